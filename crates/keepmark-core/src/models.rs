//! Core data models for keepmark.
//!
//! These types are shared across all keepmark crates and represent the
//! stored records plus the validated inputs used to write them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// USER TYPES
// =============================================================================

/// A registered account as stored in the credential store.
///
/// The password hash never leaves the server: it is skipped on serialization.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated registration data, ready to persist.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// The caller identity attached to a request once its bearer token resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

// =============================================================================
// CONTENT TYPES
// =============================================================================

/// The two content record kinds, used for messages and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Note,
    Bookmark,
}

impl ContentKind {
    /// Lowercase noun, e.g. "note".
    pub fn noun(&self) -> &'static str {
        match self {
            ContentKind::Note => "note",
            ContentKind::Bookmark => "bookmark",
        }
    }

    /// Capitalized noun, e.g. "Note".
    pub fn title(&self) -> &'static str {
        match self {
            ContentKind::Note => "Note",
            ContentKind::Bookmark => "Bookmark",
        }
    }

    pub fn not_found_message(&self) -> String {
        format!("{} not found", self.title())
    }
}

/// A short text note.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_favorite: bool,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A saved URL.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub is_favorite: bool,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated note fields, used for both insert and full-replacement update.
///
/// Build through [`crate::validation::validate_note`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteInput {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_favorite: bool,
}

/// Validated bookmark fields, used for both insert and full-replacement update.
///
/// Build through [`crate::validation::validate_bookmark`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkInput {
    pub url: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub is_favorite: bool,
}

/// Scope and filters for listing notes or bookmarks.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// `Some(user)` lists that user's records; `None` lists the ownerless pool.
    /// The two pools never mix.
    pub owner_id: Option<Uuid>,
    /// Full-text search over title, body and tags (any term matches).
    pub search: Option<String>,
    /// Keep records whose tags intersect this set.
    pub tags: Option<Vec<String>>,
}

impl ListQuery {
    pub fn for_owner(owner_id: Option<Uuid>) -> Self {
        Self {
            owner_id,
            ..Default::default()
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }
}
