//! Core traits for keepmark storage backends.
//!
//! These traits define the interfaces that concrete stores must satisfy, so
//! the HTTP layer runs unchanged over PostgreSQL or the in-process store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// CREDENTIAL STORE
// =============================================================================

/// Repository for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. A duplicate username or email fails with
    /// [`crate::Error::Conflict`].
    async fn insert(&self, user: NewUser) -> Result<User>;

    /// Look up a user by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Look up a user by normalized (lowercased) email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// True if either the username or the email is already taken.
    async fn exists_by_username_or_email(&self, username: &str, email: &str) -> Result<bool>;
}

// =============================================================================
// CONTENT STORE
// =============================================================================

/// Repository for note CRUD and search.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a new note owned by `owner_id` (or ownerless).
    async fn insert(&self, owner_id: Option<Uuid>, input: NoteInput) -> Result<Note>;

    /// Fetch a note by id. Missing notes fail with [`crate::Error::NotFound`].
    async fn fetch(&self, id: Uuid) -> Result<Note>;

    /// List notes in one owner pool, newest first.
    async fn list(&self, query: ListQuery) -> Result<Vec<Note>>;

    /// Replace the editable fields of a note. The owner is never changed.
    async fn update(&self, id: Uuid, input: NoteInput) -> Result<Note>;

    /// Delete a note.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Repository for bookmark CRUD and search.
#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    /// Insert a new bookmark owned by `owner_id` (or ownerless).
    async fn insert(&self, owner_id: Option<Uuid>, input: BookmarkInput) -> Result<Bookmark>;

    /// Fetch a bookmark by id. Missing bookmarks fail with [`crate::Error::NotFound`].
    async fn fetch(&self, id: Uuid) -> Result<Bookmark>;

    /// List bookmarks in one owner pool, newest first.
    async fn list(&self, query: ListQuery) -> Result<Vec<Bookmark>>;

    /// Replace the editable fields of a bookmark. The owner is never changed.
    async fn update(&self, id: Uuid, input: BookmarkInput) -> Result<Bookmark>;

    /// Delete a bookmark.
    async fn delete(&self, id: Uuid) -> Result<()>;
}
