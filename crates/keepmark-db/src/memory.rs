//! In-process storage backend.
//!
//! Keeps users, notes, and bookmarks in memory behind `tokio::sync::RwLock`s.
//! Full-text search uses an inverted index over the same fields the
//! PostgreSQL `search_tsv` column covers (title, body, tags), with the same
//! any-term semantics. Terms are lowercased words; there is no stemming.
//!
//! Used by `STORAGE_BACKEND=memory` for local runs and by the API tests.
//!
//! ```rust,ignore
//! let store = MemoryStore::new();
//! let note = store.notes.insert(None, input).await?;
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use keepmark_core::{
    Bookmark, BookmarkInput, BookmarkRepository, ContentKind, Error, ListQuery, NewUser, Note,
    NoteInput, NoteRepository, Result, User, UserRepository,
};

/// Split text into lowercase alphanumeric terms.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// A record that can live in a [`Collection`].
trait Indexed: Clone {
    fn id(&self) -> Uuid;
    fn owner_id(&self) -> Option<Uuid>;
    fn tags(&self) -> &[String];
    fn created_at(&self) -> DateTime<Utc>;
    /// Text fed to the inverted index.
    fn search_text(&self) -> String;
}

impl Indexed for Note {
    fn id(&self) -> Uuid {
        self.id
    }
    fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }
    fn tags(&self) -> &[String] {
        &self.tags
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn search_text(&self) -> String {
        format!("{} {} {}", self.title, self.content, self.tags.join(" "))
    }
}

impl Indexed for Bookmark {
    fn id(&self) -> Uuid {
        self.id
    }
    fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }
    fn tags(&self) -> &[String] {
        &self.tags
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    fn search_text(&self) -> String {
        format!("{} {} {}", self.title, self.description, self.tags.join(" "))
    }
}

#[derive(Debug, Default)]
struct InvertedIndex {
    postings: HashMap<String, HashSet<Uuid>>,
    terms_by_record: HashMap<Uuid, HashSet<String>>,
}

impl InvertedIndex {
    fn add(&mut self, id: Uuid, text: &str) {
        let terms: HashSet<String> = tokenize(text).collect();
        for term in &terms {
            self.postings.entry(term.clone()).or_default().insert(id);
        }
        self.terms_by_record.insert(id, terms);
    }

    fn remove(&mut self, id: Uuid) {
        let Some(terms) = self.terms_by_record.remove(&id) else {
            return;
        };
        for term in terms {
            if let Some(ids) = self.postings.get_mut(&term) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.postings.remove(&term);
                }
            }
        }
    }

    /// Records matching any term of `search`.
    fn matching(&self, search: &str) -> HashSet<Uuid> {
        tokenize(search)
            .filter_map(|term| self.postings.get(&term))
            .flat_map(|ids| ids.iter().copied())
            .collect()
    }
}

struct Entry<T> {
    record: T,
    /// Insertion order, breaks `created_at` ties.
    seq: u64,
}

struct Collection<T> {
    kind: ContentKind,
    entries: HashMap<Uuid, Entry<T>>,
    index: InvertedIndex,
    next_seq: u64,
}

impl<T: Indexed> Collection<T> {
    fn new(kind: ContentKind) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
            index: InvertedIndex::default(),
            next_seq: 0,
        }
    }

    fn not_found(&self) -> Error {
        Error::NotFound(self.kind.not_found_message())
    }

    fn insert(&mut self, record: T) -> T {
        let id = record.id();
        self.index.add(id, &record.search_text());
        self.next_seq += 1;
        self.entries.insert(
            id,
            Entry {
                record: record.clone(),
                seq: self.next_seq,
            },
        );
        record
    }

    fn fetch(&self, id: Uuid) -> Result<T> {
        self.entries
            .get(&id)
            .map(|e| e.record.clone())
            .ok_or_else(|| self.not_found())
    }

    fn replace(&mut self, id: Uuid, apply: impl FnOnce(&mut T)) -> Result<T> {
        let entry = self.entries.get_mut(&id).ok_or_else(|| {
            Error::NotFound(self.kind.not_found_message())
        })?;
        apply(&mut entry.record);
        let updated = entry.record.clone();
        self.index.remove(id);
        self.index.add(id, &updated.search_text());
        Ok(updated)
    }

    fn delete(&mut self, id: Uuid) -> Result<()> {
        if self.entries.remove(&id).is_none() {
            return Err(self.not_found());
        }
        self.index.remove(id);
        Ok(())
    }

    fn list(&self, query: &ListQuery) -> Vec<T> {
        let search_hits = query
            .search
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| self.index.matching(s));
        let tag_filter: Option<HashSet<&str>> = query
            .tags
            .as_ref()
            .filter(|t| !t.is_empty())
            .map(|t| t.iter().map(String::as_str).collect());

        let mut hits: Vec<&Entry<T>> = self
            .entries
            .values()
            .filter(|e| e.record.owner_id() == query.owner_id)
            .filter(|e| {
                search_hits
                    .as_ref()
                    .map_or(true, |ids| ids.contains(&e.record.id()))
            })
            .filter(|e| {
                tag_filter.as_ref().map_or(true, |wanted| {
                    e.record.tags().iter().any(|t| wanted.contains(t.as_str()))
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.record
                .created_at()
                .cmp(&a.record.created_at())
                .then(b.seq.cmp(&a.seq))
        });
        hits.into_iter().map(|e| e.record.clone()).collect()
    }
}

// =============================================================================
// REPOSITORIES
// =============================================================================

/// In-memory UserRepository.
#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(Error::Conflict("User already exists!".to_string()));
        }
        let now = Utc::now();
        let created = User {
            id: Uuid::now_v7(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn exists_by_username_or_email(&self, username: &str, email: &str) -> Result<bool> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .any(|u| u.username == username || u.email == email))
    }
}

/// In-memory NoteRepository.
#[derive(Clone)]
pub struct MemoryNoteRepository {
    notes: Arc<RwLock<Collection<Note>>>,
}

impl Default for MemoryNoteRepository {
    fn default() -> Self {
        Self {
            notes: Arc::new(RwLock::new(Collection::new(ContentKind::Note))),
        }
    }
}

#[async_trait]
impl NoteRepository for MemoryNoteRepository {
    async fn insert(&self, owner_id: Option<Uuid>, input: NoteInput) -> Result<Note> {
        let now = Utc::now();
        let note = Note {
            id: Uuid::now_v7(),
            title: input.title,
            content: input.content,
            tags: input.tags,
            is_favorite: input.is_favorite,
            owner_id,
            created_at: now,
            updated_at: now,
        };
        Ok(self.notes.write().await.insert(note))
    }

    async fn fetch(&self, id: Uuid) -> Result<Note> {
        self.notes.read().await.fetch(id)
    }

    async fn list(&self, query: ListQuery) -> Result<Vec<Note>> {
        Ok(self.notes.read().await.list(&query))
    }

    async fn update(&self, id: Uuid, input: NoteInput) -> Result<Note> {
        self.notes.write().await.replace(id, |note| {
            note.title = input.title;
            note.content = input.content;
            note.tags = input.tags;
            note.is_favorite = input.is_favorite;
            note.updated_at = Utc::now();
        })
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.notes.write().await.delete(id)
    }
}

/// In-memory BookmarkRepository.
#[derive(Clone)]
pub struct MemoryBookmarkRepository {
    bookmarks: Arc<RwLock<Collection<Bookmark>>>,
}

impl Default for MemoryBookmarkRepository {
    fn default() -> Self {
        Self {
            bookmarks: Arc::new(RwLock::new(Collection::new(ContentKind::Bookmark))),
        }
    }
}

#[async_trait]
impl BookmarkRepository for MemoryBookmarkRepository {
    async fn insert(&self, owner_id: Option<Uuid>, input: BookmarkInput) -> Result<Bookmark> {
        let now = Utc::now();
        let bookmark = Bookmark {
            id: Uuid::now_v7(),
            url: input.url,
            title: input.title,
            description: input.description,
            tags: input.tags,
            is_favorite: input.is_favorite,
            owner_id,
            created_at: now,
            updated_at: now,
        };
        Ok(self.bookmarks.write().await.insert(bookmark))
    }

    async fn fetch(&self, id: Uuid) -> Result<Bookmark> {
        self.bookmarks.read().await.fetch(id)
    }

    async fn list(&self, query: ListQuery) -> Result<Vec<Bookmark>> {
        Ok(self.bookmarks.read().await.list(&query))
    }

    async fn update(&self, id: Uuid, input: BookmarkInput) -> Result<Bookmark> {
        self.bookmarks.write().await.replace(id, |bookmark| {
            bookmark.url = input.url;
            bookmark.title = input.title;
            bookmark.description = input.description;
            bookmark.tags = input.tags;
            bookmark.is_favorite = input.is_favorite;
            bookmark.updated_at = Utc::now();
        })
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.bookmarks.write().await.delete(id)
    }
}

/// All three in-memory repositories.
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub users: MemoryUserRepository,
    pub notes: MemoryNoteRepository,
    pub bookmarks: MemoryBookmarkRepository,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_input(title: &str, content: &str, tags: &[&str]) -> NoteInput {
        NoteInput {
            title: title.to_string(),
            content: content.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            is_favorite: false,
        }
    }

    fn titles(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.title.as_str()).collect()
    }

    #[test]
    fn test_tokenize() {
        let terms: Vec<String> = tokenize("Hello, World! rust-lang 2024").collect();
        assert_eq!(terms, vec!["hello", "world", "rust", "lang", "2024"]);
    }

    #[tokio::test]
    async fn test_list_scopes_owner_pools() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        store
            .notes
            .insert(None, note_input("public", "c", &[]))
            .await
            .unwrap();
        store
            .notes
            .insert(Some(owner), note_input("mine", "c", &[]))
            .await
            .unwrap();

        let anon = store.notes.list(ListQuery::for_owner(None)).await.unwrap();
        assert_eq!(titles(&anon), vec!["public"]);

        let mine = store
            .notes
            .list(ListQuery::for_owner(Some(owner)))
            .await
            .unwrap();
        assert_eq!(titles(&mine), vec!["mine"]);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = MemoryStore::new();
        for title in ["first", "second", "third"] {
            store
                .notes
                .insert(None, note_input(title, "c", &[]))
                .await
                .unwrap();
        }
        let notes = store.notes.list(ListQuery::for_owner(None)).await.unwrap();
        assert_eq!(titles(&notes), vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_search_matches_any_term_in_any_field() {
        let store = MemoryStore::new();
        store
            .notes
            .insert(None, note_input("Foo title", "nothing", &[]))
            .await
            .unwrap();
        store
            .notes
            .insert(None, note_input("other", "body mentions bar", &[]))
            .await
            .unwrap();
        store
            .notes
            .insert(None, note_input("tagged", "x", &["baz"]))
            .await
            .unwrap();
        store
            .notes
            .insert(None, note_input("unrelated", "y", &[]))
            .await
            .unwrap();

        let hits = store
            .notes
            .list(ListQuery::for_owner(None).with_search("foo bar BAZ"))
            .await
            .unwrap();
        let mut found = titles(&hits);
        found.sort();
        assert_eq!(found, vec!["Foo title", "other", "tagged"]);
    }

    #[tokio::test]
    async fn test_tag_filter_intersects() {
        let store = MemoryStore::new();
        store
            .notes
            .insert(None, note_input("a-only", "c", &["a"]))
            .await
            .unwrap();
        store
            .notes
            .insert(None, note_input("b-and-c", "c", &["b", "c"]))
            .await
            .unwrap();
        store
            .notes
            .insert(None, note_input("c-only", "c", &["c"]))
            .await
            .unwrap();

        let hits = store
            .notes
            .list(ListQuery::for_owner(None).with_tags(vec!["a".to_string(), "b".to_string()]))
            .await
            .unwrap();
        let mut found = titles(&hits);
        found.sort();
        assert_eq!(found, vec!["a-only", "b-and-c"]);
    }

    #[tokio::test]
    async fn test_update_reindexes() {
        let store = MemoryStore::new();
        let note = store
            .notes
            .insert(None, note_input("old words", "c", &[]))
            .await
            .unwrap();
        store
            .notes
            .update(note.id, note_input("new words", "c", &[]))
            .await
            .unwrap();

        let old = store
            .notes
            .list(ListQuery::for_owner(None).with_search("old"))
            .await
            .unwrap();
        assert!(old.is_empty());
        let new = store
            .notes
            .list(ListQuery::for_owner(None).with_search("new"))
            .await
            .unwrap();
        assert_eq!(new.len(), 1);
        assert_eq!(new[0].owner_id, None);
    }

    #[tokio::test]
    async fn test_delete_and_missing() {
        let store = MemoryStore::new();
        let note = store
            .notes
            .insert(None, note_input("t", "c", &[]))
            .await
            .unwrap();
        store.notes.delete(note.id).await.unwrap();

        assert!(matches!(
            store.notes.fetch(note.id).await,
            Err(Error::NotFound(msg)) if msg == "Note not found"
        ));
        assert!(matches!(
            store.notes.delete(note.id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_bookmark_search_covers_description() {
        let store = MemoryStore::new();
        store
            .bookmarks
            .insert(
                None,
                BookmarkInput {
                    url: "https://example.com".to_string(),
                    title: "Example".to_string(),
                    description: "a reference page".to_string(),
                    tags: vec![],
                    is_favorite: false,
                },
            )
            .await
            .unwrap();

        let hits = store
            .bookmarks
            .list(ListQuery::for_owner(None).with_search("reference"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_user_conflicts() {
        let store = MemoryStore::new();
        let new_user = |username: &str, email: &str| NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        };
        store
            .users
            .insert(new_user("alice", "alice@example.com"))
            .await
            .unwrap();

        assert!(matches!(
            store.users.insert(new_user("alice", "other@example.com")).await,
            Err(Error::Conflict(_))
        ));
        assert!(matches!(
            store.users.insert(new_user("bob", "alice@example.com")).await,
            Err(Error::Conflict(_))
        ));
        assert!(store
            .users
            .exists_by_username_or_email("nobody", "alice@example.com")
            .await
            .unwrap());
    }
}
