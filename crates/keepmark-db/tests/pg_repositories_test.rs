//! PostgreSQL repository tests.
//!
//! Each test creates its own user and scopes every query to that owner, so
//! tests can share one database and run in parallel.

use keepmark_db::{
    BookmarkInput, BookmarkRepository, Database, Error, ListQuery, NewUser, NoteInput,
    NoteRepository, UserRepository, DEFAULT_TEST_DATABASE_URL,
};
use uuid::Uuid;

/// Connect to the test database and apply migrations.
///
/// Uses DATABASE_URL if set, otherwise the local test database on port 15432.
async fn setup_test_db() -> Database {
    let _ = dotenvy::dotenv();
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_TEST_DATABASE_URL.to_string());
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    db.migrate().await.expect("Failed to run migrations");
    db
}

async fn create_owner(db: &Database) -> Uuid {
    let suffix = Uuid::new_v4().simple().to_string();
    db.users
        .insert(NewUser {
            username: format!("user-{}", &suffix[..12]),
            email: format!("{}@example.com", &suffix[..12]),
            password_hash: "not-a-real-hash".to_string(),
        })
        .await
        .expect("Failed to create user")
        .id
}

fn note(title: &str, content: &str, tags: &[&str]) -> NoteInput {
    NoteInput {
        title: title.to_string(),
        content: content.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        is_favorite: false,
    }
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_duplicate_user_is_conflict() {
    let db = setup_test_db().await;
    let suffix = Uuid::new_v4().simple().to_string();
    let user = NewUser {
        username: format!("dup-{}", &suffix[..12]),
        email: format!("dup-{}@example.com", &suffix[..12]),
        password_hash: "hash".to_string(),
    };

    db.users.insert(user.clone()).await.expect("first insert");
    let err = db.users.insert(user.clone()).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(msg) if msg == "User already exists!"));

    assert!(db
        .users
        .exists_by_username_or_email(&user.username, "nobody@example.com")
        .await
        .unwrap());
    let found = db.users.find_by_email(&user.email).await.unwrap().unwrap();
    assert_eq!(found.username, user.username);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_note_crud_and_tag_order() {
    let db = setup_test_db().await;
    let owner = create_owner(&db).await;

    let created = db
        .notes
        .insert(Some(owner), note("Title", "Body", &["z", "a", "m"]))
        .await
        .unwrap();
    assert_eq!(created.tags, vec!["z", "a", "m"]);
    assert_eq!(created.owner_id, Some(owner));

    let fetched = db.notes.fetch(created.id).await.unwrap();
    assert_eq!(fetched.tags, vec!["z", "a", "m"]);

    let updated = db
        .notes
        .update(created.id, note("New", "Changed", &[]))
        .await
        .unwrap();
    assert_eq!(updated.title, "New");
    assert!(updated.tags.is_empty());
    assert_eq!(updated.owner_id, Some(owner));
    assert!(updated.updated_at >= created.updated_at);

    db.notes.delete(created.id).await.unwrap();
    assert!(matches!(
        db.notes.fetch(created.id).await,
        Err(Error::NotFound(msg)) if msg == "Note not found"
    ));
    assert!(matches!(
        db.notes.delete(created.id).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_note_search_and_tag_filter() {
    let db = setup_test_db().await;
    let owner = create_owner(&db).await;

    db.notes
        .insert(Some(owner), note("Databases", "postgres internals", &["a"]))
        .await
        .unwrap();
    db.notes
        .insert(Some(owner), note("Cooking", "bread recipes", &["b", "c"]))
        .await
        .unwrap();
    db.notes
        .insert(Some(owner), note("Travel", "trains", &["c"]))
        .await
        .unwrap();

    let hits = db
        .notes
        .list(ListQuery::for_owner(Some(owner)).with_search("postgres bread"))
        .await
        .unwrap();
    let mut titles: Vec<_> = hits.iter().map(|n| n.title.as_str()).collect();
    titles.sort();
    assert_eq!(titles, vec!["Cooking", "Databases"]);

    let tagged = db
        .notes
        .list(ListQuery::for_owner(Some(owner)).with_tags(vec!["a".into(), "b".into()]))
        .await
        .unwrap();
    assert_eq!(tagged.len(), 2);

    let all = db
        .notes
        .list(ListQuery::for_owner(Some(owner)))
        .await
        .unwrap();
    let titles: Vec<_> = all.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["Travel", "Cooking", "Databases"]);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_anonymous_note_not_in_owner_list() {
    let db = setup_test_db().await;
    let owner = create_owner(&db).await;
    let marker = format!("marker{}", Uuid::new_v4().simple());

    let anon = db
        .notes
        .insert(None, note("scratch", &marker, &[]))
        .await
        .unwrap();
    assert_eq!(anon.owner_id, None);

    let owner_hits = db
        .notes
        .list(ListQuery::for_owner(Some(owner)).with_search(marker.clone()))
        .await
        .unwrap();
    assert!(owner_hits.is_empty());

    let anon_hits = db
        .notes
        .list(ListQuery::for_owner(None).with_search(marker))
        .await
        .unwrap();
    assert!(anon_hits.iter().any(|n| n.id == anon.id));

    db.notes.delete(anon.id).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_bookmark_crud_and_search() {
    let db = setup_test_db().await;
    let owner = create_owner(&db).await;

    let created = db
        .bookmarks
        .insert(
            Some(owner),
            BookmarkInput {
                url: "https://example.com".to_string(),
                title: "Example Domain".to_string(),
                description: "reference material".to_string(),
                tags: vec!["web".to_string()],
                is_favorite: true,
            },
        )
        .await
        .unwrap();
    assert!(created.is_favorite);

    let hits = db
        .bookmarks
        .list(ListQuery::for_owner(Some(owner)).with_search("reference"))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);

    let updated = db
        .bookmarks
        .update(
            created.id,
            BookmarkInput {
                url: "https://example.org".to_string(),
                title: "Example Org".to_string(),
                description: String::new(),
                tags: vec![],
                is_favorite: false,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.url, "https://example.org");
    assert_eq!(updated.description, "");

    db.bookmarks.delete(created.id).await.unwrap();
    assert!(matches!(
        db.bookmarks.fetch(created.id).await,
        Err(Error::NotFound(msg)) if msg == "Bookmark not found"
    ));
}
