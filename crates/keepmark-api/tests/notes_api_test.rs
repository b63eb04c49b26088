//! Note endpoints: ownership scoping, search, tag filters, full-replacement update.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{create_note, register, send, setup, titles};

#[tokio::test]
async fn test_create_note_shape() {
    let app = setup();
    let (user_id, token) = register(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/notes",
        Some(&token),
        Some(json!({"title": "  Groceries ", "content": "milk", "tags": ["z", " a ", "", "m"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let note = &body["data"];
    assert_eq!(note["title"], "Groceries");
    assert_eq!(note["content"], "milk");
    assert_eq!(note["tags"], json!(["z", "a", "m"]));
    assert_eq!(note["isFavorite"], false);
    assert_eq!(note["ownerId"], user_id.as_str());
    assert!(note["createdAt"].is_string());
    assert!(note["updatedAt"].is_string());

    // Tag order survives a read back.
    let id = note["id"].as_str().unwrap();
    let (_, body) = send(&app, Method::GET, &format!("/api/notes/{}", id), Some(&token), None).await;
    assert_eq!(body["data"]["tags"], json!(["z", "a", "m"]));
}

#[tokio::test]
async fn test_create_note_requires_title_and_content() {
    let app = setup();
    for (payload, message) in [
        (json!({"content": "body"}), "Title is required"),
        (json!({"title": "   ", "content": "body"}), "Title is required"),
        (json!({"title": "t"}), "Content is required"),
    ] {
        let (status, body) = send(&app, Method::POST, "/api/notes", None, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"success": false, "message": message}));
    }
}

#[tokio::test]
async fn test_anonymous_notes_are_a_public_scratch_space() {
    let app = setup();
    let (_, token) = register(&app, "alice").await;
    let id = create_note(&app, None, json!({"title": "public", "content": "x"})).await;

    let (_, anon_list) = send(&app, Method::GET, "/api/notes", None, None).await;
    assert_eq!(titles(&anon_list), vec!["public"]);
    assert_eq!(anon_list["count"], 1);

    let (_, user_list) = send(&app, Method::GET, "/api/notes", Some(&token), None).await;
    assert_eq!(user_list["count"], 0);

    let (status, body) = send(&app, Method::GET, &format!("/api/notes/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["ownerId"], serde_json::Value::Null);

    // Anyone may modify an ownerless note.
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/notes/{}", id),
        Some(&token),
        Some(json!({"title": "edited", "content": "y"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_owned_note_is_private() {
    let app = setup();
    let (_, alice) = register(&app, "alice").await;
    let (_, bob) = register(&app, "bob").await;
    let id = create_note(&app, Some(&alice), json!({"title": "diary", "content": "secret"})).await;
    let path = format!("/api/notes/{}", id);

    let (status, body) = send(&app, Method::GET, &path, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "diary");

    let (status, body) = send(&app, Method::GET, &path, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized to access this note");

    let (status, body) = send(&app, Method::GET, &path, None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, body) = send(
        &app,
        Method::PUT,
        &path,
        Some(&bob),
        Some(json!({"title": "hijack", "content": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized to update this note");

    let (status, body) = send(&app, Method::DELETE, &path, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized to delete this note");

    let (_, bob_list) = send(&app, Method::GET, "/api/notes", Some(&bob), None).await;
    assert_eq!(bob_list["count"], 0);
}

#[tokio::test]
async fn test_unknown_and_malformed_ids_are_not_found() {
    let app = setup();
    for path in [
        "/api/notes/not-a-uuid".to_string(),
        format!("/api/notes/{}", uuid::Uuid::new_v4()),
    ] {
        let (status, body) = send(&app, Method::GET, &path, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"success": false, "message": "Note not found"}));
    }
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let app = setup();
    for title in ["one", "two", "three"] {
        create_note(&app, None, json!({"title": title, "content": "c"})).await;
    }
    let (_, body) = send(&app, Method::GET, "/api/notes", None, None).await;
    assert_eq!(titles(&body), vec!["three", "two", "one"]);
}

#[tokio::test]
async fn test_tag_filter_matches_any_listed_tag() {
    let app = setup();
    let (_, token) = register(&app, "alice").await;
    create_note(&app, Some(&token), json!({"title": "has-a", "content": "c", "tags": ["a"]})).await;
    create_note(&app, Some(&token), json!({"title": "has-bc", "content": "c", "tags": ["b", "c"]})).await;
    create_note(&app, Some(&token), json!({"title": "has-c", "content": "c", "tags": ["c"]})).await;

    let (status, body) = send(&app, Method::GET, "/api/notes?tags=a,%20b,", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let mut found = titles(&body);
    found.sort();
    assert_eq!(found, vec!["has-a", "has-bc"]);
    assert_eq!(body["count"], 2);

    // Blank filter means no filter.
    let (_, body) = send(&app, Method::GET, "/api/notes?tags=,", Some(&token), None).await;
    assert_eq!(body["count"], 3);
}

#[tokio::test]
async fn test_search_matches_any_term_in_any_field() {
    let app = setup();
    create_note(&app, None, json!({"title": "Rust notes", "content": "ownership"})).await;
    create_note(&app, None, json!({"title": "Recipes", "content": "sourdough bread"})).await;
    create_note(&app, None, json!({"title": "Misc", "content": "x", "tags": ["travel"]})).await;
    create_note(&app, None, json!({"title": "Other", "content": "nothing here"})).await;

    let (_, body) = send(&app, Method::GET, "/api/notes?q=rust%20bread", None, None).await;
    let mut found = titles(&body);
    found.sort();
    assert_eq!(found, vec!["Recipes", "Rust notes"]);

    let (_, body) = send(&app, Method::GET, "/api/notes?q=travel", None, None).await;
    assert_eq!(titles(&body), vec!["Misc"]);

    let (_, body) = send(&app, Method::GET, "/api/notes?q=travel&tags=other", None, None).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_update_is_full_replacement() {
    let app = setup();
    let (user_id, token) = register(&app, "alice").await;
    let id = create_note(
        &app,
        Some(&token),
        json!({"title": "t", "content": "c", "tags": ["keep?"], "isFavorite": true}),
    )
    .await;
    let path = format!("/api/notes/{}", id);

    let (status, body) = send(
        &app,
        Method::PUT,
        &path,
        Some(&token),
        Some(json!({"title": "new title", "content": "new content"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "new title");
    assert_eq!(body["data"]["tags"], json!([]));
    assert_eq!(body["data"]["isFavorite"], false);
    assert_eq!(body["data"]["ownerId"], user_id.as_str());

    let (status, body) = send(
        &app,
        Method::PUT,
        &path,
        Some(&token),
        Some(json!({"content": "no title"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Title is required");
}

#[tokio::test]
async fn test_delete_note() {
    let app = setup();
    let id = create_note(&app, None, json!({"title": "t", "content": "c"})).await;
    let path = format!("/api/notes/{}", id);

    let (status, body) = send(&app, Method::DELETE, &path, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "message": "Note deleted successfully"})
    );

    let (status, _) = send(&app, Method::GET, &path, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
