use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use keepmark_core::validation::{needs_title, validate_bookmark, validate_bookmark_url};
use keepmark_core::{ensure_access, Access, Bookmark, ContentKind, Identity};

use crate::envelope::{created, Envelope};
use crate::error::ApiError;
use crate::extract::{parse_record_id, ApiJson, ApiQuery};
use crate::handlers::ListParams;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

pub const TITLE_UNRESOLVED: &str =
    "Title is required or URL must be accessible to auto-fetch title";

/// Body for create and full-replacement update.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkBody {
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_favorite: Option<bool>,
}

/// Create a bookmark, fetching the page title when none is given.
///
/// A failed fetch rejects the request and nothing is stored.
pub async fn create_bookmark(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
    ApiJson(body): ApiJson<BookmarkBody>,
) -> Result<impl IntoResponse, ApiError> {
    let url = validate_bookmark_url(body.url.as_deref())?;

    let title = if needs_title(body.title.as_deref()) {
        match state.title_resolver.resolve(&url).await {
            Ok(title) => Some(title),
            Err(e) => {
                warn!(
                    subsystem = "api",
                    component = "bookmarks",
                    op = "create",
                    error = %e,
                    "Title fetch failed"
                );
                return Err(ApiError::BadRequest(TITLE_UNRESOLVED.to_string()));
            }
        }
    } else {
        body.title
    };

    let input = validate_bookmark(
        Some(&url),
        title.as_deref(),
        body.description.as_deref(),
        body.tags,
        body.is_favorite,
    )?;
    let bookmark = state
        .repos
        .bookmarks
        .insert(caller.as_ref().map(|c| c.id), input)
        .await?;

    info!(
        subsystem = "api",
        component = "bookmarks",
        op = "create",
        record_id = %bookmark.id,
        "Bookmark created"
    );
    Ok(created(bookmark))
}

pub async fn list_bookmarks(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.into_list_query(caller.as_ref());
    let bookmarks = state.repos.bookmarks.list(query).await?;

    debug!(
        subsystem = "api",
        component = "bookmarks",
        op = "list",
        result_count = bookmarks.len(),
        "Listed bookmarks"
    );
    Ok(Json(Envelope::list(bookmarks)))
}

async fn authorized_bookmark(
    state: &AppState,
    raw_id: &str,
    caller: Option<&Identity>,
    access: Access,
) -> Result<Bookmark, ApiError> {
    let id = parse_record_id(raw_id, ContentKind::Bookmark)?;
    let bookmark = state.repos.bookmarks.fetch(id).await?;
    ensure_access(&bookmark, caller, access)?;
    Ok(bookmark)
}

pub async fn get_bookmark(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bookmark = authorized_bookmark(&state, &id, caller.as_ref(), Access::Read).await?;
    Ok(Json(Envelope::data(bookmark)))
}

/// Full replacement. The title is never re-resolved here.
pub async fn update_bookmark(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<BookmarkBody>,
) -> Result<impl IntoResponse, ApiError> {
    let bookmark = authorized_bookmark(&state, &id, caller.as_ref(), Access::Update).await?;
    let input = validate_bookmark(
        body.url.as_deref(),
        body.title.as_deref(),
        body.description.as_deref(),
        body.tags,
        body.is_favorite,
    )?;
    let updated = state.repos.bookmarks.update(bookmark.id, input).await?;

    info!(
        subsystem = "api",
        component = "bookmarks",
        op = "update",
        record_id = %updated.id,
        "Bookmark updated"
    );
    Ok(Json(Envelope::data(updated)))
}

pub async fn delete_bookmark(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bookmark = authorized_bookmark(&state, &id, caller.as_ref(), Access::Delete).await?;
    state.repos.bookmarks.delete(bookmark.id).await?;

    info!(
        subsystem = "api",
        component = "bookmarks",
        op = "delete",
        record_id = %bookmark.id,
        "Bookmark deleted"
    );
    Ok(Json(Envelope::message("Bookmark deleted successfully")))
}
