use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::{debug, info};

use keepmark_core::validation::validate_note;
use keepmark_core::{ensure_access, Access, ContentKind, Identity, Note};

use crate::envelope::{created, Envelope};
use crate::error::ApiError;
use crate::extract::{parse_record_id, ApiJson, ApiQuery};
use crate::handlers::ListParams;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Body for create and full-replacement update.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteBody {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_favorite: Option<bool>,
}

pub async fn create_note(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
    ApiJson(body): ApiJson<NoteBody>,
) -> Result<impl IntoResponse, ApiError> {
    let input = validate_note(
        body.title.as_deref(),
        body.content.as_deref(),
        body.tags,
        body.is_favorite,
    )?;
    let note = state
        .repos
        .notes
        .insert(caller.as_ref().map(|c| c.id), input)
        .await?;

    info!(
        subsystem = "api",
        component = "notes",
        op = "create",
        record_id = %note.id,
        "Note created"
    );
    Ok(created(note))
}

pub async fn list_notes(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.into_list_query(caller.as_ref());
    let notes = state.repos.notes.list(query).await?;

    debug!(
        subsystem = "api",
        component = "notes",
        op = "list",
        result_count = notes.len(),
        "Listed notes"
    );
    Ok(Json(Envelope::list(notes)))
}

/// Fetch a note and check the caller may perform `access` on it.
async fn authorized_note(
    state: &AppState,
    raw_id: &str,
    caller: Option<&Identity>,
    access: Access,
) -> Result<Note, ApiError> {
    let id = parse_record_id(raw_id, ContentKind::Note)?;
    let note = state.repos.notes.fetch(id).await?;
    ensure_access(&note, caller, access)?;
    Ok(note)
}

pub async fn get_note(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let note = authorized_note(&state, &id, caller.as_ref(), Access::Read).await?;
    Ok(Json(Envelope::data(note)))
}

pub async fn update_note(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<NoteBody>,
) -> Result<impl IntoResponse, ApiError> {
    let note = authorized_note(&state, &id, caller.as_ref(), Access::Update).await?;
    let input = validate_note(
        body.title.as_deref(),
        body.content.as_deref(),
        body.tags,
        body.is_favorite,
    )?;
    let updated = state.repos.notes.update(note.id, input).await?;

    info!(
        subsystem = "api",
        component = "notes",
        op = "update",
        record_id = %updated.id,
        "Note updated"
    );
    Ok(Json(Envelope::data(updated)))
}

pub async fn delete_note(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let note = authorized_note(&state, &id, caller.as_ref(), Access::Delete).await?;
    state.repos.notes.delete(note.id).await?;

    info!(
        subsystem = "api",
        component = "notes",
        op = "delete",
        record_id = %note.id,
        "Note deleted"
    );
    Ok(Json(Envelope::message("Note deleted successfully")))
}
