//! Note handlers (daily and generic).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use jotter_core::{CreateNoteRequest, Note, NoteRepository, UpdateNoteRequest};

use crate::auth::RequireUser;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct FolderQuery {
    /// Omit for the root folder.
    pub folder_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SlugQuery {
    pub folder_id: Option<Uuid>,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveNoteBody {
    /// Target folder, `null` for the root.
    pub folder_id: Option<Uuid>,
}

/// Create a daily or generic note.
///
/// # Returns
/// - 201 Created with the note (generic notes carry their derived slug)
/// - 400 Bad Request if the kind's required fields are missing
/// - 404 Not Found if the target folder does not exist
pub async fn create_note(
    State(state): State<AppState>,
    auth: RequireUser,
    Json(req): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let note = state.db.notes.create(auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// Generic notes directly inside a folder.
pub async fn list_notes(
    State(state): State<AppState>,
    auth: RequireUser,
    Query(query): Query<FolderQuery>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = state
        .db
        .notes
        .list_in_folder(auth.user_id, query.folder_id)
        .await?;
    Ok(Json(notes))
}

pub async fn list_trash(
    State(state): State<AppState>,
    auth: RequireUser,
) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.db.notes.list_trash(auth.user_id).await?))
}

pub async fn get_note(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Note>, ApiError> {
    Ok(Json(state.db.notes.get(auth.user_id, id).await?))
}

/// Resolve a generic note by folder and slug.
pub async fn get_note_by_slug(
    State(state): State<AppState>,
    auth: RequireUser,
    Query(query): Query<SlugQuery>,
) -> Result<Json<Note>, ApiError> {
    let note = state
        .db
        .notes
        .get_by_slug(auth.user_id, query.folder_id, &query.slug)
        .await?;
    Ok(Json(note))
}

/// Update title and/or content. A new title re-derives the slug.
pub async fn update_note(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateNoteRequest>,
) -> Result<Json<Note>, ApiError> {
    Ok(Json(state.db.notes.update(auth.user_id, id, req).await?))
}

pub async fn move_note(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
    Json(body): Json<MoveNoteBody>,
) -> Result<Json<Note>, ApiError> {
    let note = state
        .db
        .notes
        .move_to_folder(auth.user_id, id, body.folder_id)
        .await?;
    Ok(Json(note))
}

pub async fn delete_note(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.notes.soft_delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_note(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Note>, ApiError> {
    Ok(Json(state.db.notes.restore(auth.user_id, id).await?))
}
