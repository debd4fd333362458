//! Folder tree handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use jotter_core::{CreateFolderRequest, FolderRepository, NoteFolder};

use crate::auth::RequireUser;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct RenameFolderBody {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveFolderBody {
    /// New parent, `null` for the root.
    pub parent_id: Option<Uuid>,
}

/// The whole tree, depth-first, each folder carrying its depth.
pub async fn list_folders(
    State(state): State<AppState>,
    auth: RequireUser,
) -> Result<Json<Vec<NoteFolder>>, ApiError> {
    Ok(Json(state.db.folders.list_tree(auth.user_id).await?))
}

pub async fn create_folder(
    State(state): State<AppState>,
    auth: RequireUser,
    Json(req): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<NoteFolder>), ApiError> {
    let folder = state.db.folders.create(auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

pub async fn get_folder(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<NoteFolder>, ApiError> {
    Ok(Json(state.db.folders.get(auth.user_id, id).await?))
}

pub async fn rename_folder(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
    Json(body): Json<RenameFolderBody>,
) -> Result<Json<NoteFolder>, ApiError> {
    let folder = state
        .db
        .folders
        .rename(auth.user_id, id, &body.name)
        .await?;
    Ok(Json(folder))
}

/// Move a folder under a new parent.
///
/// # Returns
/// - 200 OK with the moved folder
/// - 400 Bad Request when the move would create a cycle
pub async fn move_folder(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
    Json(body): Json<MoveFolderBody>,
) -> Result<Json<NoteFolder>, ApiError> {
    let folder = state
        .db
        .folders
        .move_to(auth.user_id, id, body.parent_id)
        .await?;
    Ok(Json(folder))
}

/// Delete a folder and its subfolders. Notes inside move to the trash.
pub async fn delete_folder(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.folders.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
