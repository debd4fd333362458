//! Comment handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use jotter_core::{Comment, CommentRepository, CommentTarget};

use crate::auth::RequireUser;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    pub content: String,
}

/// Comments on a todo, oldest first.
pub async fn list_todo_comments(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    list_for(&state, &auth, CommentTarget::Todo(id)).await
}

/// Comments on a note, oldest first.
pub async fn list_note_comments(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    list_for(&state, &auth, CommentTarget::Note(id)).await
}

/// Comment on a todo.
///
/// # Returns
/// - 201 Created with the comment
/// - 400 Bad Request if the content is blank
/// - 404 Not Found if the todo does not exist
pub async fn create_todo_comment(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
    Json(body): Json<CommentBody>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    create_on(&state, &auth, CommentTarget::Todo(id), &body.content).await
}

/// Comment on a note.
pub async fn create_note_comment(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
    Json(body): Json<CommentBody>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    create_on(&state, &auth, CommentTarget::Note(id), &body.content).await
}

async fn list_for(
    state: &AppState,
    auth: &RequireUser,
    target: CommentTarget,
) -> Result<Json<Vec<Comment>>, ApiError> {
    Ok(Json(state.db.comments.list_for(auth.user_id, target).await?))
}

async fn create_on(
    state: &AppState,
    auth: &RequireUser,
    target: CommentTarget,
    content: &str,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = state
        .db
        .comments
        .create(auth.user_id, target, content)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
    Json(body): Json<CommentBody>,
) -> Result<Json<Comment>, ApiError> {
    let comment = state
        .db
        .comments
        .update(auth.user_id, id, &body.content)
        .await?;
    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.comments.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
