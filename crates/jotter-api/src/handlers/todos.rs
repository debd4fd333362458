//! Todo handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use jotter_core::{CreateTodoRequest, Todo, TodoRepository, UpdateTodoRequest};

use crate::auth::RequireUser;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct SetCompletedBody {
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct CopyTodoBody {
    pub date: NaiveDate,
}

/// Create a todo at the end of its day.
///
/// # Returns
/// - 201 Created with the todo
/// - 400 Bad Request if the content is blank
pub async fn create_todo(
    State(state): State<AppState>,
    auth: RequireUser,
    Json(req): Json<CreateTodoRequest>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let todo = state.db.todos.create(auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn get_todo(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.db.todos.get(auth.user_id, id).await?))
}

/// Update content, priority or date. Moving to another date appends.
pub async fn update_todo(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTodoRequest>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.db.todos.update(auth.user_id, id, req).await?))
}

pub async fn toggle_todo(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.db.todos.toggle(auth.user_id, id).await?))
}

/// Set completion explicitly. Completing twice keeps the first timestamp.
pub async fn set_todo_completed(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
    Json(body): Json<SetCompletedBody>,
) -> Result<Json<Todo>, ApiError> {
    let todo = state
        .db
        .todos
        .set_completed(auth.user_id, id, body.completed)
        .await?;
    Ok(Json(todo))
}

/// Soft-delete a todo.
///
/// # Returns
/// - 204 No Content
/// - 404 Not Found if missing or already deleted
pub async fn delete_todo(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.todos.soft_delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_todo(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.db.todos.restore(auth.user_id, id).await?))
}

/// Copy a todo to another date.
///
/// # Returns
/// - 201 Created with the new todo, which records `copied_from_id`
pub async fn copy_todo(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
    Json(body): Json<CopyTodoBody>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let copy = state
        .db
        .todos
        .copy_to_date(auth.user_id, id, body.date)
        .await?;
    Ok((StatusCode::CREATED, Json(copy)))
}
