//! Day view: the refresh target of sync clients.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use jotter_core::{DayView, Todo, TodoRepository};

use crate::auth::RequireUser;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ReorderBody {
    /// Todo ids in their new order.
    pub ids: Vec<Uuid>,
}

/// Todos and daily notes for a date.
pub async fn get_day(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(date): Path<NaiveDate>,
) -> Result<Json<DayView>, ApiError> {
    Ok(Json(state.db.day_view(auth.user_id, date).await?))
}

/// Unfinished todos from earlier days, newest day first.
pub async fn get_carry_over(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(date): Path<NaiveDate>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let todos = state
        .db
        .todos
        .list_unfinished_before(auth.user_id, date)
        .await?;
    Ok(Json(todos))
}

/// Reorder a day's todos.
///
/// # Returns
/// - 204 No Content on success
/// - 400 Bad Request for duplicate ids or ids from another day
pub async fn reorder_day(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(date): Path<NaiveDate>,
    Json(body): Json<ReorderBody>,
) -> Result<StatusCode, ApiError> {
    state
        .db
        .todos
        .reorder(auth.user_id, date, &body.ids)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
