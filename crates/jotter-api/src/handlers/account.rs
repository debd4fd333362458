//! The signed-in user and their session.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use jotter_core::{SessionRepository, User, UserRepository};

use crate::auth::RequireUser;
use crate::{ApiError, AppState};

/// Get the signed-in user.
pub async fn get_me(
    State(state): State<AppState>,
    auth: RequireUser,
) -> Result<Json<User>, ApiError> {
    let user = state
        .db
        .users
        .get(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;
    Ok(Json(user))
}

/// Revoke the current session.
///
/// # Returns
/// - 204 No Content
pub async fn sign_out(
    State(state): State<AppState>,
    auth: RequireUser,
) -> Result<StatusCode, ApiError> {
    state.db.sessions.revoke(&auth.token).await?;
    Ok(StatusCode::NO_CONTENT)
}
