use axum::extract::State;
use axum::Json;

use jotter_core::{SettingsRepository, UpdateSettingsRequest, UserSettings};

use crate::auth::RequireUser;
use crate::{ApiError, AppState};

/// Current settings, defaults if never saved.
pub async fn get_settings(
    State(state): State<AppState>,
    auth: RequireUser,
) -> Result<Json<UserSettings>, ApiError> {
    Ok(Json(state.db.settings.get(auth.user_id).await?))
}

/// Merge and save settings.
///
/// # Returns
/// - 200 OK with the saved settings
/// - 400 Bad Request if an accent component is out of range
pub async fn update_settings(
    State(state): State<AppState>,
    auth: RequireUser,
    Json(req): Json<UpdateSettingsRequest>,
) -> Result<Json<UserSettings>, ApiError> {
    Ok(Json(state.db.settings.update(auth.user_id, req).await?))
}
