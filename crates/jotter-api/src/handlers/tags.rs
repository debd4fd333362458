//! Tag handlers. Tags are created implicitly by `[[name]]` mentions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use jotter_core::{ItemCollection, Tag, TagRepository};

use crate::auth::RequireUser;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct RenameTagBody {
    pub name: String,
}

pub async fn list_tags(
    State(state): State<AppState>,
    auth: RequireUser,
) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.db.tags.list(auth.user_id).await?))
}

/// Rename a tag and rewrite its mentions.
///
/// # Returns
/// - 200 OK with the renamed tag
/// - 409 Conflict if another tag already has the name
pub async fn rename_tag(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
    Json(body): Json<RenameTagBody>,
) -> Result<Json<Tag>, ApiError> {
    Ok(Json(state.db.tags.rename(auth.user_id, id, &body.name).await?))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.tags.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Live items mentioning the tag.
pub async fn list_tag_items(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ItemCollection>, ApiError> {
    Ok(Json(state.db.tags.items(auth.user_id, id).await?))
}
