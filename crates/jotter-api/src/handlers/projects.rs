//! Project handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use jotter_core::{
    CreateProjectRequest, ItemCollection, ItemRef, Project, ProjectRepository,
    UpdateProjectRequest,
};

use super::item_ref;
use crate::auth::RequireUser;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ListProjectsQuery {
    #[serde(default)]
    pub include_archived: bool,
}

/// List projects; archived ones only when asked for.
pub async fn list_projects(
    State(state): State<AppState>,
    auth: RequireUser,
    Query(query): Query<ListProjectsQuery>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let projects = state
        .db
        .projects
        .list(auth.user_id, query.include_archived)
        .await?;
    Ok(Json(projects))
}

/// Create a project.
///
/// # Returns
/// - 201 Created with the project
/// - 400 Bad Request for a blank name or invalid color
/// - 409 Conflict if the user already has a project with this name
pub async fn create_project(
    State(state): State<AppState>,
    auth: RequireUser,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = state.db.projects.create(auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, ApiError> {
    Ok(Json(state.db.projects.get(auth.user_id, id).await?))
}

pub async fn update_project(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    Ok(Json(state.db.projects.update(auth.user_id, id, req).await?))
}

pub async fn delete_project(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.projects.delete(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_project_items(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ItemCollection>, ApiError> {
    Ok(Json(state.db.projects.items(auth.user_id, id).await?))
}

/// Assign an item. Body: `{"kind": "todo", "id": "…"}`. Idempotent.
pub async fn assign_item(
    State(state): State<AppState>,
    auth: RequireUser,
    Path(id): Path<Uuid>,
    Json(item): Json<ItemRef>,
) -> Result<StatusCode, ApiError> {
    state.db.projects.assign(auth.user_id, id, item).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn unassign_item(
    State(state): State<AppState>,
    auth: RequireUser,
    Path((id, kind, item_id)): Path<(Uuid, String, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let item = item_ref(&kind, item_id)?;
    state.db.projects.unassign(auth.user_id, id, item).await?;
    Ok(StatusCode::NO_CONTENT)
}
