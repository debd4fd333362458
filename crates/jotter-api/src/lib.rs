//! # jotter-api
//!
//! HTTP API for jotter: REST endpoints over the repositories in `jotter-db`
//! and the `GET /api/sync` event stream that pushes per-user changes to
//! connected clients.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod state;
pub mod sync;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

pub use auth::RequireUser;
pub use config::ApiConfig;
pub use error::ApiError;
pub use state::AppState;

use handlers::{
    account, comments, days, folders, health, notes, projects, search, settings, tags, todos,
};

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Build the application router with its middleware stack.
pub fn router(state: AppState, allowed_origins: Vec<HeaderValue>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // Account
        .route("/api/v1/me", get(account::get_me))
        .route("/api/v1/session", delete(account::sign_out))
        // Live sync
        .route("/api/sync", get(sync::sync_events))
        .route("/api/v1/sync", get(sync::sync_events))
        // Days
        .route("/api/v1/days/:date", get(days::get_day))
        .route("/api/v1/days/:date/carry-over", get(days::get_carry_over))
        .route("/api/v1/days/:date/order", put(days::reorder_day))
        // Todos
        .route("/api/v1/todos", post(todos::create_todo))
        .route(
            "/api/v1/todos/:id",
            get(todos::get_todo)
                .patch(todos::update_todo)
                .delete(todos::delete_todo),
        )
        .route("/api/v1/todos/:id/toggle", post(todos::toggle_todo))
        .route("/api/v1/todos/:id/completed", put(todos::set_todo_completed))
        .route("/api/v1/todos/:id/restore", post(todos::restore_todo))
        .route("/api/v1/todos/:id/copy", post(todos::copy_todo))
        // Notes
        .route(
            "/api/v1/notes",
            get(notes::list_notes).post(notes::create_note),
        )
        .route("/api/v1/notes/trash", get(notes::list_trash))
        .route("/api/v1/notes/by-slug", get(notes::get_note_by_slug))
        .route(
            "/api/v1/notes/:id",
            get(notes::get_note)
                .patch(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/api/v1/notes/:id/folder", put(notes::move_note))
        .route("/api/v1/notes/:id/restore", post(notes::restore_note))
        // Comments
        .route(
            "/api/v1/todos/:id/comments",
            get(comments::list_todo_comments).post(comments::create_todo_comment),
        )
        .route(
            "/api/v1/notes/:id/comments",
            get(comments::list_note_comments).post(comments::create_note_comment),
        )
        .route(
            "/api/v1/comments/:id",
            patch(comments::update_comment).delete(comments::delete_comment),
        )
        // Folders
        .route(
            "/api/v1/folders",
            get(folders::list_folders).post(folders::create_folder),
        )
        .route(
            "/api/v1/folders/:id",
            get(folders::get_folder)
                .patch(folders::rename_folder)
                .delete(folders::delete_folder),
        )
        .route("/api/v1/folders/:id/parent", put(folders::move_folder))
        // Projects
        .route(
            "/api/v1/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/api/v1/projects/:id",
            get(projects::get_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/api/v1/projects/:id/items",
            get(projects::list_project_items).post(projects::assign_item),
        )
        .route(
            "/api/v1/projects/:id/items/:kind/:item_id",
            delete(projects::unassign_item),
        )
        // Tags
        .route("/api/v1/tags", get(tags::list_tags))
        .route(
            "/api/v1/tags/:id",
            patch(tags::rename_tag).delete(tags::delete_tag),
        )
        .route("/api/v1/tags/:id/items", get(tags::list_tag_items))
        // Settings
        .route(
            "/api/v1/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        // Search
        .route("/api/v1/search", get(search::search))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
