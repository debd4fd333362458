use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use jotter_core::SearchHit;
use jotter_db::DEFAULT_SEARCH_LIMIT;

use crate::auth::RequireUser;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    /// Clamped to 1..=100.
    pub limit: Option<i64>,
}

/// Fuzzy search across live notes and todos, best match first.
pub async fn search(
    State(state): State<AppState>,
    auth: RequireUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchHit>>, ApiError> {
    let hits = state
        .db
        .search
        .search(
            auth.user_id,
            &query.q,
            query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
        )
        .await?;
    Ok(Json(hits))
}
