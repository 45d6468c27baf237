//! Candidate search endpoint.

use axum::{
    extract::{Query, State},
    Json,
};
use ferrovet_sources::models::TargetCandidate;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

/// GET /api/search - Target autocomplete, at most ten hits
pub async fn api_search(
    State(state): State<SharedState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<TargetCandidate>>> {
    let hits = match query.limit {
        Some(limit) => state.validator.search_candidates_limited(&query.q, limit).await?,
        None => state.validator.search_candidates(&query.q).await?,
    };
    Ok(Json(hits))
}
