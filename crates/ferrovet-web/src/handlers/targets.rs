//! Target profile and weight table endpoints.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Json,
};
use ferrovet_pipeline::TargetProfile;
use ferrovet_ranker::DimensionName;
use serde::Serialize;
use tracing::info;

use crate::error::ApiResult;
use crate::state::SharedState;

/// GET /api/targets/{gene}/profile - Full validation profile for one gene
pub async fn api_target_profile(
    State(state): State<SharedState>,
    Path(gene): Path<String>,
) -> ApiResult<Json<TargetProfile>> {
    info!(gene = %gene, "Profile requested");
    let profile = state.validator.build_target_profile(&gene).await?;
    Ok(Json(profile))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightRow {
    pub dimension: DimensionName,
    pub label: &'static str,
    pub provider: &'static str,
    pub weight: f64,
}

#[derive(Debug, Serialize)]
pub struct WeightTable {
    pub weights: BTreeMap<DimensionName, f64>,
    pub dimensions: Vec<WeightRow>,
}

/// GET /api/weights - Combiner weights, one row per dimension
pub async fn api_weights(State(state): State<SharedState>) -> Json<WeightTable> {
    let weights = state.validator.weights();
    let dimensions = DimensionName::ALL
        .iter()
        .map(|d| WeightRow {
            dimension: *d,
            label: d.label(),
            provider: d.provider(),
            weight: weights.get(*d),
        })
        .collect();
    Json(WeightTable { weights: weights.as_map(), dimensions })
}
