//! Router tests over in-memory adapters; no network access.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use ferrovet_common::{SourceCache, SourceError, SourceId};
use ferrovet_pipeline::{CandidateSearch, Orchestrator, SourceSet, TargetValidator};
use ferrovet_sources::models::TargetCandidate;
use ferrovet_test_utils::{RecordSet, StaticAdapter};
use ferrovet_web::{router::build_router, state::AppState};
use pretty_assertions::assert_eq;
use serde_json::Value;
use tower::util::ServiceExt; // for `oneshot`

struct FixedSearch;

#[async_trait]
impl CandidateSearch for FixedSearch {
    async fn find_candidates(&self, query: &str, limit: usize) -> Result<Vec<TargetCandidate>, SourceError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let hits = [("ENSG00000146648", "epidermal growth factor receptor", "EGFR"),
                    ("ENSG00000141736", "erb-b2 receptor tyrosine kinase 2", "ERBB2")];
        Ok(hits
            .iter()
            .take(limit)
            .map(|(id, name, symbol)| TargetCandidate {
                id: id.to_string(),
                name: name.to_string(),
                symbol: symbol.to_string(),
            })
            .collect())
    }
}

/// Router whose seven adapters share the validator's cache.
fn setup_app() -> Router {
    let records = RecordSet::strong();
    let cache = Arc::new(SourceCache::default());
    let set = SourceSet {
        open_targets: Arc::new(StaticAdapter::new(SourceId::OpenTargets, records.genetics).with_cache(cache.clone())),
        chembl: Arc::new(StaticAdapter::new(SourceId::Chembl, records.chemistry).with_cache(cache.clone())),
        pubmed: Arc::new(StaticAdapter::new(SourceId::PubMed, records.literature).with_cache(cache.clone())),
        clinical_trials: Arc::new(StaticAdapter::new(SourceId::ClinicalTrials, records.clinical).with_cache(cache.clone())),
        biorxiv: Arc::new(StaticAdapter::new(SourceId::BioRxiv, records.preprints).with_cache(cache.clone())),
        structures: Arc::new(StaticAdapter::new(SourceId::Structures, records.structures).with_cache(cache.clone())),
        ensembl: Arc::new(StaticAdapter::new(SourceId::Ensembl, records.regulatory).with_cache(cache.clone())),
    };
    let validator = TargetValidator::new(Orchestrator::new(set), Arc::new(FixedSearch), cache);
    build_router(AppState::new(validator))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

#[tokio::test]
async fn test_health() {
    let response = setup_app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
    assert_eq!(body["cacheEntries"], 0);
}

#[tokio::test]
async fn test_profile_then_cache_is_populated() {
    let app = setup_app();

    let response = app.clone().oneshot(get("/api/targets/EGFR/profile")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile = extract_json(response.into_body()).await;

    assert_eq!(profile["geneSymbol"], "EGFR");
    assert_eq!(profile["metadata"]["servicesCompleted"], 7);
    assert_eq!(profile["metadata"]["servicesFailed"], 0);
    assert!(profile["score"]["value"].as_u64().unwrap() >= 70);
    assert_eq!(profile["sources"]["chembl"]["success"], true);

    let health = extract_json(app.oneshot(get("/health")).await.unwrap().into_body()).await;
    assert_eq!(health["cacheEntries"], 7);
}

#[tokio::test]
async fn test_invalid_symbol_is_400() {
    let response = setup_app().oneshot(get("/api/targets/-EGFR/profile")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"].as_str().unwrap().contains("invalid gene symbol"));
}

#[tokio::test]
async fn test_search() {
    let app = setup_app();

    let body = extract_json(app.clone().oneshot(get("/api/search?q=erb")).await.unwrap().into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["symbol"], "EGFR");

    let body = extract_json(app.clone().oneshot(get("/api/search?q=erb&limit=1")).await.unwrap().into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let body = extract_json(app.oneshot(get("/api/search")).await.unwrap().into_body()).await;
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn test_weights() {
    let response = setup_app().oneshot(get("/api/weights")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["weights"]["chemicalTractability"], 0.22);
    assert_eq!(body["dimensions"].as_array().unwrap().len(), 7);
    assert_eq!(body["dimensions"][0]["dimension"], "geneticEvidence");
    assert_eq!(body["dimensions"][0]["provider"], "Open Targets");

    let sum: f64 = body["weights"].as_object().unwrap().values().filter_map(Value::as_f64).sum();
    assert!((sum - 1.0).abs() <= 0.01);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let response = setup_app().oneshot(get("/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
