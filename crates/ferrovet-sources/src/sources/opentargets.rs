//! Open Targets Platform client.
//!
//! Genetic evidence for a target: disease associations and the tractability
//! assessment, both from the Platform GraphQL API. The same search query
//! also backs target autocomplete.
//!
//! API docs: https://platform-docs.opentargets.org/data-access/graphql-api
//! Endpoint: https://api.platform.opentargets.org/api/v4/graphql

use std::sync::Arc;

use async_trait::async_trait;
use ferrovet_common::validation::{count_field, float_field, FieldSpec, JsonKind};
use ferrovet_common::{CacheKey, GeneSymbol, RequestClient, SourceCache, SourceError, SourceId};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::{cached, check_shape, str_field, Fetched, SourceAdapter};
use crate::models::{DiseaseAssociation, GeneticsRecord, TargetCandidate, Tractability};

pub const OPEN_TARGETS_GRAPHQL_URL: &str = "https://api.platform.opentargets.org/api/v4/graphql";

/// Hard cap on autocomplete hits.
pub const MAX_SEARCH_RESULTS: usize = 10;

/// Association score at or above which an association counts as high confidence.
const HIGH_CONFIDENCE_SCORE: f64 = 0.5;
const ASSOCIATION_PAGE_SIZE: u32 = 50;
const TOP_DISEASES: usize = 10;

const SEARCH_QUERY: &str = r#"
query TargetSearch($queryString: String!, $size: Int!) {
  search(queryString: $queryString, entityNames: ["target"], page: {index: 0, size: $size}) {
    hits {
      id
      entity
      object {
        ... on Target { id approvedSymbol approvedName }
      }
    }
  }
}"#;

const DETAIL_QUERY: &str = r#"
query TargetDetail($ensemblId: String!, $size: Int!) {
  target(ensemblId: $ensemblId) {
    id
    approvedSymbol
    approvedName
    biotype
    tractability { label modality value }
    associatedDiseases(page: {index: 0, size: $size}) {
      count
      rows { score disease { id name } }
    }
  }
}"#;

const SEARCH_SHAPE: &[FieldSpec] = &[
    FieldSpec::required("data.search.hits", JsonKind::Array),
];

const DETAIL_SHAPE: &[FieldSpec] = &[
    FieldSpec::required("data.target.id", JsonKind::String),
    FieldSpec::required("data.target.approvedSymbol", JsonKind::String),
    FieldSpec::optional("data.target.tractability", JsonKind::Array),
    FieldSpec::required("data.target.associatedDiseases.count", JsonKind::Number),
    FieldSpec::required("data.target.associatedDiseases.rows", JsonKind::Array),
];

/// Open Targets adapter: symbol → Ensembl gene id → associations + tractability.
pub struct OpenTargetsSource {
    client: Arc<RequestClient>,
    cache: Arc<SourceCache>,
}

impl OpenTargetsSource {
    pub fn new(client: Arc<RequestClient>, cache: Arc<SourceCache>) -> Self {
        Self { client, cache }
    }

    async fn graphql(&self, query: &str, variables: Value) -> Result<Value, SourceError> {
        let body = json!({ "query": query, "variables": variables });
        let payload = self.client.post_json(OPEN_TARGETS_GRAPHQL_URL, &body).await?;
        graphql_errors(&payload)?;
        Ok(payload)
    }

    async fn search(&self, query: &str, size: usize, diagnostics: &mut Vec<String>) -> Result<Vec<TargetCandidate>, SourceError> {
        let payload = self
            .graphql(SEARCH_QUERY, json!({ "queryString": query, "size": size }))
            .await?;
        check_shape(SourceId::OpenTargets, "search", &payload, SEARCH_SHAPE, diagnostics);
        Ok(parse_search_hits(&payload))
    }

    /// Target autocomplete. Returns at most [`MAX_SEARCH_RESULTS`] hits;
    /// a blank query returns nothing without contacting the provider.
    #[instrument(skip(self))]
    pub async fn search_candidates(&self, query: &str, limit: usize) -> Result<Vec<TargetCandidate>, SourceError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let limit = limit.clamp(1, MAX_SEARCH_RESULTS);
        let key = CacheKey::new(
            SourceId::OpenTargets,
            format!("search/{}/{limit}", query.to_lowercase()),
        );

        cached(&self.cache, key, async {
            let mut diagnostics = Vec::new();
            let mut hits = self.search(query, limit, &mut diagnostics).await?;
            hits.truncate(limit);
            debug!(query, hits = hits.len(), "Open Targets search complete");
            Ok::<_, SourceError>(hits)
        })
        .await
    }

    async fn resolve_ensembl_id(&self, gene: &GeneSymbol, diagnostics: &mut Vec<String>) -> Result<String, SourceError> {
        let key = CacheKey::new(
            SourceId::OpenTargets,
            format!("target-id/{}", gene.as_str().to_ascii_uppercase()),
        );
        let mut lookup_diagnostics = Vec::new();
        let id = cached(&self.cache, key, async {
            let hits = self
                .search(gene.as_str(), MAX_SEARCH_RESULTS, &mut lookup_diagnostics)
                .await?;
            pick_target(&hits, gene.as_str())
                .map(|hit| hit.id.clone())
                .ok_or_else(|| SourceError::not_found("Open Targets target", gene.as_str()))
        })
        .await?;
        diagnostics.extend(lookup_diagnostics);
        Ok(id)
    }
}

#[async_trait]
impl SourceAdapter for OpenTargetsSource {
    type Record = GeneticsRecord;

    fn source(&self) -> SourceId {
        SourceId::OpenTargets
    }

    fn cache(&self) -> &SourceCache {
        &self.cache
    }

    #[instrument(skip(self), fields(gene = %gene))]
    async fn fetch(&self, gene: &GeneSymbol) -> Result<Fetched<GeneticsRecord>, SourceError> {
        let mut diagnostics = Vec::new();
        let ensembl_id = self.resolve_ensembl_id(gene, &mut diagnostics).await?;
        debug!(ensembl_id = %ensembl_id, "Resolved Open Targets target");

        let payload = self
            .graphql(
                DETAIL_QUERY,
                json!({ "ensemblId": ensembl_id, "size": ASSOCIATION_PAGE_SIZE }),
            )
            .await?;
        check_shape(SourceId::OpenTargets, "target", &payload, DETAIL_SHAPE, &mut diagnostics);

        let record = parse_target(&payload)?
            .ok_or_else(|| SourceError::not_found("Open Targets target", &ensembl_id))?;
        debug!(
            associations = record.association_count,
            high_confidence = record.high_confidence_associations,
            "Open Targets record normalized"
        );
        Ok(Fetched::with_diagnostics(record, diagnostics))
    }
}

// ── Normalization ───────────────────────────────────────────────────────────

/// GraphQL reports query errors with HTTP 200 and an `errors` array.
fn graphql_errors(payload: &Value) -> Result<(), SourceError> {
    match payload.get("errors").and_then(Value::as_array) {
        Some(errors) if !errors.is_empty() => {
            let message = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("; ");
            Err(SourceError::Payload(format!("GraphQL error: {message}")))
        }
        _ => Ok(()),
    }
}

/// Extracts target hits from a search response, skipping non-target entities.
pub fn parse_search_hits(payload: &Value) -> Vec<TargetCandidate> {
    let Some(hits) = payload.pointer("/data/search/hits").and_then(Value::as_array) else {
        return Vec::new();
    };
    hits.iter()
        .filter(|hit| hit.get("entity").and_then(Value::as_str).map_or(true, |e| e == "target"))
        .filter_map(|hit| {
            let object = hit.get("object").unwrap_or(&Value::Null);
            let id = str_field(object, "id").or_else(|| str_field(hit, "id"))?;
            let symbol = str_field(object, "approvedSymbol")?;
            let name = str_field(object, "approvedName").unwrap_or_else(|| symbol.clone());
            Some(TargetCandidate { id, name, symbol })
        })
        .collect()
}

/// Prefers an exact (case-insensitive) symbol match, else the top hit.
pub fn pick_target<'a>(hits: &'a [TargetCandidate], symbol: &str) -> Option<&'a TargetCandidate> {
    hits.iter()
        .find(|hit| hit.symbol.eq_ignore_ascii_case(symbol))
        .or_else(|| hits.first())
}

fn parse_tractability(entries: &[Value]) -> Tractability {
    let mut tractability = Tractability::default();
    for entry in entries {
        if !entry.get("value").and_then(Value::as_bool).unwrap_or(false) {
            continue;
        }
        match entry.get("modality").and_then(Value::as_str) {
            Some("SM") => tractability.small_molecule = true,
            Some("AB") => tractability.antibody = true,
            Some("PR") => tractability.protac = true,
            Some("OC") => tractability.other_clinical = true,
            _ => {}
        }
    }
    tractability
}

/// Normalizes a target detail response. `Ok(None)` when the target is null.
pub fn parse_target(payload: &Value) -> Result<Option<GeneticsRecord>, SourceError> {
    let target = match payload.pointer("/data/target") {
        Some(Value::Object(_)) => &payload["data"]["target"],
        Some(Value::Null) | None => return Ok(None),
        Some(_) => return Err(SourceError::Payload("data.target is not an object".into())),
    };

    let ensembl_id = str_field(target, "id")
        .ok_or_else(|| SourceError::Payload("target without id".into()))?;
    let associations = &target["associatedDiseases"];

    let mut rows: Vec<DiseaseAssociation> = associations["rows"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .filter_map(|row| {
            Some(DiseaseAssociation {
                disease_id: str_field(&row["disease"], "id")?,
                disease_name: str_field(&row["disease"], "name").unwrap_or_default(),
                score: float_field(&row["score"])?,
            })
        })
        .collect();
    rows.sort_by(|a, b| b.score.total_cmp(&a.score));

    let association_count = count_field(&associations["count"])
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(rows.len() as u32);
    let top_association_score = rows.first().map(|r| r.score).unwrap_or(0.0);
    let high_confidence_associations = rows
        .iter()
        .filter(|r| r.score >= HIGH_CONFIDENCE_SCORE)
        .count() as u32;
    rows.truncate(TOP_DISEASES);

    let tractability = target["tractability"]
        .as_array()
        .map(|entries| parse_tractability(entries))
        .unwrap_or_default();

    Ok(Some(GeneticsRecord {
        approved_symbol: str_field(target, "approvedSymbol").unwrap_or_default(),
        approved_name: str_field(target, "approvedName"),
        biotype: str_field(target, "biotype"),
        ensembl_id,
        association_count,
        top_association_score,
        high_confidence_associations,
        top_diseases: rows,
        tractability,
    }))
}
