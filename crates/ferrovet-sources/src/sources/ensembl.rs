//! Ensembl REST client.
//!
//! Regulatory genomics for a gene: symbol lookup gives coordinates and the
//! transcript set, then one region-overlap query (gene ± flank) returns the
//! regulatory-build and constrained-element features around it.
//!
//! API docs: https://rest.ensembl.org
//!   /lookup/symbol/homo_sapiens/{symbol}?expand=1
//!   /overlap/region/human/{chr}:{start}-{end}?feature=regulatory;feature=constrained

use std::sync::Arc;

use async_trait::async_trait;
use ferrovet_common::validation::{count_field, FieldSpec, JsonKind};
use ferrovet_common::{CacheKey, GeneSymbol, HttpError, RequestClient, SourceCache, SourceError, SourceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{cached, check_shape, str_field, Fetched, SourceAdapter};
use crate::models::{estimate_expression_breadth, RegulatoryCounts, RegulatoryRecord, Sourced};

const ENSEMBL_REST_URL: &str = "https://rest.ensembl.org";

const LOOKUP_SHAPE: &[FieldSpec] = &[
    FieldSpec::required("id", JsonKind::String),
    FieldSpec::required("seq_region_name", JsonKind::String),
    FieldSpec::required("start", JsonKind::Number),
    FieldSpec::required("end", JsonKind::Number),
    FieldSpec::optional("Transcript", JsonKind::Array),
];

const OVERLAP_SHAPE: &[FieldSpec] = &[
    FieldSpec::optional("0.feature_type", JsonKind::String),
];

/// Gene coordinates from the symbol lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneLocus {
    pub ensembl_gene_id: String,
    pub display_name: Option<String>,
    pub biotype: Option<String>,
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    pub strand: i8,
    pub transcript_count: u32,
}

impl GeneLocus {
    /// `chr:start-end` widened by `flank` on both sides; start never drops below 1.
    pub fn flanked_region(&self, flank: u64) -> String {
        let start = self.start.saturating_sub(flank).max(1);
        let end = self.end.saturating_add(flank);
        format!("{}:{start}-{end}", self.chromosome)
    }
}

/// Ensembl adapter.
pub struct EnsemblSource {
    client: Arc<RequestClient>,
    cache: Arc<SourceCache>,
    flank_bp: u64,
}

impl EnsemblSource {
    pub fn new(client: Arc<RequestClient>, cache: Arc<SourceCache>, flank_bp: u64) -> Self {
        Self { client, cache, flank_bp }
    }

    async fn lookup(&self, gene: &GeneSymbol, diagnostics: &mut Vec<String>) -> Result<GeneLocus, SourceError> {
        let key = CacheKey::new(
            SourceId::Ensembl,
            format!("gene/{}", gene.as_str().to_ascii_uppercase()),
        );
        let mut lookup_diagnostics = Vec::new();
        let locus = cached(&self.cache, key, async {
            let url = format!("{ENSEMBL_REST_URL}/lookup/symbol/homo_sapiens/{gene}");
            let payload = match self.client.get_json(&url, &[("expand", "1".to_string())]).await {
                // Ensembl answers an unknown symbol with 400 "No valid lookup found"
                Err(HttpError::Client { status: 400 | 404, .. }) => {
                    return Err(SourceError::not_found("Ensembl gene", gene.as_str()));
                }
                other => other?,
            };
            check_shape(SourceId::Ensembl, "lookup", &payload, LOOKUP_SHAPE, &mut lookup_diagnostics);
            parse_lookup(&payload)
        })
        .await?;
        diagnostics.extend(lookup_diagnostics);
        Ok(locus)
    }
}

#[async_trait]
impl SourceAdapter for EnsemblSource {
    type Record = RegulatoryRecord;

    fn source(&self) -> SourceId {
        SourceId::Ensembl
    }

    fn cache(&self) -> &SourceCache {
        &self.cache
    }

    #[instrument(skip(self), fields(gene = %gene))]
    async fn fetch(&self, gene: &GeneSymbol) -> Result<Fetched<RegulatoryRecord>, SourceError> {
        let mut diagnostics = Vec::new();
        let locus = self.lookup(gene, &mut diagnostics).await?;
        let region = locus.flanked_region(self.flank_bp);
        debug!(gene_id = %locus.ensembl_gene_id, region = %region, "Resolved Ensembl locus");

        let url = format!("{ENSEMBL_REST_URL}/overlap/region/human/{region}");
        let query = [
            ("feature", "regulatory".to_string()),
            ("feature", "constrained".to_string()),
        ];
        let features = self.client.get_json(&url, &query).await?;
        check_shape(SourceId::Ensembl, "overlap", &features, OVERLAP_SHAPE, &mut diagnostics);
        let features = features
            .as_array()
            .ok_or_else(|| SourceError::Payload("overlap response is not an array".into()))?;

        let record = summarize(&locus, features, self.flank_bp);
        debug!(
            regulatory = record.regulatory.total,
            constrained = record.constrained_element_count,
            complexity = ?record.regulatory_complexity,
            "Ensembl record normalized"
        );
        Ok(Fetched::with_diagnostics(record, diagnostics))
    }
}

// ── Normalization ───────────────────────────────────────────────────────────

pub fn parse_lookup(payload: &Value) -> Result<GeneLocus, SourceError> {
    let field = |key: &str| {
        count_field(&payload[key]).ok_or_else(|| SourceError::Payload(format!("lookup without {key}")))
    };
    Ok(GeneLocus {
        ensembl_gene_id: str_field(payload, "id")
            .ok_or_else(|| SourceError::Payload("lookup without id".into()))?,
        display_name: str_field(payload, "display_name"),
        biotype: str_field(payload, "biotype"),
        chromosome: str_field(payload, "seq_region_name")
            .ok_or_else(|| SourceError::Payload("lookup without seq_region_name".into()))?,
        start: field("start")?,
        end: field("end")?,
        strand: payload["strand"].as_i64().map(|s| s.signum() as i8).unwrap_or(0),
        transcript_count: payload["Transcript"].as_array().map_or(0, |t| t.len() as u32),
    })
}

/// Regulatory feature category, from the regulatory-build description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureClass {
    Promoter,
    Enhancer,
    Ctcf,
    OpenChromatin,
    TfBinding,
    Other,
}

pub fn classify_feature(description: &str) -> FeatureClass {
    let d = description.to_ascii_lowercase();
    if d.contains("promoter flank") {
        FeatureClass::Other
    } else if d.contains("promoter") {
        FeatureClass::Promoter
    } else if d.contains("enhancer") {
        FeatureClass::Enhancer
    } else if d.contains("ctcf") {
        FeatureClass::Ctcf
    } else if d.contains("open chromatin") {
        FeatureClass::OpenChromatin
    } else if d.contains("tf binding") {
        FeatureClass::TfBinding
    } else {
        FeatureClass::Other
    }
}

pub fn count_features(features: &[Value]) -> (RegulatoryCounts, u32) {
    let mut counts = RegulatoryCounts::default();
    let mut constrained = 0;
    for feature in features {
        match feature["feature_type"].as_str() {
            Some("constrained") => constrained += 1,
            Some("regulatory") => {
                counts.total += 1;
                let description = feature["description"].as_str().unwrap_or_default();
                match classify_feature(description) {
                    FeatureClass::Promoter      => counts.promoter += 1,
                    FeatureClass::Enhancer      => counts.enhancer += 1,
                    FeatureClass::Ctcf          => counts.ctcf += 1,
                    FeatureClass::OpenChromatin => counts.open_chromatin += 1,
                    FeatureClass::TfBinding     => counts.tf_binding += 1,
                    FeatureClass::Other         => {}
                }
            }
            _ => {}
        }
    }
    (counts, constrained)
}

pub fn summarize(locus: &GeneLocus, features: &[Value], flank_bp: u64) -> RegulatoryRecord {
    let (regulatory, constrained_element_count) = count_features(features);
    RegulatoryRecord {
        ensembl_gene_id: locus.ensembl_gene_id.clone(),
        display_name: locus.display_name.clone(),
        biotype: locus.biotype.clone(),
        chromosome: locus.chromosome.clone(),
        start: locus.start,
        end: locus.end,
        strand: locus.strand,
        gene_length: locus.end.saturating_sub(locus.start) + 1,
        transcript_count: locus.transcript_count,
        regulatory,
        constrained_element_count,
        regulatory_complexity: regulatory.complexity(),
        expression_breadth: Sourced::estimated(estimate_expression_breadth(
            locus.transcript_count,
            regulatory.total,
        )),
        flank_bp,
    }
}
