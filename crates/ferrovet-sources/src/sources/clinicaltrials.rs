//! ClinicalTrials.gov v2 client.
//!
//! Two queries run in parallel: the unfiltered study search (first page of
//! up to 100 studies plus the total count) and a recruiting-only count.
//! Phase, status and condition statistics are computed over the sampled page.
//!
//! API docs: https://clinicaltrials.gov/data-api/api
//! Endpoint: https://clinicaltrials.gov/api/v2/studies

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use ferrovet_common::validation::{count_field, FieldSpec, JsonKind};
use ferrovet_common::{GeneSymbol, RequestClient, SourceCache, SourceError, SourceId};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{check_shape, Fetched, SourceAdapter};
use crate::models::{highest_phase, ClinicalRecord, TrialPhase, TrialSummary};

const STUDIES_URL: &str = "https://clinicaltrials.gov/api/v2/studies";
const PAGE_SIZE: u32 = 100;
const TOP_TRIALS: usize = 10;

const STUDIES_SHAPE: &[FieldSpec] = &[
    FieldSpec::required("studies", JsonKind::Array),
    FieldSpec::required("totalCount", JsonKind::Number),
    FieldSpec::optional("studies.0.protocolSection.identificationModule.nctId", JsonKind::String),
    FieldSpec::optional("studies.0.protocolSection.statusModule.overallStatus", JsonKind::String),
];

const COUNT_SHAPE: &[FieldSpec] = &[
    FieldSpec::required("totalCount", JsonKind::Number),
];

/// ClinicalTrials.gov adapter. The gene symbol is used as the free-text term.
pub struct ClinicalTrialsSource {
    client: Arc<RequestClient>,
    cache: Arc<SourceCache>,
}

impl ClinicalTrialsSource {
    pub fn new(client: Arc<RequestClient>, cache: Arc<SourceCache>) -> Self {
        Self { client, cache }
    }

    async fn studies(&self, term: &str, recruiting_only: bool) -> Result<Value, SourceError> {
        let page_size = if recruiting_only { 1 } else { PAGE_SIZE };
        let mut query = vec![
            ("query.term", term.to_string()),
            ("pageSize", page_size.to_string()),
            ("countTotal", "true".to_string()),
        ];
        if recruiting_only {
            query.push(("filter.overallStatus", "RECRUITING".to_string()));
        }
        Ok(self.client.get_json(STUDIES_URL, &query).await?)
    }
}

#[async_trait]
impl SourceAdapter for ClinicalTrialsSource {
    type Record = ClinicalRecord;

    fn source(&self) -> SourceId {
        SourceId::ClinicalTrials
    }

    fn cache(&self) -> &SourceCache {
        &self.cache
    }

    #[instrument(skip(self), fields(gene = %gene))]
    async fn fetch(&self, gene: &GeneSymbol) -> Result<Fetched<ClinicalRecord>, SourceError> {
        let (all, recruiting) = futures::try_join!(
            self.studies(gene.as_str(), false),
            self.studies(gene.as_str(), true),
        )?;

        let mut diagnostics = Vec::new();
        check_shape(SourceId::ClinicalTrials, "studies", &all, STUDIES_SHAPE, &mut diagnostics);
        check_shape(SourceId::ClinicalTrials, "studies(recruiting)", &recruiting, COUNT_SHAPE, &mut diagnostics);

        let record = summarize(&all, &recruiting);
        debug!(
            total = record.total_trials,
            active = record.active_trials,
            highest_phase = ?record.highest_phase,
            "ClinicalTrials.gov record normalized"
        );
        Ok(Fetched::with_diagnostics(record, diagnostics))
    }
}

// ── Normalization ───────────────────────────────────────────────────────────

fn total_count(payload: &Value) -> Option<u64> {
    count_field(&payload["totalCount"])
}

fn study_list(payload: &Value) -> &[Value] {
    payload["studies"].as_array().map(Vec::as_slice).unwrap_or_default()
}

/// Reads one study's protocol section. Studies without an NCT id are skipped.
pub fn parse_study(study: &Value) -> Option<TrialSummary> {
    let protocol = &study["protocolSection"];
    let nct_id = protocol["identificationModule"]["nctId"].as_str()?.to_string();
    let title = protocol["identificationModule"]["briefTitle"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    let status = protocol["statusModule"]["overallStatus"]
        .as_str()
        .unwrap_or("UNKNOWN")
        .to_string();
    let phases = protocol["designModule"]["phases"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|p| p.as_str().and_then(TrialPhase::parse))
        .collect();
    let conditions = protocol["conditionsModule"]["conditions"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|c| c.as_str().map(String::from))
        .collect();

    Some(TrialSummary { nct_id, title, status, phases, conditions })
}

/// Aggregates the sampled page plus the recruiting-only total.
pub fn summarize(all: &Value, recruiting: &Value) -> ClinicalRecord {
    let trials: Vec<TrialSummary> = study_list(all).iter().filter_map(parse_study).collect();

    let mut phase_counts: BTreeMap<TrialPhase, u32> = BTreeMap::new();
    let mut status_counts: BTreeMap<String, u32> = BTreeMap::new();
    let mut conditions: HashSet<String> = HashSet::new();

    for trial in &trials {
        for phase in &trial.phases {
            *phase_counts.entry(*phase).or_default() += 1;
        }
        *status_counts.entry(trial.status.clone()).or_default() += 1;
        conditions.extend(trial.conditions.iter().map(|c| c.to_lowercase()));
    }

    let completed_trials = status_counts.get("COMPLETED").copied().unwrap_or(0);
    let sampled_studies = trials.len() as u32;
    let total_trials = total_count(all).unwrap_or(u64::from(sampled_studies));
    let active_trials = total_count(recruiting)
        .unwrap_or_else(|| study_list(recruiting).len() as u64);

    let mut top_trials = trials;
    top_trials.sort_by(|a, b| {
        let best = |t: &TrialSummary| t.phases.iter().max().copied();
        best(b).cmp(&best(a))
    });
    top_trials.truncate(TOP_TRIALS);

    ClinicalRecord {
        total_trials,
        active_trials,
        completed_trials,
        highest_phase: highest_phase(&phase_counts),
        phase_counts,
        distinct_conditions: conditions.len() as u32,
        status_counts,
        top_trials,
        sampled_studies,
    }
}
