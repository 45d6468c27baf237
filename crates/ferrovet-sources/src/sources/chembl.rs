//! ChEMBL API client.
//!
//! ChEMBL is a database of bioactive molecules with drug-like properties.
//! For a target it provides:
//!   - Bioactivity volume (activities carrying a pChEMBL value)
//!   - Potent compounds (pChEMBL ≥ 7, i.e. ≤ 100 nM)
//!   - Drug mechanisms and the clinical phase of the molecules behind them
//!
//! API docs: https://chembl.gitbook.io/chembl-interface-documentation/web-resources/chembl-api
//! Endpoint: https://www.ebi.ac.uk/chembl/api/data

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use ferrovet_common::validation::{count_field, float_field, FieldSpec, JsonKind};
use ferrovet_common::{CacheKey, GeneSymbol, RequestClient, SourceCache, SourceError, SourceId};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{cached, check_shape, str_field, Fetched, SourceAdapter};
use crate::models::{ChemistryRecord, DrugSummary};

const CHEMBL_API_URL: &str = "https://www.ebi.ac.uk/chembl/api/data";

/// pChEMBL threshold for a potent compound.
const POTENT_PCHEMBL: &str = "7";
/// Molecule detail lookups issued per target.
const MAX_MOLECULE_DETAILS: usize = 4;
const MECHANISM_LIMIT: u32 = 100;

const TARGET_SEARCH_SHAPE: &[FieldSpec] = &[
    FieldSpec::required("targets", JsonKind::Array),
    FieldSpec::optional("targets.0.target_chembl_id", JsonKind::String),
    FieldSpec::optional("targets.0.target_components", JsonKind::Array),
];

const MECHANISM_SHAPE: &[FieldSpec] = &[
    FieldSpec::required("mechanisms", JsonKind::Array),
    FieldSpec::optional("mechanisms.0.molecule_chembl_id", JsonKind::String),
];

const ACTIVITY_SHAPE: &[FieldSpec] = &[
    FieldSpec::required("page_meta.total_count", JsonKind::Numeric),
];

const MOLECULE_SHAPE: &[FieldSpec] = &[
    FieldSpec::required("molecule_chembl_id", JsonKind::String),
    FieldSpec::optional("max_phase", JsonKind::Numeric),
    FieldSpec::optional("molecule_type", JsonKind::String),
];

/// Resolved ChEMBL target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRef {
    pub chembl_id: String,
    pub name: String,
}

/// One row of `/mechanism.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct MechanismRow {
    pub molecule_chembl_id: String,
    pub mechanism_of_action: Option<String>,
    pub action_type: Option<String>,
    pub max_phase: Option<f64>,
}

/// The fields read from `/molecule/{id}.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeDetail {
    pub chembl_id: String,
    pub name: Option<String>,
    pub molecule_type: Option<String>,
    pub max_phase: Option<f64>,
}

/// ChEMBL adapter: symbol → target ChEMBL id → activity counts, mechanisms, drugs.
pub struct ChemblSource {
    client: Arc<RequestClient>,
    cache: Arc<SourceCache>,
}

impl ChemblSource {
    pub fn new(client: Arc<RequestClient>, cache: Arc<SourceCache>) -> Self {
        Self { client, cache }
    }

    async fn resolve_target(&self, gene: &GeneSymbol, diagnostics: &mut Vec<String>) -> Result<TargetRef, SourceError> {
        let key = CacheKey::new(
            SourceId::Chembl,
            format!("target-id/{}", gene.as_str().to_ascii_uppercase()),
        );
        let mut lookup_diagnostics = Vec::new();
        let target = cached(&self.cache, key, async {
            let url = format!("{CHEMBL_API_URL}/target/search.json");
            let payload = self
                .client
                .get_json(&url, &[("q", gene.to_string()), ("limit", "25".to_string())])
                .await?;
            check_shape(SourceId::Chembl, "target/search", &payload, TARGET_SEARCH_SHAPE, &mut lookup_diagnostics);
            pick_target(&payload, gene.as_str())
                .ok_or_else(|| SourceError::not_found("ChEMBL target", gene.as_str()))
        })
        .await?;
        diagnostics.extend(lookup_diagnostics);
        Ok(target)
    }

    async fn activity_count(&self, target_id: &str, potent_only: bool) -> Result<Value, SourceError> {
        let url = format!("{CHEMBL_API_URL}/activity.json");
        let mut query = vec![
            ("target_chembl_id", target_id.to_string()),
            ("pchembl_value__isnull", "false".to_string()),
            ("limit", "1".to_string()),
        ];
        if potent_only {
            query.push(("pchembl_value__gte", POTENT_PCHEMBL.to_string()));
        }
        Ok(self.client.get_json(&url, &query).await?)
    }

    async fn mechanisms(&self, target_id: &str) -> Result<Value, SourceError> {
        let url = format!("{CHEMBL_API_URL}/mechanism.json");
        let query = [
            ("target_chembl_id", target_id.to_string()),
            ("limit", MECHANISM_LIMIT.to_string()),
        ];
        Ok(self.client.get_json(&url, &query).await?)
    }

    async fn molecule(&self, chembl_id: &str) -> Result<Value, SourceError> {
        let url = format!("{CHEMBL_API_URL}/molecule/{chembl_id}.json");
        Ok(self.client.get_json(&url, &[]).await?)
    }
}

#[async_trait]
impl SourceAdapter for ChemblSource {
    type Record = ChemistryRecord;

    fn source(&self) -> SourceId {
        SourceId::Chembl
    }

    fn cache(&self) -> &SourceCache {
        &self.cache
    }

    #[instrument(skip(self), fields(gene = %gene))]
    async fn fetch(&self, gene: &GeneSymbol) -> Result<Fetched<ChemistryRecord>, SourceError> {
        let mut diagnostics = Vec::new();
        let target = self.resolve_target(gene, &mut diagnostics).await?;
        debug!(target = %target.chembl_id, "Resolved ChEMBL target");

        let (mechanisms, activities, potent) = futures::try_join!(
            self.mechanisms(&target.chembl_id),
            self.activity_count(&target.chembl_id, false),
            self.activity_count(&target.chembl_id, true),
        )?;
        check_shape(SourceId::Chembl, "mechanism", &mechanisms, MECHANISM_SHAPE, &mut diagnostics);
        check_shape(SourceId::Chembl, "activity", &activities, ACTIVITY_SHAPE, &mut diagnostics);
        check_shape(SourceId::Chembl, "activity(potent)", &potent, ACTIVITY_SHAPE, &mut diagnostics);

        let mechanisms = parse_mechanisms(&mechanisms);
        let picked = pick_drug_molecules(&mechanisms, MAX_MOLECULE_DETAILS);

        let details = join_all(picked.iter().map(|id| self.molecule(id))).await;
        let mut molecules = Vec::with_capacity(details.len());
        for (id, detail) in picked.iter().zip(details) {
            match detail {
                Ok(payload) => {
                    check_shape(SourceId::Chembl, "molecule", &payload, MOLECULE_SHAPE, &mut diagnostics);
                    molecules.push(parse_molecule(&payload));
                }
                Err(e) => {
                    warn!(molecule = %id, error = %e, "ChEMBL molecule lookup failed");
                    diagnostics.push(format!("molecule {id}: {e}"));
                }
            }
        }

        let record = summarize(
            &target,
            parse_total_count(&activities),
            parse_total_count(&potent),
            &mechanisms,
            &molecules,
        );
        debug!(
            activities = record.activity_count,
            potent = record.potent_activity_count,
            mechanisms = record.mechanism_count,
            max_phase = record.max_phase,
            "ChEMBL record normalized"
        );
        Ok(Fetched::with_diagnostics(record, diagnostics))
    }
}

// ── Normalization ───────────────────────────────────────────────────────────

fn has_gene_symbol(target: &Value, symbol: &str) -> bool {
    target["target_components"]
        .as_array()
        .into_iter()
        .flatten()
        .flat_map(|component| component["target_component_synonyms"].as_array().into_iter().flatten())
        .any(|synonym| {
            synonym["syn_type"].as_str() == Some("GENE_SYMBOL")
                && synonym["component_synonym"]
                    .as_str()
                    .is_some_and(|s| s.eq_ignore_ascii_case(symbol))
        })
}

/// Picks the best target hit: a human single protein carrying the symbol as
/// a gene-symbol synonym, else the first human single protein, else the
/// first human target.
pub fn pick_target(payload: &Value, symbol: &str) -> Option<TargetRef> {
    let targets = payload["targets"].as_array()?;
    let human: Vec<&Value> = targets
        .iter()
        .filter(|t| t["organism"].as_str() == Some("Homo sapiens"))
        .collect();
    let single_protein = |t: &&&Value| t["target_type"].as_str() == Some("SINGLE PROTEIN");

    let best = human
        .iter()
        .filter(single_protein)
        .find(|t| has_gene_symbol(t, symbol))
        .or_else(|| human.iter().find(single_protein))
        .or_else(|| human.first())?;

    Some(TargetRef {
        chembl_id: str_field(best, "target_chembl_id")?,
        name: str_field(best, "pref_name").unwrap_or_default(),
    })
}

pub fn parse_total_count(payload: &Value) -> u64 {
    count_field(&payload["page_meta"]["total_count"]).unwrap_or(0)
}

pub fn parse_mechanisms(payload: &Value) -> Vec<MechanismRow> {
    payload["mechanisms"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|m| {
            Some(MechanismRow {
                molecule_chembl_id: str_field(m, "molecule_chembl_id")?,
                mechanism_of_action: str_field(m, "mechanism_of_action"),
                action_type: str_field(m, "action_type"),
                max_phase: float_field(&m["max_phase"]),
            })
        })
        .collect()
}

/// Distinct mechanism molecules, most advanced first, capped at `limit`.
pub fn pick_drug_molecules(mechanisms: &[MechanismRow], limit: usize) -> Vec<String> {
    let mut rows: Vec<&MechanismRow> = mechanisms.iter().collect();
    rows.sort_by(|a, b| {
        b.max_phase
            .unwrap_or(0.0)
            .total_cmp(&a.max_phase.unwrap_or(0.0))
    });
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|m| seen.insert(m.molecule_chembl_id.as_str()))
        .take(limit)
        .map(|m| m.molecule_chembl_id.clone())
        .collect()
}

/// `max_phase` arrives as a number or as a string such as `"4.0"`.
pub fn parse_molecule(payload: &Value) -> MoleculeDetail {
    MoleculeDetail {
        chembl_id: str_field(payload, "molecule_chembl_id").unwrap_or_default(),
        name: str_field(payload, "pref_name"),
        molecule_type: str_field(payload, "molecule_type"),
        max_phase: float_field(&payload["max_phase"]),
    }
}

pub fn summarize(
    target: &TargetRef,
    activity_count: u64,
    potent_activity_count: u64,
    mechanisms: &[MechanismRow],
    molecules: &[MoleculeDetail],
) -> ChemistryRecord {
    let detail_for = |id: &str| molecules.iter().find(|m| m.chembl_id == id);

    let mut seen = HashSet::new();
    let mut approved = HashSet::new();
    let mut top_drugs = Vec::new();
    let mut max_phase: f64 = 0.0;

    for row in mechanisms {
        let detail = detail_for(&row.molecule_chembl_id);
        let phase = detail.and_then(|d| d.max_phase).or(row.max_phase);
        if let Some(p) = phase {
            max_phase = max_phase.max(p);
            if p >= 4.0 {
                approved.insert(row.molecule_chembl_id.as_str());
            }
        }
        if seen.insert(row.molecule_chembl_id.as_str()) {
            if let Some(detail) = detail {
                top_drugs.push(DrugSummary {
                    chembl_id: row.molecule_chembl_id.clone(),
                    name: detail.name.clone(),
                    max_phase: phase,
                    molecule_type: detail.molecule_type.clone(),
                    mechanism_of_action: row.mechanism_of_action.clone(),
                    action_type: row.action_type.clone(),
                });
            }
        }
    }
    top_drugs.sort_by(|a, b| b.max_phase.unwrap_or(0.0).total_cmp(&a.max_phase.unwrap_or(0.0)));

    let count_type = |needle: &str| {
        molecules
            .iter()
            .filter(|m| m.molecule_type.as_deref().is_some_and(|t| t.eq_ignore_ascii_case(needle)))
            .count() as u32
    };

    ChemistryRecord {
        target_chembl_id: target.chembl_id.clone(),
        target_name: target.name.clone(),
        activity_count,
        potent_activity_count,
        mechanism_count: seen.len() as u32,
        approved_drug_count: approved.len() as u32,
        max_phase,
        small_molecule_drugs: count_type("Small molecule"),
        antibody_drugs: count_type("Antibody"),
        top_drugs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Modality;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn target_search_fixture() -> Value {
        json!({
            "page_meta": {"total_count": 3},
            "targets": [
                {"target_chembl_id": "CHEMBL2111431", "pref_name": "Epidermal growth factor receptor and ErbB2",
                 "organism": "Homo sapiens", "target_type": "PROTEIN FAMILY", "target_components": []},
                {"target_chembl_id": "CHEMBL3608", "pref_name": "Epidermal growth factor receptor",
                 "organism": "Mus musculus", "target_type": "SINGLE PROTEIN", "target_components": []},
                {"target_chembl_id": "CHEMBL203", "pref_name": "Epidermal growth factor receptor erbB1",
                 "organism": "Homo sapiens", "target_type": "SINGLE PROTEIN",
                 "target_components": [{"accession": "P00533", "target_component_synonyms": [
                     {"component_synonym": "EGFR", "syn_type": "GENE_SYMBOL"},
                     {"component_synonym": "ERBB1", "syn_type": "GENE_SYMBOL_OTHER"}
                 ]}]}
            ]
        })
    }

    #[test]
    fn test_pick_target_prefers_human_single_protein_with_symbol() {
        let target = pick_target(&target_search_fixture(), "egfr").unwrap();
        assert_eq!(target.chembl_id, "CHEMBL203");
        assert_eq!(target.name, "Epidermal growth factor receptor erbB1");
    }

    #[test]
    fn test_pick_target_falls_back_to_first_human() {
        let payload = json!({"targets": [
            {"target_chembl_id": "CHEMBL2111431", "pref_name": "EGFR/ErbB2",
             "organism": "Homo sapiens", "target_type": "PROTEIN FAMILY"}
        ]});
        assert_eq!(pick_target(&payload, "EGFR").unwrap().chembl_id, "CHEMBL2111431");
        assert!(pick_target(&json!({"targets": []}), "EGFR").is_none());
    }

    #[test]
    fn test_total_count_accepts_strings() {
        assert_eq!(parse_total_count(&json!({"page_meta": {"total_count": 15873}})), 15873);
        assert_eq!(parse_total_count(&json!({"page_meta": {"total_count": "42"}})), 42);
        assert_eq!(parse_total_count(&json!({})), 0);
    }

    #[test]
    fn test_summarize_mechanisms_and_molecules() {
        let mechanisms = parse_mechanisms(&json!({"mechanisms": [
            {"molecule_chembl_id": "CHEMBL553", "mechanism_of_action": "Epidermal growth factor receptor erbB1 inhibitor",
             "action_type": "INHIBITOR", "max_phase": 4},
            {"molecule_chembl_id": "CHEMBL1201577", "mechanism_of_action": "Epidermal growth factor receptor erbB1 inhibitor",
             "action_type": "INHIBITOR", "max_phase": 4},
            {"molecule_chembl_id": "CHEMBL553", "mechanism_of_action": "duplicate row",
             "action_type": "INHIBITOR", "max_phase": 4},
            {"molecule_chembl_id": "CHEMBL4297479", "mechanism_of_action": "inhibitor",
             "action_type": "INHIBITOR", "max_phase": null}
        ]}));
        assert_eq!(pick_drug_molecules(&mechanisms, 4).len(), 3);

        let molecules = vec![
            parse_molecule(&json!({"molecule_chembl_id": "CHEMBL553", "pref_name": "ERLOTINIB",
                                   "molecule_type": "Small molecule", "max_phase": "4.0"})),
            parse_molecule(&json!({"molecule_chembl_id": "CHEMBL1201577", "pref_name": "CETUXIMAB",
                                   "molecule_type": "Antibody", "max_phase": 4})),
        ];
        let target = TargetRef { chembl_id: "CHEMBL203".into(), name: "EGFR".into() };
        let record = summarize(&target, 15873, 7421, &mechanisms, &molecules);

        assert_eq!(record.mechanism_count, 3);
        assert_eq!(record.approved_drug_count, 2);
        assert_eq!(record.max_phase, 4.0);
        assert_eq!(record.small_molecule_drugs, 1);
        assert_eq!(record.antibody_drugs, 1);
        assert_eq!(record.top_drugs.len(), 2);
        assert_eq!(record.confirmed_modality(), Modality::SmallMolecule);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["activityCount"], 15873);
        assert_eq!(json["potentActivityCount"], 7421);
    }

    #[test]
    fn test_summarize_without_mechanisms() {
        let target = TargetRef { chembl_id: "CHEMBL1".into(), name: "x".into() };
        let record = summarize(&target, 12, 0, &[], &[]);
        assert_eq!(record.activity_count, 12);
        assert_eq!(record.potent_activity_count, 0);
        assert_eq!(record.max_phase, 0.0);
        assert_eq!(record.mechanism_count, 0);
        assert_eq!(record.confirmed_modality(), Modality::None);
    }
}
