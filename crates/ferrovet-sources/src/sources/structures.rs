//! Structural readiness: UniProt → RCSB PDB + AlphaFold DB.
//!
//! The gene symbol is resolved to the reviewed human UniProt accession, then
//! four lookups run in parallel:
//!   - RCSB search: number of PDB entries mapped to the accession
//!   - RCSB search: entries that also carry a non-polymer (ligand) entity
//!   - RCSB search + entry data: best experimental resolution
//!   - AlphaFold DB: predicted model and its mean pLDDT
//!
//! Only the entry count is mandatory. When the ligand or resolution lookup
//! fails the value is estimated from the entry count and tagged as such.
//!
//! Endpoints:
//!   https://rest.uniprot.org/uniprotkb/search
//!   https://search.rcsb.org/rcsbsearch/v2/query
//!   https://data.rcsb.org/rest/v1/core/entry/{id}
//!   https://alphafold.ebi.ac.uk/api/prediction/{accession}

use std::sync::Arc;

use async_trait::async_trait;
use ferrovet_common::validation::{count_field, float_field, FieldSpec, JsonKind};
use ferrovet_common::{CacheKey, GeneSymbol, HttpError, RequestClient, SourceCache, SourceError, SourceId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use super::{cached, check_shape, str_field, Fetched, SourceAdapter};
use crate::models::{
    estimate_best_resolution, estimate_ligand_bound, AlphaFoldModel, Sourced, StructureRecord,
};

const UNIPROT_SEARCH_URL: &str = "https://rest.uniprot.org/uniprotkb/search";
const RCSB_SEARCH_URL: &str = "https://search.rcsb.org/rcsbsearch/v2/query";
const RCSB_ENTRY_URL: &str = "https://data.rcsb.org/rest/v1/core/entry";
const ALPHAFOLD_URL: &str = "https://alphafold.ebi.ac.uk/api/prediction";

const ACCESSION_ATTRIBUTE: &str =
    "rcsb_polymer_entity_container_identifiers.reference_sequence_identifiers.database_accession";
const RESOLUTION_ATTRIBUTE: &str = "rcsb_entry_info.resolution_combined";
const LIGAND_ATTRIBUTE: &str = "rcsb_entry_info.nonpolymer_entity_count";
const TOP_PDB_IDS: usize = 10;

const UNIPROT_SHAPE: &[FieldSpec] = &[
    FieldSpec::required("results", JsonKind::Array),
    FieldSpec::optional("results.0.primaryAccession", JsonKind::String),
];

const RCSB_SEARCH_SHAPE: &[FieldSpec] = &[
    FieldSpec::required("total_count", JsonKind::Number),
    FieldSpec::optional("result_set", JsonKind::Array),
];

const ALPHAFOLD_SHAPE: &[FieldSpec] = &[
    FieldSpec::required("0.entryId", JsonKind::String),
    FieldSpec::optional("0.globalMetricValue", JsonKind::Number),
];

/// Reviewed human UniProt entry for a gene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniprotEntry {
    pub accession: String,
    pub protein_name: Option<String>,
    pub sequence_length: Option<u32>,
}

/// Structures adapter.
pub struct StructureSource {
    client: Arc<RequestClient>,
    cache: Arc<SourceCache>,
}

impl StructureSource {
    pub fn new(client: Arc<RequestClient>, cache: Arc<SourceCache>) -> Self {
        Self { client, cache }
    }

    async fn resolve_accession(&self, gene: &GeneSymbol, diagnostics: &mut Vec<String>) -> Result<UniprotEntry, SourceError> {
        let key = CacheKey::new(
            SourceId::Structures,
            format!("uniprot/{}", gene.as_str().to_ascii_uppercase()),
        );
        let mut lookup_diagnostics = Vec::new();
        let entry = cached(&self.cache, key, async {
            let query = [
                ("query", format!("gene_exact:{gene} AND organism_id:9606 AND reviewed:true")),
                ("fields", "accession,protein_name,length".to_string()),
                ("format", "json".to_string()),
                ("size", "1".to_string()),
            ];
            let payload = self.client.get_json(UNIPROT_SEARCH_URL, &query).await?;
            check_shape(SourceId::Structures, "uniprot", &payload, UNIPROT_SHAPE, &mut lookup_diagnostics);
            parse_uniprot(&payload).ok_or_else(|| SourceError::not_found("UniProt entry", gene.as_str()))
        })
        .await?;
        diagnostics.extend(lookup_diagnostics);
        Ok(entry)
    }

    async fn search(&self, body: Value) -> Result<Value, SourceError> {
        Ok(self.client.post_json(RCSB_SEARCH_URL, &body).await?)
    }

    async fn best_resolution(&self, accession: &str) -> Result<Option<f64>, SourceError> {
        let hits = self.search(best_resolution_query(accession)).await?;
        let Some(id) = parse_search_ids(&hits).into_iter().next() else {
            return Ok(None);
        };
        let entry = self
            .client
            .get_json(&format!("{RCSB_ENTRY_URL}/{id}"), &[])
            .await?;
        Ok(parse_entry_resolution(&entry))
    }

    /// A 404 from AlphaFold DB means no prediction exists.
    async fn alphafold(&self, accession: &str) -> Result<Value, SourceError> {
        match self
            .client
            .get_json(&format!("{ALPHAFOLD_URL}/{accession}"), &[])
            .await
        {
            Err(HttpError::Client { status: 404, .. }) => Ok(Value::Null),
            other => Ok(other?),
        }
    }
}

#[async_trait]
impl SourceAdapter for StructureSource {
    type Record = StructureRecord;

    fn source(&self) -> SourceId {
        SourceId::Structures
    }

    fn cache(&self) -> &SourceCache {
        &self.cache
    }

    #[instrument(skip(self), fields(gene = %gene))]
    async fn fetch(&self, gene: &GeneSymbol) -> Result<Fetched<StructureRecord>, SourceError> {
        let mut diagnostics = Vec::new();
        let uniprot = self.resolve_accession(gene, &mut diagnostics).await?;
        let accession = uniprot.accession.as_str();
        debug!(accession, "Resolved UniProt accession");

        let (entries, ligand, resolution, alphafold) = futures::join!(
            self.search(entry_count_query(accession)),
            self.search(ligand_count_query(accession)),
            self.best_resolution(accession),
            self.alphafold(accession),
        );

        let entries = entries?;
        if !entries.is_null() {
            check_shape(SourceId::Structures, "rcsb", &entries, RCSB_SEARCH_SHAPE, &mut diagnostics);
        }

        let ligand_bound = match ligand {
            Ok(payload) => Some(parse_search_total(&payload)),
            Err(e) => {
                warn!(error = %e, "RCSB ligand count failed, estimating");
                diagnostics.push(format!("rcsb ligand count: {e}"));
                None
            }
        };
        let resolution = resolution.unwrap_or_else(|e| {
            warn!(error = %e, "RCSB resolution lookup failed, estimating");
            diagnostics.push(format!("rcsb resolution: {e}"));
            None
        });
        let alphafold = match alphafold {
            Ok(Value::Null) => None,
            Ok(payload) => {
                check_shape(SourceId::Structures, "alphafold", &payload, ALPHAFOLD_SHAPE, &mut diagnostics);
                parse_alphafold(&payload)
            }
            Err(e) => {
                warn!(error = %e, "AlphaFold lookup failed");
                diagnostics.push(format!("alphafold: {e}"));
                None
            }
        };

        let record = assemble(
            &uniprot,
            parse_search_total(&entries),
            parse_search_ids(&entries),
            ligand_bound,
            resolution,
            alphafold,
        );
        debug!(
            structures = record.pdb_structure_count,
            alphafold = record.alphafold.is_some(),
            "Structure record normalized"
        );
        Ok(Fetched::with_diagnostics(record, diagnostics))
    }
}

// ── RCSB queries ────────────────────────────────────────────────────────────

fn accession_terminal(accession: &str) -> Value {
    json!({
        "type": "terminal",
        "service": "text",
        "parameters": {
            "attribute": ACCESSION_ATTRIBUTE,
            "operator": "exact_match",
            "value": accession
        }
    })
}

pub fn entry_count_query(accession: &str) -> Value {
    json!({
        "query": accession_terminal(accession),
        "return_type": "entry",
        "request_options": { "paginate": { "start": 0, "rows": TOP_PDB_IDS } }
    })
}

pub fn ligand_count_query(accession: &str) -> Value {
    json!({
        "query": {
            "type": "group",
            "logical_operator": "and",
            "nodes": [
                accession_terminal(accession),
                {
                    "type": "terminal",
                    "service": "text",
                    "parameters": { "attribute": LIGAND_ATTRIBUTE, "operator": "greater", "value": 0 }
                }
            ]
        },
        "return_type": "entry",
        "request_options": { "return_counts": true }
    })
}

pub fn best_resolution_query(accession: &str) -> Value {
    json!({
        "query": {
            "type": "group",
            "logical_operator": "and",
            "nodes": [
                accession_terminal(accession),
                {
                    "type": "terminal",
                    "service": "text",
                    "parameters": { "attribute": RESOLUTION_ATTRIBUTE, "operator": "exists" }
                }
            ]
        },
        "return_type": "entry",
        "request_options": {
            "paginate": { "start": 0, "rows": 1 },
            "sort": [{ "sort_by": RESOLUTION_ATTRIBUTE, "direction": "asc" }]
        }
    })
}

// ── Normalization ───────────────────────────────────────────────────────────

pub fn parse_uniprot(payload: &Value) -> Option<UniprotEntry> {
    let entry = payload["results"].as_array()?.first()?;
    let description = &entry["proteinDescription"];
    let protein_name = description["recommendedName"]["fullName"]["value"]
        .as_str()
        .or_else(|| description["submissionNames"][0]["fullName"]["value"].as_str())
        .map(String::from);
    Some(UniprotEntry {
        accession: str_field(entry, "primaryAccession")?,
        protein_name,
        sequence_length: count_field(&entry["sequence"]["length"]).map(|n| n as u32),
    })
}

/// RCSB answers a query with no hits with HTTP 204 and no body.
pub fn parse_search_total(payload: &Value) -> u32 {
    count_field(&payload["total_count"])
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

pub fn parse_search_ids(payload: &Value) -> Vec<String> {
    payload["result_set"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|hit| str_field(hit, "identifier"))
        .collect()
}

pub fn parse_entry_resolution(entry: &Value) -> Option<f64> {
    entry["rcsb_entry_info"]["resolution_combined"]
        .as_array()?
        .iter()
        .filter_map(float_field)
        .min_by(f64::total_cmp)
}

pub fn parse_alphafold(payload: &Value) -> Option<AlphaFoldModel> {
    let model = payload.as_array()?.first()?;
    Some(AlphaFoldModel {
        entry_id: str_field(model, "entryId")?,
        avg_plddt: float_field(&model["globalMetricValue"]),
        fraction_very_high: float_field(&model["fractionPlddtVeryHigh"]),
        model_version: count_field(&model["latestVersion"]).map(|n| n as u32),
    })
}

/// Builds the record, substituting tagged estimates for the lookups that failed.
pub fn assemble(
    uniprot: &UniprotEntry,
    pdb_structure_count: u32,
    mut top_pdb_ids: Vec<String>,
    ligand_bound: Option<u32>,
    resolution: Option<f64>,
    alphafold: Option<AlphaFoldModel>,
) -> StructureRecord {
    top_pdb_ids.truncate(TOP_PDB_IDS);

    let best_resolution = match resolution {
        Some(r) => Some(Sourced::measured(r)),
        None => estimate_best_resolution(pdb_structure_count).map(Sourced::estimated),
    };
    let ligand_bound_count = match ligand_bound {
        Some(n) => Sourced::measured(n),
        None => Sourced::estimated(estimate_ligand_bound(pdb_structure_count)),
    };

    StructureRecord {
        uniprot_accession: uniprot.accession.clone(),
        protein_name: uniprot.protein_name.clone(),
        sequence_length: uniprot.sequence_length,
        pdb_structure_count,
        top_pdb_ids,
        best_resolution,
        ligand_bound_count,
        alphafold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValueBasis;
    use pretty_assertions::assert_eq;

    fn egfr() -> UniprotEntry {
        UniprotEntry {
            accession: "P00533".into(),
            protein_name: Some("Epidermal growth factor receptor".into()),
            sequence_length: Some(1210),
        }
    }

    #[test]
    fn test_parse_uniprot() {
        let payload = json!({"results": [{
            "primaryAccession": "P00533",
            "proteinDescription": {"recommendedName": {"fullName": {"value": "Epidermal growth factor receptor"}}},
            "sequence": {"length": 1210}
        }]});
        assert_eq!(parse_uniprot(&payload), Some(egfr()));
        assert_eq!(parse_uniprot(&json!({"results": []})), None);
    }

    #[test]
    fn test_search_payloads() {
        let payload = json!({
            "query_id": "x", "result_type": "entry", "total_count": 312,
            "result_set": [{"identifier": "1M17", "score": 1.0}, {"identifier": "4HJO", "score": 1.0}]
        });
        assert_eq!(parse_search_total(&payload), 312);
        assert_eq!(parse_search_ids(&payload), vec!["1M17", "4HJO"]);
        // HTTP 204 decodes to null
        assert_eq!(parse_search_total(&Value::Null), 0);
        assert!(parse_search_ids(&Value::Null).is_empty());
    }

    #[test]
    fn test_entry_resolution_takes_minimum() {
        let entry = json!({"rcsb_entry_info": {"resolution_combined": [2.6, 1.07]}});
        assert_eq!(parse_entry_resolution(&entry), Some(1.07));
        assert_eq!(parse_entry_resolution(&json!({"rcsb_entry_info": {}})), None);
    }

    #[test]
    fn test_parse_alphafold() {
        let payload = json!([{
            "entryId": "AF-P00533-F1", "globalMetricValue": 75.94,
            "fractionPlddtVeryHigh": 0.48, "latestVersion": 4
        }]);
        let model = parse_alphafold(&payload).unwrap();
        assert_eq!(model.entry_id, "AF-P00533-F1");
        assert_eq!(model.avg_plddt, Some(75.94));
        assert_eq!(model.model_version, Some(4));
        assert!(parse_alphafold(&json!([])).is_none());
    }

    #[test]
    fn test_assemble_measured_values() {
        let record = assemble(&egfr(), 312, vec!["1M17".into()], Some(180), Some(1.07), None);
        assert_eq!(record.best_resolution, Some(Sourced::measured(1.07)));
        assert_eq!(record.ligand_bound_count, Sourced::measured(180));
    }

    #[test]
    fn test_assemble_estimates_when_lookups_failed() {
        let record = assemble(&egfr(), 8, vec![], None, None, None);
        assert_eq!(record.best_resolution, Some(Sourced::estimated(2.2)));
        assert_eq!(record.ligand_bound_count.value, 2);
        assert_eq!(record.ligand_bound_count.basis, ValueBasis::Estimated);

        let none = assemble(&egfr(), 0, vec![], None, None, None);
        assert_eq!(none.best_resolution, None);
        assert_eq!(none.ligand_bound_count, Sourced::estimated(0));
    }

    #[test]
    fn test_queries_target_accession() {
        let q = ligand_count_query("P00533");
        assert_eq!(q["query"]["nodes"][0]["parameters"]["value"], "P00533");
        assert_eq!(q["query"]["nodes"][1]["parameters"]["attribute"], LIGAND_ATTRIBUTE);
        let q = best_resolution_query("P00533");
        assert_eq!(q["request_options"]["sort"][0]["direction"], "asc");
    }
}
