//! Folds the settled envelopes and their scores into a [`TargetProfile`].

use chrono::{DateTime, Utc};
use ferrovet_common::{GeneSymbol, SourceId};
use ferrovet_ranker::{calculate_scores_with, DimensionWeights, OverallScore, ScoringInputs};
use serde::Serialize;

use crate::orchestrator::SourceEnvelopes;

/// The full, self-contained result of one profile build.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetProfile {
    /// Symbol as requested, trimmed.
    pub gene_symbol: String,
    /// HGNC symbol reported by Open Targets, when it answered.
    pub approved_symbol: Option<String>,
    pub approved_name: Option<String>,
    pub ensembl_id: Option<String>,
    pub uniprot_accession: Option<String>,
    pub chromosome: Option<String>,
    pub score: OverallScore,
    pub sources: SourceEnvelopes,
    pub metadata: RunMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    pub analysis_timestamp: DateTime<Utc>,
    pub total_response_time_ms: u64,
    pub services_completed: usize,
    pub services_failed: usize,
    pub failed_sources: Vec<SourceId>,
}

impl TargetProfile {
    pub fn is_partial(&self) -> bool {
        self.metadata.services_failed > 0
    }
}

/// Scores whatever data the envelopes carry and builds the profile.
///
/// Identity falls back from Open Targets to Ensembl so a profile keeps its
/// gene id when only one of the two answered.
pub fn assemble_profile(
    gene: &GeneSymbol,
    sources: SourceEnvelopes,
    weights: &DimensionWeights,
    total_response_time_ms: u64,
) -> TargetProfile {
    let genetics = sources.open_targets.data();
    let regulatory = sources.ensembl.data();
    let structures = sources.structures.data();

    let score = calculate_scores_with(
        &ScoringInputs {
            genetics,
            chemistry: sources.chembl.data(),
            clinical: sources.clinical_trials.data(),
            structures,
            regulatory,
            literature: sources.pubmed.data(),
            preprints: sources.biorxiv.data(),
        },
        weights,
    );

    let approved_symbol = genetics.map(|g| g.approved_symbol.clone());
    let approved_name = genetics
        .and_then(|g| g.approved_name.clone())
        .or_else(|| structures.and_then(|s| s.protein_name.clone()));
    let ensembl_id = genetics
        .map(|g| g.ensembl_id.clone())
        .or_else(|| regulatory.map(|r| r.ensembl_gene_id.clone()));
    let uniprot_accession = structures.map(|s| s.uniprot_accession.clone());
    let chromosome = regulatory.map(|r| r.chromosome.clone());

    let failed_sources = sources.failed();
    let metadata = RunMetadata {
        analysis_timestamp: Utc::now(),
        total_response_time_ms,
        services_completed: sources.completed(),
        services_failed: failed_sources.len(),
        failed_sources,
    };

    TargetProfile {
        gene_symbol: gene.as_str().to_string(),
        approved_symbol,
        approved_name,
        ensembl_id,
        uniprot_accession,
        chromosome,
        score,
        sources,
        metadata,
    }
}
