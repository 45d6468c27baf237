//! Normalized records, one shape per provider.
//!
//! Each record keeps only what the scorers and the downstream consumers
//! need: counts, diversity metrics, phase maxima, top-N lists and derived
//! classifications.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── Provenance ──────────────────────────────────────────────────────────────

/// Whether a value came straight from the provider or from a heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueBasis {
    Measured,
    Estimated,
}

/// A value tagged with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub value: T,
    pub basis: ValueBasis,
}

impl<T> Sourced<T> {
    pub fn measured(value: T) -> Self {
        Self { value, basis: ValueBasis::Measured }
    }

    pub fn estimated(value: T) -> Self {
        Self { value, basis: ValueBasis::Estimated }
    }

    pub fn is_estimated(&self) -> bool {
        self.basis == ValueBasis::Estimated
    }
}

// ── Open Targets ────────────────────────────────────────────────────────────

/// Drug modality with confirmed tractability, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Modality {
    SmallMolecule,
    Antibody,
    Other,
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tractability {
    pub small_molecule: bool,
    pub antibody: bool,
    pub protac: bool,
    pub other_clinical: bool,
}

impl Tractability {
    pub fn best_modality(&self) -> Modality {
        if self.small_molecule {
            Modality::SmallMolecule
        } else if self.antibody {
            Modality::Antibody
        } else if self.protac || self.other_clinical {
            Modality::Other
        } else {
            Modality::None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseAssociation {
    pub disease_id: String,
    pub disease_name: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneticsRecord {
    pub ensembl_id: String,
    pub approved_symbol: String,
    pub approved_name: Option<String>,
    pub biotype: Option<String>,
    pub association_count: u32,
    pub top_association_score: f64,
    /// Associations scoring ≥ 0.5 among the returned page.
    pub high_confidence_associations: u32,
    pub top_diseases: Vec<DiseaseAssociation>,
    pub tractability: Tractability,
}

/// Autocomplete hit served by the Open Targets search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetCandidate {
    pub id: String,
    pub name: String,
    pub symbol: String,
}

// ── ChEMBL ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugSummary {
    pub chembl_id: String,
    pub name: Option<String>,
    pub max_phase: Option<f64>,
    pub molecule_type: Option<String>,
    pub mechanism_of_action: Option<String>,
    pub action_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChemistryRecord {
    pub target_chembl_id: String,
    pub target_name: String,
    /// Activity records carrying a pChEMBL value, not distinct molecules.
    pub activity_count: u64,
    /// Activity records with pChEMBL ≥ 7 (≤ 100 nM).
    pub potent_activity_count: u64,
    pub mechanism_count: u32,
    /// Distinct mechanism molecules at phase 4.
    pub approved_drug_count: u32,
    pub max_phase: f64,
    pub small_molecule_drugs: u32,
    pub antibody_drugs: u32,
    pub top_drugs: Vec<DrugSummary>,
}

impl ChemistryRecord {
    /// Modality confirmed by a drug with a known mechanism on this target.
    pub fn confirmed_modality(&self) -> Modality {
        if self.small_molecule_drugs > 0 {
            Modality::SmallMolecule
        } else if self.antibody_drugs > 0 {
            Modality::Antibody
        } else {
            Modality::None
        }
    }
}

// ── PubMed ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiteratureRecord {
    pub query_term: String,
    pub total_publications: u64,
    /// Last five calendar years.
    pub recent_publications: u64,
    pub last_year_publications: u64,
    pub review_count: u64,
    pub clinical_publications: u64,
    /// `recent_publications / total_publications`, 0 when there are none.
    pub recent_share: f64,
}

// ── ClinicalTrials.gov ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrialPhase {
    #[serde(rename = "EARLY_PHASE1")]
    EarlyPhase1,
    #[serde(rename = "PHASE1")]
    Phase1,
    #[serde(rename = "PHASE2")]
    Phase2,
    #[serde(rename = "PHASE3")]
    Phase3,
    #[serde(rename = "PHASE4")]
    Phase4,
}

impl TrialPhase {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "EARLY_PHASE1" | "EARLY_PHASE_1" | "PHASE0" => Some(TrialPhase::EarlyPhase1),
            "PHASE1" | "PHASE_1" => Some(TrialPhase::Phase1),
            "PHASE2" | "PHASE_2" => Some(TrialPhase::Phase2),
            "PHASE3" | "PHASE_3" => Some(TrialPhase::Phase3),
            "PHASE4" | "PHASE_4" => Some(TrialPhase::Phase4),
            _ => None,
        }
    }

    /// Multiplier applied to the phase-progression component.
    pub fn progression_factor(&self) -> f64 {
        match self {
            TrialPhase::Phase4 => 1.00,
            TrialPhase::Phase3 => 0.85,
            TrialPhase::Phase2 => 0.60,
            TrialPhase::Phase1 | TrialPhase::EarlyPhase1 => 0.35,
        }
    }
}

/// Highest phase with at least one trial.
pub fn highest_phase(phase_counts: &BTreeMap<TrialPhase, u32>) -> Option<TrialPhase> {
    phase_counts
        .iter()
        .filter(|(_, n)| **n > 0)
        .map(|(phase, _)| *phase)
        .max()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialSummary {
    pub nct_id: String,
    pub title: String,
    pub status: String,
    pub phases: Vec<TrialPhase>,
    pub conditions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalRecord {
    pub total_trials: u64,
    /// Trials currently recruiting.
    pub active_trials: u64,
    /// Counted within the sampled page of studies.
    pub completed_trials: u32,
    pub phase_counts: BTreeMap<TrialPhase, u32>,
    pub highest_phase: Option<TrialPhase>,
    pub distinct_conditions: u32,
    pub status_counts: BTreeMap<String, u32>,
    pub top_trials: Vec<TrialSummary>,
    pub sampled_studies: u32,
}

// ── bioRxiv ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VelocityTrend {
    Increasing,
    Stable,
    Decreasing,
}

impl VelocityTrend {
    /// Compares the last-30-day rate with the prior 30–60-day rate.
    pub fn classify(recent_rate: f64, prior_rate: f64) -> Self {
        if recent_rate > prior_rate * 1.5 {
            VelocityTrend::Increasing
        } else if prior_rate > 0.0 && recent_rate < prior_rate * 0.5 {
            VelocityTrend::Decreasing
        } else {
            VelocityTrend::Stable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreprintSummary {
    pub doi: String,
    pub title: String,
    pub date: NaiveDate,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreprintRecord {
    pub total_preprints: u32,
    pub last_30_days: u32,
    pub days_30_to_60: u32,
    /// Preprints per day over the last 30 days.
    pub recent_rate: f64,
    pub prior_rate: f64,
    pub velocity: VelocityTrend,
    pub distinct_categories: u32,
    pub distinct_institutions: u32,
    pub top_categories: Vec<CategoryCount>,
    pub recent_preprints: Vec<PreprintSummary>,
    pub preprints_scanned: u32,
    pub window_days: u32,
}

// ── UniProt / RCSB / AlphaFold ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlphaFoldModel {
    pub entry_id: String,
    pub avg_plddt: Option<f64>,
    pub fraction_very_high: Option<f64>,
    pub model_version: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureRecord {
    pub uniprot_accession: String,
    pub protein_name: Option<String>,
    pub sequence_length: Option<u32>,
    pub pdb_structure_count: u32,
    pub top_pdb_ids: Vec<String>,
    /// Å; estimated from the structure count when no entry resolution was read.
    pub best_resolution: Option<Sourced<f64>>,
    pub ligand_bound_count: Sourced<u32>,
    pub alphafold: Option<AlphaFoldModel>,
}

impl StructureRecord {
    pub fn avg_plddt(&self) -> Option<f64> {
        self.alphafold.as_ref().and_then(|m| m.avg_plddt)
    }
}

/// Best-resolution stand-in derived from how many structures exist.
pub fn estimate_best_resolution(structure_count: u32) -> Option<f64> {
    match structure_count {
        n if n > 10 => Some(1.8),
        n if n > 5 => Some(2.2),
        n if n > 0 => Some(2.8),
        _ => None,
    }
}

/// Ligand-bound count stand-in: 30% of all structures.
pub fn estimate_ligand_bound(structure_count: u32) -> u32 {
    (f64::from(structure_count) * 0.3).round() as u32
}

// ── Ensembl ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegulatoryComplexity {
    Low,
    Moderate,
    High,
}

/// Regulatory feature tallies around a gene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulatoryCounts {
    pub total: u32,
    pub promoter: u32,
    pub enhancer: u32,
    pub ctcf: u32,
    pub open_chromatin: u32,
    pub tf_binding: u32,
}

impl RegulatoryCounts {
    fn categories_present(&self) -> usize {
        [self.promoter, self.enhancer, self.ctcf, self.open_chromatin]
            .iter()
            .filter(|n| **n > 0)
            .count()
    }

    pub fn complexity(&self) -> RegulatoryComplexity {
        let categories = self.categories_present();
        if self.total > 30 || (self.enhancer > 5 && self.promoter >= 1) || categories >= 3 {
            RegulatoryComplexity::High
        } else if self.total > 10 || self.enhancer > 2 || categories >= 2 {
            RegulatoryComplexity::Moderate
        } else {
            RegulatoryComplexity::Low
        }
    }
}

/// Expression-breadth stand-in (0–100) stepped on transcript and regulatory-feature counts.
pub fn estimate_expression_breadth(transcript_count: u32, regulatory_features: u32) -> u8 {
    match (transcript_count, regulatory_features) {
        (t, r) if t >= 10 && r >= 20 => 90,
        (t, r) if t >= 6 && r >= 10 => 70,
        (t, r) if t >= 3 && r >= 5 => 50,
        (t, r) if t >= 2 || r >= 2 => 30,
        _ => 15,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulatoryRecord {
    pub ensembl_gene_id: String,
    pub display_name: Option<String>,
    pub biotype: Option<String>,
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    pub strand: i8,
    pub gene_length: u64,
    pub transcript_count: u32,
    pub regulatory: RegulatoryCounts,
    pub constrained_element_count: u32,
    pub regulatory_complexity: RegulatoryComplexity,
    pub expression_breadth: Sourced<u8>,
    pub flank_bp: u64,
}
