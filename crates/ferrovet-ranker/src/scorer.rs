//! Score types and the combiner.
//!
//! Each dimension scorer turns one normalized record into 4–5 named
//! components whose maxima sum to at most 100. The dimension score is the
//! rounded component sum; the overall score is the weighted sum of the
//! seven dimension scores.

use std::collections::BTreeMap;

use ferrovet_sources::models::{
    ChemistryRecord, ClinicalRecord, GeneticsRecord, LiteratureRecord, PreprintRecord,
    RegulatoryRecord, StructureRecord,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dimensions;
use crate::normalise::{linear_scale, round_score};
use crate::weights::DimensionWeights;

/// The seven scoring dimensions, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DimensionName {
    GeneticEvidence,
    ChemicalTractability,
    ClinicalHistory,
    StructuralReadiness,
    RegulatoryGenomics,
    LiteratureDepth,
    InnovationSignal,
}

impl DimensionName {
    pub const ALL: [DimensionName; 7] = [
        DimensionName::GeneticEvidence,
        DimensionName::ChemicalTractability,
        DimensionName::ClinicalHistory,
        DimensionName::StructuralReadiness,
        DimensionName::RegulatoryGenomics,
        DimensionName::LiteratureDepth,
        DimensionName::InnovationSignal,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DimensionName::GeneticEvidence      => "Genetic Evidence",
            DimensionName::ChemicalTractability => "Chemical Tractability",
            DimensionName::ClinicalHistory      => "Clinical History",
            DimensionName::StructuralReadiness  => "Structural Readiness",
            DimensionName::RegulatoryGenomics   => "Regulatory Genomics",
            DimensionName::LiteratureDepth      => "Literature Depth",
            DimensionName::InnovationSignal     => "Innovation Signal",
        }
    }

    /// Provider whose record feeds this dimension.
    pub fn provider(&self) -> &'static str {
        match self {
            DimensionName::GeneticEvidence      => "Open Targets",
            DimensionName::ChemicalTractability => "ChEMBL",
            DimensionName::ClinicalHistory      => "ClinicalTrials.gov",
            DimensionName::StructuralReadiness  => "UniProt/RCSB/AlphaFold",
            DimensionName::RegulatoryGenomics   => "Ensembl",
            DimensionName::LiteratureDepth      => "PubMed",
            DimensionName::InnovationSignal     => "bioRxiv",
        }
    }
}

/// One named contribution to a dimension score. `0 ≤ value ≤ max_value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComponent {
    pub name: String,
    pub value: f64,
    pub max_value: f64,
    pub description: String,
}

impl ScoreComponent {
    /// Builds a component, clamping `value` into `[0, max_value]`.
    pub fn new(name: &str, value: f64, max_value: f64, description: impl Into<String>) -> Self {
        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, max_value) };
        Self {
            name: name.to_string(),
            // two decimals is plenty for display and keeps sums stable
            value: (value * 100.0).round() / 100.0,
            max_value,
            description: description.into(),
        }
    }

    /// Component scored with [`linear_scale`].
    pub fn linear(name: &str, value: f64, cap: f64, max_value: f64, description: impl Into<String>) -> Self {
        Self::new(name, linear_scale(value, cap, max_value), max_value, description)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionScore {
    pub dimension: DimensionName,
    pub label: String,
    pub score: u8,
    pub components: Vec<ScoreComponent>,
    pub description: String,
}

impl DimensionScore {
    /// Score for a dimension whose provider returned nothing.
    pub fn no_data(dimension: DimensionName) -> Self {
        Self {
            dimension,
            label: dimension.label().to_string(),
            score: 0,
            components: Vec::new(),
            description: format!("No data available from {}", dimension.provider()),
        }
    }

    /// Sums the components into a rounded, clamped score.
    pub fn from_components(dimension: DimensionName, components: Vec<ScoreComponent>) -> Self {
        let score = round_score(components.iter().map(|c| c.value).sum());
        Self {
            dimension,
            label: dimension.label().to_string(),
            score,
            description: describe(dimension, score),
            components,
        }
    }

    pub fn max_total(&self) -> f64 {
        self.components.iter().map(|c| c.max_value).sum()
    }
}

fn describe(dimension: DimensionName, score: u8) -> String {
    let band = match score {
        75..=100 => "Strong",
        50..=74  => "Moderate",
        25..=49  => "Limited",
        _        => "Weak",
    };
    format!("{band} {} ({score}/100)", dimension.label().to_lowercase())
}

/// Normalized records available to the scorers. `None` for any provider
/// that failed or returned nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringInputs<'a> {
    pub genetics: Option<&'a GeneticsRecord>,
    pub chemistry: Option<&'a ChemistryRecord>,
    pub clinical: Option<&'a ClinicalRecord>,
    pub structures: Option<&'a StructureRecord>,
    pub regulatory: Option<&'a RegulatoryRecord>,
    pub literature: Option<&'a LiteratureRecord>,
    pub preprints: Option<&'a PreprintRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallScore {
    pub value: u8,
    pub dimensions: BTreeMap<DimensionName, DimensionScore>,
    pub weights: BTreeMap<DimensionName, f64>,
}

/// Scores every dimension and combines them with the default weights.
pub fn calculate_scores(inputs: &ScoringInputs<'_>) -> OverallScore {
    calculate_scores_with(inputs, &DimensionWeights::default())
}

/// `overall = round(Σ score[d] × weight[d])`, clamped to 0–100.
pub fn calculate_scores_with(inputs: &ScoringInputs<'_>, weights: &DimensionWeights) -> OverallScore {
    let scored = [
        dimensions::genetic::score(inputs.genetics),
        dimensions::chemical::score(inputs.chemistry),
        dimensions::clinical::score(inputs.clinical),
        dimensions::structural::score(inputs.structures),
        dimensions::regulatory::score(inputs.regulatory),
        dimensions::literature::score(inputs.literature),
        dimensions::innovation::score(inputs.preprints),
    ];

    let weighted: f64 = scored
        .iter()
        .map(|d| f64::from(d.score) * weights.get(d.dimension))
        .sum();
    let value = round_score(weighted);

    debug!(overall = value, "Validation score combined");

    OverallScore {
        value,
        dimensions: scored.into_iter().map(|d| (d.dimension, d)).collect(),
        weights: weights.as_map(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_clamps() {
        let c = ScoreComponent::new("x", 31.0, 30.0, "");
        assert_eq!(c.value, 30.0);
        let c = ScoreComponent::new("x", -1.0, 30.0, "");
        assert_eq!(c.value, 0.0);
        let c = ScoreComponent::new("x", f64::NAN, 30.0, "");
        assert_eq!(c.value, 0.0);
    }

    #[test]
    fn test_no_data_dimension() {
        let d = DimensionScore::no_data(DimensionName::ClinicalHistory);
        assert_eq!(d.score, 0);
        assert!(d.components.is_empty());
        assert!(d.description.starts_with("No data available"));
    }

    #[test]
    fn test_all_none_scores_zero() {
        let overall = calculate_scores(&ScoringInputs::default());
        assert_eq!(overall.value, 0);
        assert_eq!(overall.dimensions.len(), 7);
        assert!(overall.dimensions.values().all(|d| d.score == 0 && d.components.is_empty()));
        assert!((overall.weights.values().sum::<f64>() - 1.0).abs() <= 0.01);
    }

    #[test]
    fn test_dimension_serializes_camel_case() {
        let overall = calculate_scores(&ScoringInputs::default());
        let json = serde_json::to_value(&overall).unwrap();
        assert!(json["dimensions"]["structuralReadiness"].is_object());
        assert_eq!(json["dimensions"]["geneticEvidence"]["score"], 0);
        assert_eq!(json["weights"]["clinicalHistory"], 0.18);
    }
}
