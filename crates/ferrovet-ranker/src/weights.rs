//! Dimension weight table for the overall validation score.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::scorer::DimensionName;

/// Weights applied to the seven dimension scores. Sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionWeights {
    /// ChEMBL compounds, mechanisms and drugs
    pub chemical_tractability: f64,
    /// Open Targets disease associations
    pub genetic_evidence: f64,
    /// ClinicalTrials.gov trial history
    pub clinical_history: f64,
    /// PDB / AlphaFold structures
    pub structural_readiness: f64,
    /// Ensembl regulatory landscape
    pub regulatory_genomics: f64,
    /// PubMed publication record
    pub literature_depth: f64,
    /// bioRxiv preprint activity
    pub innovation_signal: f64,
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            chemical_tractability: 0.22,
            genetic_evidence:      0.18,
            clinical_history:      0.18,
            structural_readiness:  0.13,
            regulatory_genomics:   0.12,
            literature_depth:      0.09,
            innovation_signal:     0.08,
        }
    }
}

impl DimensionWeights {
    pub fn get(&self, dimension: DimensionName) -> f64 {
        match dimension {
            DimensionName::GeneticEvidence      => self.genetic_evidence,
            DimensionName::ChemicalTractability => self.chemical_tractability,
            DimensionName::ClinicalHistory      => self.clinical_history,
            DimensionName::StructuralReadiness  => self.structural_readiness,
            DimensionName::RegulatoryGenomics   => self.regulatory_genomics,
            DimensionName::LiteratureDepth      => self.literature_depth,
            DimensionName::InnovationSignal     => self.innovation_signal,
        }
    }

    fn get_mut(&mut self, dimension: DimensionName) -> &mut f64 {
        match dimension {
            DimensionName::GeneticEvidence      => &mut self.genetic_evidence,
            DimensionName::ChemicalTractability => &mut self.chemical_tractability,
            DimensionName::ClinicalHistory      => &mut self.clinical_history,
            DimensionName::StructuralReadiness  => &mut self.structural_readiness,
            DimensionName::RegulatoryGenomics   => &mut self.regulatory_genomics,
            DimensionName::LiteratureDepth      => &mut self.literature_depth,
            DimensionName::InnovationSignal     => &mut self.innovation_signal,
        }
    }

    pub fn sum(&self) -> f64 {
        DimensionName::ALL.iter().map(|d| self.get(*d)).sum()
    }

    /// Weights sum to 1.0 within ±0.01.
    pub fn validate(&self) -> bool {
        (self.sum() - 1.0).abs() <= 0.01
    }

    /// Renormalise weights so they sum to 1.0
    pub fn normalise(&mut self) {
        let sum = self.sum();
        if sum > 0.0 {
            for dimension in DimensionName::ALL {
                *self.get_mut(dimension) /= sum;
            }
        }
    }

    pub fn as_map(&self) -> BTreeMap<DimensionName, f64> {
        DimensionName::ALL.iter().map(|d| (*d, self.get(*d))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let w = DimensionWeights::default();
        assert!(w.validate(), "Default weights must sum to 1.0");
    }

    #[test]
    fn test_normalise_restores_sum() {
        let mut w = DimensionWeights::default();
        w.chemical_tractability += 0.10; // deliberately break sum
        assert!(!w.validate());
        w.normalise();
        assert!(w.validate());
        assert!((w.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_map_keys_are_camel_case() {
        let json = serde_json::to_value(DimensionWeights::default().as_map()).unwrap();
        assert_eq!(json["chemicalTractability"], 0.22);
        assert_eq!(json["innovationSignal"], 0.08);
        assert_eq!(json.as_object().unwrap().len(), 7);
    }
}
