//! regulatoryGenomics: Ensembl regulatory build and constrained elements.

use ferrovet_sources::models::{RegulatoryComplexity, RegulatoryRecord};

use crate::scorer::{DimensionName, DimensionScore, ScoreComponent};

pub fn score(record: Option<&RegulatoryRecord>) -> DimensionScore {
    let Some(r) = record else {
        return DimensionScore::no_data(DimensionName::RegulatoryGenomics);
    };
    let features = r.regulatory.total;
    let complexity_points = match r.regulatory_complexity {
        RegulatoryComplexity::High => 20.0,
        RegulatoryComplexity::Moderate => 12.0,
        RegulatoryComplexity::Low if features > 0 => 5.0,
        RegulatoryComplexity::Low => 0.0,
    };

    DimensionScore::from_components(
        DimensionName::RegulatoryGenomics,
        vec![
            ScoreComponent::linear(
                "Regulatory landscape",
                f64::from(features),
                40.0,
                25.0,
                format!(
                    "{features} regulatory features within {} kb ({} promoter, {} enhancer)",
                    r.flank_bp / 1000,
                    r.regulatory.promoter,
                    r.regulatory.enhancer
                ),
            ),
            ScoreComponent::new(
                "Regulatory complexity",
                complexity_points,
                20.0,
                format!("{:?} complexity", r.regulatory_complexity),
            ),
            ScoreComponent::linear(
                "Evolutionary constraint",
                f64::from(r.constrained_element_count),
                20.0,
                20.0,
                format!("{} constrained elements", r.constrained_element_count),
            ),
            ScoreComponent::linear(
                "Transcript diversity",
                f64::from(r.transcript_count),
                15.0,
                15.0,
                format!("{} transcripts", r.transcript_count),
            ),
            ScoreComponent::linear(
                "Expression breadth",
                f64::from(r.expression_breadth.value),
                100.0,
                20.0,
                if r.expression_breadth.is_estimated() {
                    format!("~{}/100 (estimated)", r.expression_breadth.value)
                } else {
                    format!("{}/100", r.expression_breadth.value)
                },
            ),
        ],
    )
}
