//! geneticEvidence: Open Targets disease associations and tractability.

use ferrovet_sources::models::{GeneticsRecord, Modality};

use crate::normalise::stepped;
use crate::scorer::{DimensionName, DimensionScore, ScoreComponent};

const CONSTRAINT_TIERS: [(f64, f64); 4] = [(50.0, 20.0), (20.0, 14.0), (5.0, 8.0), (1.0, 4.0)];

fn modality_points(modality: Modality) -> f64 {
    match modality {
        Modality::SmallMolecule => 15.0,
        Modality::Antibody      => 10.0,
        Modality::Other         => 5.0,
        Modality::None          => 0.0,
    }
}

pub fn score(record: Option<&GeneticsRecord>) -> DimensionScore {
    let Some(r) = record else {
        return DimensionScore::no_data(DimensionName::GeneticEvidence);
    };
    let count = f64::from(r.association_count);
    let modality = r.tractability.best_modality();

    DimensionScore::from_components(
        DimensionName::GeneticEvidence,
        vec![
            ScoreComponent::linear(
                "Disease association breadth",
                count,
                50.0,
                25.0,
                format!("{} associated diseases", r.association_count),
            ),
            ScoreComponent::linear(
                "Association strength",
                r.top_association_score,
                1.0,
                25.0,
                format!("Top association score {:.2}", r.top_association_score),
            ),
            ScoreComponent::new(
                "Genetic constraint tier",
                stepped(count, &CONSTRAINT_TIERS, 0.0),
                20.0,
                "Tiered on association count",
            ),
            ScoreComponent::new(
                "Tractability modality",
                modality_points(modality),
                15.0,
                format!("Best tractable modality: {modality:?}"),
            ),
            ScoreComponent::linear(
                "High-confidence associations",
                f64::from(r.high_confidence_associations),
                15.0,
                15.0,
                format!("{} associations scoring ≥ 0.5", r.high_confidence_associations),
            ),
        ],
    )
}
