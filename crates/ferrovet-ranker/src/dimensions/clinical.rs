//! clinicalHistory: ClinicalTrials.gov trial volume and phase progression.

use ferrovet_sources::models::{highest_phase, ClinicalRecord};

use crate::scorer::{DimensionName, DimensionScore, ScoreComponent};

pub fn score(record: Option<&ClinicalRecord>) -> DimensionScore {
    let Some(r) = record else {
        return DimensionScore::no_data(DimensionName::ClinicalHistory);
    };
    // Derived from the counts, not `highest_phase`
    let phase = highest_phase(&r.phase_counts);
    let factor = phase.map_or(0.0, |p| p.progression_factor());
    let phase_label = phase
        .map_or_else(|| "no phased trials".to_string(), |p| format!("highest phase {p:?}"));

    DimensionScore::from_components(
        DimensionName::ClinicalHistory,
        vec![
            ScoreComponent::linear(
                "Trial volume",
                r.total_trials as f64,
                100.0,
                25.0,
                format!("{} registered trials", r.total_trials),
            ),
            ScoreComponent::new(
                "Phase progression",
                factor * 30.0,
                30.0,
                format!("{phase_label} (factor {factor:.2})"),
            ),
            ScoreComponent::linear(
                "Active recruitment",
                r.active_trials as f64,
                10.0,
                20.0,
                format!("{} trials recruiting", r.active_trials),
            ),
            ScoreComponent::linear(
                "Completed trials",
                f64::from(r.completed_trials),
                30.0,
                15.0,
                format!("{} completed of {} sampled", r.completed_trials, r.sampled_studies),
            ),
            ScoreComponent::linear(
                "Indication breadth",
                f64::from(r.distinct_conditions),
                20.0,
                10.0,
                format!("{} distinct conditions", r.distinct_conditions),
            ),
        ],
    )
}
