//! innovationSignal: bioRxiv preprint volume and velocity.

use ferrovet_sources::models::{PreprintRecord, VelocityTrend};

use crate::scorer::{DimensionName, DimensionScore, ScoreComponent};

fn velocity_points(record: &PreprintRecord) -> f64 {
    if record.total_preprints == 0 {
        return 0.0;
    }
    match record.velocity {
        VelocityTrend::Increasing => 20.0,
        VelocityTrend::Stable     => 12.0,
        VelocityTrend::Decreasing => 5.0,
    }
}

pub fn score(record: Option<&PreprintRecord>) -> DimensionScore {
    let Some(r) = record else {
        return DimensionScore::no_data(DimensionName::InnovationSignal);
    };

    DimensionScore::from_components(
        DimensionName::InnovationSignal,
        vec![
            ScoreComponent::linear(
                "Preprint volume",
                f64::from(r.total_preprints),
                20.0,
                30.0,
                format!(
                    "{} matching preprints in {} days ({} scanned)",
                    r.total_preprints, r.window_days, r.preprints_scanned
                ),
            ),
            ScoreComponent::linear(
                "Recent preprints",
                f64::from(r.last_30_days),
                8.0,
                25.0,
                format!("{} in the last 30 days", r.last_30_days),
            ),
            ScoreComponent::new(
                "Velocity",
                velocity_points(r),
                20.0,
                format!(
                    "{:?}: {:.2}/day vs {:.2}/day in the prior 30 days",
                    r.velocity, r.recent_rate, r.prior_rate
                ),
            ),
            ScoreComponent::linear(
                "Topic diversity",
                f64::from(r.distinct_categories),
                5.0,
                15.0,
                format!("{} subject categories", r.distinct_categories),
            ),
            ScoreComponent::linear(
                "Institutional breadth",
                f64::from(r.distinct_institutions),
                10.0,
                10.0,
                format!("{} corresponding institutions", r.distinct_institutions),
            ),
        ],
    )
}
