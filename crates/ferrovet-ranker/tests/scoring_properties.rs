//! Bounds and combination properties of the scoring engine, exercised with
//! the shared fixture records.

use ferrovet_ranker::{calculate_scores, DimensionName, DimensionScore, DimensionWeights, ScoringInputs};
use ferrovet_test_utils::RecordSet;
use pretty_assertions::assert_eq;

fn full_inputs(records: &RecordSet) -> ScoringInputs<'_> {
    ScoringInputs {
        genetics: Some(&records.genetics),
        chemistry: Some(&records.chemistry),
        clinical: Some(&records.clinical),
        structures: Some(&records.structures),
        regulatory: Some(&records.regulatory),
        literature: Some(&records.literature),
        preprints: Some(&records.preprints),
    }
}

fn assert_bounds(d: &DimensionScore) {
    assert!(d.score <= 100);
    let max_total: f64 = d.components.iter().map(|c| c.max_value).sum();
    assert!(max_total <= 100.0, "{:?}: maxima sum to {max_total}", d.dimension);
    for c in &d.components {
        assert!(c.value >= 0.0 && c.value <= c.max_value, "{:?}/{}", d.dimension, c.name);
    }
}

#[test]
fn test_strong_fixture_scores_at_least_70() {
    let records = RecordSet::strong();
    let overall = calculate_scores(&full_inputs(&records));

    assert!(overall.value >= 70, "overall {}", overall.value);
    assert_eq!(overall.dimensions.len(), 7);
    for d in overall.dimensions.values() {
        assert_bounds(d);
        assert!(!d.components.is_empty());
    }
}

#[test]
fn test_overall_is_rounded_weighted_sum() {
    let records = RecordSet::strong();
    let overall = calculate_scores(&full_inputs(&records));
    let weights = DimensionWeights::default();

    let expected: f64 = overall
        .dimensions
        .iter()
        .map(|(name, d)| f64::from(d.score) * weights.get(*name))
        .sum();
    assert_eq!(overall.value, expected.round() as u8);
}

#[test]
fn test_single_source_populated() {
    let records = RecordSet::strong();
    let inputs = ScoringInputs {
        chemistry: Some(&records.chemistry),
        ..ScoringInputs::default()
    };
    let overall = calculate_scores(&inputs);

    assert!(overall.value > 0 && overall.value <= 100);
    for (name, d) in &overall.dimensions {
        if *name == DimensionName::ChemicalTractability {
            assert!(d.score > 0);
        } else {
            assert_eq!(d.score, 0, "{name:?} should be empty");
            assert!(d.components.is_empty());
        }
    }
}

#[test]
fn test_all_none() {
    let overall = calculate_scores(&ScoringInputs::default());
    assert_eq!(overall.value, 0);
    assert!(overall.dimensions.values().all(|d| d.score == 0));
}

#[test]
fn test_weights_sum_to_one() {
    let overall = calculate_scores(&ScoringInputs::default());
    let sum: f64 = overall.weights.values().sum();
    assert!((sum - 1.0).abs() <= 0.01);
}

#[test]
fn test_dimensions_serialize_in_stable_order() {
    let records = RecordSet::strong();
    let overall = calculate_scores(&full_inputs(&records));
    let json = serde_json::to_value(&overall).unwrap();
    assert_eq!(json["dimensions"].as_object().unwrap().len(), 7);
    assert!(json["dimensions"]["chemicalTractability"]["components"][0]["maxValue"].is_number());

    // `Value` maps sort their keys, so check the order in the raw text
    for text in [
        serde_json::to_string(&overall.dimensions).unwrap(),
        serde_json::to_string(&overall.weights).unwrap(),
    ] {
        let positions: Vec<usize> = DimensionName::ALL
            .iter()
            .map(|name| {
                let key = serde_json::to_string(name).unwrap();
                text.find(&format!("{key}:")).unwrap_or_else(|| panic!("{key} missing"))
            })
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{text}");
    }
}
