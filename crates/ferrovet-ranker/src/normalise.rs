//! Score normalisation functions shared by the dimension scorers.

/// Linear scaling with saturation: `min(value, cap) / cap × max`.
///
/// Returns 0 when `cap ≤ 0` or `value ≤ 0` (and for NaN input).
pub fn linear_scale(value: f64, cap: f64, max: f64) -> f64 {
    if cap <= 0.0 || value <= 0.0 || value.is_nan() || cap.is_nan() {
        return 0.0;
    }
    value.min(cap) / cap * max
}

/// Integer convenience wrapper around [`linear_scale`].
pub fn linear_count(count: u64, cap: f64, max: f64) -> f64 {
    linear_scale(count as f64, cap, max)
}

/// Rounds a component sum to a 0–100 dimension score.
pub fn round_score(sum: f64) -> u8 {
    if sum.is_nan() {
        return 0;
    }
    sum.round().clamp(0.0, 100.0) as u8
}

/// First step whose threshold `value` reaches, else `floor`.
/// Steps are `(threshold, points)` ordered from highest threshold down.
pub fn stepped(value: f64, steps: &[(f64, f64)], floor: f64) -> f64 {
    steps
        .iter()
        .find(|(threshold, _)| value >= *threshold)
        .map(|(_, points)| *points)
        .unwrap_or(floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_scale_reference_point() {
        assert_eq!(linear_scale(25.0, 50.0, 20.0), 10.0);
    }

    #[test]
    fn test_linear_scale_degenerate_inputs() {
        assert_eq!(linear_scale(10.0, 0.0, 20.0), 0.0);
        assert_eq!(linear_scale(10.0, -5.0, 20.0), 0.0);
        assert_eq!(linear_scale(0.0, 50.0, 20.0), 0.0);
        assert_eq!(linear_scale(-3.0, 50.0, 20.0), 0.0);
        assert_eq!(linear_scale(f64::NAN, 50.0, 20.0), 0.0);
    }

    #[test]
    fn test_linear_scale_saturates() {
        assert_eq!(linear_scale(50.0, 50.0, 20.0), 20.0);
        assert_eq!(linear_scale(5_000.0, 50.0, 20.0), 20.0);
        assert_eq!(linear_count(12_000, 5_000.0, 30.0), 30.0);
    }

    #[test]
    fn test_round_score_clamps() {
        assert_eq!(round_score(49.5), 50);
        assert_eq!(round_score(130.0), 100);
        assert_eq!(round_score(-4.0), 0);
    }

    #[test]
    fn test_stepped() {
        let steps = [(50.0, 20.0), (20.0, 14.0), (5.0, 8.0), (1.0, 4.0)];
        assert_eq!(stepped(50.0, &steps, 0.0), 20.0);
        assert_eq!(stepped(49.0, &steps, 0.0), 14.0);
        assert_eq!(stepped(1.0, &steps, 0.0), 4.0);
        assert_eq!(stepped(0.0, &steps, 0.0), 0.0);
    }
}
