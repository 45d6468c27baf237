//! One scorer per validation dimension.
//!
//! Every scorer is a pure `Option<&Record> -> DimensionScore`; `None`
//! yields a zero score with no components.

pub mod chemical;
pub mod clinical;
pub mod genetic;
pub mod innovation;
pub mod literature;
pub mod regulatory;
pub mod structural;

#[cfg(test)]
pub(crate) mod invariants {
    use crate::scorer::DimensionScore;

    /// Checks the bounds every dimension score must satisfy.
    pub fn assert_well_formed(d: &DimensionScore) {
        assert!(d.score <= 100, "{:?} score {} > 100", d.dimension, d.score);
        assert!(d.max_total() <= 100.0, "{:?} component maxima sum to {}", d.dimension, d.max_total());
        for c in &d.components {
            assert!(
                (0.0..=c.max_value).contains(&c.value),
                "{:?}/{}: {} outside [0, {}]",
                d.dimension,
                c.name,
                c.value,
                c.max_value
            );
        }
    }
}
