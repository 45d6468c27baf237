//! ferrovet-ranker — Target validation scoring engine.
//!
//! Seven pure dimension scorers over the normalized provider records, and
//! the weighted combiner that folds them into one 0–100 score.

pub mod dimensions;
pub mod normalise;
pub mod scorer;
pub mod weights;

pub use scorer::{
    calculate_scores, calculate_scores_with, DimensionName, DimensionScore, OverallScore,
    ScoreComponent, ScoringInputs,
};
pub use weights::DimensionWeights;
