//! literatureDepth: PubMed publication counts.

use ferrovet_sources::models::LiteratureRecord;

use crate::scorer::{DimensionName, DimensionScore, ScoreComponent};

pub fn score(record: Option<&LiteratureRecord>) -> DimensionScore {
    let Some(r) = record else {
        return DimensionScore::no_data(DimensionName::LiteratureDepth);
    };

    DimensionScore::from_components(
        DimensionName::LiteratureDepth,
        vec![
            ScoreComponent::linear(
                "Publication volume",
                r.total_publications as f64,
                5_000.0,
                30.0,
                format!("{} publications", r.total_publications),
            ),
            ScoreComponent::linear(
                "Recent output",
                r.recent_publications as f64,
                2_000.0,
                25.0,
                format!("{} in the last five years", r.recent_publications),
            ),
            ScoreComponent::linear(
                "Clinical literature",
                r.clinical_publications as f64,
                200.0,
                20.0,
                format!("{} clinical trial/study publications", r.clinical_publications),
            ),
            ScoreComponent::linear(
                "Review coverage",
                r.review_count as f64,
                300.0,
                15.0,
                format!("{} reviews", r.review_count),
            ),
            ScoreComponent::linear(
                "Current momentum",
                r.last_year_publications as f64,
                500.0,
                10.0,
                format!("{} in the last year", r.last_year_publications),
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::invariants::assert_well_formed;

    fn record(total: u64, recent: u64, clinical: u64, reviews: u64, last_year: u64) -> LiteratureRecord {
        LiteratureRecord {
            query_term: "EGFR[tiab]".into(),
            total_publications: total,
            recent_publications: recent,
            last_year_publications: last_year,
            review_count: reviews,
            clinical_publications: clinical,
            recent_share: 0.0,
        }
    }

    #[test]
    fn test_heavily_published_gene() {
        let d = score(Some(&record(60_000, 21_000, 2_400, 5_800, 4_100)));
        assert_well_formed(&d);
        assert_eq!(d.score, 100);
    }

    #[test]
    fn test_sparse_gene() {
        // 250/5000×30 + 100/2000×25 + 0 + 15/300×15 + 25/500×10
        let d = score(Some(&record(250, 100, 0, 15, 25)));
        assert_well_formed(&d);
        assert_eq!(d.score, 4);
    }

    #[test]
    fn test_none_is_zero() {
        assert_eq!(score(None).score, 0);
    }
}
