//! chemicalTractability: ChEMBL bioactivity, clinical maturity and drug modality.

use ferrovet_sources::models::{ChemistryRecord, Modality};

use crate::scorer::{DimensionName, DimensionScore, ScoreComponent};

fn modality_points(modality: Modality) -> f64 {
    match modality {
        Modality::SmallMolecule => 20.0,
        Modality::Antibody      => 12.0,
        Modality::Other | Modality::None => 0.0,
    }
}

pub fn score(record: Option<&ChemistryRecord>) -> DimensionScore {
    let Some(r) = record else {
        return DimensionScore::no_data(DimensionName::ChemicalTractability);
    };
    let modality = r.confirmed_modality();

    DimensionScore::from_components(
        DimensionName::ChemicalTractability,
        vec![
            ScoreComponent::linear(
                "Compound volume",
                r.activity_count as f64,
                100.0,
                25.0,
                format!("{} activity records with pChEMBL", r.activity_count),
            ),
            ScoreComponent::linear(
                "Potent compounds",
                r.potent_activity_count as f64,
                50.0,
                20.0,
                format!("{} activities at pChEMBL ≥ 7", r.potent_activity_count),
            ),
            ScoreComponent::linear(
                "Clinical maturity",
                r.max_phase,
                4.0,
                25.0,
                format!("Max phase {}", r.max_phase),
            ),
            ScoreComponent::linear(
                "Mechanism coverage",
                f64::from(r.mechanism_count),
                5.0,
                10.0,
                format!("{} molecules with a known mechanism", r.mechanism_count),
            ),
            ScoreComponent::new(
                "Drug modality",
                modality_points(modality),
                20.0,
                match modality {
                    Modality::SmallMolecule => "Small-molecule drug confirmed",
                    Modality::Antibody      => "Antibody drug only",
                    _                       => "No drug modality confirmed",
                },
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::invariants::assert_well_formed;

    fn record(compounds: u64, potent: u64, phase: f64, mechanisms: u32, sm: u32, ab: u32) -> ChemistryRecord {
        ChemistryRecord {
            target_chembl_id: "CHEMBL203".into(),
            target_name: "EGFR".into(),
            activity_count: compounds,
            potent_activity_count: potent,
            mechanism_count: mechanisms,
            approved_drug_count: 0,
            max_phase: phase,
            small_molecule_drugs: sm,
            antibody_drugs: ab,
            top_drugs: vec![],
        }
    }

    #[test]
    fn test_none_is_zero() {
        assert_eq!(score(None).score, 0);
    }

    #[test]
    fn test_approved_small_molecule_target() {
        let d = score(Some(&record(15_000, 7_000, 4.0, 12, 3, 1)));
        assert_well_formed(&d);
        assert_eq!(d.score, 100);
    }

    #[test]
    fn test_antibody_only_target() {
        // 50/100×25 + 10/50×20 + 2/4×25 + 1/5×10 + 12
        let d = score(Some(&record(50, 10, 2.0, 1, 0, 1)));
        assert_well_formed(&d);
        assert_eq!(d.score, 43);
    }
}
