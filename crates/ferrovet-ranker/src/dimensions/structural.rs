//! structuralReadiness: experimental structures and predicted models.

use ferrovet_sources::models::StructureRecord;

use crate::scorer::{DimensionName, DimensionScore, ScoreComponent};

/// Points for the best resolution in Å; lower is better.
fn resolution_points(resolution: Option<f64>) -> f64 {
    match resolution {
        Some(r) if r <= 2.0 => 20.0,
        Some(r) if r <= 2.5 => 15.0,
        Some(r) if r <= 3.0 => 10.0,
        Some(_) => 5.0,
        None => 0.0,
    }
}

pub fn score(record: Option<&StructureRecord>) -> DimensionScore {
    let Some(r) = record else {
        return DimensionScore::no_data(DimensionName::StructuralReadiness);
    };

    let resolution = r.best_resolution.map(|s| s.value);
    let resolution_note = match r.best_resolution {
        Some(s) if s.is_estimated() => format!("~{:.1} Å (estimated from entry count)", s.value),
        Some(s) => format!("{:.2} Å", s.value),
        None => "no experimental structure".to_string(),
    };
    let ligand = r.ligand_bound_count;
    let plddt = r.avg_plddt().unwrap_or(0.0);

    DimensionScore::from_components(
        DimensionName::StructuralReadiness,
        vec![
            ScoreComponent::linear(
                "Experimental coverage",
                f64::from(r.pdb_structure_count),
                20.0,
                30.0,
                format!("{} PDB entries", r.pdb_structure_count),
            ),
            ScoreComponent::new(
                "Resolution quality",
                resolution_points(resolution),
                20.0,
                resolution_note,
            ),
            ScoreComponent::linear(
                "Ligand-bound structures",
                f64::from(ligand.value),
                10.0,
                20.0,
                if ligand.is_estimated() {
                    format!("~{} entries with ligands (estimated)", ligand.value)
                } else {
                    format!("{} entries with ligands", ligand.value)
                },
            ),
            ScoreComponent::linear(
                "Predicted model confidence",
                plddt,
                100.0,
                20.0,
                format!("AlphaFold mean pLDDT {plddt:.1}"),
            ),
            ScoreComponent::new(
                "Predicted model availability",
                if r.alphafold.is_some() { 10.0 } else { 0.0 },
                10.0,
                if r.alphafold.is_some() { "AlphaFold model available" } else { "No AlphaFold model" },
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::invariants::assert_well_formed;
    use ferrovet_sources::models::{AlphaFoldModel, Sourced};

    fn record(count: u32, resolution: Option<Sourced<f64>>, ligand: Sourced<u32>, plddt: Option<f64>) -> StructureRecord {
        StructureRecord {
            uniprot_accession: "P00533".into(),
            protein_name: None,
            sequence_length: None,
            pdb_structure_count: count,
            top_pdb_ids: vec![],
            best_resolution: resolution,
            ligand_bound_count: ligand,
            alphafold: plddt.map(|p| AlphaFoldModel {
                entry_id: "AF-P00533-F1".into(),
                avg_plddt: Some(p),
                fraction_very_high: None,
                model_version: Some(4),
            }),
        }
    }

    #[test]
    fn test_resolution_steps() {
        assert_eq!(resolution_points(Some(1.07)), 20.0);
        assert_eq!(resolution_points(Some(2.0)), 20.0);
        assert_eq!(resolution_points(Some(2.5)), 15.0);
        assert_eq!(resolution_points(Some(3.0)), 10.0);
        assert_eq!(resolution_points(Some(3.4)), 5.0);
        assert_eq!(resolution_points(None), 0.0);
    }

    #[test]
    fn test_well_studied_structure() {
        let d = score(Some(&record(312, Some(Sourced::measured(1.07)), Sourced::measured(180), Some(75.0))));
        assert_well_formed(&d);
        // 30 + 20 + 20 + 15 + 10
        assert_eq!(d.score, 95);
    }

    #[test]
    fn test_estimated_values_still_score() {
        let d = score(Some(&record(4, Some(Sourced::estimated(2.8)), Sourced::estimated(1), None)));
        assert_well_formed(&d);
        // 4/20×30 + 10 + 1/10×20
        assert_eq!(d.score, 18);
        assert!(d.components[1].description.contains("estimated"));
    }

    #[test]
    fn test_none_is_zero() {
        assert_eq!(score(None).score, 0);
    }
}
