//! Normalized records for a heavily studied, drugged kinase (EGFR-like).
//!
//! Values are realistic orders of magnitude, not a snapshot of any provider.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ferrovet_sources::models::*;

/// One record per provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    pub genetics: GeneticsRecord,
    pub chemistry: ChemistryRecord,
    pub literature: LiteratureRecord,
    pub clinical: ClinicalRecord,
    pub preprints: PreprintRecord,
    pub structures: StructureRecord,
    pub regulatory: RegulatoryRecord,
}

impl RecordSet {
    /// Records that should score as a strongly validated target.
    pub fn strong() -> Self {
        Self {
            genetics: strong_genetics(),
            chemistry: strong_chemistry(),
            literature: strong_literature(),
            clinical: strong_clinical(),
            preprints: strong_preprints(),
            structures: strong_structures(),
            regulatory: strong_regulatory(),
        }
    }
}

pub fn strong_genetics() -> GeneticsRecord {
    GeneticsRecord {
        ensembl_id: "ENSG00000146648".into(),
        approved_symbol: "EGFR".into(),
        approved_name: Some("epidermal growth factor receptor".into()),
        biotype: Some("protein_coding".into()),
        association_count: 1834,
        top_association_score: 0.83,
        high_confidence_associations: 22,
        top_diseases: vec![
            DiseaseAssociation {
                disease_id: "EFO_0003060".into(),
                disease_name: "non-small cell lung carcinoma".into(),
                score: 0.83,
            },
            DiseaseAssociation {
                disease_id: "MONDO_0008903".into(),
                disease_name: "lung cancer".into(),
                score: 0.79,
            },
        ],
        tractability: Tractability {
            small_molecule: true,
            antibody: true,
            protac: false,
            other_clinical: true,
        },
    }
}

pub fn strong_chemistry() -> ChemistryRecord {
    ChemistryRecord {
        target_chembl_id: "CHEMBL203".into(),
        target_name: "Epidermal growth factor receptor erbB1".into(),
        activity_count: 15_873,
        potent_activity_count: 7_421,
        mechanism_count: 38,
        approved_drug_count: 11,
        max_phase: 4.0,
        small_molecule_drugs: 3,
        antibody_drugs: 1,
        top_drugs: vec![DrugSummary {
            chembl_id: "CHEMBL553".into(),
            name: Some("ERLOTINIB".into()),
            max_phase: Some(4.0),
            molecule_type: Some("Small molecule".into()),
            mechanism_of_action: Some("Epidermal growth factor receptor erbB1 inhibitor".into()),
            action_type: Some("INHIBITOR".into()),
        }],
    }
}

pub fn strong_literature() -> LiteratureRecord {
    LiteratureRecord {
        query_term: "EGFR[tiab]".into(),
        total_publications: 61_250,
        recent_publications: 21_400,
        last_year_publications: 4_150,
        review_count: 5_820,
        clinical_publications: 2_410,
        recent_share: 21_400.0 / 61_250.0,
    }
}

pub fn strong_clinical() -> ClinicalRecord {
    ClinicalRecord {
        total_trials: 1_412,
        active_trials: 187,
        completed_trials: 44,
        phase_counts: BTreeMap::from([
            (TrialPhase::Phase1, 21),
            (TrialPhase::Phase2, 38),
            (TrialPhase::Phase3, 17),
            (TrialPhase::Phase4, 6),
        ]),
        highest_phase: Some(TrialPhase::Phase4),
        distinct_conditions: 57,
        status_counts: BTreeMap::from([
            ("COMPLETED".to_string(), 44),
            ("RECRUITING".to_string(), 31),
            ("TERMINATED".to_string(), 9),
        ]),
        top_trials: vec![],
        sampled_studies: 100,
    }
}

pub fn strong_preprints() -> PreprintRecord {
    PreprintRecord {
        total_preprints: 14,
        last_30_days: 9,
        days_30_to_60: 5,
        recent_rate: 0.3,
        prior_rate: 5.0 / 30.0,
        velocity: VelocityTrend::Increasing,
        distinct_categories: 4,
        distinct_institutions: 11,
        top_categories: vec![CategoryCount { category: "cancer biology".into(), count: 8 }],
        recent_preprints: vec![PreprintSummary {
            doi: "10.1101/2025.06.01.000001".into(),
            title: "Resistance to third-generation EGFR inhibitors".into(),
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or_default(),
            category: Some("cancer biology".into()),
        }],
        preprints_scanned: 500,
        window_days: 60,
    }
}

pub fn strong_structures() -> StructureRecord {
    StructureRecord {
        uniprot_accession: "P00533".into(),
        protein_name: Some("Epidermal growth factor receptor".into()),
        sequence_length: Some(1210),
        pdb_structure_count: 312,
        top_pdb_ids: vec!["1M17".into(), "4HJO".into(), "2ITY".into()],
        best_resolution: Some(Sourced::measured(1.07)),
        ligand_bound_count: Sourced::measured(241),
        alphafold: Some(AlphaFoldModel {
            entry_id: "AF-P00533-F1".into(),
            avg_plddt: Some(75.9),
            fraction_very_high: Some(0.48),
            model_version: Some(4),
        }),
    }
}

pub fn strong_regulatory() -> RegulatoryRecord {
    let regulatory = RegulatoryCounts {
        total: 46,
        promoter: 3,
        enhancer: 14,
        ctcf: 9,
        open_chromatin: 11,
        tf_binding: 6,
    };
    RegulatoryRecord {
        ensembl_gene_id: "ENSG00000146648".into(),
        display_name: Some("EGFR".into()),
        biotype: Some("protein_coding".into()),
        chromosome: "7".into(),
        start: 55_019_017,
        end: 55_211_628,
        strand: 1,
        gene_length: 192_612,
        transcript_count: 14,
        regulatory,
        constrained_element_count: 23,
        regulatory_complexity: regulatory.complexity(),
        expression_breadth: Sourced::estimated(estimate_expression_breadth(14, 46)),
        flank_bp: 10_000,
    }
}
