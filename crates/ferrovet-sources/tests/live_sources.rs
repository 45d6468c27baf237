//! Live provider checks for every adapter.
//!
//! Run with: cargo test --package ferrovet-sources --test live_sources -- --ignored --nocapture

use std::sync::Arc;

use ferrovet_common::{GeneSymbol, RequestClient, RetryPolicy, SourceCache};
use ferrovet_sources::{
    BioRxivSource, ChemblSource, ClinicalTrialsSource, EnsemblSource, OpenTargetsSource,
    PubMedSource, SourceAdapter, StructureSource, TrialPhase,
};

fn shared() -> (Arc<RequestClient>, Arc<SourceCache>) {
    let client = RequestClient::new(RetryPolicy::default()).expect("client");
    (Arc::new(client), Arc::new(SourceCache::default()))
}

fn egfr() -> GeneSymbol {
    GeneSymbol::parse("EGFR").unwrap()
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_open_targets_egfr() {
    let (client, cache) = shared();
    let source = OpenTargetsSource::new(client, cache);

    let env = source.collect(&egfr()).await;
    assert!(env.success(), "{:?}", env.error());
    let record = env.data().unwrap();
    println!("{record:#?}");
    assert_eq!(record.ensembl_id, "ENSG00000146648");
    assert!(record.association_count > 100);

    let hits = source.search_candidates("EGF", 5).await.unwrap();
    assert!(!hits.is_empty() && hits.len() <= 5);
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_chembl_egfr() {
    let (client, cache) = shared();
    let env = ChemblSource::new(client, cache).collect(&egfr()).await;
    assert!(env.success(), "{:?}", env.error());
    let record = env.data().unwrap();
    println!("{record:#?}");
    assert_eq!(record.target_chembl_id, "CHEMBL203");
    assert!(record.activity_count > 1000);
    assert_eq!(record.max_phase, 4.0);
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_pubmed_egfr() {
    let (client, cache) = shared();
    let api_key = std::env::var("NCBI_API_KEY").ok();
    let env = PubMedSource::new(client, cache, api_key).collect(&egfr()).await;
    assert!(env.success(), "{:?}", env.error());
    let record = env.data().unwrap();
    println!("{record:#?}");
    assert!(record.total_publications > record.recent_publications);
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_clinical_trials_egfr() {
    let (client, cache) = shared();
    let env = ClinicalTrialsSource::new(client, cache).collect(&egfr()).await;
    assert!(env.success(), "{:?}", env.error());
    let record = env.data().unwrap();
    println!("{record:#?}");
    assert!(record.total_trials > 0);
    assert!(record.highest_phase >= Some(TrialPhase::Phase2));
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_biorxiv_egfr() {
    let (client, cache) = shared();
    let env = BioRxivSource::new(client, cache, 2, 60).collect(&egfr()).await;
    assert!(env.success(), "{:?}", env.error());
    println!("{:#?}", env.data().unwrap());
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_structures_egfr() {
    let (client, cache) = shared();
    let env = StructureSource::new(client, cache).collect(&egfr()).await;
    assert!(env.success(), "{:?}", env.error());
    let record = env.data().unwrap();
    println!("{record:#?}");
    assert_eq!(record.uniprot_accession, "P00533");
    assert!(record.pdb_structure_count > 100);
    assert!(record.alphafold.is_some());
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_ensembl_egfr() {
    let (client, cache) = shared();
    let env = EnsemblSource::new(client, cache, 10_000).collect(&egfr()).await;
    assert!(env.success(), "{:?}", env.error());
    let record = env.data().unwrap();
    println!("{record:#?}");
    assert_eq!(record.chromosome, "7");
    assert!(record.transcript_count > 1);
}

#[tokio::test]
#[ignore] // Requires network access
async fn test_second_collect_hits_cache() {
    let (client, cache) = shared();
    let source = PubMedSource::new(client, cache.clone(), None);
    let first = source.collect(&egfr()).await;
    let second = source.collect(&egfr()).await;
    assert!(first.success() && !first.cached());
    assert!(second.cached());
    assert_eq!(first.data(), second.data());
}
