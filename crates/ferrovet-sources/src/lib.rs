//! ferrovet-sources — Evidence adapters for the seven upstream providers.
//!
//! Each adapter resolves the provider's identifier for a gene symbol,
//! queries it, soft-validates the payloads and normalizes them into one of
//! the records in [`models`]:
//! - Open Targets (genetic associations, tractability)
//! - ChEMBL (compounds, mechanisms, drugs)
//! - PubMed (publication counts)
//! - ClinicalTrials.gov (trial phases and status)
//! - bioRxiv (preprint velocity)
//! - UniProt / RCSB PDB / AlphaFold (structures)
//! - Ensembl (regulatory features)

pub mod models;
pub mod sources;

pub use models::*;
pub use sources::{
    BioRxivSource, ChemblSource, ClinicalTrialsSource, EnsemblSource, Fetched, OpenTargetsSource,
    PubMedSource, SourceAdapter, StructureSource,
};
