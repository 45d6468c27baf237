//! ferrovet-pipeline — Fan-out, profile assembly and the library entry points.
//!
//! [`TargetValidator`] is what the web layer and the CLI talk to: it validates
//! the gene symbol, runs the seven adapters through the [`Orchestrator`],
//! scores whatever came back and assembles a [`TargetProfile`].

pub mod assembler;
pub mod error;
pub mod orchestrator;
pub mod service;

pub use assembler::{assemble_profile, RunMetadata, TargetProfile};
pub use error::ProfileError;
pub use orchestrator::{Orchestrator, SourceEnvelopes, SourceSet};
pub use service::{CandidateSearch, TargetValidator};
