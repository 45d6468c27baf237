//! ferrovet-common — Shared types, errors, and plumbing used across all Ferrovet crates.
//!
//! Everything a source adapter needs before it talks to its provider:
//! the resilient HTTP client, the TTL cache, the result envelope and the
//! soft schema validation helpers.

pub mod cache;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod symbol;
pub mod validation;

// Re-export commonly used types
pub use cache::{CacheKey, SourceCache, TtlCache};
pub use config::{PipelineConfig, SourcesConfig};
pub use envelope::{SourceEnvelope, SourceId};
pub use error::{HttpError, SourceError};
pub use http::{RequestClient, RetryPolicy};
pub use symbol::GeneSymbol;
pub use validation::{Diagnostic, FieldSpec, JsonKind};
