//! ferrovet-test-utils — Shared fixtures and adapter test doubles.
//!
//! `fixtures` holds fully populated records for a well-validated target;
//! `doubles` holds `SourceAdapter` implementations that succeed, fail,
//! panic or stall on demand, for exercising the orchestrator without
//! network access.

pub mod doubles;
pub mod fixtures;

pub use doubles::{FailingAdapter, PanickingAdapter, StaticAdapter};
pub use fixtures::RecordSet;
