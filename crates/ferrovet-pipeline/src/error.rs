use ferrovet_common::symbol::InvalidSymbol;
use thiserror::Error;

/// Errors that abort a profile build before any provider is contacted.
///
/// Provider failures never surface here; they become failed envelopes.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    InvalidSymbol(#[from] InvalidSymbol),
}
