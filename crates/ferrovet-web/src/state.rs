//! Shared application state for the web server.

use std::sync::Arc;

use ferrovet_pipeline::TargetValidator;

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub validator: TargetValidator,
}

impl AppState {
    pub fn new(validator: TargetValidator) -> Self {
        Self { validator }
    }
}

pub type SharedState = Arc<AppState>;
