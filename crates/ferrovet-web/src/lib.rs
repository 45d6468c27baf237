//! ferrovet-web — HTTP API and CLI for Ferrovet.
//!
//! Exposes the profile build and candidate search over JSON:
//!   - `GET /api/targets/{gene}/profile`
//!   - `GET /api/search?q=..&limit=..`
//!   - `GET /api/weights`
//!   - `GET /health`

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
