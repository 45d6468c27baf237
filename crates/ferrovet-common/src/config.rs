//! Pipeline and source settings, deserialized from the `[pipeline]` and
//! `[sources]` tables of `ferrovet.toml`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Overall budget for one profile build; `0` waits for every adapter.
    #[serde(default = "default_profile_deadline_ms")]
    pub profile_deadline_ms: u64,
}

fn default_request_timeout_ms() -> u64 { 15_000 }
fn default_retries() -> u32 { 2 }
fn default_backoff_ms() -> u64 { 250 }
fn default_cache_ttl_secs() -> u64 { 3_600 }
fn default_profile_deadline_ms() -> u64 { 60_000 }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            retries: default_retries(),
            initial_backoff_ms: default_backoff_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            profile_deadline_ms: default_profile_deadline_ms(),
        }
    }
}

impl PipelineConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            timeout: Duration::from_millis(self.request_timeout_ms),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            ..RetryPolicy::default()
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn profile_deadline(&self) -> Option<Duration> {
        (self.profile_deadline_ms > 0).then(|| Duration::from_millis(self.profile_deadline_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// NCBI E-utilities key; raises the PubMed rate limit from 3 to 10 rps.
    #[serde(default)]
    pub ncbi_api_key: Option<String>,
    /// bioRxiv listing pages (100 preprints each) fetched in parallel.
    #[serde(default = "default_biorxiv_pages")]
    pub biorxiv_pages: u32,
    #[serde(default = "default_biorxiv_window_days")]
    pub biorxiv_window_days: u32,
    /// Flank added on each side of the gene when querying Ensembl overlaps.
    #[serde(default = "default_ensembl_flank_bp")]
    pub ensembl_flank_bp: u64,
    #[serde(default)]
    pub extra_allowed_hosts: Vec<String>,
}

fn default_biorxiv_pages() -> u32 { 5 }
fn default_biorxiv_window_days() -> u32 { 60 }
fn default_ensembl_flank_bp() -> u64 { 10_000 }

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            ncbi_api_key: None,
            biorxiv_pages: default_biorxiv_pages(),
            biorxiv_window_days: default_biorxiv_window_days(),
            ensembl_flank_bp: default_ensembl_flank_bp(),
            extra_allowed_hosts: Vec::new(),
        }
    }
}
