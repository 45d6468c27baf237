//! Configuration loading for Ferrovet.
//! Reads ferrovet.toml from the current directory or the path given by
//! `--config` / the FERROVET_CONFIG env var.

use std::path::Path;

use anyhow::Context;
use ferrovet_common::{PipelineConfig, SourcesConfig};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "ferrovet.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String { "127.0.0.1:3001".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

impl Config {
    /// Load configuration from `path`, or ferrovet.toml when none is given.
    /// A missing file falls back to defaults; a malformed one is an error.
    /// Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Self::from_toml_str(&content).with_context(|| format!("parsing {}", path.display()))?
        } else {
            warn!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// FERROVET_BIND replaces the bind address, NCBI_API_KEY the PubMed key.
    /// Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(bind) = var("FERROVET_BIND") {
            self.server.bind = bind;
        }
        if let Some(key) = var("NCBI_API_KEY") {
            self.sources.ncbi_api_key = Some(key);
        }
    }
}
