//! Result envelope wrapping every source adapter's outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The seven upstream providers, in profile key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceId {
    OpenTargets,
    Chembl,
    #[serde(rename = "pubmed")]
    PubMed,
    ClinicalTrials,
    #[serde(rename = "biorxiv")]
    BioRxiv,
    Structures,
    Ensembl,
}

impl SourceId {
    pub const ALL: [SourceId; 7] = [
        SourceId::OpenTargets,
        SourceId::Chembl,
        SourceId::PubMed,
        SourceId::ClinicalTrials,
        SourceId::BioRxiv,
        SourceId::Structures,
        SourceId::Ensembl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::OpenTargets    => "openTargets",
            SourceId::Chembl         => "chembl",
            SourceId::PubMed         => "pubmed",
            SourceId::ClinicalTrials => "clinicalTrials",
            SourceId::BioRxiv        => "biorxiv",
            SourceId::Structures     => "structures",
            SourceId::Ensembl        => "ensembl",
        }
    }

    /// Human-readable provider name used in log lines and error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceId::OpenTargets    => "Open Targets",
            SourceId::Chembl         => "ChEMBL",
            SourceId::PubMed         => "PubMed",
            SourceId::ClinicalTrials => "ClinicalTrials.gov",
            SourceId::BioRxiv        => "bioRxiv",
            SourceId::Structures     => "UniProt/RCSB/AlphaFold",
            SourceId::Ensembl        => "Ensembl",
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one adapter call.
///
/// Fields are private so the invariant holds by construction:
/// a failed envelope has no data and an error, a successful one has data
/// and no error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEnvelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
    source: SourceId,
    timestamp: DateTime<Utc>,
    cached: bool,
    response_time_ms: u64,
    diagnostics: Vec<String>,
}

impl<T> SourceEnvelope<T> {
    pub fn ok(
        source: SourceId,
        data: T,
        cached: bool,
        response_time_ms: u64,
        diagnostics: Vec<String>,
    ) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            source,
            timestamp: Utc::now(),
            cached,
            response_time_ms,
            diagnostics,
        }
    }

    pub fn failed(source: SourceId, error: impl Into<String>, response_time_ms: u64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            source,
            timestamp: Utc::now(),
            cached: false,
            response_time_ms,
            diagnostics: Vec::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn cached(&self) -> bool {
        self.cached
    }

    pub fn response_time_ms(&self) -> u64 {
        self.response_time_ms
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope_invariant() {
        let env = SourceEnvelope::ok(SourceId::Chembl, 7u32, false, 120, vec![]);
        assert!(env.success());
        assert_eq!(env.data(), Some(&7));
        assert!(env.error().is_none());
    }

    #[test]
    fn test_failed_envelope_invariant() {
        let env: SourceEnvelope<u32> = SourceEnvelope::failed(SourceId::PubMed, "HTTP 500", 30);
        assert!(!env.success());
        assert!(env.data().is_none());
        assert_eq!(env.error(), Some("HTTP 500"));
        assert!(!env.cached());
    }

    #[test]
    fn test_envelope_serializes_camel_case() {
        let env = SourceEnvelope::ok(SourceId::ClinicalTrials, 1u8, true, 5, vec![]);
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["source"], "clinicalTrials");
        assert_eq!(json["responseTimeMs"], 5);
        assert_eq!(json["cached"], true);
        assert!(json["error"].is_null());
    }

    #[test]
    fn test_source_ids_are_distinct() {
        let mut keys: Vec<&str> = SourceId::ALL.iter().map(|s| s.as_str()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 7);
    }

    #[test]
    fn test_source_id_serde_matches_key() {
        for id in SourceId::ALL {
            assert_eq!(serde_json::to_value(id).unwrap(), id.as_str(), "{id:?}");
            let back: SourceId = serde_json::from_value(serde_json::json!(id.as_str())).unwrap();
            assert_eq!(back, id);
        }
        let env: SourceEnvelope<u8> = SourceEnvelope::failed(SourceId::PubMed, "HTTP 429", 3);
        assert_eq!(serde_json::to_value(&env).unwrap()["source"], "pubmed");
    }
}
