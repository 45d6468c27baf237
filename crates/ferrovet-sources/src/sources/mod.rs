//! Provider adapters.
//!
//! Every adapter follows the same path: resolve the provider identifier
//! (cached), issue its queries, soft-validate the payloads, derive the
//! normalized record and hand it back. [`SourceAdapter::collect`] wraps that
//! in the cache lookup, the timing and the envelope conversion so no adapter
//! error ever escapes as anything but a failed envelope.

pub mod biorxiv;
pub mod chembl;
pub mod clinicaltrials;
pub mod ensembl;
pub mod opentargets;
pub mod pubmed;
pub mod structures;

use std::future::Future;

use async_trait::async_trait;
use ferrovet_common::validation::{validate, FieldSpec};
use ferrovet_common::{CacheKey, GeneSymbol, SourceCache, SourceEnvelope, SourceError, SourceId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};

pub use biorxiv::BioRxivSource;
pub use chembl::ChemblSource;
pub use clinicaltrials::ClinicalTrialsSource;
pub use ensembl::EnsemblSource;
pub use opentargets::OpenTargetsSource;
pub use pubmed::PubMedSource;
pub use structures::StructureSource;

/// A normalized record plus the soft-validation findings gathered on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub record: T,
    pub diagnostics: Vec<String>,
}

impl<T> Fetched<T> {
    pub fn new(record: T) -> Self {
        Self { record, diagnostics: Vec::new() }
    }

    pub fn with_diagnostics(record: T, diagnostics: Vec<String>) -> Self {
        Self { record, diagnostics }
    }
}

/// Common interface for the seven evidence providers.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    type Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    fn source(&self) -> SourceId;

    /// Shared cache instance the adapter reads and writes through.
    fn cache(&self) -> &SourceCache;

    /// Fetch and normalize the record for `gene`. Errors propagate; the
    /// envelope conversion happens in [`SourceAdapter::collect`].
    async fn fetch(&self, gene: &GeneSymbol) -> Result<Fetched<Self::Record>, SourceError>;

    /// Cached fetch wrapped in a result envelope. Never fails.
    async fn collect(&self, gene: &GeneSymbol) -> SourceEnvelope<Self::Record> {
        let source = self.source();
        let started = Instant::now();
        let key = record_key(source, gene);

        if let Some(hit) = self.cache().get(&key) {
            match serde_json::from_value::<Self::Record>(hit) {
                Ok(record) => {
                    debug!(source = %source, gene = %gene, "record served from cache");
                    return SourceEnvelope::ok(source, record, true, elapsed_ms(started), Vec::new());
                }
                Err(e) => {
                    warn!(source = %source, gene = %gene, error = %e, "discarding undecodable cache entry");
                    self.cache().remove(&key);
                }
            }
        }

        let outcome = match self.fetch(gene).await {
            Ok(fetched) => serde_json::to_value(&fetched.record)
                .map(|value| (fetched, value))
                .map_err(SourceError::from),
            Err(e) => Err(e),
        };

        match outcome {
            Ok((fetched, value)) => {
                self.cache().set(key, value);
                SourceEnvelope::ok(source, fetched.record, false, elapsed_ms(started), fetched.diagnostics)
            }
            Err(e) => {
                warn!(source = %source, gene = %gene, error = %e, "source adapter failed");
                SourceEnvelope::failed(source, e.to_string(), elapsed_ms(started))
            }
        }
    }
}

/// Cache key for a gene's normalized record.
pub fn record_key(source: SourceId, gene: &GeneSymbol) -> CacheKey {
    CacheKey::new(source, format!("record/{}", gene.as_str().to_ascii_uppercase()))
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Returns the cached value under `key`, or runs `load` and caches its result.
///
/// Used for identifier resolution (symbol → Ensembl id, ChEMBL id, UniProt
/// accession) so repeated profiles skip the lookup round trip.
pub(crate) async fn cached<T, F>(cache: &SourceCache, key: CacheKey, load: F) -> Result<T, SourceError>
where
    T: Serialize + DeserializeOwned,
    F: Future<Output = Result<T, SourceError>>,
{
    if let Some(hit) = cache.get(&key) {
        if let Ok(value) = serde_json::from_value(hit) {
            return Ok(value);
        }
    }
    let value = load.await?;
    cache.set(key, serde_json::to_value(&value)?);
    Ok(value)
}

/// Soft-validates `payload`, logging each mismatch and appending it to `sink`.
pub(crate) fn check_shape(source: SourceId, label: &str, payload: &Value, specs: &[FieldSpec], sink: &mut Vec<String>) {
    for diag in validate(payload, specs) {
        warn!(source = %source, payload = label, "{diag}");
        sink.push(format!("{label}: {diag}"));
    }
}

/// Reads an optional string field.
pub(crate) fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrovet_common::HttpError;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Count {
        n: u32,
    }

    struct Counting {
        cache: SourceCache,
        calls: AtomicU32,
        fail: bool,
    }

    #[async_trait]
    impl SourceAdapter for Counting {
        type Record = Count;

        fn source(&self) -> SourceId {
            SourceId::PubMed
        }

        fn cache(&self) -> &SourceCache {
            &self.cache
        }

        async fn fetch(&self, _gene: &GeneSymbol) -> Result<Fetched<Count>, SourceError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(HttpError::Server { status: 502 }.into());
            }
            Ok(Fetched::with_diagnostics(Count { n }, vec!["esearch: drift".into()]))
        }
    }

    fn adapter(fail: bool) -> Counting {
        Counting { cache: SourceCache::default(), calls: AtomicU32::new(0), fail }
    }

    #[tokio::test]
    async fn test_second_collect_is_cached() {
        let a = adapter(false);
        let gene = GeneSymbol::parse("egfr").unwrap();

        let first = a.collect(&gene).await;
        assert!(first.success());
        assert!(!first.cached());
        assert_eq!(first.diagnostics(), ["esearch: drift".to_string()]);

        let second = a.collect(&GeneSymbol::parse("EGFR").unwrap()).await;
        assert!(second.cached());
        assert_eq!(second.data(), Some(&Count { n: 1 }));
        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_becomes_failed_envelope_and_is_not_cached() {
        let a = adapter(true);
        let gene = GeneSymbol::parse("KRAS").unwrap();

        let env = a.collect(&gene).await;
        assert!(!env.success());
        assert!(env.data().is_none());
        assert_eq!(env.error(), Some("server error: HTTP 502"));
        assert!(a.cache.is_empty());

        a.collect(&gene).await;
        assert_eq!(a.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cached_helper_loads_once() {
        let cache = SourceCache::default();
        let key = CacheKey::new(SourceId::Chembl, "target-id/EGFR");

        let first: String = cached(&cache, key.clone(), async { Ok("CHEMBL203".to_string()) })
            .await
            .unwrap();
        let second: String = cached(&cache, key, async {
            Err(SourceError::Payload("should not be called".into()))
        })
        .await
        .unwrap();

        assert_eq!(first, "CHEMBL203");
        assert_eq!(second, "CHEMBL203");
    }
}
