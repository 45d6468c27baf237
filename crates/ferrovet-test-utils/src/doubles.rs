//! `SourceAdapter` test doubles.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ferrovet_common::{GeneSymbol, SourceCache, SourceError, SourceId};
use ferrovet_sources::{Fetched, SourceAdapter};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Returns a fixed record, optionally after a delay. Counts fetches.
pub struct StaticAdapter<R> {
    source: SourceId,
    record: R,
    delay: Option<Duration>,
    cache: Arc<SourceCache>,
    calls: AtomicU32,
}

impl<R> StaticAdapter<R> {
    pub fn new(source: SourceId, record: R) -> Self {
        Self {
            source,
            record,
            delay: None,
            cache: Arc::new(SourceCache::default()),
            calls: AtomicU32::new(0),
        }
    }

    /// Sleeps for `delay` before answering; use with a paused clock.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_cache(mut self, cache: Arc<SourceCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Number of times `fetch` ran (cache hits excluded).
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<R> SourceAdapter for StaticAdapter<R>
where
    R: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Record = R;

    fn source(&self) -> SourceId {
        self.source
    }

    fn cache(&self) -> &SourceCache {
        &self.cache
    }

    async fn fetch(&self, _gene: &GeneSymbol) -> Result<Fetched<R>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(Fetched::new(self.record.clone()))
    }
}

/// Always fails with a payload error.
pub struct FailingAdapter<R> {
    source: SourceId,
    message: String,
    cache: SourceCache,
    _record: PhantomData<fn() -> R>,
}

impl<R> FailingAdapter<R> {
    pub fn new(source: SourceId, message: impl Into<String>) -> Self {
        Self {
            source,
            message: message.into(),
            cache: SourceCache::default(),
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<R> SourceAdapter for FailingAdapter<R>
where
    R: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Record = R;

    fn source(&self) -> SourceId {
        self.source
    }

    fn cache(&self) -> &SourceCache {
        &self.cache
    }

    async fn fetch(&self, _gene: &GeneSymbol) -> Result<Fetched<R>, SourceError> {
        Err(SourceError::Payload(self.message.clone()))
    }
}

/// Panics inside `fetch`.
pub struct PanickingAdapter<R> {
    source: SourceId,
    cache: SourceCache,
    _record: PhantomData<fn() -> R>,
}

impl<R> PanickingAdapter<R> {
    pub fn new(source: SourceId) -> Self {
        Self {
            source,
            cache: SourceCache::default(),
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<R> SourceAdapter for PanickingAdapter<R>
where
    R: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Record = R;

    fn source(&self) -> SourceId {
        self.source
    }

    fn cache(&self) -> &SourceCache {
        &self.cache
    }

    async fn fetch(&self, gene: &GeneSymbol) -> Result<Fetched<R>, SourceError> {
        panic!("{} adapter exploded on {gene}", self.source);
    }
}
