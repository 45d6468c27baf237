//! Library entry points: profile build and candidate search.

use std::sync::Arc;

use async_trait::async_trait;
use ferrovet_common::{
    GeneSymbol, HttpError, PipelineConfig, RequestClient, SourceCache, SourceError, SourcesConfig,
};
use ferrovet_ranker::DimensionWeights;
use ferrovet_sources::models::TargetCandidate;
use ferrovet_sources::sources::opentargets::MAX_SEARCH_RESULTS;
use ferrovet_sources::OpenTargetsSource;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use crate::assembler::{assemble_profile, TargetProfile};
use crate::error::ProfileError;
use crate::orchestrator::{elapsed_ms, Orchestrator, SourceSet};

/// Incremental target search, independent of the scoring pipeline.
#[async_trait]
pub trait CandidateSearch: Send + Sync {
    async fn find_candidates(&self, query: &str, limit: usize) -> Result<Vec<TargetCandidate>, SourceError>;
}

#[async_trait]
impl CandidateSearch for OpenTargetsSource {
    async fn find_candidates(&self, query: &str, limit: usize) -> Result<Vec<TargetCandidate>, SourceError> {
        self.search_candidates(query, limit).await
    }
}

pub struct TargetValidator {
    orchestrator: Orchestrator,
    search: Arc<dyn CandidateSearch>,
    weights: DimensionWeights,
    cache: Arc<SourceCache>,
}

impl TargetValidator {
    pub fn new(orchestrator: Orchestrator, search: Arc<dyn CandidateSearch>, cache: Arc<SourceCache>) -> Self {
        Self {
            orchestrator,
            search,
            weights: DimensionWeights::default(),
            cache,
        }
    }

    /// Wires the production adapters from configuration: one request client
    /// and one cache shared by all seven providers.
    pub fn live(pipeline: &PipelineConfig, sources: &SourcesConfig) -> Result<Self, HttpError> {
        let mut client = RequestClient::new(pipeline.retry_policy())?;
        for host in &sources.extra_allowed_hosts {
            client.allow_host(host);
        }
        let client = Arc::new(client);
        let cache = Arc::new(SourceCache::new(pipeline.cache_ttl()));

        let search = Arc::new(OpenTargetsSource::new(client.clone(), cache.clone()));
        let orchestrator = Orchestrator::new(SourceSet::live(client, cache.clone(), sources))
            .with_deadline(pipeline.profile_deadline());

        info!(
            ttl_secs = pipeline.cache_ttl_secs,
            deadline_ms = pipeline.profile_deadline_ms,
            retries = pipeline.retries,
            "Target validator ready"
        );
        Ok(Self::new(orchestrator, search, cache))
    }

    /// Replaces the combiner weights. Weights that do not sum to one are
    /// rescaled first.
    pub fn with_weights(mut self, mut weights: DimensionWeights) -> Self {
        if !weights.validate() {
            warn!(sum = weights.sum(), "Dimension weights do not sum to 1, normalising");
            weights.normalise();
        }
        self.weights = weights;
        self
    }

    pub fn weights(&self) -> &DimensionWeights {
        &self.weights
    }

    pub fn cache(&self) -> &SourceCache {
        &self.cache
    }

    /// Builds the full validation profile for `gene_symbol`.
    ///
    /// Only a malformed symbol is an error; provider failures show up as
    /// failed envelopes and zero-scored dimensions inside the profile.
    #[instrument(skip(self))]
    pub async fn build_target_profile(&self, gene_symbol: &str) -> Result<TargetProfile, ProfileError> {
        let gene = GeneSymbol::parse(gene_symbol)?;
        let started = Instant::now();

        let envelopes = self.orchestrator.collect_all(&gene).await;
        let profile = assemble_profile(&gene, envelopes, &self.weights, elapsed_ms(started));

        info!(
            gene = %gene,
            score = profile.score.value,
            completed = profile.metadata.services_completed,
            failed = profile.metadata.services_failed,
            elapsed_ms = profile.metadata.total_response_time_ms,
            "Target profile built"
        );
        Ok(profile)
    }

    /// Up to ten `{id, name, symbol}` candidates; a blank query yields none.
    pub async fn search_candidates(&self, query: &str) -> Result<Vec<TargetCandidate>, SourceError> {
        self.search_candidates_limited(query, MAX_SEARCH_RESULTS).await
    }

    pub async fn search_candidates_limited(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<TargetCandidate>, SourceError> {
        self.search.find_candidates(query, limit).await
    }
}
