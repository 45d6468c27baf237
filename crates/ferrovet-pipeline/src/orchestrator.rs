//! Concurrent fan-out over the seven source adapters.
//!
//! Each adapter runs in its own spawned task so an error or a panic in one
//! provider cannot disturb the others. Every handle is settled into an
//! envelope; nothing here returns an error.

use std::sync::Arc;
use std::time::Duration;

use ferrovet_common::{GeneSymbol, RequestClient, SourceCache, SourceEnvelope, SourceId, SourcesConfig};
use ferrovet_sources::models::{
    ChemistryRecord, ClinicalRecord, GeneticsRecord, LiteratureRecord, PreprintRecord,
    RegulatoryRecord, StructureRecord,
};
use ferrovet_sources::{
    BioRxivSource, ChemblSource, ClinicalTrialsSource, EnsemblSource, OpenTargetsSource,
    PubMedSource, SourceAdapter, StructureSource,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

type Adapter<R> = Arc<dyn SourceAdapter<Record = R>>;

/// One adapter per provider.
#[derive(Clone)]
pub struct SourceSet {
    pub open_targets: Adapter<GeneticsRecord>,
    pub chembl: Adapter<ChemistryRecord>,
    pub pubmed: Adapter<LiteratureRecord>,
    pub clinical_trials: Adapter<ClinicalRecord>,
    pub biorxiv: Adapter<PreprintRecord>,
    pub structures: Adapter<StructureRecord>,
    pub ensembl: Adapter<RegulatoryRecord>,
}

impl SourceSet {
    /// The production adapters, sharing one client and one cache.
    pub fn live(client: Arc<RequestClient>, cache: Arc<SourceCache>, config: &SourcesConfig) -> Self {
        Self {
            open_targets: Arc::new(OpenTargetsSource::new(client.clone(), cache.clone())),
            chembl: Arc::new(ChemblSource::new(client.clone(), cache.clone())),
            pubmed: Arc::new(PubMedSource::new(client.clone(), cache.clone(), config.ncbi_api_key.clone())),
            clinical_trials: Arc::new(ClinicalTrialsSource::new(client.clone(), cache.clone())),
            biorxiv: Arc::new(BioRxivSource::new(
                client.clone(),
                cache.clone(),
                config.biorxiv_pages,
                config.biorxiv_window_days,
            )),
            structures: Arc::new(StructureSource::new(client.clone(), cache.clone())),
            ensembl: Arc::new(EnsemblSource::new(client, cache, config.ensembl_flank_bp)),
        }
    }
}

/// The seven envelopes of one profile build, in fixed key order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEnvelopes {
    pub open_targets: SourceEnvelope<GeneticsRecord>,
    pub chembl: SourceEnvelope<ChemistryRecord>,
    pub pubmed: SourceEnvelope<LiteratureRecord>,
    pub clinical_trials: SourceEnvelope<ClinicalRecord>,
    pub biorxiv: SourceEnvelope<PreprintRecord>,
    pub structures: SourceEnvelope<StructureRecord>,
    pub ensembl: SourceEnvelope<RegulatoryRecord>,
}

impl SourceEnvelopes {
    /// `(source, success)` for every envelope, in key order.
    pub fn outcomes(&self) -> [(SourceId, bool); 7] {
        [
            (self.open_targets.source(), self.open_targets.success()),
            (self.chembl.source(), self.chembl.success()),
            (self.pubmed.source(), self.pubmed.success()),
            (self.clinical_trials.source(), self.clinical_trials.success()),
            (self.biorxiv.source(), self.biorxiv.success()),
            (self.structures.source(), self.structures.success()),
            (self.ensembl.source(), self.ensembl.success()),
        ]
    }

    pub fn completed(&self) -> usize {
        self.outcomes().iter().filter(|(_, ok)| *ok).count()
    }

    pub fn failed(&self) -> Vec<SourceId> {
        self.outcomes()
            .into_iter()
            .filter(|(_, ok)| !ok)
            .map(|(source, _)| source)
            .collect()
    }
}

pub struct Orchestrator {
    sources: SourceSet,
    deadline: Option<Duration>,
}

impl Orchestrator {
    pub fn new(sources: SourceSet) -> Self {
        Self { sources, deadline: None }
    }

    /// Bounds the whole fan-out; adapters still running at the deadline are
    /// aborted and recorded as failed.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Runs every adapter concurrently and waits for all of them to settle.
    #[instrument(skip(self), fields(gene = %gene))]
    pub async fn collect_all(&self, gene: &GeneSymbol) -> SourceEnvelopes {
        let started = Instant::now();
        let deadline = self.deadline.map(|d| started + d);
        let s = &self.sources;

        let open_targets = spawn_adapter(&s.open_targets, gene);
        let chembl = spawn_adapter(&s.chembl, gene);
        let pubmed = spawn_adapter(&s.pubmed, gene);
        let clinical_trials = spawn_adapter(&s.clinical_trials, gene);
        let biorxiv = spawn_adapter(&s.biorxiv, gene);
        let structures = spawn_adapter(&s.structures, gene);
        let ensembl = spawn_adapter(&s.ensembl, gene);

        let (open_targets, chembl, pubmed, clinical_trials, biorxiv, structures, ensembl) = tokio::join!(
            settle(SourceId::OpenTargets, open_targets, started, deadline),
            settle(SourceId::Chembl, chembl, started, deadline),
            settle(SourceId::PubMed, pubmed, started, deadline),
            settle(SourceId::ClinicalTrials, clinical_trials, started, deadline),
            settle(SourceId::BioRxiv, biorxiv, started, deadline),
            settle(SourceId::Structures, structures, started, deadline),
            settle(SourceId::Ensembl, ensembl, started, deadline),
        );

        let envelopes = SourceEnvelopes {
            open_targets,
            chembl,
            pubmed,
            clinical_trials,
            biorxiv,
            structures,
            ensembl,
        };
        info!(
            completed = envelopes.completed(),
            failed = envelopes.failed().len(),
            elapsed_ms = elapsed_ms(started),
            "Source fan-out settled"
        );
        envelopes
    }
}

fn spawn_adapter<R>(adapter: &Adapter<R>, gene: &GeneSymbol) -> JoinHandle<SourceEnvelope<R>>
where
    R: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    let adapter = Arc::clone(adapter);
    let gene = gene.clone();
    tokio::spawn(async move { adapter.collect(&gene).await })
}

/// Turns a task handle into an envelope: joined, timed out or crashed.
async fn settle<R>(
    source: SourceId,
    mut handle: JoinHandle<SourceEnvelope<R>>,
    started: Instant,
    deadline: Option<Instant>,
) -> SourceEnvelope<R> {
    let joined = match deadline {
        Some(at) => match tokio::time::timeout_at(at, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                let waited = elapsed_ms(started);
                warn!(source = %source, waited_ms = waited, "Source adapter missed the profile deadline");
                return SourceEnvelope::failed(
                    source,
                    format!("{} did not respond within the {waited} ms profile deadline", source.display_name()),
                    waited,
                );
            }
        },
        None => handle.await,
    };

    match joined {
        Ok(envelope) => {
            debug!(source = %source, success = envelope.success(), "Source adapter settled");
            envelope
        }
        Err(e) => {
            let reason = if e.is_panic() { "panicked" } else { "was cancelled" };
            error!(source = %source, error = %e, "Source adapter task {reason}");
            SourceEnvelope::failed(
                source,
                format!("{} adapter {reason}", source.display_name()),
                elapsed_ms(started),
            )
        }
    }
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
