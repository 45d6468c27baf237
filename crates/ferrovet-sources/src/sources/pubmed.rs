//! PubMed E-utilities client.
//!
//! Literature depth comes from five esearch count queries issued
//! concurrently (`rettype=count`, no PMIDs transferred):
//!   all      SYMBOL[tiab]
//!   5-year   same, publication date within the last five calendar years
//!   1-year   same, `reldate=365`
//!   reviews  AND review[pt]
//!   clinical AND (clinical trial[pt] OR clinical study[pt])
//!
//! NCBI allows 3 requests per second without an API key and 10 with one,
//! so at most [`KEYLESS_CONCURRENCY`] queries are in flight when no key is set.
//!
//! Endpoint: https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use futures::{stream, StreamExt, TryStreamExt};
use ferrovet_common::validation::{count_field, FieldSpec, JsonKind};
use ferrovet_common::{GeneSymbol, RequestClient, SourceCache, SourceError, SourceId};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{check_shape, Fetched, SourceAdapter};
use crate::models::LiteratureRecord;

const ESEARCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";

pub const KEYLESS_CONCURRENCY: usize = 3;
pub const KEYED_CONCURRENCY: usize = 5;

const ESEARCH_SHAPE: &[FieldSpec] = &[
    FieldSpec::required("esearchresult.count", JsonKind::Numeric),
];

/// One esearch count request.
#[derive(Debug, Clone, PartialEq)]
pub struct CountQuery {
    pub label: &'static str,
    pub params: Vec<(&'static str, String)>,
}

/// Builds the five count queries for `symbol` as of `today`.
pub fn count_queries(symbol: &str, today: NaiveDate) -> [CountQuery; 5] {
    let base = format!("{symbol}[tiab]");
    let term = |t: String| ("term", t);
    let year = today.year();

    [
        CountQuery { label: "all", params: vec![term(base.clone())] },
        CountQuery {
            label: "5y",
            params: vec![
                term(base.clone()),
                ("datetype", "pdat".to_string()),
                ("mindate", (year - 4).to_string()),
                ("maxdate", year.to_string()),
            ],
        },
        CountQuery {
            label: "1y",
            params: vec![
                term(base.clone()),
                ("datetype", "pdat".to_string()),
                ("reldate", "365".to_string()),
            ],
        },
        CountQuery {
            label: "reviews",
            params: vec![term(format!("{base} AND review[pt]"))],
        },
        CountQuery {
            label: "clinical",
            params: vec![term(format!(
                "{base} AND (clinical trial[pt] OR clinical study[pt])"
            ))],
        },
    ]
}

/// PubMed adapter. No identifier resolution; the symbol is the query term.
pub struct PubMedSource {
    client: Arc<RequestClient>,
    cache: Arc<SourceCache>,
    api_key: Option<String>,
}

impl PubMedSource {
    pub fn new(client: Arc<RequestClient>, cache: Arc<SourceCache>, api_key: Option<String>) -> Self {
        Self { client, cache, api_key }
    }

    /// Count queries allowed in flight at once.
    pub fn concurrency(&self) -> usize {
        if self.api_key.is_some() {
            KEYED_CONCURRENCY
        } else {
            KEYLESS_CONCURRENCY
        }
    }

    async fn count(&self, query: &CountQuery) -> Result<Value, SourceError> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("rettype", "count".to_string()),
            ("retmode", "json".to_string()),
        ];
        params.extend(query.params.iter().cloned());
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }
        Ok(self.client.get_json(ESEARCH_URL, &params).await?)
    }
}

#[async_trait]
impl SourceAdapter for PubMedSource {
    type Record = LiteratureRecord;

    fn source(&self) -> SourceId {
        SourceId::PubMed
    }

    fn cache(&self) -> &SourceCache {
        &self.cache
    }

    #[instrument(skip(self), fields(gene = %gene))]
    async fn fetch(&self, gene: &GeneSymbol) -> Result<Fetched<LiteratureRecord>, SourceError> {
        let queries = count_queries(gene.as_str(), Utc::now().date_naive());

        let payloads = run_counts(&queries, self.concurrency(), |query| self.count(query)).await?;

        let mut diagnostics = Vec::new();
        for (query, payload) in queries.iter().zip(&payloads) {
            check_shape(SourceId::PubMed, query.label, payload, ESEARCH_SHAPE, &mut diagnostics);
        }

        let counts: Vec<u64> = payloads.iter().map(parse_count).collect();
        let record = summarize(
            &queries[0].params[0].1,
            counts[0],
            counts[1],
            counts[2],
            counts[3],
            counts[4],
        );
        debug!(
            total = record.total_publications,
            recent = record.recent_publications,
            "PubMed counts collected"
        );
        Ok(Fetched::with_diagnostics(record, diagnostics))
    }
}

/// Runs `count` over `queries` with at most `limit` requests in flight.
/// Payloads come back in query order; the first error aborts the rest.
pub async fn run_counts<'q, F, Fut>(
    queries: &'q [CountQuery],
    limit: usize,
    count: F,
) -> Result<Vec<Value>, SourceError>
where
    F: FnMut(&'q CountQuery) -> Fut,
    Fut: Future<Output = Result<Value, SourceError>>,
{
    // Futures are lazy, so building them up front does not start any request;
    // collecting first keeps the closure type out of the awaited future (Send).
    let pending: Vec<Fut> = queries.iter().map(count).collect();
    stream::iter(pending)
        .buffered(limit.max(1))
        .try_collect()
        .await
}

// ── Normalization ───────────────────────────────────────────────────────────

/// `esearchresult.count` is a decimal string.
pub fn parse_count(payload: &Value) -> u64 {
    count_field(&payload["esearchresult"]["count"]).unwrap_or(0)
}

pub fn summarize(
    query_term: &str,
    total: u64,
    recent: u64,
    last_year: u64,
    reviews: u64,
    clinical: u64,
) -> LiteratureRecord {
    let recent_share = if total > 0 {
        recent as f64 / total as f64
    } else {
        0.0
    };
    LiteratureRecord {
        query_term: query_term.to_string(),
        total_publications: total,
        recent_publications: recent,
        last_year_publications: last_year,
        review_count: reviews,
        clinical_publications: clinical,
        recent_share,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_count_queries_cover_five_windows() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let queries = count_queries("KRAS", today);

        assert_eq!(queries[0].params, vec![("term", "KRAS[tiab]".to_string())]);
        assert!(queries[1].params.contains(&("mindate", "2021".to_string())));
        assert!(queries[1].params.contains(&("maxdate", "2025".to_string())));
        assert!(queries[2].params.contains(&("reldate", "365".to_string())));
        assert_eq!(queries[3].params[0].1, "KRAS[tiab] AND review[pt]");
        assert!(queries[4].params[0].1.contains("clinical trial[pt] OR clinical study[pt]"));
    }

    #[test]
    fn test_parse_count_string() {
        let payload = json!({"header": {"type": "esearch"}, "esearchresult": {"count": "21408"}});
        assert_eq!(parse_count(&payload), 21408);
        assert_eq!(parse_count(&json!({"esearchresult": {}})), 0);
    }

    #[test]
    fn test_concurrency_capped_without_key() {
        let client = Arc::new(RequestClient::new(Default::default()).unwrap());
        let cache = Arc::new(SourceCache::default());

        let keyless = PubMedSource::new(client.clone(), cache.clone(), None);
        assert_eq!(keyless.concurrency(), 3);

        let keyed = PubMedSource::new(client, cache, Some("abc123".into()));
        assert_eq!(keyed.concurrency(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_counts_limits_requests_in_flight() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::time::Duration;

        let queries = count_queries("EGFR", NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        for (limit, expected_peak) in [(KEYLESS_CONCURRENCY, 3), (KEYED_CONCURRENCY, 5)] {
            let in_flight = AtomicUsize::new(0);
            let peak = AtomicUsize::new(0);
            let payloads = run_counts(&queries, limit, |query| {
                let (in_flight, peak) = (&in_flight, &peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(400)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(json!({"esearchresult": {"count": query.label}}))
                }
            })
            .await
            .unwrap();

            assert_eq!(peak.load(Ordering::SeqCst), expected_peak);
            let labels: Vec<&str> = payloads
                .iter()
                .map(|p| p["esearchresult"]["count"].as_str().unwrap())
                .collect();
            assert_eq!(labels, vec!["all", "5y", "1y", "reviews", "clinical"]);
        }
    }

    #[tokio::test]
    async fn test_run_counts_surfaces_first_error() {
        let queries = count_queries("EGFR", NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        let result = run_counts(&queries, KEYLESS_CONCURRENCY, |query| async move {
            if query.label == "reviews" {
                Err(SourceError::Payload("HTTP 429".into()))
            } else {
                Ok(json!({"esearchresult": {"count": "1"}}))
            }
        })
        .await;
        assert!(matches!(result, Err(SourceError::Payload(_))));
    }

    #[test]
    fn test_recent_share() {
        let record = summarize("TP53[tiab]", 1000, 250, 60, 80, 40);
        assert_eq!(record.recent_share, 0.25);
        assert_eq!(summarize("X[tiab]", 0, 0, 0, 0, 0).recent_share, 0.0);
    }
}
