//! Resilient HTTP client used by every source adapter.
//!
//! Wraps `reqwest::Client` with three policies:
//!   - a host allowlist (requests to any other host fail without network I/O)
//!   - a per-request timeout that cancels the in-flight request
//!   - bounded retries with exponential backoff on transient failures
//!     (5xx, network errors, timeouts); 4xx responses are returned at once

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, ClientBuilder, Method, Request, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::HttpError;

const FERROVET_USER_AGENT: &str = concat!("ferrovet/", env!("CARGO_PKG_VERSION"));

/// Provider hosts the pipeline is allowed to reach.
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &[
    "api.platform.opentargets.org", // Open Targets GraphQL
    "www.ebi.ac.uk",                // ChEMBL
    "eutils.ncbi.nlm.nih.gov",      // PubMed E-utilities
    "clinicaltrials.gov",           // ClinicalTrials.gov v2
    "api.biorxiv.org",              // bioRxiv
    "rest.uniprot.org",             // UniProt
    "search.rcsb.org",              // RCSB search
    "data.rcsb.org",                // RCSB entry data
    "alphafold.ebi.ac.uk",          // AlphaFold DB
    "rest.ensembl.org",             // Ensembl REST
];

/// Timeout and retry budget for one logical request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub retries: u32,
    /// Applied to each attempt separately.
    pub timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            timeout: Duration::from_secs(15),
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Runs `fut`, failing with [`HttpError::Timeout`] if it does not settle
/// within `timeout`. Dropping the future cancels the underlying request.
pub async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, HttpError>
where
    F: Future<Output = Result<T, HttpError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(HttpError::Timeout(timeout)),
    }
}

/// Attempts `operation` up to `policy.retries + 1` times.
///
/// Only transient errors are retried. When attempts run out the last
/// observed error is returned.
pub async fn retry_with_backoff<T, F, Fut>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, HttpError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, HttpError>>,
{
    let max_attempts = policy.retries + 1;
    let mut backoff = policy.initial_backoff;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation = operation_name, attempt, "Request succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if err.is_transient() && attempt < max_attempts => {
                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "Transient request failure, will retry after backoff"
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(policy.max_backoff);
            }
            Err(err) => {
                if err.is_transient() {
                    warn!(
                        operation = operation_name,
                        attempts = attempt,
                        error = %err,
                        "Request failed: retries exhausted"
                    );
                }
                return Err(err);
            }
        }
    }
}

/// An allowlist-capped HTTP client with timeout and retry policies.
#[derive(Debug, Clone)]
pub struct RequestClient {
    client: Client,
    allowlist: HashSet<String>,
    policy: RetryPolicy,
}

impl RequestClient {
    /// Creates a client allowed to reach the seven provider hosts.
    pub fn new(policy: RetryPolicy) -> Result<Self, HttpError> {
        let client = ClientBuilder::new()
            .connect_timeout(policy.timeout)
            .build()
            .map_err(|e| HttpError::Network(format!("failed to build HTTP client: {e}")))?;

        let allowlist = DEFAULT_ALLOWED_HOSTS.iter().map(|d| d.to_string()).collect();

        Ok(Self { client, allowlist, policy })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_host(&mut self, host: &str) {
        self.allowlist.insert(host.to_string());
    }

    /// Whether a URL is permitted: exact host match or a subdomain of an allowed host.
    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        self.allowlist
            .iter()
            .any(|allowed| host == allowed || host.ends_with(&format!(".{allowed}")))
    }

    fn check(&self, url: &str) -> Result<(), HttpError> {
        if self.is_allowed(url) {
            Ok(())
        } else {
            Err(HttpError::Security(url.to_string()))
        }
    }

    pub fn get(&self, url: &str) -> Result<RequestBuilder, HttpError> {
        self.request(Method::GET, url)
    }

    pub fn post(&self, url: &str) -> Result<RequestBuilder, HttpError> {
        self.request(Method::POST, url)
    }

    pub fn request(&self, method: Method, url: &str) -> Result<RequestBuilder, HttpError> {
        self.check(url)?;
        Ok(self
            .client
            .request(method, url)
            .header(USER_AGENT, FERROVET_USER_AGENT)
            .header(ACCEPT, "application/json"))
    }

    /// Issues one request, cancelled if it exceeds `timeout`.
    pub async fn request_with_timeout(
        &self,
        request: Request,
        timeout: Duration,
    ) -> Result<Response, HttpError> {
        self.check(request.url().as_str())?;
        with_timeout(timeout, async {
            self.client.execute(request).await.map_err(HttpError::from)
        })
        .await
    }

    /// Issues `request` with up to `retries` extra attempts.
    ///
    /// 5xx responses count as failures and are retried; 4xx responses are
    /// handed back to the caller unchanged.
    pub async fn request_with_retry(
        &self,
        request: Request,
        retries: u32,
        timeout: Duration,
    ) -> Result<Response, HttpError> {
        let policy = self.policy.with_retries(retries).with_timeout(timeout);
        let label = format!("{} {}", request.method(), request.url().path());

        retry_with_backoff(&label, &policy, |_attempt| {
            let attempt = request.try_clone();
            async move {
                let attempt = attempt.ok_or(HttpError::NotReplayable)?;
                let response = self.request_with_timeout(attempt, timeout).await?;
                let status = response.status();
                if status.is_server_error() {
                    return Err(HttpError::Server { status: status.as_u16() });
                }
                Ok(response)
            }
        })
        .await
    }

    /// Sends a built request with the client's default policy and decodes a JSON body.
    ///
    /// A 4xx becomes [`HttpError::Client`] (never retried). An empty body
    /// (e.g. HTTP 204) decodes to `Value::Null`.
    pub async fn send_json(&self, builder: RequestBuilder) -> Result<Value, HttpError> {
        let request = builder.build()?;
        let url = request.url().clone();
        let response = self
            .request_with_retry(request, self.policy.retries, self.policy.timeout)
            .await?;

        let status = response.status();
        let body = with_timeout(self.policy.timeout, async {
            response.bytes().await.map_err(HttpError::from)
        })
        .await?;

        if status.is_client_error() {
            let excerpt: String = String::from_utf8_lossy(&body).chars().take(200).collect();
            return Err(HttpError::Client {
                status: status.as_u16(),
                body: excerpt,
            });
        }

        debug!(url = %url, status = status.as_u16(), bytes = body.len(), "HTTP response received");

        if body.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body).map_err(|e| HttpError::Decode(e.to_string()))
    }

    pub async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, HttpError> {
        let builder = self.get(url)?.query(query);
        self.send_json(builder).await
    }

    pub async fn post_json(&self, url: &str, body: &Value) -> Result<Value, HttpError> {
        let builder = self.post(url)?.json(body);
        self.send_json(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            timeout: Duration::from_secs(1),
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_retry_succeeds_first_attempt() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff("op", &fast_policy(2), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, HttpError>(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_errors_retried_until_exhausted() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_backoff("op", &fast_policy(2), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(HttpError::Server { status: 500 + attempt as u16 }) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3, "retries + 1 attempts");
        // last observed error is surfaced
        assert_eq!(result.unwrap_err().status(), Some(503));
    }

    #[tokio::test]
    async fn test_client_errors_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_backoff("op", &fast_policy(5), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(HttpError::Client { status: 404, body: "not found".into() }) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.unwrap_err().status(), Some(404));
    }

    #[tokio::test]
    async fn test_transient_then_success() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff("op", &fast_policy(3), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(HttpError::Network("connection reset".into()))
                } else {
                    Ok("ok")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_surfaces_timeout() {
        let result: Result<(), _> = with_timeout(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(HttpError::Timeout(d)) if d == Duration::from_millis(50)));
    }

    #[test]
    fn test_with_timeout_passes_value_through() {
        let result = tokio_test::block_on(with_timeout(Duration::from_secs(1), async { Ok::<_, HttpError>(7) }));
        assert_eq!(tokio_test::assert_ok!(result), 7);
    }

    #[test]
    fn test_allowlist() {
        let client = RequestClient::new(RetryPolicy::default()).unwrap();
        assert!(client.is_allowed("https://www.ebi.ac.uk/chembl/api/data/target/search.json"));
        assert!(client.is_allowed("https://rest.ensembl.org/lookup/symbol/homo_sapiens/EGFR"));
        assert!(!client.is_allowed("https://example.com/"));
        assert!(!client.is_allowed("not a url"));
    }

    #[test]
    fn test_disallowed_host_rejected_without_io() {
        let client = RequestClient::new(RetryPolicy::default()).unwrap();
        let err = client.get("https://example.com/data").unwrap_err();
        assert!(matches!(err, HttpError::Security(_)));
    }

    #[test]
    fn test_allow_host_extends_allowlist() {
        let mut client = RequestClient::new(RetryPolicy::default()).unwrap();
        client.allow_host("mirror.internal.test");
        assert!(client.is_allowed("http://mirror.internal.test/api"));
    }
}
