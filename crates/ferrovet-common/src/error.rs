use std::time::Duration;

use thiserror::Error;

/// Failures raised by the resilient request client.
///
/// Transient variants (`Timeout`, `Network`, `Server`) are retried by
/// [`crate::http::retry_with_backoff`]; everything else is surfaced on the
/// first attempt.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    #[error("request timed out after {} ms", .0.as_millis())]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("server error: HTTP {status}")]
    Server { status: u16 },

    #[error("client error: HTTP {status}: {body}")]
    Client { status: u16, body: String },

    #[error("response decode error: {0}")]
    Decode(String),

    #[error("request could not be replayed for retry")]
    NotReplayable,

    #[error("Network capabilities capped: host not in allowlist for URL {0}")]
    Security(String),
}

impl HttpError {
    /// 5xx responses and network/timeout failures are worth another attempt;
    /// client-side errors are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            HttpError::Timeout(_) | HttpError::Network(_) | HttpError::Server { .. }
        )
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Server { status } | HttpError::Client { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            HttpError::Decode(err.to_string())
        } else {
            HttpError::Network(err.to_string())
        }
    }
}

/// Errors a source adapter can produce. Caught at the adapter boundary and
/// rendered into the envelope's `error` string.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("no {source_name} record found for {identifier}")]
    NotFound {
        source_name: &'static str,
        identifier: String,
    },

    #[error("unexpected payload: {0}")]
    Payload(String),

    #[error("cache encoding error: {0}")]
    Cache(#[from] serde_json::Error),
}

impl SourceError {
    pub fn not_found(source_name: &'static str, identifier: impl Into<String>) -> Self {
        SourceError::NotFound {
            source_name,
            identifier: identifier.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(HttpError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(HttpError::Network("reset".into()).is_transient());
        assert!(HttpError::Server { status: 503 }.is_transient());
        assert!(!HttpError::Client { status: 404, body: String::new() }.is_transient());
        assert!(!HttpError::Decode("eof".into()).is_transient());
        assert!(!HttpError::Security("http://evil.test".into()).is_transient());
    }

    #[test]
    fn test_timeout_message_in_millis() {
        let err = HttpError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "request timed out after 1500 ms");
    }

    #[test]
    fn test_not_found_message() {
        let err = SourceError::not_found("ChEMBL target", "NOTAGENE");
        assert_eq!(err.to_string(), "no ChEMBL target record found for NOTAGENE");
    }
}
