use std::path::PathBuf;

use thiserror::Error;

/// Failure reading a listing page or a profile. The collector logs it and
/// moves on to the next page/profile.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid url {url}: {source}")]
    BadUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl FetchError {
    /// Rate limiting, server errors and transport failures are worth another
    /// attempt; anything else will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => *status == 429 || (500..600).contains(status),
            FetchError::Client(_) | FetchError::BadUrl { .. } => false,
        }
    }
}

/// Failure reading or writing a record store. Always fatal for the run.
#[derive(Debug, Error)]
pub enum StoreIoError {
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Non-fatal signal that a field extraction met a shape it did not expect.
/// The field keeps its fallback (usually empty) value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {detail}")]
pub struct ParseAmbiguityWarning {
    pub field: &'static str,
    pub detail: String,
}

impl ParseAmbiguityWarning {
    pub fn new(field: &'static str, detail: impl Into<String>) -> Self {
        Self {
            field,
            detail: detail.into(),
        }
    }
}

/// Anything that stops a command before or during a run.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreIoError),

    #[error("configuration: {0}")]
    Config(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_policy() {
        let status = |status| FetchError::Status {
            url: "https://sasthyaseba.com".into(),
            status,
        };
        assert!(status(429).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(!status(403).is_retryable());
    }

    #[test]
    fn warning_display() {
        let w = ParseAmbiguityWarning::new("hospital", "no address line");
        assert_eq!(w.to_string(), "hospital: no address line");
    }
}
