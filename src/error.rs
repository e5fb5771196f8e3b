use thiserror::Error;

/// Failures while fetching a page. Fatal to the single fetch that raised it.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] wreq::Error),

    #[error("rate limited by {url} (status {status})")]
    Throttled { status: u16, url: String },

    #[error("Request failed with status: {status} ({url})")]
    Status { status: u16, url: String },

    #[error("request timed out: {url}")]
    Timeout { url: String },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("unsupported transport: {0}")]
    Unsupported(String),
}

impl TransportError {
    /// Returns true for throttling responses that warrant a backoff retry.
    pub fn is_throttled(&self) -> bool {
        matches!(self, TransportError::Throttled { .. })
    }

    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16, url: &str) -> Self {
        match status {
            429 | 503 => TransportError::Throttled { status, url: url.to_string() },
            _ => TransportError::Status { status, url: url.to_string() },
        }
    }
}
