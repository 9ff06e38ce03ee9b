//! Fetch error types.

use std::sync::Arc;

use super::url::UrlError;

/// Errors from [`FetchClient`](super::FetchClient).
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The key could not be turned into an http(s) URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),

    /// The HTTP client could not be built.
    #[error("client setup failed: {0}")]
    Setup(String),

    /// Upstream answered with a non-success status.
    #[error("HTTP error: status {status} for {url}")]
    Status { status: u16, url: String },

    /// Body larger than the configured limit.
    #[error("response too large: {size} bytes exceeds {limit}")]
    TooLarge { size: u64, limit: usize },

    /// Request timed out.
    #[error("request timeout")]
    Timeout,

    /// Network or protocol failure.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(Arc::new(err))
        }
    }
}
