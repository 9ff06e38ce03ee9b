//! HTTP fetcher for the caching interceptor.
//!
//! ### Request shaping
//! - The key is canonicalized into an http(s) URL (see [`canonicalize`])
//! - Redirects are followed up to `max_redirects`
//! - Bodies over `max_bytes` are rejected, by `Content-Length` first and
//!   then while reading
//!
//! With `error_on_status` set (the default) any non-2xx status is an error,
//! so the interceptor never caches an error page. With it cleared, the body
//! is returned whatever the status.

mod error;
pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use pagetally_core::{AppConfig, Fetcher};
use reqwest::{Client, StatusCode, Url, header};

pub use error::FetchError;
pub use url::{UrlError, canonicalize};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "pagetally/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Treat non-2xx responses as errors (default: true)
    pub error_on_status: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: 5,
            error_on_status: config.error_on_status,
        }
    }
}

/// An upstream response with its body read.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Final URL after redirects
    pub url: Url,
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub bytes: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl FetchResponse {
    /// Body as text. Invalid UTF-8 sequences are replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// HTTP client with size and redirect limits.
#[derive(Debug, Clone)]
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Build a client from `config`.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| FetchError::Setup(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// GET `target` after canonicalizing it.
    pub async fn get(&self, target: &str) -> Result<FetchResponse, FetchError> {
        let start = Instant::now();
        let url = canonicalize(target)?;

        let mut response = self.http.get(url.as_str()).send().await?;

        let status = response.status();
        if self.config.error_on_status && !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let limit = self.config.max_bytes;
        if let Some(len) = response.content_length()
            && len > limit as u64
        {
            return Err(FetchError::TooLarge { size: len, limit });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            let size = body.len() + chunk.len();
            if size > limit {
                return Err(FetchError::TooLarge {
                    size: size as u64,
                    limit,
                });
            }
            body.extend_from_slice(&chunk);
        }
        let bytes = body.freeze();

        let fetch_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(url = %final_url, fetch_ms, bytes = bytes.len(), "fetched");

        Ok(FetchResponse {
            url: final_url,
            status,
            content_type,
            bytes,
            fetch_ms,
        })
    }
}

#[async_trait]
impl Fetcher for FetchClient {
    type Error = FetchError;

    async fn fetch(&self, key: &str) -> Result<String, FetchError> {
        Ok(self.get(key).await?.text())
    }
}
