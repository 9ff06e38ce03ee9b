//! Turning a cache key into a request URL.
//!
//! Only the outgoing request uses the canonical form. Keys in the store stay
//! exactly as the caller passed them.

use std::borrow::Cow;

use url::Url;

/// Why a key could not be used as a URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("URL has no host")]
    MissingHost,

    #[error("invalid URL: {0}")]
    Invalid(String),
}

/// Canonicalize `input` for an HTTP request.
///
/// Trims whitespace, assumes `https://` when no scheme is given, lowercases
/// the host (done by the `url` parser for http and https) and drops the
/// fragment. The query string is kept as written.
pub fn canonicalize(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let with_scheme = if trimmed.contains("://") {
        Cow::Borrowed(trimmed)
    } else {
        Cow::Owned(format!("https://{trimmed}"))
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| UrlError::Invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlError::UnsupportedScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);
    Ok(url)
}
