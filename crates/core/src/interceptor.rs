//! Cache-aside wrapper around an expensive fetch.
//!
//! Every [`CachingInterceptor::invoke`] call runs the same sequence against the
//! store:
//!
//! 1. `INCR count:<key>` (on hits and misses alike)
//! 2. `GET cached:<key>`; a hit is returned as-is
//! 3. on a miss: fetch, `SET count:<key> 0`, store `cached:<key>` with the TTL
//!
//! The steps are separate store calls, not a transaction. Two concurrent
//! misses on one key both run the fetch, and a reset can swallow increments
//! made by other callers while the fetch was in flight.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{InvokeError, StoreError};
use crate::keys::{cached_key, counter_key};
use crate::store::{KeyValueStore, parse_counter};

/// Default lifetime of a cached value.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10);

/// The expensive operation being accelerated.
#[async_trait]
pub trait Fetcher: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Produce the value for `key`.
    async fn fetch(&self, key: &str) -> Result<String, Self::Error>;
}

/// [`Fetcher`] built from an async closure. See [`fetch_fn`].
#[derive(Clone)]
pub struct FnFetcher<F>(F);

/// Wrap `f` as a [`Fetcher`].
///
/// ```ignore
/// let fetcher = fetch_fn(|url: String| async move { client.get(&url).await });
/// ```
pub fn fetch_fn<F>(f: F) -> FnFetcher<F> {
    FnFetcher(f)
}

#[async_trait]
impl<F, Fut, E> Fetcher for FnFetcher<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, E>> + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    async fn fetch(&self, key: &str) -> Result<String, E> {
        (self.0)(key.to_string()).await
    }
}

/// Counts requests per key and serves cached results within a TTL.
///
/// Holds no state of its own beyond its collaborators; any number of
/// interceptors, in any number of processes, can share one store.
pub struct CachingInterceptor<F> {
    store: Arc<dyn KeyValueStore>,
    fetcher: F,
    ttl: Duration,
}

impl<F: Fetcher> CachingInterceptor<F> {
    pub fn new(store: Arc<dyn KeyValueStore>, fetcher: F, ttl: Duration) -> Self {
        Self {
            store,
            fetcher,
            ttl,
        }
    }

    /// Same as [`new`](Self::new) with [`DEFAULT_TTL`].
    pub fn with_default_ttl(store: Arc<dyn KeyValueStore>, fetcher: F) -> Self {
        Self::new(store, fetcher, DEFAULT_TTL)
    }

    /// Return the value for `key`, from cache when a live copy exists.
    ///
    /// Any stored value counts as a hit, including an empty one.
    ///
    /// # Errors
    ///
    /// - `InvokeError::Fetch` when the wrapped fetch fails. Nothing is cached
    ///   and the counter keeps this call's increment.
    /// - `InvokeError::Store` when the store is unreachable or holds a value
    ///   that is not valid UTF-8 text.
    pub async fn invoke(&self, key: &str) -> Result<String, InvokeError<F::Error>> {
        let count_key = counter_key(key);
        let value_key = cached_key(key);

        let count = self.store.increment(&count_key).await?;

        if let Some(bytes) = self.store.get(&value_key).await? {
            let value = String::from_utf8(bytes)
                .map_err(|e| StoreError::corrupt(&value_key, e.to_string()))?;
            tracing::debug!(key, count, "cache hit");
            return Ok(value);
        }

        tracing::debug!(key, count, "cache miss");

        let value = match self.fetcher.fetch(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, count, error = %e, "fetch failed; counter left as is");
                return Err(InvokeError::Fetch(e));
            }
        };

        self.store.set(&count_key, b"0").await?;
        self.store
            .set_with_ttl(&value_key, value.as_bytes(), self.ttl)
            .await?;

        let ttl_secs = self.ttl.as_secs_f64();
        tracing::debug!(key, bytes = value.len(), ttl_secs, "cached fresh value");
        Ok(value)
    }

    /// Requests seen for `key` since it was last cached. Absent counts as 0.
    pub async fn request_count(&self, key: &str) -> Result<i64, StoreError> {
        let count_key = counter_key(key);
        match self.store.get(&count_key).await? {
            Some(raw) => parse_counter(&count_key, &raw),
            None => Ok(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }
}

impl<F> std::fmt::Debug for CachingInterceptor<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingInterceptor")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
