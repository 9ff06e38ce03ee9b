//! In-process store with TTL support.
//!
//! Entries live in a `HashMap` behind a tokio `RwLock`. Expiry deadlines use
//! `tokio::time::Instant`, so a paused test runtime controls when entries
//! expire.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{KeyValueStore, StoreError, encode_counter, parse_counter};

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// Shared in-memory key-value store.
///
/// Cloning yields another handle to the same map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining lifetime of `key`, or `None` if it is absent, expired or has no expiry.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .and_then(|entry| entry.expires_at)
            .map(|deadline| deadline - now)
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        let (current, expires_at) = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                (parse_counter(key, &entry.value)?, entry.expires_at)
            }
            _ => (0, None),
        };

        let next = current
            .checked_add(1)
            .ok_or_else(|| StoreError::corrupt(key, "increment would overflow"))?;

        entries.insert(
            key.to_string(),
            Entry {
                value: encode_counter(next),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let expires_at = Instant::now() + ttl;
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: Some(expires_at),
            },
        );
        Ok(())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = (before - entries.len()) as u64;
        tracing::debug!(removed, "purged expired memory entries");
        Ok(removed)
    }
}
