//! Key-value store abstraction and adapters.
//!
//! The interceptor only ever talks to a [`KeyValueStore`]. Each operation is
//! atomic on its own; nothing here offers multi-key transactions.
//!
//! Adapters:
//!
//! - [`MemoryStore`]: in-process map, expiry on the tokio clock
//! - [`SqliteStore`]: file-backed store shareable across processes (WAL mode)
//! - [`RedisStore`]: Redis server via a managed connection (feature `redis`)
//!
//! Values are raw bytes. Counters are decimal ASCII integers, the same
//! representation Redis uses for `INCR`, so data written by one adapter reads
//! back the same way through another.

pub mod connection;
pub mod memory;
pub mod migrations;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod sqlite;

use std::time::Duration;

use async_trait::async_trait;

pub use crate::StoreError;

pub use connection::SqliteStore;
pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;

/// Operations the interceptor needs from a shared key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Atomically add one to the integer at `key` and return the new value.
    ///
    /// An absent or expired key counts as 0. An existing expiry is kept.
    async fn increment(&self, key: &str) -> Result<i64, StoreError>;

    /// Read the value at `key`. Expired entries read as `None`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Overwrite `key` and schedule its removal after `ttl`.
    async fn set_with_ttl(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError>;

    /// Overwrite `key` with no expiry.
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Delete expired entries and return how many were removed.
    ///
    /// Stores that expire keys on their own report 0.
    async fn purge_expired(&self) -> Result<u64, StoreError> {
        Ok(0)
    }
}

/// Decode a stored counter.
pub(crate) fn parse_counter(key: &str, raw: &[u8]) -> Result<i64, StoreError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or_else(|| StoreError::corrupt(key, "value is not an integer"))
}

/// Encode a counter the way Redis stores it.
pub(crate) fn encode_counter(value: i64) -> Vec<u8> {
    value.to_string().into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_counter() {
        assert_eq!(parse_counter("k", b"0").unwrap(), 0);
        assert_eq!(parse_counter("k", b"42").unwrap(), 42);
        assert_eq!(parse_counter("k", b"-3").unwrap(), -3);
    }

    #[test]
    fn test_parse_counter_rejects_text() {
        match parse_counter("count:a", b"hello") {
            Err(StoreError::Corrupt { key, .. }) => assert_eq!(key, "count:a"),
            other => panic!("unexpected result: {other:?}"),
        }

        assert!(parse_counter("k", &[0xff, 0xfe]).is_err());
        assert!(parse_counter("k", b"").is_err());
    }

    #[test]
    fn test_encode_counter() {
        assert_eq!(encode_counter(0), b"0".to_vec());
        assert_eq!(encode_counter(17), b"17".to_vec());
    }
}
