//! Redis adapter.
//!
//! Maps the store operations onto `INCR`, `GET`, `PSETEX` and `SET` over a
//! `ConnectionManager`, which reconnects on its own after a dropped link.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::{KeyValueStore, StoreError};

/// Key-value store backed by a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect to the server at `url` (`redis://host:port/db`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        tracing::debug!("connected to redis");
        Ok(Self { conn })
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        let value: i64 = conn.incr(key, 1i64).await?;
        Ok(value)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), StoreError> {
        // PSETEX rejects a zero expiry.
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut conn = self.conn.clone();
        let _: () = conn.pset_ex(key, value.to_vec(), millis).await?;
        Ok(())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value.to_vec()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Connects to `PAGETALLY_TEST_REDIS_URL`; these tests need a live server.
    async fn test_store() -> RedisStore {
        let url = std::env::var("PAGETALLY_TEST_REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379/".into());
        RedisStore::connect(&url).await.unwrap()
    }

    #[tokio::test]
    async fn test_connect_invalid_url() {
        let result = RedisStore::connect("not a url").await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    #[ignore = "requires a running redis server"]
    async fn test_increment_and_reset() {
        let store = test_store().await;
        store.set("count:pagetally-test", b"0").await.unwrap();
        assert_eq!(store.increment("count:pagetally-test").await.unwrap(), 1);
        let value = store.get("count:pagetally-test").await.unwrap();
        assert_eq!(value, Some(b"1".to_vec()));
    }

    #[tokio::test]
    #[ignore = "requires a running redis server"]
    async fn test_set_with_ttl_expires() {
        let store = test_store().await;
        let ttl = Duration::from_millis(100);
        store
            .set_with_ttl("cached:pagetally-test", b"hello", ttl)
            .await
            .unwrap();
        let value = store.get("cached:pagetally-test").await.unwrap();
        assert_eq!(value, Some(b"hello".to_vec()));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(store.get("cached:pagetally-test").await.unwrap().is_none());
    }
}
