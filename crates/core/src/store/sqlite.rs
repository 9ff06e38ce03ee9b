//! Key-value operations on the SQLite store.
//!
//! Expiry is a millisecond Unix timestamp. Reads filter out expired rows;
//! `purge_expired` deletes them.

use std::time::Duration;

use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, TransactionBehavior};

use super::connection::SqliteStore;
use super::{KeyValueStore, StoreError, encode_counter, parse_counter};

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

const UPSERT: &str = "INSERT INTO kv (key, value, expires_at) VALUES (?1, ?2, ?3)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at";

impl SqliteStore {
    async fn upsert(
        &self,
        key: &str,
        value: &[u8],
        expires_at: Option<i64>,
    ) -> Result<(), StoreError> {
        let key = key.to_string();
        let value = value.to_vec();
        self.conn
            .call(move |conn| -> Result<(), StoreError> {
                conn.execute(UPSERT, params![key, value, expires_at])?;
                Ok(())
            })
            .await
            .map_err(StoreError::from)
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn increment(&self, key: &str) -> Result<i64, StoreError> {
        let key = key.to_string();
        let now = now_millis();
        self.conn
            .call(move |conn| -> Result<i64, StoreError> {
                // IMMEDIATE takes the write lock up front so concurrent
                // processes cannot both read the same old value.
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

                let row = tx.query_row(
                    "SELECT value, expires_at FROM kv WHERE key = ?1",
                    params![key],
                    |row| Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Option<i64>>(1)?)),
                );

                let (current, expires_at) = match row {
                    Ok((value, expires_at)) if expires_at.is_none_or(|at| at > now) => {
                        (parse_counter(&key, &value)?, expires_at)
                    }
                    Ok(_) | Err(rusqlite::Error::QueryReturnedNoRows) => (0, None),
                    Err(e) => return Err(e.into()),
                };

                let next = current
                    .checked_add(1)
                    .ok_or_else(|| StoreError::corrupt(&key, "increment would overflow"))?;

                tx.execute(UPSERT, params![key, encode_counter(next), expires_at])?;
                tx.commit()?;
                Ok(next)
            })
            .await
            .map_err(StoreError::from)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let key = key.to_string();
        let now = now_millis();
        self.conn
            .call(move |conn| -> Result<Option<Vec<u8>>, StoreError> {
                let result = conn.query_row(
                    "SELECT value FROM kv
                     WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                    params![key, now],
                    |row| row.get(0),
                );

                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(StoreError::from)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let expires_at = now_millis().saturating_add(ttl_millis(ttl));
        self.upsert(key, value, Some(expires_at)).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.upsert(key, value, None).await
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let now = now_millis();
        let removed = self
            .conn
            .call(move |conn| -> Result<u64, StoreError> {
                let n = conn.execute(
                    "DELETE FROM kv WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                    params![now],
                )?;
                Ok(n as u64)
            })
            .await
            .map_err(StoreError::from)?;

        tracing::debug!(removed, "purged expired sqlite entries");
        Ok(removed)
    }
}
