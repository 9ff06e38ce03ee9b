//! SQLite store handle.
//!
//! Opens the database, applies pragmas for concurrent access (WAL mode plus a
//! busy timeout so several processes can share one file), and runs migrations.

use super::{StoreError, migrations};
use std::path::Path;
use tokio_rusqlite::Connection;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA busy_timeout=5000;";

/// SQLite-backed key-value store.
///
/// Wraps a tokio-rusqlite `Connection`, which runs statements on a
/// background thread. Clones share that connection.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pub(crate) conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path).await?;
        Self::init(conn).await
    }

    /// Open a private in-memory store, mainly for tests.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|conn| conn.execute_batch(PRAGMAS)).await?;
        migrations::run(&conn).await?;
        Ok(Self { conn })
    }
}
