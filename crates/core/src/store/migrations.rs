//! SQLite schema migrations.
//!
//! A `_migrations` table records the highest applied version; anything above
//! it is applied in order on open.

use super::StoreError;
use tokio_rusqlite::{Connection, params};

/// Migration list: (version, SQL).
const MIGRATIONS: &[(&str, &str)] = &[("1", include_str!("../../migrations/001_kv.sql"))];

/// Apply every migration newer than the recorded version.
///
/// # Errors
///
/// Returns `StoreError::MigrationFailed` for a malformed version and
/// `StoreError::Unavailable` if a statement fails.
pub async fn run(conn: &Connection) -> Result<(), StoreError> {
    conn.call(|conn| -> Result<(), StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
            [],
        )?;

        let current: i64 = conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM _migrations",
            [],
            |row| row.get(0),
        )?;

        for (version, sql) in MIGRATIONS {
            let version_num = version
                .parse::<i64>()
                .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
            if version_num > current {
                conn.execute_batch(sql).map_err(|e| {
                    StoreError::MigrationFailed(format!("version {version_num}: {e}"))
                })?;
                conn.execute(
                    "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                    params![version_num, chrono::Utc::now().to_rfc3339()],
                )?;
                tracing::debug!(version = version_num, "applied store migration");
            }
        }

        Ok(())
    })
    .await
    .map_err(StoreError::from)
}
