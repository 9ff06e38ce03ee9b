use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use pagetally_core::{
    AppConfig, CachingInterceptor, Fetcher, KeyValueStore, MemoryStore, SqliteStore, StoreKind,
};

/// Open the store named by `config.store`.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match config.store {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::Sqlite => {
            let store = SqliteStore::open(&config.db_path)
                .await
                .with_context(|| format!("opening {}", config.db_path.display()))?;
            Arc::new(store)
        }
        #[cfg(feature = "redis")]
        StoreKind::Redis => {
            let store = pagetally_core::RedisStore::connect(&config.redis_url).await?;
            Arc::new(store)
        }
        #[cfg(not(feature = "redis"))]
        StoreKind::Redis => bail!("built without the `redis` feature"),
    };
    tracing::debug!(store = %config.store, "store ready");
    Ok(store)
}

/// Invoke every key in order, writing bodies to `out` unless `quiet`.
///
/// A failing key is logged and skipped. Returns an error naming how many
/// keys failed once all have been tried.
pub async fn get<F: Fetcher>(
    interceptor: &CachingInterceptor<F>,
    keys: &[String],
    quiet: bool,
    out: &mut impl Write,
) -> Result<()> {
    let mut failed = 0usize;

    for key in keys {
        match interceptor.invoke(key).await {
            Ok(body) => {
                let count = interceptor.request_count(key).await?;
                tracing::info!(key = %key, count, bytes = body.len(), "served");
                if !quiet {
                    writeln!(out, "{body}")?;
                }
            }
            Err(e) if e.is_store_failure() => return Err(e).context("store failed"),
            Err(e) => {
                tracing::error!(key = %key, error = %e, "fetch failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} keys failed", keys.len());
    }
    Ok(())
}

/// Write the request count for `key`.
pub async fn count<F: Fetcher>(
    interceptor: &CachingInterceptor<F>,
    key: &str,
    out: &mut impl Write,
) -> Result<()> {
    let count = interceptor.request_count(key).await?;
    writeln!(out, "{count}")?;
    Ok(())
}

/// Delete expired entries from the interceptor's store and write how many
/// were removed.
pub async fn purge<F: Fetcher>(
    interceptor: &CachingInterceptor<F>,
    out: &mut impl Write,
) -> Result<()> {
    let removed = interceptor
        .store()
        .purge_expired()
        .await
        .context("purge failed")?;
    tracing::info!(removed, "purged expired entries");
    writeln!(out, "{removed}")?;
    Ok(())
}
