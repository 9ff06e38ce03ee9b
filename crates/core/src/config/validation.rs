//! Configuration validation rules.
//!
//! Checks `AppConfig` values after they have been loaded from the
//! environment, files, or defaults.

use crate::config::{AppConfig, StoreKind};
use thiserror::Error;

/// Longest allowed cache lifetime (one day).
const MAX_TTL_SECONDS: u64 = 86_400;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `ttl_seconds` is 0 or longer than a day
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    /// - `store` is `redis` and `redis_url` is not a redis URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_seconds == 0 {
            return Err(invalid("ttl_seconds", "must be at least 1"));
        }
        if self.ttl_seconds > MAX_TTL_SECONDS {
            let reason = format!("must not exceed {MAX_TTL_SECONDS}");
            return Err(invalid("ttl_seconds", reason));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 300000ms"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        let redis_scheme =
            self.redis_url.starts_with("redis://") || self.redis_url.starts_with("rediss://");
        if self.store == StoreKind::Redis && !redis_scheme {
            return Err(invalid("redis_url", "must use redis:// or rediss://"));
        }

        if self.store == StoreKind::Memory {
            tracing::warn!("memory store selected; nothing persists past exit");
        }

        Ok(())
    }
}
