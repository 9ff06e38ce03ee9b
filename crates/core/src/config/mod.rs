//! Application configuration with layered loading.
//!
//! Sources, highest precedence first:
//!
//! 1. Environment variables (PAGETALLY_*)
//! 2. TOML config file (`--config` or PAGETALLY_CONFIG_FILE)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Which [`KeyValueStore`](crate::store::KeyValueStore) adapter to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Process-local map; nothing survives the process.
    Memory,
    /// SQLite file at `db_path`.
    #[default]
    Sqlite,
    /// Redis server at `redis_url`.
    Redis,
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            StoreKind::Memory => "memory",
            StoreKind::Sqlite => "sqlite",
            StoreKind::Redis => "redis",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Lifetime of a cached value in seconds.
    ///
    /// Set via PAGETALLY_TTL_SECONDS.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Store backend.
    ///
    /// Set via PAGETALLY_STORE (`memory`, `sqlite` or `redis`).
    #[serde(default)]
    pub store: StoreKind,

    /// Path to the SQLite store file.
    ///
    /// Set via PAGETALLY_DB_PATH.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Redis connection URL.
    ///
    /// Set via PAGETALLY_REDIS_URL.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via PAGETALLY_USER_AGENT.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via PAGETALLY_MAX_BYTES.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via PAGETALLY_TIMEOUT_MS.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Treat non-2xx HTTP responses as fetch failures.
    ///
    /// When false, error pages are returned and cached like any other body.
    /// Set via PAGETALLY_ERROR_ON_STATUS.
    #[serde(default = "default_error_on_status")]
    pub error_on_status: bool,
}

fn default_ttl_seconds() -> u64 {
    10
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./pagetally.sqlite")
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".into()
}

fn default_user_agent() -> String {
    "pagetally/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_error_on_status() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
            store: StoreKind::default(),
            db_path: default_db_path(),
            redis_url: default_redis_url(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            error_on_status: default_error_on_status(),
        }
    }
}

impl AppConfig {
    /// Cache lifetime as a Duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// HTTP timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration, reading the TOML file named by PAGETALLY_CONFIG_FILE if set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be read or parsed, or if
    /// validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let file = std::env::var_os("PAGETALLY_CONFIG_FILE").map(PathBuf::from);
        Self::load_from(file.as_deref())
    }

    /// Load configuration with an explicit TOML file.
    ///
    /// Environment variables still take precedence over the file.
    pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = file {
            if !path.exists() {
                let reason = format!("config file not found: {}", path.display());
                return Err(ConfigError::LoadFailed(reason));
            }
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(
            Env::prefixed("PAGETALLY_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.ttl_seconds, 10);
        assert_eq!(config.store, StoreKind::Sqlite);
        assert_eq!(config.db_path, PathBuf::from("./pagetally.sqlite"));
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379/");
        assert_eq!(config.user_agent, "pagetally/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert!(config.error_on_status);
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.ttl(), Duration::from_secs(10));
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
    }

    #[test]
    fn test_store_kind_display() {
        assert_eq!(StoreKind::Memory.to_string(), "memory");
        assert_eq!(StoreKind::Redis.to_string(), "redis");
    }

    #[test]
    fn test_load_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env("PAGETALLY_TTL_SECONDS", "30");
            jail.set_env("PAGETALLY_STORE", "memory");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.ttl_seconds, 30);
            assert_eq!(config.store, StoreKind::Memory);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "pagetally.toml",
                "ttl_seconds = 5\nuser_agent = \"from-file\"\nstore = \"redis\"",
            )?;
            jail.set_env("PAGETALLY_CONFIG_FILE", "pagetally.toml");
            jail.set_env("PAGETALLY_TTL_SECONDS", "7");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.ttl_seconds, 7);
            assert_eq!(config.user_agent, "from-file");
            assert_eq!(config.store, StoreKind::Redis);
            Ok(())
        });
    }

    #[test]
    fn test_error_on_status_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env("PAGETALLY_ERROR_ON_STATUS", "false");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert!(!config.error_on_status);
            Ok(())
        });
    }

    #[test]
    fn test_missing_config_file() {
        Jail::expect_with(|_jail| {
            let result = AppConfig::load_from(Some(Path::new("nope.toml")));
            assert!(matches!(result, Err(ConfigError::LoadFailed(_))));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_env_value_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("PAGETALLY_TTL_SECONDS", "0");
            match AppConfig::load() {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "ttl_seconds"),
                other => panic!("unexpected result: {other:?}"),
            }
            Ok(())
        });
    }
}
