//! Core of pagetally: a cache-aside request accelerator.
//!
//! This crate provides:
//! - [`CachingInterceptor`], which counts requests per key and serves cached
//!   results within a TTL
//! - The [`KeyValueStore`] seam plus memory, SQLite and Redis adapters
//! - Error types and layered configuration

pub mod config;
pub mod error;
pub mod interceptor;
pub mod keys;
pub mod store;

pub use config::{AppConfig, ConfigError, StoreKind};
pub use error::{InvokeError, StoreError};
pub use interceptor::{CachingInterceptor, DEFAULT_TTL, Fetcher, FnFetcher, fetch_fn};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};

#[cfg(feature = "redis")]
pub use store::RedisStore;
