//! Store key namespace.
//!
//! Counters and cached values share the caller's key under fixed prefixes.
//! The prefixes are part of the on-store format and must not change.

/// Prefix of the per-key request counter.
pub const COUNT_PREFIX: &str = "count:";

/// Prefix of the per-key cached value.
pub const CACHED_PREFIX: &str = "cached:";

/// Store key holding the request counter for `key`.
pub fn counter_key(key: &str) -> String {
    format!("{COUNT_PREFIX}{key}")
}

/// Store key holding the cached value for `key`.
pub fn cached_key(key: &str) -> String {
    format!("{CACHED_PREFIX}{key}")
}
