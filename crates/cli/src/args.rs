//! Command-line surface for `pagetally`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use pagetally_core::{AppConfig, StoreKind};

#[derive(Parser, Debug)]
#[command(
    name = "pagetally",
    version,
    about = "Cache-aside fetches with per-key request counts",
    long_about = None
)]
pub struct Cli {
    /// TOML config file (overrides PAGETALLY_CONFIG_FILE)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Store backend
    #[arg(long, global = true, value_enum)]
    pub store: Option<StoreArg>,

    /// Lifetime of a cached value in seconds
    #[arg(long, global = true)]
    pub ttl_seconds: Option<u64>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch each key through the cache and print the body
    Get {
        #[arg(required = true)]
        keys: Vec<String>,

        /// Do not print bodies
        #[arg(long, short)]
        quiet: bool,
    },
    /// Print the request count for a key
    Count { key: String },
    /// Delete expired entries from the store and print how many were removed
    Purge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreArg {
    Memory,
    Sqlite,
    Redis,
}

impl From<StoreArg> for StoreKind {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::Memory => StoreKind::Memory,
            StoreArg::Sqlite => StoreKind::Sqlite,
            StoreArg::Redis => StoreKind::Redis,
        }
    }
}

impl Cli {
    /// Apply flag overrides on top of a loaded config.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(store) = self.store {
            config.store = store.into();
        }
        if let Some(ttl) = self.ttl_seconds {
            config.ttl_seconds = ttl;
        }
    }
}
