//! pagetally entry point.
//!
//! Logging goes to stderr so stdout carries only fetched bodies and counts.

use anyhow::Result;
use clap::Parser;
use pagetally_client::{FetchClient, FetchConfig};
use pagetally_core::{AppConfig, CachingInterceptor};
use tracing_subscriber::EnvFilter;

mod args;
mod commands;

use args::{Cli, Command};

fn init_logging(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json);

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(Some(path))?,
        None => AppConfig::load()?,
    };
    cli.apply(&mut config);
    config.validate()?;

    let store = commands::open_store(&config).await?;
    let client = FetchClient::new(FetchConfig::from(&config))?;
    let interceptor = CachingInterceptor::new(store, client, config.ttl());

    let ttl_ms = interceptor.ttl().as_millis() as u64;
    tracing::debug!(store = %config.store, ttl_ms, "interceptor ready");

    let mut stdout = std::io::stdout().lock();
    match &cli.command {
        Command::Get { keys, quiet } => {
            commands::get(&interceptor, keys, *quiet, &mut stdout).await
        }
        Command::Count { key } => commands::count(&interceptor, key, &mut stdout).await,
        Command::Purge => commands::purge(&interceptor, &mut stdout).await,
    }
}
