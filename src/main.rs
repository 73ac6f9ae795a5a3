//! feed-relay — Binary Entrypoint
//! Boots the polling manager: tracing, metrics recorder, source roster,
//! and the tick loop. No interactive surface; configuration is static
//! startup data (config file + environment).

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use feed_relay::config;
use feed_relay::fetch::HttpFetcher;
use feed_relay::manager::SchedulerManager;
use feed_relay::notify::telegram::TelegramNotifier;
use feed_relay::store::JsonFileStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(true).init();

    feed_relay::metrics::init();

    let cfg = config::load_default().context("loading configuration")?;
    info!(
        sources = cfg.sources.len(),
        tick_secs = cfg.tick_interval_secs,
        "feed-relay starting"
    );

    let fetcher = Arc::new(HttpFetcher::new()?);
    let store = Arc::new(JsonFileStore::new(cfg.state_dir.clone()));
    let sink = Arc::new(TelegramNotifier::from_env());

    let manager = SchedulerManager::from_config(&cfg, fetcher, store, sink);
    manager.run().await;
    Ok(())
}
