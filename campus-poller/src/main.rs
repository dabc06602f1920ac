//! Campus Poller
//!
//! Keeps one cached query of the Campus API fresh.
//!
//! The poller primes the cache for the configured key, then invalidates it
//! once per interval until interrupted or until the retry ceiling is hit.

use anyhow::{Context, Result};
use campus_client::CampusClient;
use std::sync::Arc;
use tokio::time;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_poller::config::Config;
use campus_poller::repository::{HttpQueryFetcher, is_not_found};
use campus_poller::{PollingController, QueryCache};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_poller=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Campus Poller");

    let config = load_config()?;
    info!(
        "Loaded configuration: api_url={}, key={}",
        config.api_url, config.poll.key
    );

    let http_client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;
    let client = CampusClient::with_client(config.api_url.clone(), http_client);

    let cache = Arc::new(QueryCache::new(Arc::new(HttpQueryFetcher::new(client))));

    match cache.fetch(&config.poll.key).await {
        Ok(_) => info!("Cached initial data for '{}'", config.poll.key),
        Err(e) if is_not_found(&e) => {
            return Err(e.context(format!("Poll key '{}' names no resource", config.poll.key)));
        }
        Err(e) => warn!("Initial fetch of '{}' failed: {:#}", config.poll.key, e),
    }

    let mut controller = PollingController::new(cache.clone());
    controller
        .apply(config.poll.clone())
        .context("Failed to start polling")?;

    if !controller.is_polling() {
        info!("Polling is disabled, nothing to do");
        return Ok(());
    }

    let mut status = time::interval(config.poll.interval);

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                info!("Interrupted");
                break;
            }
            _ = status.tick() => {
                if !controller.is_polling() {
                    info!(
                        "Polling of '{}' ceased after {} consecutive failures",
                        config.poll.key,
                        controller.retry_count()
                    );
                    break;
                }
            }
        }
    }

    controller.stop();

    if let Some(entry) = cache.get(&config.poll.key) {
        info!(
            "Last refresh of '{}' at {}{}",
            config.poll.key,
            entry.fetched_at,
            if entry.stale { " (stale)" } else { "" }
        );
    }

    Ok(())
}

/// Loads configuration from environment variables with fallback to defaults
fn load_config() -> Result<Config> {
    match Config::from_env() {
        Ok(config) => {
            config.validate()?;
            Ok(config)
        }
        Err(e) => {
            info!("Failed to load config from environment ({:#}), using defaults", e);
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }
}
