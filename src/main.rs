use std::sync::Arc;

use anyhow::{Error, Result};
use storefront_relay::{
    api::{AppState, run_api_server},
    clients::{
        rebuild::{periodic_schedule, spawn_periodic_rebuilds},
        redis::RedisExpiringSet,
        store::{ExpiringSet, InMemoryExpiringSet},
    },
    config::Config,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let store: Arc<dyn ExpiringSet> = match config.redis() {
        Some(redis_url) => Arc::new(RedisExpiringSet::connect(redis_url).await?),
        None => {
            warn!("REDIS_URL not set, duplicate suppression is local to this process");
            Arc::new(InMemoryExpiringSet::new())
        }
    };

    let state = AppState::new(&config, store)?;

    if let Some(period) = periodic_schedule(&config) {
        spawn_periodic_rebuilds(Arc::clone(&state.rebuild), period);
    } else {
        info!("Periodic rebuilds disabled");
    }

    run_api_server(&config, state).await
}
