use std::{sync::Arc, time::Duration};

use anyhow::{Error, Result, anyhow};
use reqwest::{Client, StatusCode};
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{debug, info, warn};

use crate::{config::Config, models::rebuild::TriggerSource};

const REBUILD_TIMEOUT: Duration = Duration::from_secs(20);

pub struct RebuildClient {
    http_client: Client,
    webhook_url: Option<String>,
    debug_log: bool,
}

impl RebuildClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let http_client = Client::builder()
            .timeout(REBUILD_TIMEOUT)
            .build()
            .map_err(|_| anyhow!("Failed to create HTTP client"))?;

        info!(
            configured = config.build_webhook().is_some(),
            "Rebuild client initialized"
        );

        Ok(Self {
            http_client,
            webhook_url: config.build_webhook().map(str::to_string),
            debug_log: config.debug_log,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Fires the build webhook once and reports the HTTP status it answered with.
    pub async fn trigger(&self, source: TriggerSource) -> Result<StatusCode, Error> {
        let webhook_url = self
            .webhook_url
            .as_deref()
            .ok_or_else(|| anyhow!("Build webhook URL not set."))?;

        debug!(%source, "Triggering frontend rebuild");

        let response = self
            .http_client
            .post(webhook_url)
            .send()
            .await
            .map_err(|e| anyhow!("{}", e))?;

        Ok(response.status())
    }

    /// Like [`trigger`](Self::trigger), but only logs the outcome.
    pub async fn trigger_logged(&self, source: TriggerSource) {
        match self.trigger(source).await {
            Ok(status) if self.debug_log => {
                info!(%source, status = status.as_u16(), "Triggered frontend rebuild")
            }
            Ok(status) => debug!(%source, status = status.as_u16(), "Triggered frontend rebuild"),
            Err(e) if self.debug_log => warn!(%source, error = %e, "Frontend rebuild failed"),
            Err(e) => debug!(%source, error = %e, "Frontend rebuild failed"),
        }
    }
}

/// Period of the background rebuild task, or `None` when it should not run.
pub fn periodic_schedule(config: &Config) -> Option<Duration> {
    if config.periodic_rebuild_enabled && config.build_webhook().is_some() {
        Some(config.rebuild_interval())
    } else {
        None
    }
}

/// Triggers a rebuild every `period`, starting one period from now.
pub fn spawn_periodic_rebuilds(client: Arc<RebuildClient>, period: Duration) -> JoinHandle<()> {
    info!(period_secs = period.as_secs(), "Periodic rebuilds scheduled");

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            client.trigger_logged(TriggerSource::Cron).await;
        }
    })
}
