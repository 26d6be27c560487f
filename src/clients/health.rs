use std::{collections::HashMap, sync::Arc, time::Instant};

use chrono::Utc;
use tracing::{debug, warn};

use crate::{
    clients::store::ExpiringSet,
    config::Config,
    models::health::{HealthCheckResponse, HealthStatus, ServiceHealth},
};

pub struct HealthChecker {
    store: Arc<dyn ExpiringSet>,
    discord_configured: bool,
    rebuild_configured: bool,
}

impl HealthChecker {
    pub fn new(config: &Config, store: Arc<dyn ExpiringSet>) -> Self {
        Self {
            store,
            discord_configured: config.discord_webhook().is_some(),
            rebuild_configured: config.build_webhook().is_some(),
        }
    }

    pub async fn check_all(&self) -> HealthCheckResponse {
        let mut checks = HashMap::new();

        checks.insert("dedup_store".to_string(), self.check_store().await);

        let discord_health = if self.discord_configured {
            ServiceHealth::configured()
        } else {
            ServiceHealth::not_configured(
                HealthStatus::Degraded,
                Some("Discord webhook not configured".to_string()),
            )
        };
        checks.insert("discord_webhook".to_string(), discord_health);

        let rebuild_health = if self.rebuild_configured {
            ServiceHealth::configured()
        } else {
            ServiceHealth::not_configured(HealthStatus::Healthy, None)
        };
        checks.insert("build_webhook".to_string(), rebuild_health);

        HealthCheckResponse {
            status: determine_overall_status(&checks),
            timestamp: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            checks,
        }
    }

    async fn check_store(&self) -> ServiceHealth {
        let start = Instant::now();
        let backend = self.store.backend();

        match self.store.ping().await {
            Ok(_) => {
                let elapsed = start.elapsed().as_millis() as u64;
                debug!(backend, response_time_ms = elapsed, "Dedup store health check passed");
                ServiceHealth::healthy(elapsed)
            }
            Err(e) => {
                warn!(backend, error = %e, "Dedup store health check failed");
                ServiceHealth::unhealthy(format!("{} unreachable: {}", backend, e))
            }
        }
    }
}

fn determine_overall_status(checks: &HashMap<String, ServiceHealth>) -> HealthStatus {
    let has_unhealthy = checks
        .values()
        .any(|health| health.status == HealthStatus::Unhealthy);

    let has_degraded = checks
        .values()
        .any(|health| health.status == HealthStatus::Degraded);

    if has_unhealthy {
        HealthStatus::Unhealthy
    } else if has_degraded {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}
