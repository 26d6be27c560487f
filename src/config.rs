use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use dotenvy::dotenv;
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    #[serde(default)]
    pub discord_webhook_url: Option<String>,

    #[serde(default)]
    pub build_webhook_url: Option<String>,
    #[serde(default)]
    pub periodic_rebuild_enabled: bool,
    /// Hours between scheduled rebuilds.
    #[serde(default = "default_rebuild_interval")]
    pub periodic_rebuild_interval: u64,

    #[serde(default = "default_frontend_domain")]
    pub frontend_domain: String,

    #[serde(default)]
    pub debug_log: bool,

    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_dedup_ttl")]
    pub dedup_ttl_seconds: u64,

    #[serde(default = "default_server_port")]
    pub server_port: u16,
}

fn default_rebuild_interval() -> u64 {
    1
}

fn default_frontend_domain() -> String {
    "http://localhost:8888".to_string()
}

fn default_dedup_ttl() -> u64 {
    12 * 60 * 60
}

fn default_server_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord_webhook_url: None,
            build_webhook_url: None,
            periodic_rebuild_enabled: false,
            periodic_rebuild_interval: default_rebuild_interval(),
            frontend_domain: default_frontend_domain(),
            debug_log: false,
            redis_url: None,
            dedup_ttl_seconds: default_dedup_ttl(),
            server_port: default_server_port(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::from_env::<Self>()
            .map_err(|_| anyhow!("Invalid or missing environmental variable"))?;
        Ok(config)
    }

    pub fn discord_webhook(&self) -> Option<&str> {
        non_empty(&self.discord_webhook_url)
    }

    pub fn build_webhook(&self) -> Option<&str> {
        non_empty(&self.build_webhook_url)
    }

    pub fn redis(&self) -> Option<&str> {
        non_empty(&self.redis_url)
    }

    pub fn dedup_ttl(&self) -> Duration {
        Duration::from_secs(self.dedup_ttl_seconds)
    }

    /// Interval between scheduled rebuilds, never shorter than one hour.
    pub fn rebuild_interval(&self) -> Duration {
        Duration::from_secs(self.periodic_rebuild_interval.max(1) * 60 * 60)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_urls_count_as_unset() {
        let config = Config {
            discord_webhook_url: Some("   ".to_string()),
            build_webhook_url: Some(String::new()),
            ..Config::default()
        };

        assert_eq!(config.discord_webhook(), None);
        assert_eq!(config.build_webhook(), None);
    }

    #[test]
    fn rebuild_interval_is_clamped_to_one_hour() {
        let config = Config {
            periodic_rebuild_interval: 0,
            ..Config::default()
        };

        assert_eq!(config.rebuild_interval(), Duration::from_secs(3600));
    }

    #[test]
    fn default_ttl_is_twelve_hours() {
        assert_eq!(Config::default().dedup_ttl(), Duration::from_secs(43_200));
    }
}
