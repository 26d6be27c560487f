use anyhow::{Error, Result, anyhow};
use reqwest::{Client, header::CONTENT_TYPE};
use tracing::{debug, info};

use crate::{
    config::Config,
    models::embed::{NotificationMessage, WebhookEnvelope},
};

pub struct DiscordClient {
    http_client: Client,
    webhook_url: Option<String>,
}

impl DiscordClient {
    pub fn new(config: &Config) -> Self {
        Self::with_webhook(config.discord_webhook().map(str::to_string))
    }

    pub fn with_webhook(webhook_url: Option<String>) -> Self {
        info!(
            configured = webhook_url.is_some(),
            "Discord webhook client initialized"
        );

        Self {
            http_client: Client::new(),
            webhook_url,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Posts one embed. Only transport failures are errors; the response
    /// status is logged but not inspected.
    pub async fn send_embed(&self, message: NotificationMessage) -> Result<(), Error> {
        let webhook_url = self
            .webhook_url
            .as_deref()
            .ok_or_else(|| anyhow!("Discord webhook not configured"))?;

        let envelope = WebhookEnvelope::from(message);
        let body = serde_json::to_vec(&envelope)?;

        let response = self
            .http_client
            .post(webhook_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| anyhow!("{}", e))?;

        debug!(status = %response.status(), "Discord webhook responded");

        Ok(())
    }
}
