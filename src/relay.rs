use std::{sync::Arc, time::Duration};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{
    clients::{discord::DiscordClient, store::ExpiringSet},
    config::Config,
    models::{event::InboundEvent, status::DeliveryResult},
    utils::build_message,
};

/// Relays inbound storefront events to the Discord webhook, suppressing
/// repeated order and error events for the same transaction.
///
/// The dedup flag is written before delivery is attempted, so a failed
/// delivery still counts as seen: each transaction is relayed at most once
/// per TTL window.
pub struct EventRelay {
    store: Arc<dyn ExpiringSet>,
    discord: DiscordClient,
    dedup_ttl: Duration,
    debug_log: bool,
}

impl EventRelay {
    pub fn new(
        store: Arc<dyn ExpiringSet>,
        discord: DiscordClient,
        dedup_ttl: Duration,
        debug_log: bool,
    ) -> Self {
        Self {
            store,
            discord,
            dedup_ttl,
            debug_log,
        }
    }

    pub fn from_config(config: &Config, store: Arc<dyn ExpiringSet>) -> Self {
        Self::new(
            store,
            DiscordClient::new(config),
            config.dedup_ttl(),
            config.debug_log,
        )
    }

    pub async fn handle(&self, event: InboundEvent) -> DeliveryResult {
        let kind = event.kind();

        if let Some(key) = event.dedup_key() {
            if key.transaction_id.is_empty() {
                debug!(%kind, "Event without transaction id treated as duplicate");
                return DeliveryResult::Duplicate;
            }

            match self.store.set_if_absent(&key.to_string(), self.dedup_ttl).await {
                Ok(true) => {}
                Ok(false) => {
                    info!(
                        %kind,
                        transaction_id = %key.transaction_id,
                        "Event already relayed, skipping"
                    );
                    return DeliveryResult::Duplicate;
                }
                Err(e) => {
                    warn!(
                        %kind,
                        transaction_id = %key.transaction_id,
                        error = %e,
                        "Dedup store unavailable, event dropped"
                    );
                    return DeliveryResult::DeliveryFailed {
                        reason: e.to_string(),
                    };
                }
            }
        }

        if !self.discord.is_configured() {
            debug!(%kind, "Discord webhook not configured");
            return DeliveryResult::NotConfigured;
        }

        let message = build_message(&event, Utc::now());

        match self.discord.send_embed(message).await {
            Ok(_) => {
                info!(%kind, "Event relayed to Discord");
                DeliveryResult::Sent
            }
            Err(e) => {
                if self.debug_log {
                    warn!(%kind, error = %e, "Discord delivery failed");
                } else {
                    debug!(%kind, error = %e, "Discord delivery failed");
                }
                DeliveryResult::DeliveryFailed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
