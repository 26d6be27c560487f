use serde::{Deserialize, Serialize};

/// Accent colour used for every embed posted by the relay.
pub const EMBED_COLOR: u32 = 7_506_394;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: false,
        }
    }

    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub title: String,
    pub description: String,
    pub fields: Vec<EmbedField>,
    pub color: u32,
    pub timestamp: String,
}

/// Request body expected by Discord-style webhooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    pub embeds: Vec<NotificationMessage>,
}

impl From<NotificationMessage> for WebhookEnvelope {
    fn from(message: NotificationMessage) -> Self {
        Self {
            embeds: vec![message],
        }
    }
}
