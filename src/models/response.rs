use serde::{Deserialize, Serialize};

use crate::models::status::{DeliveryResult, RelayStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: RelayStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<DeliveryResult> for StatusResponse {
    fn from(result: DeliveryResult) -> Self {
        let status = result.status();
        let message = match result {
            DeliveryResult::Sent => Some("Sent to Discord".to_string()),
            DeliveryResult::Duplicate => None,
            DeliveryResult::NotConfigured => Some("Discord webhook not configured".to_string()),
            DeliveryResult::DeliveryFailed { reason } => Some(reason),
        };

        Self { status, message }
    }
}

/// Mirrors the `{success, data}` shape the admin rebuild button expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildResponse {
    pub success: bool,
    pub data: String,
}

impl RebuildResponse {
    pub fn success(data: String) -> Self {
        Self {
            success: true,
            data,
        }
    }

    pub fn error(data: String) -> Self {
        Self {
            success: false,
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkResponse {
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
