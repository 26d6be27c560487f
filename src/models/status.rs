use serde::{Deserialize, Serialize};

/// Outcome of relaying a single inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    Sent,
    Duplicate,
    NotConfigured,
    DeliveryFailed { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayStatus {
    Success,
    Duplicate,
    Error,
}

impl DeliveryResult {
    pub fn status(&self) -> RelayStatus {
        match self {
            DeliveryResult::Sent => RelayStatus::Success,
            DeliveryResult::Duplicate => RelayStatus::Duplicate,
            DeliveryResult::NotConfigured | DeliveryResult::DeliveryFailed { .. } => {
                RelayStatus::Error
            }
        }
    }
}
