//! Delivery types.

use serde::{Deserialize, Serialize};

/// Supported delivery sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    Telegram,
    Tiktok,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Telegram => "telegram",
            SinkKind::Tiktok => "tiktok",
        }
    }
}

/// Caption material attached to a delivery.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryMetadata {
    pub title: String,
    pub caption: String,
}

/// Result of one sink attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DeliveryResult {
    Delivered,
    Failed { reason: String },
}

impl DeliveryResult {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryResult::Delivered)
    }
}

/// Per-sink outcome recorded on the completed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub sink: SinkKind,
    #[serde(flatten)]
    pub result: DeliveryResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_kind_serde_tags() {
        assert_eq!(serde_json::to_string(&SinkKind::Telegram).unwrap(), "\"telegram\"");
        assert_eq!(serde_json::to_string(&SinkKind::Tiktok).unwrap(), "\"tiktok\"");
    }

    #[test]
    fn test_outcome_flattens_result() {
        let outcome = DeliveryOutcome {
            sink: SinkKind::Tiktok,
            result: DeliveryResult::Failed {
                reason: "upload rejected".to_string(),
            },
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["sink"], "tiktok");
        assert_eq!(json["result"], "failed");
        assert_eq!(json["reason"], "upload rejected");

        let back: DeliveryOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);
    }
}
