//! Control messages posted by the hosting page

use crate::error::{SwcacheError, SwcacheResult};

/// Message type that forces a waiting version to activate
pub const SKIP_WAITING: &str = "SKIP_WAITING";

/// A message from the host application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    /// `{"type": "SKIP_WAITING"}`
    SkipWaiting,
    /// Any other payload; carries the `type` field if there was one
    Other(Option<String>),
}

impl ControlMessage {
    /// Parse a JSON payload.
    ///
    /// Only malformed JSON is an error. Payloads without a recognised
    /// `type` are accepted and ignored by the receiver.
    pub fn parse(json: &str) -> SwcacheResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| SwcacheError::MessageInvalid(e.to_string()))?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &serde_json::Value) -> Self {
        match value.get("type").and_then(|t| t.as_str()) {
            Some(SKIP_WAITING) => Self::SkipWaiting,
            other => Self::Other(other.map(str::to_string)),
        }
    }

    pub fn to_value(&self) -> serde_json::Value {
        match self {
            Self::SkipWaiting => serde_json::json!({ "type": SKIP_WAITING }),
            Self::Other(Some(kind)) => serde_json::json!({ "type": kind }),
            Self::Other(None) => serde_json::json!({}),
        }
    }
}
