//! Outbound event frame (JSON text).
//!
//! Every push to a web client is one text frame of the form
//! `{"event": "<name>", "data": <decoded payload>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SensorcastError};

/// Borrowed view used on the hot path: serialize once per broadcast.
#[derive(Debug, Serialize)]
pub struct OutboundEvent<'a> {
    pub event: &'a str,
    pub data: &'a Value,
}

impl<'a> OutboundEvent<'a> {
    pub fn new(event: &'a str, data: &'a Value) -> Self {
        Self { event, data }
    }

    /// Encode to the text frame body.
    pub fn to_text(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| SensorcastError::Internal(format!("event encode failed: {e}")))
    }
}

/// Owned form, for clients and tests reading frames back.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventFrame {
    pub event: String,
    pub data: Value,
}

impl EventFrame {
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| SensorcastError::BadRequest(format!("invalid event frame: {e}")))
    }
}
