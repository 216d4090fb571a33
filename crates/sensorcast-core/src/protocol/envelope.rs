//! Broker message envelope and payload decode.

use bytes::Bytes;
use serde_json::Value;

use crate::error::{Result, SensorcastError};

/// Longest payload excerpt carried into log lines.
const PREVIEW_CHARS: usize = 256;

/// One message received on a subscribed topic.
///
/// The envelope is consumed by [`decode`] and dropped afterwards; nothing keeps
/// a history of received payloads.
#[derive(Debug, Clone)]
pub struct MessageEnvelope {
    /// Topic the broker delivered the message on.
    pub topic: String,
    /// Raw payload bytes, untouched.
    pub payload: Bytes,
}

impl MessageEnvelope {
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Lossy UTF-8 view of the payload for log lines, cut at a char boundary.
    pub fn preview(&self) -> String {
        let text = String::from_utf8_lossy(&self.payload);
        match text.char_indices().nth(PREVIEW_CHARS) {
            Some((idx, _)) => format!("{}...", &text[..idx]),
            None => text.into_owned(),
        }
    }
}

/// Parse the payload as a JSON document.
///
/// Any JSON value is accepted; no schema is enforced. Invalid UTF-8 and
/// malformed JSON both map to `InvalidPayload`.
pub fn decode(env: &MessageEnvelope) -> Result<Value> {
    let text = std::str::from_utf8(&env.payload)
        .map_err(|e| SensorcastError::InvalidPayload(format!("payload is not utf-8: {e}")))?;
    serde_json::from_str(text)
        .map_err(|e| SensorcastError::InvalidPayload(format!("payload is not json: {e}")))
}
