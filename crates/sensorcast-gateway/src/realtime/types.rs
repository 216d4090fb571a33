use axum::extract::ws::Message;
use serde_json::Value;

use sensorcast_core::error::Result;
use sensorcast_core::protocol::event::OutboundEvent;

/// Quality-of-Service strategy for outgoing delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QoS {
    /// Latency-critical: do not await; if a client's queue is full, drop for that client.
    Lossy,
    /// Await queue space per client, optionally bounded by a timeout (0 = none).
    Reliable { timeout_ms: u64 },
}

/// Prepared message cached for broadcasting (serialize once, send N times).
#[derive(Debug, Clone)]
pub struct PreparedMsg(String);

impl PreparedMsg {
    pub fn event(event: &str, data: &Value) -> Result<Self> {
        OutboundEvent::new(event, data).to_text().map(PreparedMsg)
    }

    /// Each client gets its own frame; the decoded value is never shared.
    pub fn to_ws_message(&self) -> Message {
        Message::Text(self.0.clone())
    }
}
