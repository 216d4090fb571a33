//! Ingestion bridge: one broker subscription feeding the fan-out publisher.

pub mod ingest;
pub mod source;
pub mod status;

pub use ingest::{Bridge, Outcome};
pub use source::{MessageSource, MqttSource};
pub use status::{BridgeState, BridgeStatus};
