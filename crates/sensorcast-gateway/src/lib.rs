//! sensorcast gateway library entry.
//!
//! This crate wires the MQTT ingestion bridge, the realtime fan-out core, the
//! WebSocket transport, and the static/ops HTTP surface into one service. It is
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod bridge;
pub mod config;
pub mod obs;
pub mod ops;
pub mod realtime;
pub mod router;
pub mod transport;
