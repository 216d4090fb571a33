//! Lightweight in-process metrics (dependency-free).
//!
//! Counters for the ingest pipeline and the WS side, stored as atomics and
//! rendered by the `/metrics` handler.

pub mod metrics;

pub use metrics::BridgeMetrics;
