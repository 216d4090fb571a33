//! Realtime runtime (egress engine) for the sensorcast gateway.
//!
//! SessionRegistry + QoS-based broadcast to every connected client.

pub mod core;
pub mod types;

pub use self::core::{Connection, Delivery, RealtimeCore, SessionRegistry};
pub use types::{PreparedMsg, QoS};
