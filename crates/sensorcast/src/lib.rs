//! Top-level facade crate for sensorcast.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use sensorcast_core::*;
}

pub mod gateway {
    pub use sensorcast_gateway::*;
}
