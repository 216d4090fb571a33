//! Realtime core components for Gateway runtime.
//!
//! The session registry (owned by the WS transport) and the fan-out engine the
//! bridge publishes through.

mod realtime;
mod session_registry;

pub use realtime::{Delivery, RealtimeCore};
pub use session_registry::{Connection, SessionRegistry};
