//! sensorcast core: transport-agnostic message primitives and the shared error type.
//!
//! This crate defines what flows through the bridge: the broker-side
//! `MessageEnvelope`, the payload decode step, and the `OutboundEvent` frame
//! pushed to web clients. It carries no broker or HTTP dependencies so the
//! decode and framing rules can be tested on their own.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. A malformed payload
//! from a sensor must surface as `SensorcastError` and never bring the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorKind, Result, SensorcastError};
