//! Protocol modules (broker side + client side).
//!
//! - Envelope: one message as delivered by the broker, plus the JSON decode step.
//! - Event: the named frame pushed to every connected web client.
//!
//! Decoding is panic-free: a malformed payload is reported as
//! `SensorcastError::InvalidPayload` so the bridge can drop it and move on.

pub mod envelope;
pub mod event;
