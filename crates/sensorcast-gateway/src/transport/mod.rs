//! Transport layer (WebSocket).
//!
//! Exposes the WS upgrade handler; each session registers its outbound queue
//! with the realtime core and drains it into the socket.

pub mod ws;
