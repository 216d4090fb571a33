//! Shared error type across sensorcast crates.

use thiserror::Error;

/// Stable error classes, used as log fields and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid input from a client or caller.
    BadRequest,
    /// Broker payload that is not valid JSON.
    InvalidPayload,
    /// Broker connection or subscription failure.
    Broker,
    /// Invalid configuration.
    Config,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal failure.
    Internal,
}

impl ErrorKind {
    /// String representation used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::InvalidPayload => "INVALID_PAYLOAD",
            ErrorKind::Broker => "BROKER",
            ErrorKind::Config => "CONFIG",
            ErrorKind::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, SensorcastError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum SensorcastError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("broker: {0}")]
    Broker(String),
    #[error("config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl SensorcastError {
    /// Map the error to its stable kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SensorcastError::BadRequest(_) => ErrorKind::BadRequest,
            SensorcastError::InvalidPayload(_) => ErrorKind::InvalidPayload,
            SensorcastError::Broker(_) => ErrorKind::Broker,
            SensorcastError::Config(_) => ErrorKind::Config,
            SensorcastError::UnsupportedVersion => ErrorKind::UnsupportedVersion,
            SensorcastError::Internal(_) => ErrorKind::Internal,
        }
    }
}
