//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;
use std::path::Path;

use sensorcast_core::error::{Result, SensorcastError};

pub use schema::{BrokerSection, DeliveryMode, FanoutSection, GatewayConfig, GatewaySection};

pub fn load_from_file(path: impl AsRef<Path>) -> Result<GatewayConfig> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)
        .map_err(|e| SensorcastError::Config(format!("read {} failed: {e}", path.display())))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| SensorcastError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load `path` if it exists, otherwise fall back to built-in defaults.
///
/// An explicitly requested path that is missing is still an error.
pub fn load_or_default(path: &Path, explicit: bool) -> Result<GatewayConfig> {
    if !explicit && !path.exists() {
        tracing::info!(path = %path.display(), "config file not found, using defaults");
        let cfg = GatewayConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    load_from_file(path)
}
