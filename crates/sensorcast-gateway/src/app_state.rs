//! Shared application state for the sensorcast gateway.
//!
//! Everything the HTTP side and the bridge share lives here, owned
//! explicitly and handed out as `Arc`s. No process-wide globals.

use std::sync::Arc;

use sensorcast_core::error::Result;

use crate::bridge::BridgeStatus;
use crate::config::GatewayConfig;
use crate::obs::BridgeMetrics;
use crate::realtime::RealtimeCore;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    realtime: Arc<RealtimeCore>,
    metrics: Arc<BridgeMetrics>,
    bridge_status: Arc<BridgeStatus>,
}

struct AppStateInner {
    cfg: GatewayConfig,
}

impl AppState {
    /// Build application state from a validated config.
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        cfg.validate()?;

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg }),
            realtime: Arc::new(RealtimeCore::new()),
            metrics: Arc::new(BridgeMetrics::default()),
            bridge_status: Arc::new(BridgeStatus::new()),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn realtime(&self) -> Arc<RealtimeCore> {
        Arc::clone(&self.realtime)
    }

    pub fn metrics(&self) -> Arc<BridgeMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn bridge_status(&self) -> Arc<BridgeStatus> {
        Arc::clone(&self.bridge_status)
    }

    /// Extra gauge lines for `/metrics` that are read from live state.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("sensorcast_bridge_subscribed", u64::from(self.bridge_status.is_subscribed())),
            ("sensorcast_clients_connected", self.realtime.connected() as u64),
        ]
    }
}
