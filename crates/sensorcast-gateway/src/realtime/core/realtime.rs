use std::sync::Arc;

use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{timeout, Duration};

use sensorcast_core::error::Result;

use crate::realtime::core::{Connection, SessionRegistry};
use crate::realtime::types::{PreparedMsg, QoS};

/// Per-broadcast delivery tally.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Frames accepted into a client queue.
    pub delivered: usize,
    /// Client queue was full (lossy) or already closed.
    pub dropped: usize,
    /// Reliable send did not get queue space in time. The client was evicted.
    pub timed_out: usize,
}

impl Delivery {
    pub fn attempted(&self) -> usize {
        self.delivered + self.dropped + self.timed_out
    }
}

enum SendResult {
    Ok,
    Dropped,
    TimedOut,
}

/// RealtimeCore: egress engine (fan-out to every connected client).
pub struct RealtimeCore {
    pub sessions: Arc<SessionRegistry>,
}

impl Default for RealtimeCore {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeCore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(SessionRegistry::new()),
        }
    }

    pub fn connected(&self) -> usize {
        self.sessions.len()
    }

    /// Send `data` under `event` to every client connected right now.
    ///
    /// No clients is a no-op. Nothing is retained for clients that connect later.
    /// A client that misses the reliable send timeout is removed from the registry.
    pub async fn broadcast(&self, event: &str, data: &Value, qos: &QoS) -> Result<Delivery> {
        let targets = self.sessions.snapshot();
        if targets.is_empty() {
            return Ok(Delivery::default());
        }

        let prepared = PreparedMsg::event(event, data)?;
        let delivery = match qos {
            QoS::Lossy => publish_lossy(&targets, &prepared),
            QoS::Reliable { timeout_ms } => {
                let (d, stuck) = publish_reliable(&targets, &prepared, *timeout_ms).await;
                drop(targets);
                for sid in stuck {
                    if self.sessions.remove(sid).is_some() {
                        tracing::info!(session = sid, "evicted client that stopped reading");
                    }
                }
                d
            }
        };
        Ok(delivery)
    }
}

/// try_send only, drop if queue is full.
fn publish_lossy(targets: &[(u64, Connection)], prepared: &PreparedMsg) -> Delivery {
    let mut d = Delivery::default();
    for (sid, conn) in targets {
        match conn.tx.try_send(prepared.to_ws_message()) {
            Ok(()) => d.delivered += 1,
            Err(TrySendError::Full(_)) => {
                tracing::debug!(session = sid, "client queue full, event dropped");
                d.dropped += 1;
            }
            Err(TrySendError::Closed(_)) => d.dropped += 1,
        }
    }
    d
}

/// Send concurrently with optional timeout per client. Returns the tally and
/// the sessions that timed out.
async fn publish_reliable(
    targets: &[(u64, Connection)],
    prepared: &PreparedMsg,
    timeout_ms: u64,
) -> (Delivery, Vec<u64>) {
    let mut futs = FuturesUnordered::new();
    for (sid, conn) in targets {
        let msg = prepared.to_ws_message();
        futs.push(async move {
            let sent = if timeout_ms > 0 {
                match timeout(Duration::from_millis(timeout_ms), conn.tx.send(msg)).await {
                    Ok(r) => r.is_ok(),
                    Err(_) => {
                        tracing::debug!(session = sid, timeout_ms, "client send timed out");
                        return (*sid, SendResult::TimedOut);
                    }
                }
            } else {
                conn.tx.send(msg).await.is_ok()
            };
            if sent {
                (*sid, SendResult::Ok)
            } else {
                (*sid, SendResult::Dropped)
            }
        });
    }

    let mut d = Delivery::default();
    let mut stuck = Vec::new();
    while let Some((sid, r)) = futs.next().await {
        match r {
            SendResult::Ok => d.delivered += 1,
            SendResult::Dropped => d.dropped += 1,
            SendResult::TimedOut => {
                d.timed_out += 1;
                stuck.push(sid);
            }
        }
    }
    (d, stuck)
}
