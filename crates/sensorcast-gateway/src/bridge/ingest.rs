//! Ingest loop: broker source -> ordered queue -> decode -> fan-out.
//!
//! The reader and the processor are joined by a bounded mpsc queue. The
//! processor handles one message at a time (decode, then broadcast to
//! completion) so clients observe events in broker delivery order. A full
//! queue makes the reader wait; nothing is dropped between the two.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, watch};

use sensorcast_core::error::Result;
use sensorcast_core::protocol::envelope::{decode, MessageEnvelope};

use crate::app_state::AppState;
use crate::bridge::source::MessageSource;
use crate::bridge::status::BridgeStatus;
use crate::obs::BridgeMetrics;
use crate::realtime::{Delivery, QoS, RealtimeCore};

/// What happened to one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Decoded and handed to the publisher.
    Forwarded(Delivery),
    /// Not valid JSON; nothing was broadcast.
    Dropped,
}

pub struct Bridge {
    /// Configured filter; per-message topics may differ under wildcards.
    subscription: Arc<str>,
    event: Arc<str>,
    qos: QoS,
    capacity: usize,
    realtime: Arc<RealtimeCore>,
    metrics: Arc<BridgeMetrics>,
    status: Arc<BridgeStatus>,
}

impl Bridge {
    pub fn new(state: &AppState) -> Self {
        let cfg = state.cfg();
        Self {
            subscription: Arc::from(cfg.broker.topic.as_str()),
            event: Arc::from(cfg.fanout.event.as_str()),
            qos: cfg.fanout.qos(),
            capacity: cfg.broker.channel_capacity,
            realtime: state.realtime(),
            metrics: state.metrics(),
            status: state.bridge_status(),
        }
    }

    pub fn event_name(&self) -> &str {
        &self.event
    }

    /// Decode one message and broadcast it. Never fails: bad payloads are logged and dropped.
    pub async fn handle(&self, env: MessageEnvelope) -> Outcome {
        self.metrics.messages_received.inc(&[("subscription", self.subscription.as_ref())]);
        tracing::info!(topic = %env.topic, bytes = env.len(), payload = %env.preview(), "message received");

        let data = match decode(&env) {
            Ok(v) => v,
            Err(e) => {
                self.metrics.decode_failures.inc(&[]);
                tracing::warn!(topic = %env.topic, error = %e, "payload dropped");
                return Outcome::Dropped;
            }
        };
        drop(env);

        let started = Instant::now();
        match self.realtime.broadcast(&self.event, &data, &self.qos).await {
            Ok(d) => {
                self.metrics.broadcast_duration.observe(&[], started.elapsed());
                self.metrics.events_broadcast.inc(&[("event", self.event.as_ref())]);
                self.metrics.deliveries.add(&[("result", "ok")], d.delivered as u64);
                self.metrics.deliveries.add(&[("result", "dropped")], d.dropped as u64);
                self.metrics.deliveries.add(&[("result", "timeout")], d.timed_out as u64);
                tracing::debug!(event = %self.event, delivered = d.delivered, dropped = d.dropped, timed_out = d.timed_out, "event broadcast");
                Outcome::Forwarded(d)
            }
            Err(e) => {
                tracing::error!(event = %self.event, error = %e, "broadcast failed");
                Outcome::Dropped
            }
        }
    }

    /// Pump `source` until shutdown, source end, or broker failure.
    ///
    /// Messages already queued are processed before returning. The source is
    /// always closed. A broker failure marks the bridge `Failed` and is returned.
    pub async fn run<S: MessageSource>(&self, mut source: S, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let (tx, mut rx) = mpsc::channel::<MessageEnvelope>(self.capacity);

        let reader = async move {
            let res = loop {
                if *shutdown.borrow() {
                    break Ok(());
                }
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break Ok(());
                        }
                    }
                    next = source.next_message() => match next {
                        Ok(Some(env)) => {
                            if tx.send(env).await.is_err() {
                                break Ok(());
                            }
                        }
                        Ok(None) => {
                            tracing::info!("message source ended");
                            break Ok(());
                        }
                        Err(e) => break Err(e),
                    },
                }
            };
            drop(tx);

            if let Err(e) = source.close().await {
                tracing::warn!(error = %e, "closing message source failed");
            }
            res
        };

        let processor = async {
            while let Some(env) = rx.recv().await {
                self.handle(env).await;
            }
        };

        let (res, ()) = tokio::join!(reader, processor);

        if let Err(e) = &res {
            self.status.mark_failed();
            self.metrics.broker_errors.inc(&[("kind", e.kind().as_str())]);
            tracing::error!(error = %e, "bridge stopped: broker connection failed");
        }
        res
    }
}
