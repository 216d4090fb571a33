//! Broker-side message sources.
//!
//! `MessageSource` is the seam between the ingest loop and the broker client:
//! the loop only ever asks for the next message, in delivery order.

use std::sync::Arc;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, SubscribeReasonCode};
use tokio::time::Duration;

use sensorcast_core::error::{Result, SensorcastError};
use sensorcast_core::protocol::envelope::MessageEnvelope;

use crate::bridge::status::BridgeStatus;
use crate::config::BrokerSection;

/// Max time spent flushing DISCONNECT on close.
const CLOSE_FLUSH: Duration = Duration::from_millis(500);

#[async_trait]
pub trait MessageSource: Send {
    /// Next message on the subscription. `Ok(None)` means the source ended cleanly.
    async fn next_message(&mut self) -> Result<Option<MessageEnvelope>>;

    /// Release the underlying connection.
    async fn close(&mut self) -> Result<()>;
}

/// MQTT subscription on one topic, driven by the rumqttc event loop.
///
/// Subscribes on every `ConnAck`, but the event loop is never polled again
/// after an error, so a lost connection ends the source instead of
/// reconnecting behind the caller's back.
pub struct MqttSource {
    client: AsyncClient,
    eventloop: EventLoop,
    topic: String,
    qos: rumqttc::QoS,
    status: Arc<BridgeStatus>,
}

impl MqttSource {
    /// Build the client. No I/O happens until the first `next_message`.
    pub fn new(cfg: &BrokerSection, status: Arc<BridgeStatus>) -> Result<Self> {
        let (host, port) = cfg.address()?;
        let mut opts = MqttOptions::new(cfg.client_id(), host, port);
        opts.set_keep_alive(Duration::from_secs(cfg.keep_alive_secs));

        let (client, eventloop) = AsyncClient::new(opts, cfg.channel_capacity);

        Ok(Self {
            client,
            eventloop,
            topic: cfg.topic.clone(),
            qos: mqtt_qos(cfg.qos)?,
            status,
        })
    }
}

#[async_trait]
impl MessageSource for MqttSource {
    async fn next_message(&mut self) -> Result<Option<MessageEnvelope>> {
        loop {
            let event = self
                .eventloop
                .poll()
                .await
                .map_err(|e| SensorcastError::Broker(format!("connection lost: {e}")))?;

            match event {
                Event::Incoming(Packet::ConnAck(ack)) => {
                    tracing::info!(code = ?ack.code, topic = %self.topic, "connected to broker, subscribing");
                    self.client
                        .subscribe(self.topic.as_str(), self.qos)
                        .await
                        .map_err(|e| SensorcastError::Broker(format!("subscribe request failed: {e}")))?;
                }
                Event::Incoming(Packet::SubAck(ack)) => {
                    if ack
                        .return_codes
                        .iter()
                        .any(|c| matches!(c, SubscribeReasonCode::Failure))
                    {
                        return Err(SensorcastError::Broker(format!(
                            "broker rejected subscription to {}",
                            self.topic
                        )));
                    }
                    self.status.mark_subscribed();
                    tracing::info!(topic = %self.topic, "subscribed");
                }
                Event::Incoming(Packet::Publish(p)) => {
                    return Ok(Some(MessageEnvelope::new(p.topic, p.payload)));
                }
                Event::Incoming(Packet::Disconnect) => {
                    return Err(SensorcastError::Broker("broker sent DISCONNECT".into()));
                }
                _ => {}
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.client
            .disconnect()
            .await
            .map_err(|e| SensorcastError::Broker(format!("disconnect request failed: {e}")))?;

        // Drive the loop until DISCONNECT is on the wire.
        let eventloop = &mut self.eventloop;
        let _ = tokio::time::timeout(CLOSE_FLUSH, async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        })
        .await;

        tracing::info!(topic = %self.topic, "broker connection closed");
        Ok(())
    }
}

fn mqtt_qos(level: u8) -> Result<rumqttc::QoS> {
    match level {
        0 => Ok(rumqttc::QoS::AtMostOnce),
        1 => Ok(rumqttc::QoS::AtLeastOnce),
        2 => Ok(rumqttc::QoS::ExactlyOnce),
        other => Err(SensorcastError::Config(format!("invalid mqtt qos: {other}"))),
    }
}
