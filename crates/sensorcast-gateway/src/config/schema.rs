use serde::Deserialize;
use sensorcast_core::error::{Result, SensorcastError};

use crate::realtime::QoS;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub broker: BrokerSection,

    #[serde(default)]
    pub fanout: FanoutSection,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            broker: BrokerSection::default(),
            fanout: FanoutSection::default(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(SensorcastError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.broker.validate()?;
        self.fanout.validate()?;

        Ok(())
    }
}

// --------------------
// gateway: HTTP / WS side
// --------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Per-session outbound queue depth.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,

    /// A socket write blocked longer than this ends the session.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            static_dir: default_static_dir(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            outbound_queue: default_outbound_queue(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(SensorcastError::Config(format!(
                "gateway.listen must be a valid socket address, got {:?}",
                self.listen
            )));
        }
        if self.static_dir.trim().is_empty() {
            return Err(SensorcastError::Config(
                "gateway.static_dir must not be empty".into(),
            ));
        }
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(SensorcastError::Config(
                "gateway.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(SensorcastError::Config(
                "gateway.idle_timeout_ms must be between 10000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(SensorcastError::Config(
                "gateway.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        if !(1..=65536).contains(&self.outbound_queue) {
            return Err(SensorcastError::Config(
                "gateway.outbound_queue must be between 1 and 65536".into(),
            ));
        }
        if !(100..=60000).contains(&self.write_timeout_ms) {
            return Err(SensorcastError::Config(
                "gateway.write_timeout_ms must be between 100 and 60000".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}
fn default_static_dir() -> String {
    "public".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_outbound_queue() -> usize {
    256
}
fn default_write_timeout_ms() -> u64 {
    10000
}

// --------------------
// broker: MQTT ingestion
// --------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrokerSection {
    /// `mqtt://host[:port]` or `tcp://host[:port]`.
    #[serde(default = "default_broker_url")]
    pub url: String,

    #[serde(default = "default_topic")]
    pub topic: String,

    /// Generated from the process id when absent.
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    /// Subscription QoS (0, 1 or 2).
    #[serde(default)]
    pub qos: u8,

    /// Depth of the queue between the broker reader and the processor.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for BrokerSection {
    fn default() -> Self {
        Self {
            url: default_broker_url(),
            topic: default_topic(),
            client_id: None,
            keep_alive_secs: default_keep_alive_secs(),
            qos: 0,
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl BrokerSection {
    pub fn validate(&self) -> Result<()> {
        self.address()?;
        if self.topic.is_empty() {
            return Err(SensorcastError::Config("broker.topic must not be empty".into()));
        }
        if let Some(id) = &self.client_id {
            if id.is_empty() {
                return Err(SensorcastError::Config(
                    "broker.client_id must not be empty when set".into(),
                ));
            }
        }
        if !(5..=3600).contains(&self.keep_alive_secs) {
            return Err(SensorcastError::Config(
                "broker.keep_alive_secs must be between 5 and 3600".into(),
            ));
        }
        if self.qos > 2 {
            return Err(SensorcastError::Config("broker.qos must be 0, 1 or 2".into()));
        }
        if !(1..=65536).contains(&self.channel_capacity) {
            return Err(SensorcastError::Config(
                "broker.channel_capacity must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }

    /// Split `url` into (host, port).
    pub fn address(&self) -> Result<(String, u16)> {
        parse_broker_url(&self.url)
    }

    pub fn client_id(&self) -> String {
        self.client_id
            .clone()
            .unwrap_or_else(|| format!("sensorcast-{}", std::process::id()))
    }
}

fn default_broker_url() -> String {
    "mqtt://localhost:1883".into()
}
fn default_topic() -> String {
    "test/gps".into()
}
fn default_keep_alive_secs() -> u64 {
    30
}
fn default_channel_capacity() -> usize {
    100
}

const DEFAULT_MQTT_PORT: u16 = 1883;

/// `mqtt://host[:port]`, `tcp://host[:port]` or `mqtt://[v6addr][:port]`.
/// Credentials and paths are not accepted.
pub fn parse_broker_url(url: &str) -> Result<(String, u16)> {
    let rest = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .ok_or_else(|| {
            SensorcastError::Config(format!("broker.url must start with mqtt:// or tcp://, got {url:?}"))
        })?;
    let rest = rest.trim_end_matches('/');
    if rest.is_empty() {
        return Err(SensorcastError::Config("broker.url has no host".into()));
    }
    if rest.contains('@') {
        return Err(SensorcastError::Config(
            "broker.url must not contain credentials".into(),
        ));
    }
    if rest.contains('/') {
        return Err(SensorcastError::Config(format!("broker.url must not contain a path, got {url:?}")));
    }

    // [v6addr] or [v6addr]:port
    if let Some(bracketed) = rest.strip_prefix('[') {
        let (host, tail) = bracketed
            .split_once(']')
            .ok_or_else(|| SensorcastError::Config(format!("broker.url has an unclosed '[': {url:?}")))?;
        if host.parse::<std::net::Ipv6Addr>().is_err() {
            return Err(SensorcastError::Config(format!("broker.url has an invalid IPv6 host: {host:?}")));
        }
        let port = match tail {
            "" => DEFAULT_MQTT_PORT,
            t => parse_port(t.strip_prefix(':').ok_or_else(|| {
                SensorcastError::Config(format!("broker.url has junk after the IPv6 host: {url:?}"))
            })?)?,
        };
        return Ok((host.to_string(), port));
    }

    let (host, port) = match rest.rsplit_once(':') {
        Some((host, port)) => (host, parse_port(port)?),
        None => (rest, DEFAULT_MQTT_PORT),
    };
    if host.is_empty() {
        return Err(SensorcastError::Config("broker.url has no host".into()));
    }
    if host.contains([':', '[', ']']) {
        return Err(SensorcastError::Config(format!(
            "broker.url IPv6 hosts must be bracketed, got {url:?}"
        )));
    }
    Ok((host.to_string(), port))
}

fn parse_port(port: &str) -> Result<u16> {
    port.parse()
        .map_err(|_| SensorcastError::Config(format!("broker.url has invalid port: {port:?}")))
}

// --------------------
// fanout: client push
// --------------------
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FanoutSection {
    #[serde(default = "default_event")]
    pub event: String,

    #[serde(default)]
    pub delivery: DeliveryMode,

    /// Per-client send timeout for `reliable` delivery. 0 disables it.
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
}

impl Default for FanoutSection {
    fn default() -> Self {
        Self {
            event: default_event(),
            delivery: DeliveryMode::default(),
            send_timeout_ms: default_send_timeout_ms(),
        }
    }
}

impl FanoutSection {
    pub fn validate(&self) -> Result<()> {
        if self.event.is_empty() {
            return Err(SensorcastError::Config("fanout.event must not be empty".into()));
        }
        if self.send_timeout_ms > 60000 {
            return Err(SensorcastError::Config(
                "fanout.send_timeout_ms must be at most 60000".into(),
            ));
        }
        Ok(())
    }

    pub fn qos(&self) -> QoS {
        match self.delivery {
            DeliveryMode::Lossy => QoS::Lossy,
            DeliveryMode::Reliable => QoS::Reliable {
                timeout_ms: self.send_timeout_ms,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    Lossy,
    #[default]
    Reliable,
}

fn default_event() -> String {
    "datos_sensor".into()
}
fn default_send_timeout_ms() -> u64 {
    1500
}
