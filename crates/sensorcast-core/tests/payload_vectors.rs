//! Broker payload vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use sensorcast_core::protocol::envelope::{decode, MessageEnvelope};
use sensorcast_core::protocol::event::{EventFrame, OutboundEvent};
use sensorcast_core::ErrorKind;

fn load(name: &str) -> Vec<u8> {
    fs::read(format!("tests/vectors/{name}")).unwrap()
}

#[test]
fn esp32_reading_passes_through_unchanged() {
    let env = MessageEnvelope::new("test/gps", load("esp32_reading.json"));
    let v = decode(&env).unwrap();
    assert_eq!(v["temp"], 23.41);
    assert_eq!(v["press"], 944.87);
    assert!(v["gps"].as_str().unwrap().starts_with("$GPRMC"));

    let text = OutboundEvent::new("datos_sensor", &v).to_text().unwrap();
    let frame = EventFrame::parse(&text).unwrap();
    assert_eq!(frame.event, "datos_sensor");
    assert_eq!(frame.data, v);
}

#[test]
fn esp32_without_sensor_keeps_nulls() {
    let env = MessageEnvelope::new("test/gps", load("esp32_no_sensor.json"));
    let v = decode(&env).unwrap();
    assert!(v["temp"].is_null());
    assert!(v["press"].is_null());
    assert_eq!(v["gps"], "-");
}

#[test]
fn truncated_payload_is_invalid() {
    let env = MessageEnvelope::new("test/gps", load("truncated.txt"));
    assert_eq!(decode(&env).unwrap_err().kind(), ErrorKind::InvalidPayload);
}

#[test]
fn plain_text_is_invalid() {
    let env = MessageEnvelope::new("test/gps", load("not_json.txt"));
    assert_eq!(decode(&env).unwrap_err().kind(), ErrorKind::InvalidPayload);
}

#[test]
fn scalar_json_is_accepted() {
    let env = MessageEnvelope::new("test/gps", "42");
    assert_eq!(decode(&env).unwrap(), 42);
}
