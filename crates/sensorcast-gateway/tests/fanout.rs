#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use axum::extract::ws::Message;
use serde_json::json;
use tokio::sync::mpsc;

use sensorcast_core::protocol::event::EventFrame;
use sensorcast_gateway::realtime::{Connection, Delivery, QoS, RealtimeCore};

fn client(core: &RealtimeCore, queue: usize) -> (u64, mpsc::Receiver<Message>) {
    let (tx, rx) = mpsc::channel(queue);
    (core.sessions.insert(Connection { tx }), rx)
}

fn frame(rx: &mut mpsc::Receiver<Message>) -> EventFrame {
    match rx.try_recv().expect("frame queued") {
        Message::Text(s) => EventFrame::parse(&s).unwrap(),
        other => panic!("unexpected frame: {other:?}"),
    }
}

#[tokio::test]
async fn broadcast_without_clients_is_noop() {
    let core = RealtimeCore::new();
    let d = core
        .broadcast("datos_sensor", &json!({"v": 1}), &QoS::Lossy)
        .await
        .unwrap();
    assert_eq!(d, Delivery::default());
}

#[tokio::test]
async fn every_connected_client_gets_the_event() {
    let core = RealtimeCore::new();
    let mut rxs: Vec<_> = (0..3).map(|_| client(&core, 4).1).collect();

    let data = json!({"temp": 21.5, "press": null, "gps": "-"});
    let d = core
        .broadcast("datos_sensor", &data, &QoS::Reliable { timeout_ms: 0 })
        .await
        .unwrap();
    assert_eq!(d.delivered, 3);

    for rx in &mut rxs {
        let f = frame(rx);
        assert_eq!(f.event, "datos_sensor");
        assert_eq!(f.data, data);
    }
}

#[tokio::test]
async fn disconnected_client_is_not_targeted() {
    let core = RealtimeCore::new();
    let (gone, _rx_gone) = client(&core, 4);
    let (_kept, mut rx) = client(&core, 4);
    core.sessions.remove(gone);

    let d = core.broadcast("e", &json!(1), &QoS::Lossy).await.unwrap();
    assert_eq!(d.attempted(), 1);
    assert_eq!(frame(&mut rx).data, json!(1));
}

#[tokio::test]
async fn lossy_drops_for_full_queue_only() {
    let core = RealtimeCore::new();
    let (_slow, mut slow_rx) = client(&core, 1);
    let (_fast, mut fast_rx) = client(&core, 8);

    core.broadcast("e", &json!({"n": 1}), &QoS::Lossy).await.unwrap();
    let d = core.broadcast("e", &json!({"n": 2}), &QoS::Lossy).await.unwrap();
    assert_eq!(d, Delivery { delivered: 1, dropped: 1, timed_out: 0 });

    assert_eq!(frame(&mut slow_rx).data, json!({"n": 1}));
    assert!(slow_rx.try_recv().is_err());
    assert_eq!(frame(&mut fast_rx).data, json!({"n": 1}));
    assert_eq!(frame(&mut fast_rx).data, json!({"n": 2}));
}

#[tokio::test]
async fn reliable_times_out_on_stuck_client() {
    let core = RealtimeCore::new();
    let (_stuck, _stuck_rx) = client(&core, 1);
    let (_ok, mut ok_rx) = client(&core, 8);
    let qos = QoS::Reliable { timeout_ms: 20 };

    core.broadcast("e", &json!(1), &qos).await.unwrap();
    let d = core.broadcast("e", &json!(2), &qos).await.unwrap();
    assert_eq!(d, Delivery { delivered: 1, dropped: 0, timed_out: 1 });

    assert_eq!(frame(&mut ok_rx).data, json!(1));
    assert_eq!(frame(&mut ok_rx).data, json!(2));
}

#[tokio::test]
async fn timed_out_client_is_evicted() {
    let core = RealtimeCore::new();
    let (stuck, mut stuck_rx) = client(&core, 1);
    let (kept, _ok_rx) = client(&core, 8);
    let qos = QoS::Reliable { timeout_ms: 20 };

    core.broadcast("e", &json!(1), &qos).await.unwrap();
    core.broadcast("e", &json!(2), &qos).await.unwrap();
    assert_eq!(core.connected(), 1);
    assert!(core.sessions.remove(stuck).is_none());

    let d = core.broadcast("e", &json!(3), &qos).await.unwrap();
    assert_eq!(d, Delivery { delivered: 1, dropped: 0, timed_out: 0 });
    assert!(core.sessions.remove(kept).is_some());

    // The evicted queue keeps what it already accepted, then reports closed.
    assert_eq!(frame(&mut stuck_rx).data, json!(1));
    assert!(stuck_rx.recv().await.is_none());
}

#[tokio::test]
async fn closed_client_queue_counts_as_dropped() {
    let core = RealtimeCore::new();
    let (_sid, rx) = client(&core, 4);
    drop(rx);

    let d = core
        .broadcast("e", &json!(1), &QoS::Reliable { timeout_ms: 100 })
        .await
        .unwrap();
    assert_eq!(d, Delivery { delivered: 0, dropped: 1, timed_out: 0 });
}
