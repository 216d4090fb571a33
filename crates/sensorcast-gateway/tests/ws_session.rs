#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

//! Full HTTP/WS path: a real listener, a real WebSocket client.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use sensorcast_core::protocol::envelope::MessageEnvelope;
use sensorcast_core::protocol::event::EventFrame;
use sensorcast_gateway::{app_state::AppState, bridge::Bridge, config::GatewayConfig, router};

const TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

fn state() -> AppState {
    let mut cfg = GatewayConfig::default();
    cfg.gateway.static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../../public").into();
    AppState::new(cfg).unwrap()
}

async fn serve(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router::build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> WsStream {
    let (ws, _resp) = connect_async(format!("ws://{addr}/ws")).await.expect("ws connect");
    ws
}

/// Session registration happens on the server after the handshake returns.
async fn wait_for_clients(state: &AppState, n: usize) {
    timeout(TIMEOUT, async {
        while state.realtime().connected() != n {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("expected {n} clients, have {}", state.realtime().connected()));
}

/// Next text frame, skipping keep-alive control frames.
async fn next_event(ws: &mut WsStream) -> EventFrame {
    loop {
        let msg = timeout(TIMEOUT, ws.next())
            .await
            .expect("frame in time")
            .expect("stream open")
            .expect("frame ok");
        match msg {
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Text(_) => return EventFrame::parse(msg.to_text().unwrap()).unwrap(),
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

#[tokio::test]
async fn connect_receive_and_close() {
    let st = state();
    let addr = serve(st.clone()).await;
    let bridge = Bridge::new(&st);

    let mut ws = connect(addr).await;
    wait_for_clients(&st, 1).await;
    assert_eq!(st.metrics().ws_upgrades.get(&[]), 1);
    assert_eq!(st.metrics().ws_active_sessions.get(&[]), 1);

    let payload = r#"{"temp":22.4,"press":1013.2,"gps":"40.4168,-3.7038"}"#;
    bridge.handle(MessageEnvelope::new("test/gps", payload.to_string())).await;

    let frame = next_event(&mut ws).await;
    assert_eq!(frame.event, "datos_sensor");
    assert_eq!(frame.data["press"], serde_json::json!(1013.2));

    ws.close(None).await.unwrap();
    wait_for_clients(&st, 0).await;
    assert_eq!(st.metrics().ws_active_sessions.get(&[]), 0);
}

#[tokio::test]
async fn every_socket_gets_the_same_frame() {
    let st = state();
    let addr = serve(st.clone()).await;
    let bridge = Bridge::new(&st);

    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    wait_for_clients(&st, 2).await;

    bridge.handle(MessageEnvelope::new("test/gps", r#"{"seq":1}"#.to_string())).await;
    assert_eq!(next_event(&mut a).await, next_event(&mut b).await);

    drop(a);
    wait_for_clients(&st, 1).await;
    bridge.handle(MessageEnvelope::new("test/gps", r#"{"seq":2}"#.to_string())).await;
    assert_eq!(next_event(&mut b).await.data, serde_json::json!({"seq": 2}));
}

#[tokio::test]
async fn evicted_session_is_closed_by_the_server() {
    let st = state();
    let addr = serve(st.clone()).await;

    let mut ws = connect(addr).await;
    wait_for_clients(&st, 1).await;

    let (sid, _) = st.realtime().sessions.snapshot().remove(0);
    st.realtime().sessions.remove(sid);

    let ended = timeout(TIMEOUT, async {
        loop {
            match ws.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(ended.is_ok(), "server kept the evicted socket open");

    timeout(TIMEOUT, async {
        while st.metrics().ws_active_sessions.get(&[]) != 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("session loop exited");
}

#[tokio::test]
async fn static_files_and_readiness() {
    let st = state();
    let addr = serve(st.clone()).await;

    let index = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert_eq!(index.status(), reqwest::StatusCode::OK);
    assert!(index.text().await.unwrap().contains("datos_sensor"));

    let missing = reqwest::get(format!("http://{addr}/nope.js")).await.unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

    let ready = reqwest::get(format!("http://{addr}/readyz")).await.unwrap();
    assert_eq!(ready.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

    st.bridge_status().mark_subscribed();
    let ready = reqwest::get(format!("http://{addr}/readyz")).await.unwrap();
    assert_eq!(ready.status(), reqwest::StatusCode::OK);
}
