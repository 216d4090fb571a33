//! WebSocket handler for push clients.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS
//! - Register the session's outbound queue with the publisher, remove it on exit
//! - Writer: drain the outbound queue into the socket, bounded by a write timeout
//! - Lifecycle: ping/pong + idle timeout
//!
//! The registry holds the only strong sender of a session's queue. Once the
//! publisher evicts the session, the queue drains and the loop ends.
//!
//! The channel is push-only. Text/binary frames from clients are read (to keep
//! the connection alive and detect close) and otherwise ignored.

use std::borrow::Cow;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::Instrument;

use crate::app_state::AppState;
use crate::realtime::Connection;

// --------------------
// Entry
// --------------------
pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    app.metrics().ws_upgrades.inc(&[]);
    ws.on_upgrade(move |socket| run_session(app, socket))
}

// --------------------
// Core session loop
// --------------------
async fn run_session(app: AppState, socket: WebSocket) {
    let realtime = app.realtime();
    let metrics = app.metrics();

    // ---- outbound channel, visible to the publisher from here on
    let (out_tx, out_rx) = mpsc::channel::<Message>(app.cfg().gateway.outbound_queue);
    let self_tx = out_tx.downgrade();
    let sid = realtime.sessions.insert(Connection { tx: out_tx });
    metrics.ws_active_sessions.inc(&[]);

    let span = tracing::info_span!("ws_session", sid);
    let reason = session_loop(&app, socket, self_tx, out_rx)
        .instrument(span.clone())
        .await;

    realtime.sessions.remove(sid);
    metrics.ws_active_sessions.dec(&[]);
    span.in_scope(|| {
        tracing::info!(reason, clients = realtime.connected(), "client disconnected");
    });
}

async fn session_loop(
    app: &AppState,
    socket: WebSocket,
    self_tx: mpsc::WeakSender<Message>,
    mut out_rx: mpsc::Receiver<Message>,
) -> &'static str {
    let gw = &app.cfg().gateway;
    tracing::info!(clients = app.realtime().connected(), "client connected");

    let (mut ws_tx, mut ws_rx) = socket.split();

    // ---- timers
    let ping_every = Duration::from_millis(gw.ping_interval_ms);
    let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);
    let write_timeout = Duration::from_millis(gw.write_timeout_ms);

    let mut ping_tick = tokio::time::interval(ping_every);
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                let Some(m) = maybe_out else { break "outbound closed"; };
                match tokio::time::timeout(write_timeout, ws_tx.send(m)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(_)) => break "write failed",
                    Err(_) => break "write timeout",
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(Ok(msg)) = incoming else { break "read closed"; };
                last_activity = Instant::now();

                match msg {
                    Message::Text(s) => {
                        tracing::debug!(bytes = s.len(), "ignoring inbound text frame");
                    }
                    Message::Binary(b) => {
                        tracing::debug!(bytes = b.len(), "ignoring inbound binary frame");
                    }
                    Message::Ping(payload) => queue_control(&self_tx, Message::Pong(payload)),
                    Message::Pong(_) => {}
                    Message::Close(_) => break "client closed",
                }
            }

            // ping
            _ = ping_tick.tick() => queue_control(&self_tx, Message::Ping(Vec::new())),

            // idle timeout
            _ = tokio::time::sleep(Duration::from_millis(250)) => {
                if last_activity.elapsed() >= idle_timeout {
                    let close = Message::Close(Some(CloseFrame {
                        code: close_code::AWAY,
                        reason: Cow::from("idle timeout"),
                    }));
                    let _ = tokio::time::timeout(write_timeout, ws_tx.send(close)).await;
                    break "idle timeout";
                }
            }
        }
    }
}

/// Queue a ping/pong behind pending events. No-op once the session was evicted.
fn queue_control(self_tx: &mpsc::WeakSender<Message>, msg: Message) {
    if let Some(tx) = self_tx.upgrade() {
        let _ = tx.try_send(msg);
    }
}
