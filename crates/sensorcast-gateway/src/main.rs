//! sensorcast gateway
//!
//! - MQTT subscription (default `mqtt://localhost:1883`, topic `test/gps`)
//! - Each JSON payload is pushed to every WS client on `/ws` as `datos_sensor`
//! - Static files from `public/`, ops endpoints, Prometheus metrics
//!
//! Usage: `sensorcast-gateway [config.yaml]`. Without an argument
//! `sensorcast.yaml` is read if present, otherwise defaults apply.
//! A lost broker connection stops the process with a non-zero exit code.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sensorcast_core::error::{Result, SensorcastError};
use sensorcast_gateway::{
    app_state::AppState,
    bridge::{Bridge, MqttSource},
    config, router,
};

const DEFAULT_CONFIG: &str = "sensorcast.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, kind = e.kind().as_str(), "sensorcast-gateway stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let arg = std::env::args().nth(1);
    let explicit = arg.is_some();
    let path = PathBuf::from(arg.unwrap_or_else(|| DEFAULT_CONFIG.to_string()));
    let cfg = config::load_or_default(&path, explicit)?;

    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .map_err(|e| SensorcastError::Config(format!("gateway.listen: {e}")))?;

    let state = AppState::new(cfg)?;
    let source = MqttSource::new(&state.cfg().broker, state.bridge_status())?;
    let bridge = Bridge::new(&state);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ---- HTTP / WS
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| SensorcastError::Internal(format!("bind {listen} failed: {e}")))?;
    tracing::info!(%listen, static_dir = %state.cfg().gateway.static_dir, "web server listening");

    let app = router::build_router(state.clone());
    let mut server_stop = shutdown_rx.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = server_stop.wait_for(|stop| *stop).await;
            })
            .await
    });

    // ---- bridge
    tracing::info!(
        broker = %state.cfg().broker.url,
        topic = %state.cfg().broker.topic,
        event = %bridge.event_name(),
        "bridge starting"
    );
    let mut bridge_task = tokio::spawn(async move { bridge.run(source, shutdown_rx).await });

    let finished = tokio::select! {
        res = &mut bridge_task => Some(res),
        _ = shutdown_signal() => {
            tracing::info!("shutdown requested");
            None
        }
    };

    // Tear down both halves explicitly.
    let _ = shutdown_tx.send(true);
    let bridge_res = match finished {
        Some(res) => res,
        None => bridge_task.await,
    }
    .map_err(|e| SensorcastError::Internal(format!("bridge task panicked: {e}")))?;

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "web server failed"),
        Err(e) => tracing::error!(error = %e, "web server task panicked"),
    }

    bridge_res
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
