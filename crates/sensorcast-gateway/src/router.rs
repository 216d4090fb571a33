//! Axum router wiring.
//!
//! - `/ws` upgrades to the push channel
//! - `/healthz`, `/readyz`, `/metrics` for operations
//! - everything else is served from the static directory

use axum::{routing::get, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.cfg().gateway.static_dir);

    Router::new()
        .route("/ws", get(transport::ws::ws_upgrade))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
