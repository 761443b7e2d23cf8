//! Thin axum binding: upgrade `/ws` connections into the session endpoint,
//! serve `/health` for liveness/readiness probes. No listener-side policy
//! (TLS termination, load balancing, rate limiting) lives here — that's the
//! deployment environment's job.

use crate::hub::Hub;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    room_count: usize,
    user_count: usize,
}

async fn health(State(hub): State<Arc<Hub>>) -> impl IntoResponse {
    Json(HealthBody {
        status: "ok",
        room_count: hub.room_count().await,
        user_count: hub.user_count().await,
    })
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(hub): State<Arc<Hub>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| crate::session::run(socket, hub))
}

pub fn router(hub: Arc<Hub>) -> Router {
    Router::new()
        .route("/ws", get(ws_upgrade))
        .route("/health", get(health))
        .with_state(hub)
}

pub async fn serve(hub: Arc<Hub>, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "relay listening");
    axum::serve(listener, router(hub)).await
}
