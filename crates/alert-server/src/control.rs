//! Engine-control HTTP plane: start/stop/check-now/status only.
//!
//! No CRUD surface for locations/channels/trials here — those are managed directly
//! against the database in this build. The control plane exists purely to let an
//! operator or systemd unit flip the engine on and off.

use alert_core::summary::PollSummary;
use alert_engine::{AlertEngine, EngineStatus};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;

#[derive(Clone)]
struct AppState {
    engine: AlertEngine,
}

pub fn build_router(engine: AlertEngine) -> Router {
    let state = AppState { engine };
    Router::new()
        .route("/engine/start", post(start))
        .route("/engine/stop", post(stop))
        .route("/engine/check-now", post(check_now))
        .route("/engine/status", get(status))
        .with_state(state)
}

pub async fn serve(engine: AlertEngine, bind: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = bind.parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(event = "alert_server.control_plane_listening", %addr);
    let app = build_router(engine);
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

async fn start(State(state): State<AppState>) -> impl IntoResponse {
    state.engine.start().await;
    StatusCode::ACCEPTED
}

async fn stop(State(state): State<AppState>) -> impl IntoResponse {
    state.engine.stop().await;
    StatusCode::ACCEPTED
}

async fn check_now(State(state): State<AppState>) -> Json<PollSummary> {
    Json(state.engine.check_now().await)
}

async fn status(State(state): State<AppState>) -> Json<EngineStatus> {
    Json(state.engine.status().await)
}
