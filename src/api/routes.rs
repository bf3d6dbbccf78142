//! Router construction and server entry point.

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::chat;
use super::types::{ErrorResponse, HealthResponse};
use crate::agent::Agent;

/// Shared application state.
pub struct AppState {
    pub agent: Agent,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/chat", post(chat::chat))
        .route("/chat/stream", post(chat::chat_stream))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `host:port` and serve until Ctrl-C.
pub async fn serve(host: &str, port: u16, agent: Agent) -> anyhow::Result<()> {
    let state = Arc::new(AppState { agent });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!(addr = %listener.local_addr()?, "Todo Agent API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

pub(super) fn error_response(status: StatusCode, detail: String) -> Response {
    (status, Json(ErrorResponse { detail })).into_response()
}
