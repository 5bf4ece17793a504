//! HTTP server for the metrics and health endpoints.
//!
//! Runs on a separate tokio task. `/metrics` serves Prometheus text;
//! `/health` reports liveness and the current session count as JSON.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::state::Hub;

async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

async fn health_handler(State(hub): State<Arc<Hub>>) -> Json<Value> {
    Json(json!({
        "status": if hub.is_shutting_down() { "stopping" } else { "ok" },
        "sessions": hub.registry.len(),
        "capacity": hub.registry.capacity(),
    }))
}

fn router(hub: Arc<Hub>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(hub)
}

/// Run the HTTP server.
///
/// Binds to `0.0.0.0:port`. This is a long-running task that should be
/// spawned in the background; bind failures are logged, not fatal.
pub async fn run_http_server(port: u16, hub: Arc<Hub>) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind HTTP server");
            return;
        }
    };
    tracing::info!(%addr, "Metrics HTTP server listening");

    if let Err(e) = axum::serve(listener, router(hub)).await {
        tracing::error!(error = %e, "HTTP server error");
    }
}
