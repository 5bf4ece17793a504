//! ndfad - NDFA validation and chat daemon.
//!
//! Accepts TCP clients, exchanges nicknames, then serves length-prefixed JSON
//! frames: automaton validation requests answered to the sender, and chat
//! lines broadcast to everyone.

mod config;
mod error;
mod handlers;
mod http;
mod metrics;
mod network;
mod state;
mod telemetry;

use crate::config::Config;
use crate::network::Gateway;
use crate::state::Hub;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = config::validation::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {}", errors.len(), config_path);
    }

    info!(
        server = %config.server.name,
        listen = %config.listen.address,
        max_sessions = config.limits.max_sessions,
        max_frame_len = config.limits.max_frame_len,
        "Starting ndfad"
    );

    let hub = Arc::new(Hub::new(&config));

    // Prometheus metrics are optional.
    // Convention: metrics_port = 0 disables the HTTP endpoint (used by tests).
    let metrics_port = config.server.metrics_port.unwrap_or(9090);
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        info!("Metrics initialized");

        let hub = Arc::clone(&hub);
        tokio::spawn(async move {
            http::run_http_server(metrics_port, hub).await;
        });
    }

    let gateway = Gateway::bind(config.listen.address, Arc::clone(&hub)).await?;
    info!(addr = %gateway.local_addr()?, "Server ready");

    tokio::select! {
        result = gateway.run() => {
            if let Err(e) = result {
                error!(error = %e, "Gateway stopped");
            }
        }
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("Received Ctrl-C, shutting down"),
                Err(e) => error!(error = %e, "Failed to listen for Ctrl-C, shutting down"),
            }
        }
    }

    hub.shutdown();
    info!("Shutdown complete");
    Ok(())
}
