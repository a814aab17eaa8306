//! chainread API Server Entry Point
//!
//! Loads configuration, wires the cache tiers and starts the Axum server.
//! On Ctrl-C the server stops accepting requests and pending cache
//! population is drained before exit.

use chainread_api::telemetry::init_tracing;
use chainread_api::{build_state, create_router, ApiError, ApiResult, ServiceConfig};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let config = ServiceConfig::from_env()
        .map_err(|e| ApiError::internal_error(format!("Invalid configuration: {}", e)))?;
    init_tracing(config.log_format)?;

    let state = build_state(&config)?;
    let reader = state.reader.clone();
    let app = create_router(state);

    let addr = config.bind_addr;
    tracing::info!(
        %addr,
        origin = %config.origin.base_url,
        local_capacity = config.reader.local_capacity,
        "Starting chainread API server"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    reader.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
