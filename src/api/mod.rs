//! HTTP server for the aggregated status view
//!
//! This module maps the two service operations onto HTTP requests.
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **Decorated service** shared by all handlers
//! - **Token bucket** (governor) in front of the refresh endpoint
//!
//! ## Endpoints
//!
//! - `GET /refresh` - Re-read snapshot files (429 when rate limited)
//! - `GET /nagios` - Current status of every host
//! - `GET /metrics` - Prometheus metrics
//! - `GET /health` - Status store health (503 when unavailable)

pub mod error;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::{CheckState, HealthResponse, HostStatusResponse, StatusResponse};

use std::net::SocketAddr;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8080")
    pub bind_addr: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// Build the router with all routes
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/refresh", get(routes::status::refresh))
        .route("/nagios", get(routes::status::get_status))
        .route("/metrics", get(routes::metrics::get_metrics))
        .route("/health", get(routes::health::health_check))
        .fallback(routes::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind the API server and serve until `shutdown` resolves
pub async fn serve(
    config: ApiConfig,
    state: ApiState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    info!("starting API server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("API server listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router(state)).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
