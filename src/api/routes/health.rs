//! Health check endpoint

use axum::{Json, extract::State, http::StatusCode};
use tracing::warn;

use crate::api::{error::ApiResult, state::ApiState, types::HealthResponse};

/// GET /health
///
/// Reports the status store's health; 503 when the store is not operational
pub async fn health_check(
    State(state): State<ApiState>,
) -> ApiResult<(StatusCode, Json<HealthResponse>)> {
    let health = state.store.health_check().await?;

    let (code, status) = if health.healthy {
        (StatusCode::OK, "ok")
    } else {
        warn!("status store unhealthy: {}", health.message);
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    Ok((
        code,
        Json(HealthResponse {
            status: status.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            message: health.message,
            storage: health.metadata,
        }),
    ))
}
