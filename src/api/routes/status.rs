//! Status query and refresh endpoints

use axum::{Json, extract::State};
use serde_json::{Value, json};
use tracing::debug;

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{HostStatusResponse, present},
};

/// GET /refresh
///
/// Re-read all snapshot files. Rejected with 429 while the rate limiter
/// has no token; rejected calls never reach the service.
pub async fn refresh(State(state): State<ApiState>) -> ApiResult<Json<Value>> {
    if state.refresh_limiter.check().is_err() {
        debug!("refresh rejected by rate limiter");
        return Err(ApiError::RateLimited);
    }

    state.service.refresh().await?;

    Ok(Json(json!({})))
}

/// GET /nagios
///
/// Current status of every host
pub async fn get_status(State(state): State<ApiState>) -> ApiResult<Json<HostStatusResponse>> {
    let hosts = state.service.get().await?;

    Ok(Json(present(&hosts)))
}
