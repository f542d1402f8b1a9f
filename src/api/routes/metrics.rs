//! Prometheus exposition endpoint

use axum::{extract::State, http::header, response::IntoResponse};
use prometheus::TEXT_FORMAT;

use crate::api::{error::ApiResult, state::ApiState};
use crate::metrics::encode;

/// GET /metrics
pub async fn get_metrics(State(state): State<ApiState>) -> ApiResult<impl IntoResponse> {
    let body = encode(&state.registry)?;

    Ok(([(header::CONTENT_TYPE, TEXT_FORMAT)], body))
}
