pub mod health;
pub mod metrics;
pub mod status;

use crate::api::error::ApiError;

/// Fallback for unknown routes
pub async fn not_found(uri: axum::http::Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {}", uri.path()))
}
