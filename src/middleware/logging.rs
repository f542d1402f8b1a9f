//! Logging middleware
//!
//! Emits one event per call once the inner service has returned. The
//! result is handed back untouched.

use std::time::Instant;

use async_trait::async_trait;
use tower::Layer;
use tracing::{info, warn};

use super::method;
use crate::HostStatusMap;
use crate::service::{ServiceResult, StatusService};

/// Logs every call with its duration and outcome
#[derive(Debug, Clone)]
pub struct LoggingMiddleware<S> {
    next: S,
}

impl<S> LoggingMiddleware<S> {
    pub fn new(next: S) -> Self {
        Self { next }
    }
}

#[async_trait]
impl<S: StatusService> StatusService for LoggingMiddleware<S> {
    async fn refresh(&self) -> ServiceResult<()> {
        let begin = Instant::now();
        let result = self.next.refresh().await;
        let took = begin.elapsed();

        match &result {
            Ok(()) => info!(method = method::REFRESH, ?took, "refreshed status data"),
            Err(e) => warn!(method = method::REFRESH, err = %e, ?took, "refresh failed"),
        }
        result
    }

    async fn get(&self) -> ServiceResult<HostStatusMap> {
        let begin = Instant::now();
        let result = self.next.get().await;
        let took = begin.elapsed();

        match &result {
            Ok(hosts) => info!(
                method = method::GET,
                numhosts = hosts.len(),
                ?took,
                "served status data"
            ),
            Err(e) => warn!(method = method::GET, err = %e, ?took, "query failed"),
        }
        result
    }
}

/// [`Layer`] producing a [`LoggingMiddleware`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer;

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingMiddleware::new(inner)
    }
}
