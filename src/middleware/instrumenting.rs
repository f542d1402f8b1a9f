//! Instrumenting middleware
//!
//! Counts requests and records their duration, labelled by operation and
//! whether an error occurred. `get` additionally records how many hosts
//! were returned.

use std::time::Instant;

use async_trait::async_trait;
use tower::Layer;

use super::method;
use crate::HostStatusMap;
use crate::metrics::ServiceMetrics;
use crate::service::{ServiceResult, StatusService};

pub struct InstrumentingMiddleware<S> {
    metrics: ServiceMetrics,
    next: S,
}

impl<S> InstrumentingMiddleware<S> {
    pub fn new(metrics: ServiceMetrics, next: S) -> Self {
        Self { metrics, next }
    }

    fn observe(&self, method: &str, failed: bool, begin: Instant) {
        let failed = failed.to_string();
        let labels = [method, failed.as_str()];
        self.metrics.requests.with_label_values(&labels).inc();
        self.metrics
            .request_duration
            .with_label_values(&labels)
            .observe(begin.elapsed().as_secs_f64());
    }
}

#[async_trait]
impl<S: StatusService> StatusService for InstrumentingMiddleware<S> {
    async fn refresh(&self) -> ServiceResult<()> {
        let begin = Instant::now();
        let result = self.next.refresh().await;
        self.observe(method::REFRESH, result.is_err(), begin);
        result
    }

    async fn get(&self) -> ServiceResult<HostStatusMap> {
        let begin = Instant::now();
        let result = self.next.get().await;
        self.observe(method::GET, result.is_err(), begin);

        let hosts = result.as_ref().map_or(0, |hosts| hosts.len());
        let failed = result.is_err().to_string();
        self.metrics
            .hosts_returned
            .with_label_values(&[method::GET, failed.as_str()])
            .observe(hosts as f64);
        result
    }
}

/// [`Layer`] producing an [`InstrumentingMiddleware`]
#[derive(Clone)]
pub struct InstrumentingLayer {
    metrics: ServiceMetrics,
}

impl InstrumentingLayer {
    pub fn new(metrics: ServiceMetrics) -> Self {
        Self { metrics }
    }
}

impl<S> Layer<S> for InstrumentingLayer {
    type Service = InstrumentingMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InstrumentingMiddleware::new(self.metrics.clone(), inner)
    }
}
