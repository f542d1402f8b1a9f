//! Prometheus metrics for the aggregation service
//!
//! Collectors are registered on a caller-owned [`Registry`] so tests and
//! embedding applications can keep independent sets.
//!
//! # Usage
//!
//! ```ignore
//! let registry = Registry::new();
//! let metrics = ServiceMetrics::register(&registry)?;
//! let body = metrics::encode(&registry)?;
//! ```

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

const NAMESPACE: &str = "nagios_aggregator";
const LABELS: &[&str] = &["method", "error"];

/// Collectors observed by the instrumenting middleware
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Number of requests received
    pub requests: IntCounterVec,

    /// Request duration in seconds
    pub request_duration: HistogramVec,

    /// Number of hosts returned by a query
    pub hosts_returned: HistogramVec,
}

impl ServiceMetrics {
    /// Create the collectors and register them on `registry`
    pub fn register(registry: &Registry) -> prometheus::Result<Self> {
        let requests = IntCounterVec::new(
            Opts::new("requests_total", "Number of requests received").namespace(NAMESPACE),
            LABELS,
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "request_duration_seconds",
                "Total duration of requests in seconds",
            )
            .namespace(NAMESPACE)
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            LABELS,
        )?;
        let hosts_returned = HistogramVec::new(
            HistogramOpts::new("hosts_returned", "Number of hosts returned per query")
                .namespace(NAMESPACE)
                .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0]),
            LABELS,
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(hosts_returned.clone()))?;

        Ok(Self {
            requests,
            request_duration,
            hosts_returned,
        })
    }
}

/// Render every collector of `registry` in the text exposition format
pub fn encode(registry: &Registry) -> prometheus::Result<String> {
    let mut buffer = vec![];
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
