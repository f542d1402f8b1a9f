//! Tests for the decorated service as assembled by the binary
//!
//! Layer order: instrumenting, caching, logging, core service.

use std::sync::Arc;
use std::time::Duration;

use nagios_aggregator::{
    cache::ResponseCache,
    metrics::{self, ServiceMetrics},
    middleware::{CachingLayer, InstrumentingLayer, LoggingLayer},
    service::StatusService,
};
use prometheus::Registry;
use tower::ServiceBuilder;

use crate::helpers::StubService;

fn decorated(
    inner: Arc<StubService>,
    ttl: Duration,
) -> (Arc<dyn StatusService>, ServiceMetrics, Registry) {
    let registry = Registry::new();
    let metrics = ServiceMetrics::register(&registry).unwrap();
    let service = ServiceBuilder::new()
        .layer(InstrumentingLayer::new(metrics.clone()))
        .layer(CachingLayer::new(Arc::new(ResponseCache::new(ttl))))
        .layer(LoggingLayer)
        .service(inner);
    (Arc::new(service), metrics, registry)
}

#[tokio::test]
async fn test_cached_gets_are_still_counted() {
    let inner = StubService::new();
    let (service, metrics, _) = decorated(inner.clone(), Duration::from_secs(60));

    let first = service.get().await.unwrap();
    let second = service.get().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(inner.gets(), 1);
    assert_eq!(metrics.requests.with_label_values(&["get", "false"]).get(), 2);
}

#[tokio::test]
async fn test_refresh_invalidates_cached_response() {
    let inner = StubService::new();
    let (service, _, _) = decorated(inner.clone(), Duration::from_secs(60));

    service.get().await.unwrap();
    service.refresh().await.unwrap();
    let after = service.get().await.unwrap();

    assert_eq!(inner.gets(), 2);
    assert_eq!(inner.refreshes(), 1);
    assert_eq!(after["web1"][0].attribute("call"), Some("1"));
}

#[tokio::test]
async fn test_failed_refresh_invalidates_and_is_counted() {
    let inner = StubService::new();
    let (service, metrics, _) = decorated(inner.clone(), Duration::from_secs(60));

    service.get().await.unwrap();
    inner.set_failing(true);
    let err = service.refresh().await.unwrap_err();
    assert_eq!(err.to_string(), "invalid configuration: stub refresh failure");
    inner.set_failing(false);

    service.get().await.unwrap();
    assert_eq!(inner.gets(), 2);
    assert_eq!(
        metrics.requests.with_label_values(&["refresh", "true"]).get(),
        1
    );
}

#[tokio::test]
async fn test_errors_are_not_cached() {
    let inner = StubService::new();
    let (service, metrics, _) = decorated(inner.clone(), Duration::from_secs(60));

    inner.set_failing(true);
    assert!(service.get().await.is_err());
    inner.set_failing(false);
    assert!(service.get().await.is_ok());

    assert_eq!(inner.gets(), 2);
    assert_eq!(metrics.requests.with_label_values(&["get", "true"]).get(), 1);
    assert_eq!(metrics.requests.with_label_values(&["get", "false"]).get(), 1);
}

#[tokio::test]
async fn test_expired_entry_calls_inwards() {
    let inner = StubService::new();
    let (service, _, _) = decorated(inner.clone(), Duration::from_millis(20));

    service.get().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    service.get().await.unwrap();

    assert_eq!(inner.gets(), 2);
}

#[tokio::test]
async fn test_registry_exposes_observations() {
    let inner = StubService::new();
    let (service, _, registry) = decorated(inner, Duration::from_secs(60));

    service.refresh().await.unwrap();
    service.get().await.unwrap();

    let text = metrics::encode(&registry).unwrap();
    assert!(text.contains("nagios_aggregator_requests_total"));
    assert!(text.contains("nagios_aggregator_request_duration_seconds"));
    assert!(text.contains("nagios_aggregator_hosts_returned"));
    assert!(text.contains(r#"method="refresh""#));
}
