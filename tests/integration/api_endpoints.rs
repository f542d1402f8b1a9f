//! Integration tests for API endpoints
//!
//! These tests verify that:
//! - Query and refresh endpoints return correct responses
//! - Refresh is rate limited
//! - Metrics and health endpoints respond
//! - Health follows the status store
//! - Unknown routes return 404

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use nagios_aggregator::{
    HostStatusMap,
    aggregator::MergePolicy,
    api::{ApiConfig, ApiState, spawn_api_server},
    cache::ResponseCache,
    metrics::ServiceMetrics,
    middleware::{CachingLayer, InstrumentingLayer, LoggingLayer},
    service::{AggregationService, StatusService},
    storage::{HealthStatus, HostRetention, StatusStore, StorageError, StorageResult},
};
use prometheus::Registry;
use serde_json::Value;
use tempfile::{TempDir, tempdir};
use tower::ServiceBuilder;

use crate::helpers::{host_block, memory_service, status_block, write_snapshot};

async fn spawn_test_api(status_dir: &TempDir, refresh_interval: Duration) -> SocketAddr {
    let (service, store) = memory_service(
        status_dir.path(),
        MergePolicy::Append,
        HostRetention::Keep,
    );
    spawn_api(service, store, refresh_interval).await
}

async fn spawn_api(
    service: impl StatusService + 'static,
    store: Arc<dyn StatusStore>,
    refresh_interval: Duration,
) -> SocketAddr {
    let registry = Registry::new();
    let metrics = ServiceMetrics::register(&registry).unwrap();
    let service: Arc<dyn StatusService> = Arc::new(
        ServiceBuilder::new()
            .layer(InstrumentingLayer::new(metrics))
            .layer(CachingLayer::new(Arc::new(ResponseCache::new(
                Duration::from_secs(60),
            ))))
            .layer(LoggingLayer)
            .service(service),
    );

    let state = ApiState::new(service, store, registry, refresh_interval).unwrap();
    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
    };

    spawn_api_server(config, state).await.unwrap()
}

/// Store whose engine reports itself as unavailable
struct UnavailableStore;

#[async_trait]
impl StatusStore for UnavailableStore {
    async fn put_all(&self, _: HostStatusMap, _: HostRetention) -> StorageResult<()> {
        Err(StorageError::BackendError("engine unavailable".into()))
    }

    async fn get_all(&self) -> StorageResult<HostStatusMap> {
        Err(StorageError::BackendError("engine unavailable".into()))
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        Ok(HealthStatus {
            healthy: false,
            message: "engine unavailable".to_string(),
            metadata: HashMap::new(),
        })
    }

    async fn get_stats(&self) -> StorageResult<String> {
        Ok("unavailable".to_string())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}

fn populated_dir() -> TempDir {
    let dir = tempdir().unwrap();
    write_snapshot(dir.path(), "a.dat", &host_block("web1", 1));
    write_snapshot(
        dir.path(),
        "b.dat",
        &status_block(
            "servicestatus",
            "web1",
            &[
                ("service_description", "HTTP"),
                ("current_state", "2"),
                ("plugin_output", "connection refused"),
                ("current_attempt", "1"),
                ("max_attempts", "3"),
            ],
        ),
    );
    dir
}

#[tokio::test]
async fn test_query_before_refresh_is_server_error() {
    let dir = populated_dir();
    let addr = spawn_test_api(&dir, Duration::from_secs(60)).await;

    let response = reqwest::get(format!("http://{addr}/nagios")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("no status data"));
}

#[tokio::test]
async fn test_refresh_then_query() {
    let dir = populated_dir();
    let addr = spawn_test_api(&dir, Duration::from_secs(60)).await;

    let response = reqwest::get(format!("http://{addr}/refresh")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({}));

    let response = reqwest::get(format!("http://{addr}/nagios")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    let records = body["web1"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["kind"], "hoststatus");
    assert_eq!(records[0]["state"], "DOWN");
    assert_eq!(records[1]["state"], "CRITICAL");
    assert_eq!(records[1]["service"], "HTTP");
    assert_eq!(records[1]["output"], "connection refused");
    assert_eq!(records[1]["attempts"], "1/3");
}

#[tokio::test]
async fn test_refresh_is_rate_limited() {
    let dir = populated_dir();
    let addr = spawn_test_api(&dir, Duration::from_millis(500)).await;
    let url = format!("http://{addr}/refresh");

    let first = reqwest::get(&url).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = reqwest::get(&url).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    tokio::time::sleep(Duration::from_millis(700)).await;

    let third = reqwest::get(&url).await.unwrap();
    assert_eq!(third.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let dir = populated_dir();
    let addr = spawn_test_api(&dir, Duration::from_secs(60)).await;

    reqwest::get(format!("http://{addr}/refresh")).await.unwrap();
    reqwest::get(format!("http://{addr}/nagios")).await.unwrap();

    let response = reqwest::get(format!("http://{addr}/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = response.text().await.unwrap();
    assert!(text.contains("nagios_aggregator_requests_total"));
    assert!(text.contains(r#"method="get""#));
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempdir().unwrap();
    let addr = spawn_test_api(&dir, Duration::from_secs(60)).await;

    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"]["backend"], "memory");
}

#[tokio::test]
async fn test_health_reports_unavailable_store() {
    let dir = tempdir().unwrap();
    let store: Arc<dyn StatusStore> = Arc::new(UnavailableStore);
    let service = AggregationService::new(dir.path(), Arc::clone(&store)).unwrap();
    let addr = spawn_api(service, store, Duration::from_secs(60)).await;

    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "unavailable");
    assert_eq!(body["message"], "engine unavailable");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let dir = tempdir().unwrap();
    let addr = spawn_test_api(&dir, Duration::from_secs(60)).await;

    let response = reqwest::get(format!("http://{addr}/servers")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
