//! Tests of the sled-backed pipeline
//!
//! These tests verify that:
//! - Refreshed snapshots are readable through the persistent store
//! - Concurrent refreshes and queries only ever observe complete snapshots

use std::sync::Arc;

use nagios_aggregator::{
    aggregator::FileAggregator,
    record_count,
    service::{AggregationService, ServiceError, StatusService},
    storage::{HostRetention, StatusStore, StorageError, sled_store::SledStore},
};
use tempfile::tempdir;

use crate::helpers::{host_block, status_block, write_snapshot};

async fn sled_service(
    status_dir: &std::path::Path,
    db_dir: &std::path::Path,
) -> (Arc<AggregationService>, Arc<SledStore>) {
    let store = Arc::new(SledStore::new(db_dir.join("nagios.db")).await.unwrap());
    let aggregator = FileAggregator::new(status_dir).unwrap();
    let service = AggregationService::with_aggregator(aggregator, store.clone())
        .unwrap()
        .with_retention(HostRetention::Prune);
    (Arc::new(service), store)
}

#[tokio::test]
async fn test_refresh_persists_to_sled() {
    let status_dir = tempdir().unwrap();
    let db_dir = tempdir().unwrap();
    write_snapshot(
        status_dir.path(),
        "status.dat",
        &format!(
            "{}{}",
            host_block("web1", 0),
            status_block(
                "servicestatus",
                "web1",
                &[("service_description", "SSH"), ("current_state", "0")]
            )
        ),
    );

    let (service, store) = sled_service(status_dir.path(), db_dir.path()).await;
    service.refresh().await.unwrap();

    let stored = store.get_all().await.unwrap();
    assert_eq!(stored["web1"].len(), 2);
    assert_eq!(stored, service.get().await.unwrap());

    let health = store.health_check().await.unwrap();
    assert!(health.healthy);

    store.close().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_refresh_and_get_see_whole_snapshots() {
    let status_dir = tempdir().unwrap();
    let db_dir = tempdir().unwrap();
    let contents: String = (0..20).map(|i| host_block(&format!("host{i}"), 0)).collect();
    write_snapshot(status_dir.path(), "status.dat", &contents);

    let (service, _store) = sled_service(status_dir.path(), db_dir.path()).await;

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..16 {
        let service = service.clone();
        tasks.spawn(async move {
            if i % 2 == 0 {
                service.refresh().await.map(|_| None)
            } else {
                service.get().await.map(|hosts| Some(record_count(&hosts)))
            }
        });
    }

    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(None) => {}
            Ok(Some(count)) => assert_eq!(count, 20),
            Err(ServiceError::Storage(StorageError::NotInitialized)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(record_count(&service.get().await.unwrap()), 20);
}
