//! Helper functions for integration tests

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use nagios_aggregator::{
    HostStatusMap, StatusRecord,
    aggregator::{FileAggregator, MergePolicy},
    service::{AggregationService, ServiceError, ServiceResult, StatusService},
    storage::{HostRetention, StatusStore, memory::MemoryStore},
};

/// Render one status block
pub fn status_block(kind: &str, host: &str, attributes: &[(&str, &str)]) -> String {
    let mut block = format!("{kind} {{\n\thost_name={host}\n");
    for (key, value) in attributes {
        block.push_str(&format!("\t{key}={value}\n"));
    }
    block.push_str("\t}\n");
    block
}

/// Host block with the given `current_state`
pub fn host_block(host: &str, state: u8) -> String {
    status_block("hoststatus", host, &[("current_state", &state.to_string())])
}

/// Write a snapshot file into `dir`
pub fn write_snapshot(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

/// Build an aggregation service over `dir` backed by an in-memory store
pub fn memory_service(
    dir: &Path,
    merge_policy: MergePolicy,
    retention: HostRetention,
) -> (AggregationService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let aggregator = FileAggregator::new(dir)
        .unwrap()
        .with_merge_policy(merge_policy);
    let service = AggregationService::with_aggregator(aggregator, store.clone() as Arc<dyn StatusStore>)
        .unwrap()
        .with_retention(retention);
    (service, store)
}

/// Service double that counts calls and can be switched to failing
#[derive(Default)]
pub struct StubService {
    pub gets: AtomicUsize,
    pub refreshes: AtomicUsize,
    pub failing: AtomicBool,
}

impl StubService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusService for StubService {
    async fn refresh(&self) -> ServiceResult<()> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ServiceError::Config("stub refresh failure".into()));
        }
        Ok(())
    }

    async fn get(&self) -> ServiceResult<HostStatusMap> {
        let call = self.gets.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ServiceError::Config("stub get failure".into()));
        }
        let mut record = StatusRecord::new("hoststatus");
        record.hostname = "web1".into();
        record
            .attributes
            .insert("call".into(), call.to_string());
        Ok(HostStatusMap::from([("web1".to_string(), vec![record])]))
    }
}
