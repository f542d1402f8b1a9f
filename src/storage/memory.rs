//! In-memory storage backend (no persistence)
//!
//! This backend keeps the latest snapshot in memory.
//! It's useful for:
//! - Testing without an on-disk database
//! - Ephemeral deployments where a restart may start from scratch
//!
//! ## Limitations
//!
//! - **No persistence**: All data lost on restart

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::backend::{HealthStatus, HostRetention, StatusStore};
use super::error::{StorageError, StorageResult};
use crate::HostStatusMap;

/// In-memory status store
///
/// `None` until the first snapshot is written.
#[derive(Default)]
pub struct MemoryStore {
    hosts: RwLock<Option<HostStatusMap>>,
}

impl MemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatusStore for MemoryStore {
    async fn put_all(
        &self,
        snapshot: HostStatusMap,
        retention: HostRetention,
    ) -> StorageResult<()> {
        debug!("in-memory store: writing {} hosts", snapshot.len());

        let mut hosts = self.hosts.write().await;
        let hosts = hosts.get_or_insert_with(HostStatusMap::new);
        if retention == HostRetention::Prune {
            hosts.retain(|host, _| snapshot.contains_key(host));
        }
        hosts.extend(snapshot);
        Ok(())
    }

    async fn get_all(&self) -> StorageResult<HostStatusMap> {
        self.hosts
            .read()
            .await
            .clone()
            .ok_or(StorageError::NotInitialized)
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let hosts = self.hosts.read().await.as_ref().map_or(0, HashMap::len);
        Ok(HealthStatus {
            healthy: true,
            message: "In-memory storage operational".to_string(),
            metadata: HashMap::from([
                ("backend".to_string(), "memory".to_string()),
                ("hosts".to_string(), hosts.to_string()),
            ]),
        })
    }

    async fn get_stats(&self) -> StorageResult<String> {
        let hosts = self.hosts.read().await.as_ref().map_or(0, HashMap::len);
        Ok(format!("In-Memory: {} hosts", hosts))
    }

    async fn close(&self) -> StorageResult<()> {
        debug!("closing in-memory store (no-op)");
        Ok(())
    }
}
