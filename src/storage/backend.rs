//! Status store trait definition
//!
//! This module defines the core `StatusStore` trait that all
//! storage implementations must implement.

use std::collections::HashMap;

use async_trait::async_trait;

use super::error::StorageResult;
use crate::{HostStatusMap, StatusRecord};

/// What happens to stored hosts that are missing from a new snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostRetention {
    /// Hosts are only ever added or overwritten
    #[default]
    Keep,

    /// Hosts absent from the snapshot are deleted in the same transaction
    Prune,
}

/// Health status of the storage backend
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,

    /// Additional backend-specific metadata
    pub metadata: HashMap<String, String>,
}

/// Trait for host status stores
///
/// ## Consistency
///
/// - `put_all` is atomic: either every host of the snapshot is written or
///   none is. Only one writer is active at a time.
/// - `get_all` fails as a whole if any single entry cannot be decoded.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` as they are shared between the
/// refresh and query paths.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Write a whole snapshot in one transaction
    async fn put_all(
        &self,
        snapshot: HostStatusMap,
        retention: HostRetention,
    ) -> StorageResult<()>;

    /// Write the records of a single host, leaving other hosts untouched
    async fn put(&self, hostname: String, records: Vec<StatusRecord>) -> StorageResult<()> {
        self.put_all(HostStatusMap::from([(hostname, records)]), HostRetention::Keep)
            .await
    }

    /// Read every stored host
    ///
    /// Returns `StorageError::NotInitialized` if nothing was ever written.
    async fn get_all(&self) -> StorageResult<HostStatusMap>;

    /// Check backend health
    async fn health_check(&self) -> StorageResult<HealthStatus>;

    /// Get backend-specific statistics
    async fn get_stats(&self) -> StorageResult<String>;

    /// Close the backend and flush pending writes
    async fn close(&self) -> StorageResult<()>;
}
