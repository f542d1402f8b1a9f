//! sled storage backend implementation
//!
//! This module provides a sled-based implementation of the `StatusStore` trait.
//!
//! ## Layout
//!
//! - One tree (`host_status`) acts as the bucket
//! - Keys are raw hostname bytes
//! - Values are the JSON-encoded record list of the host
//!
//! ## Concurrency
//!
//! sled only allows a single process to open a database, so the store keeps
//! one handle for its whole lifetime. Writers are serialized through a
//! lock, and reads wait for an in-flight write to finish so they never see
//! half of a snapshot. All engine calls run on the blocking thread pool.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionError,
};
use sled::{Db, IVec};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use super::backend::{HealthStatus, HostRetention, StatusStore};
use super::error::{StorageError, StorageResult};
use crate::{HostStatusMap, StatusRecord};

/// Name of the tree holding the host entries
pub const STATUS_BUCKET: &str = "host_status";

/// sled status store
pub struct SledStore {
    db: Db,
    db_path: String,
    /// Held exclusively while a snapshot is written
    write_lock: RwLock<()>,
}

impl SledStore {
    /// Open (or create) the database at `db_path`
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("opening sled status store at: {}", db_path_str);

        let path = db_path.as_ref().to_path_buf();
        let db = tokio::task::spawn_blocking(move || sled::Config::new().path(path).open())
            .await?
            .map_err(|e| StorageError::OpenFailed(e.to_string()))?;

        Ok(Self {
            db,
            db_path: db_path_str,
            write_lock: RwLock::new(()),
        })
    }

    fn has_bucket(db: &Db) -> bool {
        db.tree_names()
            .iter()
            .any(|name| &name[..] == STATUS_BUCKET.as_bytes())
    }

    fn write_snapshot(
        db: &Db,
        snapshot: &HostStatusMap,
        retention: HostRetention,
    ) -> StorageResult<()> {
        let tree = db.open_tree(STATUS_BUCKET)?;

        let stale: Vec<IVec> = match retention {
            HostRetention::Keep => vec![],
            HostRetention::Prune => tree
                .iter()
                .keys()
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .filter(|key| match std::str::from_utf8(key) {
                    Ok(host) => !snapshot.contains_key(host),
                    Err(_) => true,
                })
                .collect(),
        };

        tree.transaction(|tx| -> ConflictableTransactionResult<(), StorageError> {
            for (host, records) in snapshot {
                let value = serde_json::to_vec(records).map_err(|e| {
                    ConflictableTransactionError::Abort(StorageError::SerializationError(
                        format!("failed to serialize records of '{}': {}", host, e),
                    ))
                })?;
                tx.insert(host.as_bytes(), value)?;
            }
            for key in &stale {
                tx.remove(key.clone())?;
            }
            Ok(())
        })
        .map_err(|e| match e {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => e.into(),
        })?;

        if !stale.is_empty() {
            debug!("pruned {} hosts missing from snapshot", stale.len());
        }
        Ok(())
    }

    fn read_snapshot(db: &Db) -> StorageResult<HostStatusMap> {
        if !Self::has_bucket(db) {
            return Err(StorageError::NotInitialized);
        }

        let tree = db.open_tree(STATUS_BUCKET)?;
        let mut result = HostStatusMap::new();
        for entry in tree.iter() {
            let (key, value) = entry?;
            let host = String::from_utf8_lossy(&key).into_owned();
            let records: Vec<StatusRecord> = serde_json::from_slice(&value).map_err(|e| {
                StorageError::SerializationError(format!(
                    "failed to decode records of '{}': {}",
                    host, e
                ))
            })?;
            result.insert(host, records);
        }
        Ok(result)
    }
}

#[async_trait]
impl StatusStore for SledStore {
    #[instrument(skip(self, snapshot), fields(hosts = snapshot.len()))]
    async fn put_all(
        &self,
        snapshot: HostStatusMap,
        retention: HostRetention,
    ) -> StorageResult<()> {
        let _guard = self.write_lock.write().await;

        debug!("writing {} hosts to sled", snapshot.len());

        let db = self.db.clone();
        tokio::task::spawn_blocking(move || Self::write_snapshot(&db, &snapshot, retention))
            .await??;

        self.db.flush_async().await?;

        debug!("snapshot write complete");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_all(&self) -> StorageResult<HostStatusMap> {
        let _guard = self.write_lock.read().await;

        let db = self.db.clone();
        let result = tokio::task::spawn_blocking(move || Self::read_snapshot(&db)).await??;

        debug!("read {} hosts from sled", result.len());
        Ok(result)
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let db = self.db.clone();
        let size = tokio::task::spawn_blocking(move || db.size_on_disk()).await?;

        match size {
            Ok(size) => Ok(HealthStatus {
                healthy: true,
                message: "sled store operational".to_string(),
                metadata: HashMap::from([
                    ("backend".to_string(), "sled".to_string()),
                    ("db_path".to_string(), self.db_path.clone()),
                    ("size_on_disk".to_string(), size.to_string()),
                ]),
            }),
            Err(e) => Ok(HealthStatus {
                healthy: false,
                message: format!("sled store unavailable: {}", e),
                metadata: HashMap::from([("backend".to_string(), "sled".to_string())]),
            }),
        }
    }

    async fn get_stats(&self) -> StorageResult<String> {
        let db = self.db.clone();
        let (hosts, size) = tokio::task::spawn_blocking(move || -> StorageResult<_> {
            let hosts = if Self::has_bucket(&db) {
                db.open_tree(STATUS_BUCKET)?.len()
            } else {
                0
            };
            Ok((hosts, db.size_on_disk()?))
        })
        .await??;

        Ok(format!("sled: {} hosts, {} bytes on disk", hosts, size))
    }

    async fn close(&self) -> StorageResult<()> {
        info!("flushing sled status store");
        self.db.flush_async().await?;
        Ok(())
    }
}
