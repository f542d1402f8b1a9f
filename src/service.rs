//! Aggregation service
//!
//! [`StatusService`] is the capability every layer of the request path
//! implements: the raw [`AggregationService`] as well as each decorator in
//! [`crate::middleware`]. Callers only ever hold a `StatusService`, so the
//! decorators can be stacked in any order.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::HostStatusMap;
use crate::aggregator::{AggregateError, FileAggregator};
use crate::parser::ParserError;
use crate::storage::{HostRetention, StatusStore, StorageError};

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the aggregation service
#[derive(Debug)]
pub enum ServiceError {
    /// The service is misconfigured (e.g. missing status directory)
    Config(String),

    /// Parsing or merging the snapshot files failed
    Aggregation(AggregateError),

    /// Reading or writing the status store failed
    Storage(StorageError),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Config(msg) => write!(f, "invalid configuration: {}", msg),
            ServiceError::Aggregation(err) => write!(f, "{}", err),
            ServiceError::Storage(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Config(_) => None,
            ServiceError::Aggregation(err) => Some(err),
            ServiceError::Storage(err) => Some(err),
        }
    }
}

impl From<AggregateError> for ServiceError {
    fn from(err: AggregateError) -> Self {
        ServiceError::Aggregation(err)
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Storage(err)
    }
}

impl From<ParserError> for ServiceError {
    fn from(err: ParserError) -> Self {
        ServiceError::Aggregation(AggregateError::Parse(err))
    }
}

/// Aggregated view over all monitoring instances
#[async_trait]
pub trait StatusService: Send + Sync {
    /// Re-read every snapshot file and persist the merged result
    async fn refresh(&self) -> ServiceResult<()>;

    /// Current status of every known host
    async fn get(&self) -> ServiceResult<HostStatusMap>;
}

#[async_trait]
impl<S: StatusService + ?Sized> StatusService for Arc<S> {
    async fn refresh(&self) -> ServiceResult<()> {
        (**self).refresh().await
    }

    async fn get(&self) -> ServiceResult<HostStatusMap> {
        (**self).get().await
    }
}

#[async_trait]
impl<S: StatusService + ?Sized> StatusService for Box<S> {
    async fn refresh(&self) -> ServiceResult<()> {
        (**self).refresh().await
    }

    async fn get(&self) -> ServiceResult<HostStatusMap> {
        (**self).get().await
    }
}

/// Snapshot directory aggregator backed by a status store
pub struct AggregationService {
    aggregator: FileAggregator,
    store: Arc<dyn StatusStore>,
    retention: HostRetention,
}

impl AggregationService {
    /// Create the service
    ///
    /// Fails if `status_dir` does not exist.
    pub fn new(
        status_dir: impl Into<PathBuf>,
        store: Arc<dyn StatusStore>,
    ) -> ServiceResult<Self> {
        let aggregator = FileAggregator::new(status_dir)?;
        Self::with_aggregator(aggregator, store)
    }

    /// Create the service from a preconfigured aggregator
    pub fn with_aggregator(
        aggregator: FileAggregator,
        store: Arc<dyn StatusStore>,
    ) -> ServiceResult<Self> {
        ensure_directory(aggregator.status_dir())?;
        info!(
            "aggregating snapshots from {}",
            aggregator.status_dir().display()
        );
        Ok(Self {
            aggregator,
            store,
            retention: HostRetention::default(),
        })
    }

    /// Set the policy for hosts that disappear from the snapshots
    pub fn with_retention(mut self, retention: HostRetention) -> Self {
        self.retention = retention;
        self
    }
}

fn ensure_directory(path: &Path) -> ServiceResult<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ServiceError::Config(format!(
            "{} is not a directory",
            path.display()
        ))),
        Err(e) => Err(ServiceError::Config(format!(
            "status directory {}: {}",
            path.display(),
            e
        ))),
    }
}

#[async_trait]
impl StatusService for AggregationService {
    #[instrument(skip(self))]
    async fn refresh(&self) -> ServiceResult<()> {
        let snapshot = self.aggregator.aggregate().await?;
        debug!("persisting {} hosts", snapshot.len());
        self.store.put_all(snapshot, self.retention).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self) -> ServiceResult<HostStatusMap> {
        Ok(self.store.get_all().await?)
    }
}
