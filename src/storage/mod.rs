//! Persistence of the aggregated host status
//!
//! The store keeps one entry per host: the key is the hostname, the value
//! the JSON-encoded list of that host's status records. A refresh writes
//! the whole snapshot in a single transaction, a query reads every entry.
//!
//! ## Backends
//!
//! - **sled** (default): embedded, crash-safe key-value engine
//! - **In-Memory**: no persistence, for tests and ephemeral runs
//!
//! ## Usage
//!
//! ```no_run
//! use nagios_aggregator::storage::{StatusStore, sled_store::SledStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = SledStore::new("./nagios.db").await?;
//!     let hosts = store.get_all().await?;
//!     println!("{} hosts", hosts.len());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod memory;
pub mod sled_store;

pub use backend::{HealthStatus, HostRetention, StatusStore};
pub use error::{StorageError, StorageResult};
