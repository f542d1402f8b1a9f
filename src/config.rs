use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing::trace;

use crate::aggregator::{DEFAULT_SNAPSHOT_SUFFIX, MergePolicy};
use crate::storage::HostRetention;

/// Storage backend configuration
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (no persistence)
    #[serde(rename = "none")]
    None,

    /// sled database (default)
    Sled {
        /// Path to the database directory
        #[serde(default = "default_db_path")]
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sled {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    std::env::temp_dir().join("nagios.db")
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listen address
    pub http_addr: SocketAddr,

    /// Directory containing the snapshot files
    pub status_dir: PathBuf,

    /// Suffix of snapshot files
    pub suffix: String,

    /// Seconds to keep query results cached
    pub cache_expiration: u64,

    /// Minimum seconds between processed refresh requests
    pub refresh_interval: u64,

    /// Combining of records when several snapshots report the same host
    pub merge: MergePolicy,

    /// Handling of stored hosts missing from a new snapshot
    pub retention: HostRetention,

    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: crate::util::get_http_addr(),
            status_dir: PathBuf::from("statuses"),
            suffix: DEFAULT_SNAPSHOT_SUFFIX.to_string(),
            cache_expiration: 180,
            refresh_interval: 60,
            merge: MergePolicy::default(),
            retention: HostRetention::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_expiration)
    }

    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.cache_expiration == 0 {
            anyhow::bail!("cache_expiration must be at least one second");
        }
        if self.refresh_interval == 0 {
            anyhow::bail!("refresh_interval must be at least one second");
        }
        if self.suffix.is_empty() {
            anyhow::bail!("snapshot suffix must not be empty");
        }
        Ok(())
    }
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
