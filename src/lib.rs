pub mod aggregator;
#[cfg(feature = "api")]
pub mod api;
pub mod cache;
pub mod config;
pub mod metrics;
pub mod middleware;
pub mod parser;
pub mod service;
pub mod storage;
pub mod util;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Status records grouped by the host they belong to.
///
/// Records keep the order in which they were parsed from a single snapshot
/// file. Records that never declared a host end up under the empty key.
pub type HostStatusMap = HashMap<String, Vec<StatusRecord>>;

/// One block of a monitoring snapshot file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Block type as declared in the snapshot (e.g. `hoststatus`)
    #[serde(rename = "status_type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    /// Value of the `host_name` attribute
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hostname: String,

    /// Every other attribute, verbatim
    #[serde(rename = "values", default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
}

impl StatusRecord {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Look up a raw attribute value.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Total number of records across all hosts.
pub fn record_count(map: &HostStatusMap) -> usize {
    map.values().map(Vec::len).sum()
}
