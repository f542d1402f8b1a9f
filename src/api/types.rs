//! API response types
//!
//! The query endpoint does not expose raw status records. Each record is
//! reshaped into a [`StatusResponse`]: the numeric state is translated into
//! its label, attempts are combined and unix timestamps become RFC 3339.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{HostStatusMap, StatusRecord};

/// Block type of host checks
pub const HOST_STATUS_KIND: &str = "hoststatus";

/// Block type of service checks
pub const SERVICE_STATUS_KIND: &str = "servicestatus";

// ============================================================================
// Check states
// ============================================================================

/// State of a host or service check
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckState {
    Ok,
    Warning,
    Critical,
    Unknown,
    Down,
    Unreachable,
}

impl CheckState {
    /// Translate a `current_state` code for the given block type.
    ///
    /// Hosts: 0 OK, 1 DOWN, 2 UNREACHABLE.
    /// Services: 0 OK, 1 WARNING, 2 CRITICAL, 3 UNKNOWN.
    pub fn from_code(kind: &str, code: &str) -> Option<Self> {
        let code: u8 = code.trim().parse().ok()?;
        match (kind, code) {
            (HOST_STATUS_KIND, 0) => Some(CheckState::Ok),
            (HOST_STATUS_KIND, 1) => Some(CheckState::Down),
            (HOST_STATUS_KIND, 2) => Some(CheckState::Unreachable),
            (SERVICE_STATUS_KIND, 0) => Some(CheckState::Ok),
            (SERVICE_STATUS_KIND, 1) => Some(CheckState::Warning),
            (SERVICE_STATUS_KIND, 2) => Some(CheckState::Critical),
            (SERVICE_STATUS_KIND, 3) => Some(CheckState::Unknown),
            _ => None,
        }
    }

    /// Get the string representation (uppercase)
    ///
    /// This matches the serde serialization format.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckState::Ok => "OK",
            CheckState::Warning => "WARNING",
            CheckState::Critical => "CRITICAL",
            CheckState::Unknown => "UNKNOWN",
            CheckState::Down => "DOWN",
            CheckState::Unreachable => "UNREACHABLE",
        }
    }
}

impl std::fmt::Display for CheckState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Response types
// ============================================================================

/// Presentation of one status record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    /// State label, or the raw code if it has no label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    /// `current_attempt/max_attempts`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_check: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_state_change: Option<DateTime<Utc>>,
}

/// Response of the query endpoint: hostname to presented records
pub type HostStatusResponse = HashMap<String, Vec<StatusResponse>>;

/// Parse a unix timestamp attribute; `0` means "never".
fn unix_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    let seconds: i64 = value?.trim().parse().ok()?;
    if seconds == 0 {
        return None;
    }
    DateTime::from_timestamp(seconds, 0)
}

impl From<&StatusRecord> for StatusResponse {
    fn from(record: &StatusRecord) -> Self {
        let state = record.attribute("current_state").map(|code| {
            CheckState::from_code(&record.kind, code)
                .map(|state| state.as_str().to_string())
                .unwrap_or_else(|| code.to_string())
        });

        let attempts = match (
            record.attribute("current_attempt"),
            record.attribute("max_attempts"),
        ) {
            (None, None) => None,
            (current, max) => Some(format!(
                "{}/{}",
                current.unwrap_or_default(),
                max.unwrap_or_default()
            )),
        };

        Self {
            kind: record.kind.clone(),
            state,
            output: record.attribute("plugin_output").map(str::to_string),
            service: record.attribute("service_description").map(str::to_string),
            attempts,
            last_check: unix_timestamp(record.attribute("last_check")),
            next_check: unix_timestamp(record.attribute("next_check")),
            last_state_change: unix_timestamp(record.attribute("last_state_change")),
        }
    }
}

/// Reshape every host's records for presentation
pub fn present(hosts: &HostStatusMap) -> HostStatusResponse {
    hosts
        .iter()
        .map(|(host, records)| {
            (
                host.clone(),
                records.iter().map(StatusResponse::from).collect(),
            )
        })
        .collect()
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,

    /// Status store message
    pub message: String,

    /// Status store metadata (backend, size, ...)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub storage: HashMap<String, String>,
}
