//! Parser for monitoring snapshot files (`status.dat`)
//!
//! A snapshot is a sequence of blocks:
//!
//! ```text
//! hoststatus {
//!     host_name=web1
//!     current_state=0
//!     }
//! ```
//!
//! Every closed block becomes one [`StatusRecord`], grouped by its
//! `host_name`. The parser never fails on malformed data: unknown lines are
//! ignored and an unterminated block at the end of the document is dropped.
//! Attribute lines that appear outside of any block are collected into the
//! pending record, which is thrown away as soon as the next block opens.

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{instrument, trace};

use crate::{HostStatusMap, StatusRecord};

const BLOCK_OPEN: &str = r"^\s*(\w+)\s*\{";
const ATTRIBUTE: &str = r"^\s*(\w+)(?:=|\s+)(.*)";
const BLOCK_CLOSE: &str = r"^\s*\}";

/// Attribute that is lifted out of the attribute map into `hostname`
pub const HOST_NAME_KEY: &str = "host_name";

/// Errors that can occur while reading or parsing a snapshot
#[derive(Debug)]
pub enum ParserError {
    /// One of the built-in line patterns failed to compile
    InvalidPattern(regex::Error),

    /// The snapshot file could not be read
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserError::InvalidPattern(err) => write!(f, "invalid line pattern: {}", err),
            ParserError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ParserError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParserError::InvalidPattern(err) => Some(err),
            ParserError::Io { source, .. } => Some(source),
        }
    }
}

impl From<regex::Error> for ParserError {
    fn from(err: regex::Error) -> Self {
        ParserError::InvalidPattern(err)
    }
}

/// Compiled line patterns for the snapshot grammar
#[derive(Debug, Clone)]
pub struct StatusParser {
    block_open: Regex,
    attribute: Regex,
    block_close: Regex,
}

impl StatusParser {
    pub fn new() -> Result<Self, ParserError> {
        Ok(Self {
            block_open: Regex::new(BLOCK_OPEN)?,
            attribute: Regex::new(ATTRIBUTE)?,
            block_close: Regex::new(BLOCK_CLOSE)?,
        })
    }

    /// Parse a whole snapshot document.
    pub fn parse(&self, document: &str) -> HostStatusMap {
        let mut result = HostStatusMap::new();
        let mut current = StatusRecord::default();

        for line in document.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(captures) = self.block_open.captures(line) {
                // an unterminated previous block is silently dropped
                current = StatusRecord::new(&captures[1]);
                continue;
            }

            if let Some(captures) = self.attribute.captures(line) {
                let key = &captures[1];
                let value = captures[2].to_string();
                if key == HOST_NAME_KEY {
                    current.hostname = value;
                } else {
                    current.attributes.insert(key.to_string(), value);
                }
                continue;
            }

            if self.block_close.is_match(line) {
                let record = std::mem::take(&mut current);
                trace!(kind = %record.kind, host = %record.hostname, "closed block");
                result
                    .entry(record.hostname.clone())
                    .or_default()
                    .push(record);
            }
        }

        result
    }

    /// Read and parse a snapshot file.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub async fn parse_file(&self, path: impl AsRef<Path>) -> Result<HostStatusMap, ParserError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|source| ParserError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let document = String::from_utf8_lossy(&data);
        let result = self.parse(&document);
        trace!("parsed {} hosts", result.len());
        Ok(result)
    }
}

/// Parse a snapshot document with a freshly compiled pattern set.
pub fn parse_status(document: &str) -> Result<HostStatusMap, ParserError> {
    Ok(StatusParser::new()?.parse(document))
}

/// Read and parse a snapshot file with a freshly compiled pattern set.
pub async fn parse_file(path: impl AsRef<Path>) -> Result<HostStatusMap, ParserError> {
    StatusParser::new()?.parse_file(path).await
}
