//! Concurrent aggregation of snapshot files from a directory
//!
//! Every snapshot file found in the status directory is parsed on its own
//! tokio task. The aggregation is all-or-nothing: if a single file fails,
//! no partial result is returned.
//!
//! Files are discovered in lexical order and their fragments are merged in
//! that order, so when two files report the same host the outcome does not
//! depend on task completion order: with [`MergePolicy::Replace`] the
//! lexically later file wins, with [`MergePolicy::Append`] its records
//! follow the earlier file's.

use std::collections::hash_map::Entry;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, instrument, trace, warn};

use crate::HostStatusMap;
use crate::parser::{ParserError, StatusParser};

/// Default suffix of snapshot files
pub const DEFAULT_SNAPSHOT_SUFFIX: &str = ".dat";

/// Errors raised while aggregating a snapshot directory
#[derive(Debug)]
pub enum AggregateError {
    /// The status directory could not be listed
    Discovery {
        path: PathBuf,
        source: std::io::Error,
    },

    /// At least one snapshot could not be parsed (first failure only)
    Parse(ParserError),

    /// A parse task panicked or was aborted
    Task(String),
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateError::Discovery { path, source } => {
                write!(f, "failed to list {}: {}", path.display(), source)
            }
            AggregateError::Parse(err) => write!(f, "failed to parse status data: {}", err),
            AggregateError::Task(msg) => write!(f, "failed to parse status data: {}", msg),
        }
    }
}

impl std::error::Error for AggregateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AggregateError::Discovery { source, .. } => Some(source),
            AggregateError::Parse(err) => Some(err),
            AggregateError::Task(_) => None,
        }
    }
}

impl From<ParserError> for AggregateError {
    fn from(err: ParserError) -> Self {
        AggregateError::Parse(err)
    }
}

/// How fragments that report the same host are combined
///
/// With `Replace` a host reported by two files keeps only the records of
/// the lexically later file. Use `Append` (`--append-duplicate-hosts`) to
/// keep the records of every file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// The later fragment replaces the host's records
    #[default]
    Replace,

    /// The later fragment's records are appended
    Append,
}

/// Parses every snapshot file of a directory and merges the results
#[derive(Debug, Clone)]
pub struct FileAggregator {
    status_dir: PathBuf,
    suffix: String,
    merge_policy: MergePolicy,
    parser: Arc<StatusParser>,
}

impl FileAggregator {
    pub fn new(status_dir: impl Into<PathBuf>) -> Result<Self, ParserError> {
        Ok(Self {
            status_dir: status_dir.into(),
            suffix: DEFAULT_SNAPSHOT_SUFFIX.to_string(),
            merge_policy: MergePolicy::default(),
            parser: Arc::new(StatusParser::new()?),
        })
    }

    /// Use a different snapshot file suffix (default `.dat`).
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_merge_policy(mut self, merge_policy: MergePolicy) -> Self {
        self.merge_policy = merge_policy;
        self
    }

    pub fn status_dir(&self) -> &Path {
        &self.status_dir
    }

    /// List snapshot files in lexical order.
    ///
    /// Only the name is matched; an entry that turns out to be unreadable
    /// (e.g. a directory named `*.dat`) fails the aggregation later on.
    pub async fn discover(&self) -> Result<Vec<PathBuf>, AggregateError> {
        let discovery_error = |source| AggregateError::Discovery {
            path: self.status_dir.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(&self.status_dir)
            .await
            .map_err(discovery_error)?;

        let mut files = vec![];
        while let Some(entry) = entries.next_entry().await.map_err(discovery_error)? {
            let path = entry.path();
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(&self.suffix));
            if matches {
                files.push(path);
            }
        }
        files.sort();

        Ok(files)
    }

    /// Parse all snapshot files concurrently and merge them.
    #[instrument(skip(self), fields(dir = %self.status_dir.display()))]
    pub async fn aggregate(&self) -> Result<HostStatusMap, AggregateError> {
        let files = self.discover().await?;
        debug!("found {} snapshot files", files.len());

        let mut tasks = JoinSet::new();
        for (index, file) in files.iter().cloned().enumerate() {
            let parser = Arc::clone(&self.parser);
            tasks.spawn(async move { (index, parser.parse_file(file).await) });
        }

        // one slot per file, so the outcome does not depend on completion order
        let mut fragments: Vec<Option<Result<HostStatusMap, ParserError>>> =
            (0..files.len()).map(|_| None).collect();
        let mut task_failure = None;

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, fragment)) => fragments[index] = Some(fragment),
                Err(e) => {
                    warn!("parse task failed: {e}");
                    task_failure.get_or_insert_with(|| e.to_string());
                }
            }
        }

        let mut merged = Vec::with_capacity(fragments.len());
        for (file, fragment) in files.iter().zip(fragments) {
            match fragment {
                Some(Ok(fragment)) => merged.push(fragment),
                Some(Err(e)) => {
                    warn!("failed to parse {}: {e}", file.display());
                    return Err(AggregateError::Parse(e));
                }
                None => {}
            }
        }
        if let Some(msg) = task_failure {
            return Err(AggregateError::Task(msg));
        }

        Ok(merge_fragments(merged, self.merge_policy))
    }
}

/// Merge fragments in order.
pub fn merge_fragments(
    fragments: impl IntoIterator<Item = HostStatusMap>,
    policy: MergePolicy,
) -> HostStatusMap {
    let mut result = HostStatusMap::new();
    for fragment in fragments {
        for (hostname, records) in fragment {
            match result.entry(hostname) {
                Entry::Vacant(entry) => {
                    entry.insert(records);
                }
                Entry::Occupied(mut entry) => {
                    trace!("host '{}' reported by more than one snapshot", entry.key());
                    match policy {
                        MergePolicy::Replace => *entry.get_mut() = records,
                        MergePolicy::Append => entry.get_mut().extend(records),
                    }
                }
            }
        }
    }
    result
}
