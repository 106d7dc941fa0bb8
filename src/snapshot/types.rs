// Snapshot identifiers, status and records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Identifier that selects every snapshot in a repository
pub const ALL_SNAPSHOTS: &str = "_all";

/// Name of a snapshot inside a repository.
///
/// Generated identifiers are derived from the wall-clock minute, so two
/// backups started within the same minute produce the same name and the
/// second one is rejected by the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(String);

impl SnapshotId {
    /// Use an explicitly supplied identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Lowercase, filesystem-safe name for a backup taken at `at`,
    /// e.g. `2024-mar-05-02-pm-07`
    pub fn generate(at: DateTime<Utc>) -> Self {
        Self(at.format("%Y-%b-%d-%I-%p-%M").to_string().to_lowercase())
    }

    /// The `_all` selector used when listing
    pub fn all() -> Self {
        Self(ALL_SNAPSHOTS.to_string())
    }

    /// Identifier as sent in request paths
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SnapshotId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Remote state of one snapshot. Only `STARTED` is non-terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotStatus {
    /// Still running
    Started,
    /// Finished with every shard stored
    Success,
    /// Any other reported state (`FAILED`, `PARTIAL`, `ABORTED`, ...)
    Other(String),
}

impl SnapshotStatus {
    /// Interpret a reported `state`; matching is case-sensitive
    pub fn parse(state: &str) -> Self {
        match state {
            "STARTED" => SnapshotStatus::Started,
            "SUCCESS" => SnapshotStatus::Success,
            other => SnapshotStatus::Other(other.to_string()),
        }
    }

    /// State name as reported
    pub fn as_str(&self) -> &str {
        match self {
            SnapshotStatus::Started => "STARTED",
            SnapshotStatus::Success => "SUCCESS",
            SnapshotStatus::Other(state) => state,
        }
    }
}

impl fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A snapshot record exactly as the cluster reported it.
///
/// Kept as raw JSON so failure diagnostics (shard failures, reasons) survive
/// untouched into [`SnapshotError::SnapshotFailed`](crate::SnapshotError::SnapshotFailed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotRecord(Value);

impl SnapshotRecord {
    /// Wrap a record taken from a status response
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    /// Reported `state`, if present
    pub fn state(&self) -> Option<&str> {
        self.0.get("state").and_then(Value::as_str)
    }

    /// Reported snapshot name, if present
    pub fn snapshot(&self) -> Option<&str> {
        self.0.get("snapshot").and_then(Value::as_str)
    }

    /// The record as reported
    pub fn raw(&self) -> &Value {
        &self.0
    }

    /// Unwrap into the reported JSON
    pub fn into_raw(self) -> Value {
        self.0
    }
}

impl fmt::Display for SnapshotRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything needed to resume polling in a later invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollState {
    /// Repository holding the snapshot
    pub repository_id: String,
    /// Snapshot being waited for
    pub snapshot_id: SnapshotId,
    /// Seconds between status queries
    pub interval_seconds: u64,
}

impl PollState {
    /// Resume data for `snapshot_id`, polled every `interval`
    pub fn new(repository_id: impl Into<String>, snapshot_id: SnapshotId, interval: Duration) -> Self {
        Self {
            repository_id: repository_id.into(),
            snapshot_id,
            interval_seconds: interval.as_secs(),
        }
    }

    /// Poll interval as a duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}
