// Inbound invocation payloads and the request bodies derived from them

use serde::{Deserialize, Serialize};

use crate::snapshot::SnapshotId;
use crate::{Result, SnapshotError};

/// Index pattern used when the payload names none
pub const ALL_INDICES: &str = "*";

fn indices_or_all(indices: &Option<String>) -> String {
    indices
        .as_deref()
        .map(str::trim)
        .filter(|pattern| !pattern.is_empty())
        .unwrap_or(ALL_INDICES)
        .to_string()
}

/// Characters that would end or split the path segment holding the name
const RESERVED_IN_SNAPSHOT: &[char] = &['/', '?', '#', '%', '\\'];

fn explicit_snapshot(snapshot: &Option<String>) -> Result<Option<SnapshotId>> {
    let Some(id) = snapshot.as_deref().map(str::trim).filter(|id| !id.is_empty()) else {
        return Ok(None);
    };

    if id
        .chars()
        .any(|c| RESERVED_IN_SNAPSHOT.contains(&c) || c.is_whitespace() || c.is_control())
    {
        return Err(SnapshotError::InvalidRequest(format!(
            "snapshot identifier '{}' contains characters not allowed in a path segment",
            id
        )));
    }
    Ok(Some(SnapshotId::new(id)))
}

/// Payload of the backup operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupRequest {
    /// Index pattern, `*` when absent
    pub indices: Option<String>,
    /// Defaults to `true` for backups
    pub include_global_state: Option<bool>,
}

impl BackupRequest {
    /// Snapshot body with defaults applied
    pub fn settings(&self) -> SnapshotSettings {
        SnapshotSettings {
            indices: indices_or_all(&self.indices),
            ignore_unavailable: false,
            include_global_state: self.include_global_state.unwrap_or(true),
        }
    }
}

/// Body of `PUT /_snapshot/{repository}/{snapshot}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct SnapshotSettings {
    pub indices: String,
    pub ignore_unavailable: bool,
    pub include_global_state: bool,
}

/// Payload of the restore operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestoreRequest {
    /// Required
    pub snapshot: Option<String>,
    /// Index pattern, `*` when absent
    pub indices: Option<String>,
    /// Defaults to `false` for restores
    pub include_global_state: Option<bool>,
    /// Defaults to `false`
    pub include_aliases: Option<bool>,
}

impl RestoreRequest {
    /// The snapshot to restore; absent or blank is an error
    pub fn snapshot_id(&self) -> Result<SnapshotId> {
        explicit_snapshot(&self.snapshot)?.ok_or_else(|| {
            SnapshotError::InvalidRequest("restore requires a snapshot identifier".to_string())
        })
    }

    /// Restore body with defaults applied
    pub fn settings(&self) -> RestoreSettings {
        RestoreSettings {
            indices: indices_or_all(&self.indices),
            ignore_unavailable: false,
            include_aliases: self.include_aliases.unwrap_or(false),
            include_global_state: self.include_global_state.unwrap_or(false),
        }
    }
}

/// Body of `POST /_snapshot/{repository}/{snapshot}/_restore`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct RestoreSettings {
    pub indices: String,
    pub ignore_unavailable: bool,
    pub include_aliases: bool,
    pub include_global_state: bool,
}

/// Payload of the list operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListRequest {
    /// Snapshot name or pattern
    pub snapshot: Option<String>,
}

impl ListRequest {
    /// The named snapshot or pattern, or `_all`
    pub fn snapshot_id(&self) -> Result<SnapshotId> {
        Ok(explicit_snapshot(&self.snapshot)?.unwrap_or_else(SnapshotId::all))
    }
}

/// Payload of the status operation, which resumes polling an existing snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusRequest {
    /// Required
    pub snapshot: Option<String>,
    /// Poll interval override; zero or absent keeps the configured one
    pub interval_seconds: Option<u64>,
}

impl StatusRequest {
    /// The snapshot to wait for; absent or blank is an error
    pub fn snapshot_id(&self) -> Result<SnapshotId> {
        explicit_snapshot(&self.snapshot)?.ok_or_else(|| {
            SnapshotError::InvalidRequest("status requires a snapshot identifier".to_string())
        })
    }
}
