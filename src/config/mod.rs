//! Environment configuration for snapshot operations

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::operations::RepositoryReference;
use crate::{Result, SnapshotError};

/// Bucket holding the snapshots (required)
pub const BUCKET_ID_VAR: &str = "BUCKET_ID";
/// Repository name, defaults to the bucket
pub const REPOSITORY_ID_VAR: &str = "REPOSITORY_ID";
/// Region of the bucket and of the signed requests (required)
pub const BUCKET_REGION_VAR: &str = "BUCKET_REGION";
/// Administrative endpoint (required)
pub const ENDPOINT_VAR: &str = "ELASTICSEARCH_DOMAIN_ENDPOINT";
/// Role the cluster assumes to reach the bucket (required)
pub const ROLE_ARN_VAR: &str = "ELASTICSEARCH_DOMAIN_IAM_ROLE_ARN";
/// Incoming-webhook URL; notifications are off without it
pub const WEBHOOK_URL_VAR: &str = "SLACK_WEBHOOK_URL";
/// Seconds between status queries
pub const POLL_INTERVAL_VAR: &str = "SNAPSHOT_POLL_INTERVAL_SECONDS";

/// Seconds between status queries unless overridden
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Settings shared by every operation of one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Snapshot repository to declare and use
    pub repository: RepositoryReference,
    /// Administrative endpoint, hostname or URL
    pub endpoint: String,
    /// Notification webhook
    pub webhook_url: Option<String>,
    /// Seconds between status queries
    pub poll_interval_secs: u64,
}

impl SnapshotConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |name: &str| {
            optional(name).ok_or_else(|| SnapshotError::Config(format!("{} is not set", name)))
        };

        let bucket = required(BUCKET_ID_VAR)?;
        let repository = RepositoryReference {
            id: optional(REPOSITORY_ID_VAR).unwrap_or_else(|| bucket.clone()),
            region: required(BUCKET_REGION_VAR)?,
            bucket,
            role_arn: required(ROLE_ARN_VAR)?,
        };

        let poll_interval_secs = match optional(POLL_INTERVAL_VAR) {
            Some(raw) => raw.parse::<u64>().ok().filter(|secs| *secs > 0).ok_or_else(|| {
                SnapshotError::Config(format!(
                    "{} must be a positive number of seconds, got '{}'",
                    POLL_INTERVAL_VAR, raw
                ))
            })?,
            None => DEFAULT_POLL_INTERVAL_SECS,
        };

        Ok(Self {
            repository,
            endpoint: required(ENDPOINT_VAR)?,
            webhook_url: optional(WEBHOOK_URL_VAR),
            poll_interval_secs,
        })
    }

    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
