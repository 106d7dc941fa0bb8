//! # Search Snapshot
//!
//! Signed administration of snapshots on a managed search cluster.
//!
//! ## Overview
//!
//! The cluster's `_snapshot` API only accepts requests signed with AWS
//! Signature Version 4. This crate builds those requests, interprets the
//! responses (which can report errors behind a `200`), and drives a backup to
//! completion by polling its status.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use search_snapshot::client::{Endpoint, SignedRequest};
//! use search_snapshot::operations::{BackupRequest, RepositoryReference, SnapshotService};
//! use search_snapshot::signing::AwsCredentials;
//!
//! # async fn example() -> search_snapshot::Result<()> {
//! let signer = SignedRequest::new(
//!     "eu-west-1",
//!     Endpoint::parse("search-logs.eu-west-1.es.amazonaws.com")?,
//!     Arc::new(AwsCredentials::from_environment()),
//! )?;
//!
//! let repository = RepositoryReference {
//!     id: "cluster-backups".to_string(),
//!     region: "eu-west-1".to_string(),
//!     bucket: "cluster-backups".to_string(),
//!     role_arn: "arn:aws:iam::123456789012:role/snapshots".to_string(),
//! };
//!
//! let service = SnapshotService::new(signer, repository, Duration::from_secs(10));
//! let record = service.backup(&BackupRequest::default()).await?;
//! println!("{}", record);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`signing`]: credentials and Signature Version 4
//! - [`client`]: the signed request descriptor and the [`client::AdminApi`] seam
//! - [`snapshot`]: snapshot identifiers, status and the lifecycle poller
//! - [`operations`]: repository declaration, backup, list, restore, status
//! - [`notification`]: best-effort webhook notifications
//! - [`config`]: environment configuration

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

use thiserror::Error;

use crate::snapshot::SnapshotRecord;

/// Result type for snapshot operations
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Main error type for snapshot operations
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Network, DNS or TLS failure, or the body could not be read
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body is not JSON, or lacks the expected shape
    #[error("Malformed response ({reason}): {body}")]
    MalformedResponse {
        /// What was wrong with the body
        reason: String,
        /// Body as received
        body: String,
    },

    /// Status response did not describe exactly one snapshot
    #[error("Expected exactly one snapshot in status response, found {count}: {body}")]
    UnexpectedSnapshotCount {
        /// Number of snapshots described
        count: usize,
        /// Body as received
        body: String,
    },

    /// JSON body carried `error`, `errors` or `Message`
    #[error("Remote API error (HTTP {status}): {body}")]
    RemoteApi {
        /// HTTP status of the response
        status: u16,
        /// Body as received
        body: String,
    },

    /// Snapshot reached a terminal state other than `SUCCESS`
    #[error("Snapshot failed: {record}")]
    SnapshotFailed {
        /// Final record as reported by the cluster
        record: SnapshotRecord,
    },

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credentials could not be resolved
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Administrative endpoint could not be parsed
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Invocation payload is missing required fields
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Request body could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Credentials and Signature Version 4
pub mod signing;

/// Signed requests to the administrative endpoint
pub mod client;

/// Snapshot model and lifecycle poller
pub mod snapshot;

/// Repository declaration and snapshot operations
pub mod operations;

/// Best-effort outcome notifications
pub mod notification;

/// Environment configuration
pub mod config;
