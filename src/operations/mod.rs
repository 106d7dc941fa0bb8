//! Snapshot operations built on the request signer and the poller
//!
//! Each operation declares the repository, then issues its own call:
//!
//! - backup: `PUT /_snapshot/{repo}/{snapshot}`, then poll `_status`
//! - list: `GET /_snapshot/{repo}/{snapshot|_all}`
//! - restore: `POST /_snapshot/{repo}/{snapshot}/_restore`
//! - status: poll `_status` of an existing snapshot

mod repository;
mod requests;
mod service;

pub use repository::{ensure_repository, RepositoryReference};
pub use requests::{
    BackupRequest, ListRequest, RestoreRequest, RestoreSettings, SnapshotSettings, StatusRequest,
    ALL_INDICES,
};
pub use service::{restore_path, snapshot_path, SnapshotService};
