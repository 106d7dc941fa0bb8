//! Snapshot identifiers, status model and the lifecycle poller

pub mod poller;
mod types;

pub use poller::{await_completion, resume, status_path};
pub use types::{PollState, SnapshotId, SnapshotRecord, SnapshotStatus, ALL_SNAPSHOTS};
