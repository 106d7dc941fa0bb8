//! Snapshot lifecycle poller
//!
//! Queries `/_snapshot/{repository}/{snapshot}/_status` until the snapshot
//! reaches a terminal state, waiting a fixed interval after every `STARTED`.
//! There is no attempt limit and no overall deadline: snapshot duration depends
//! on data volume. Callers that need a bound wrap the future in their own
//! timeout, and can resume later from a [`PollState`].

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::types::{PollState, SnapshotId, SnapshotRecord, SnapshotStatus};
use crate::client::{AdminApi, Method};
use crate::{Result, SnapshotError};

/// Status sub-resource of one snapshot
pub fn status_path(repository_id: &str, snapshot_id: &SnapshotId) -> String {
    format!("/_snapshot/{}/{}/_status", repository_id, snapshot_id)
}

/// Poll until the snapshot resolves.
///
/// Resolves with the full record on `SUCCESS`; fails with
/// [`SnapshotError::SnapshotFailed`] carrying the record for any other
/// terminal state. Transport and API errors surface immediately.
#[instrument(skip_all, fields(repository = %repository_id, snapshot = %snapshot_id, interval_secs = interval.as_secs()))]
pub async fn await_completion<A>(
    api: &A,
    repository_id: &str,
    snapshot_id: &SnapshotId,
    interval: Duration,
) -> Result<SnapshotRecord>
where
    A: AdminApi + ?Sized,
{
    let path = status_path(repository_id, snapshot_id);
    let mut polls: u64 = 0;

    loop {
        polls += 1;
        let response = api.send(Method::Get, &path, None).await?;
        let record = single_snapshot(&response)?;
        let status = record.state().map(SnapshotStatus::parse).ok_or_else(|| {
            SnapshotError::MalformedResponse {
                reason: "snapshot record has no state".to_string(),
                body: response.to_string(),
            }
        })?;

        debug!(poll = polls, status = %status, record = %record, "snapshot status");

        match status {
            SnapshotStatus::Started => tokio::time::sleep(interval).await,
            SnapshotStatus::Success => {
                info!(polls, "snapshot completed");
                return Ok(record);
            }
            SnapshotStatus::Other(state) => {
                warn!(polls, state = %state, "snapshot reached a failed state");
                return Err(SnapshotError::SnapshotFailed { record });
            }
        }
    }
}

/// Continue polling a snapshot started by an earlier invocation
pub async fn resume<A>(api: &A, state: &PollState) -> Result<SnapshotRecord>
where
    A: AdminApi + ?Sized,
{
    await_completion(api, &state.repository_id, &state.snapshot_id, state.interval()).await
}

/// The status response must describe exactly one snapshot.
fn single_snapshot(response: &Value) -> Result<SnapshotRecord> {
    let snapshots = response
        .get("snapshots")
        .and_then(Value::as_array)
        .ok_or_else(|| SnapshotError::MalformedResponse {
            reason: "status response has no snapshots array".to_string(),
            body: response.to_string(),
        })?;

    match snapshots.as_slice() {
        [only] => Ok(SnapshotRecord::new(only.clone())),
        _ => Err(SnapshotError::UnexpectedSnapshotCount {
            count: snapshots.len(),
            body: response.to_string(),
        }),
    }
}
