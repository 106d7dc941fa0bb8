// Snapshot operations - backup, restore, list and status for one invocation

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use super::repository::{ensure_repository, RepositoryReference};
use super::requests::{BackupRequest, ListRequest, RestoreRequest, StatusRequest};
use crate::client::{AdminApi, Method};
use crate::notification::{notify_best_effort, Notification, Notifier};
use crate::snapshot::{resume, PollState, SnapshotId, SnapshotRecord};
use crate::Result;

/// `/_snapshot/{repository}/{snapshot}`
pub fn snapshot_path(repository_id: &str, snapshot_id: &SnapshotId) -> String {
    format!("/_snapshot/{}/{}", repository_id, snapshot_id)
}

/// `/_snapshot/{repository}/{snapshot}/_restore`
pub fn restore_path(repository_id: &str, snapshot_id: &SnapshotId) -> String {
    format!("/_snapshot/{}/{}/_restore", repository_id, snapshot_id)
}

/// Operations against one repository of one cluster.
///
/// Every operation re-declares the repository first and runs strictly in
/// sequence: declare, start, then (for backups) poll until terminal.
pub struct SnapshotService<A> {
    api: A,
    repository: RepositoryReference,
    poll_interval: Duration,
    notifier: Option<Arc<dyn Notifier>>,
    cluster_label: String,
}

impl<A: AdminApi> SnapshotService<A> {
    /// Service polling every `poll_interval`, labelled with the repository id
    pub fn new(api: A, repository: RepositoryReference, poll_interval: Duration) -> Self {
        let cluster_label = repository.id.clone();
        Self {
            api,
            repository,
            poll_interval,
            notifier: None,
            cluster_label,
        }
    }

    /// Report backup outcomes through `notifier`
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Name used for the cluster in notifications
    pub fn with_cluster_label(mut self, label: impl Into<String>) -> Self {
        self.cluster_label = label.into();
        self
    }

    /// Repository every operation targets
    pub fn repository(&self) -> &RepositoryReference {
        &self.repository
    }

    /// Resume data for a snapshot of this repository
    pub fn poll_state(&self, snapshot_id: &SnapshotId) -> PollState {
        PollState::new(self.repository.id.clone(), snapshot_id.clone(), self.poll_interval)
    }

    /// Declare the repository on its own
    pub async fn ensure_repository(&self) -> Result<Value> {
        ensure_repository(&self.api, &self.repository).await
    }

    /// Take a snapshot named after the current minute and wait for it
    pub async fn backup(&self, request: &BackupRequest) -> Result<SnapshotRecord> {
        self.backup_as(request, SnapshotId::generate(Utc::now())).await
    }

    /// Take a snapshot with a given name and wait for it.
    ///
    /// Any failure is logged and reported through the notifier, then returned
    /// unchanged. Notification problems are never returned.
    #[instrument(skip_all, fields(repository = %self.repository.id, snapshot = %snapshot_id))]
    pub async fn backup_as(
        &self,
        request: &BackupRequest,
        snapshot_id: SnapshotId,
    ) -> Result<SnapshotRecord> {
        match self.run_backup(request, &snapshot_id).await {
            Ok(record) => {
                info!("backup operation is complete");
                let notification = Notification::success(
                    format!("{} backup finished", self.cluster_label),
                    format!("_(Snapshot: {})_", snapshot_id),
                );
                notify_best_effort(self.notifier.as_deref(), &notification).await;
                Ok(record)
            }
            Err(err) => {
                error!(error = %err, "backup operation failed");
                let notification = Notification::failure(
                    format!("{} backup failed", self.cluster_label),
                    err.to_string(),
                );
                notify_best_effort(self.notifier.as_deref(), &notification).await;
                Err(err)
            }
        }
    }

    async fn run_backup(
        &self,
        request: &BackupRequest,
        snapshot_id: &SnapshotId,
    ) -> Result<SnapshotRecord> {
        self.ensure_repository().await?;

        let settings = serde_json::to_value(request.settings())?;
        let path = snapshot_path(&self.repository.id, snapshot_id);
        self.api.send(Method::Put, &path, Some(&settings)).await?;

        let poll_state = self.poll_state(snapshot_id);
        info!(
            poll_state = %serde_json::to_string(&poll_state)?,
            "backup operation is in progress"
        );
        resume(&self.api, &poll_state).await
    }

    /// Describe one snapshot, or every snapshot when none is named
    #[instrument(skip_all, fields(repository = %self.repository.id))]
    pub async fn list(&self, request: &ListRequest) -> Result<Value> {
        let snapshot_id = request.snapshot_id()?;
        self.ensure_repository().await?;

        let response = self
            .api
            .send(Method::Get, &snapshot_path(&self.repository.id, &snapshot_id), None)
            .await?;
        debug!(snapshot = %snapshot_id, response = %response, "snapshots listed");
        Ok(response)
    }

    /// Start restoring a snapshot. Completion is not awaited.
    #[instrument(skip_all, fields(repository = %self.repository.id))]
    pub async fn restore(&self, request: &RestoreRequest) -> Result<Value> {
        let snapshot_id = request.snapshot_id()?;
        self.ensure_repository().await?;

        let settings = serde_json::to_value(request.settings())?;
        let response = self
            .api
            .send(
                Method::Post,
                &restore_path(&self.repository.id, &snapshot_id),
                Some(&settings),
            )
            .await?;
        info!(snapshot = %snapshot_id, response = %response, "restore acknowledged");
        Ok(response)
    }

    /// Resume polling a snapshot started earlier
    #[instrument(skip_all, fields(repository = %self.repository.id))]
    pub async fn status(&self, request: &StatusRequest) -> Result<SnapshotRecord> {
        let snapshot_id = request.snapshot_id()?;
        self.ensure_repository().await?;

        let mut poll_state = self.poll_state(&snapshot_id);
        if let Some(secs) = request.interval_seconds.filter(|secs| *secs > 0) {
            poll_state.interval_seconds = secs;
        }
        info!(poll_state = %serde_json::to_string(&poll_state)?, "resuming snapshot status polling");
        resume(&self.api, &poll_state).await
    }
}
