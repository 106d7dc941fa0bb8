// Repository declaration - idempotent PUT issued before every operation

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use crate::client::{AdminApi, Method};
use crate::Result;

/// Object-storage repository registered with the cluster as a snapshot target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryReference {
    /// Repository name on the cluster
    pub id: String,
    /// Region of the bucket
    pub region: String,
    /// Bucket that stores the snapshots
    pub bucket: String,
    /// Role the cluster assumes to write into the bucket
    pub role_arn: String,
}

impl RepositoryReference {
    /// `/_snapshot/{id}`
    pub fn path(&self) -> String {
        format!("/_snapshot/{}", self.id)
    }

    /// Body of the declaration request
    pub fn declaration(&self) -> Value {
        json!({
            "type": "s3",
            "settings": {
                "bucket": self.bucket,
                "region": self.region,
                "role_arn": self.role_arn,
            }
        })
    }
}

/// Declare (or re-declare) the repository.
///
/// Re-declaring identical settings is a no-op on the cluster, so this is
/// issued on every invocation instead of being cached.
#[instrument(skip_all, fields(repository = %repository.id))]
pub async fn ensure_repository<A>(api: &A, repository: &RepositoryReference) -> Result<Value>
where
    A: AdminApi + ?Sized,
{
    debug!(bucket = %repository.bucket, region = %repository.region, "declaring snapshot repository");
    let response = api
        .send(Method::Put, &repository.path(), Some(&repository.declaration()))
        .await?;
    info!("snapshot repository ready");
    Ok(response)
}
