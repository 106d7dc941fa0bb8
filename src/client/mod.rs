//! Authenticated access to the cluster's administrative endpoint
//!
//! [`SignedRequest`] is the only production implementation of [`AdminApi`].
//! The poller and the operations depend on the trait so they can be driven by
//! scripted responses in tests.

mod endpoint;
mod signed_request;

pub use endpoint::Endpoint;
pub use signed_request::{interpret_response, PreparedRequest, SignedRequest, ERROR_FIELDS};

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::Result;

/// HTTP methods used against the snapshot API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read a snapshot, a listing or a status
    Get,
    /// Declare a repository or start a snapshot
    Put,
    /// Start a restore
    Post,
}

impl Method {
    /// Upper-case method name as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Put => "PUT",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Put => reqwest::Method::PUT,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// One authenticated JSON round-trip against the administrative API.
///
/// Implementations resolve with the parsed response body, or fail with
/// [`SnapshotError::Transport`](crate::SnapshotError::Transport),
/// [`SnapshotError::MalformedResponse`](crate::SnapshotError::MalformedResponse) or
/// [`SnapshotError::RemoteApi`](crate::SnapshotError::RemoteApi).
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Send `method path` with an optional JSON body
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value>;
}

#[async_trait]
impl<T: AdminApi + ?Sized> AdminApi for std::sync::Arc<T> {
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        (**self).send(method, path, body).await
    }
}
