// Shared test doubles: a scripted administrative API and a recording notifier

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::Instant;

use search_snapshot::client::{AdminApi, Method};
use search_snapshot::notification::{Notification, NotificationError, Notifier};
use search_snapshot::{Result, SnapshotError};

/// One call observed by [`ScriptedApi`]
#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub at: Instant,
}

/// Answers calls from a queue of canned results, in order
pub struct ScriptedApi {
    responses: Mutex<VecDeque<Result<Value>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    pub fn new(responses: Vec<Result<Value>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<(Method, String)> {
        self.calls()
            .into_iter()
            .map(|call| (call.method, call.path))
            .collect()
    }
}

#[async_trait]
impl AdminApi for ScriptedApi {
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            body: body.cloned(),
            at: Instant::now(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected call: {} {}", method, path))
    }
}

/// Status response with a single snapshot in `state`
pub fn status(snapshot: &str, state: &str) -> Result<Value> {
    Ok(json!({
        "snapshots": [{
            "snapshot": snapshot,
            "repository": "cluster-backups",
            "state": state,
            "shards_stats": {"done": 1, "failed": 0, "total": 1}
        }]
    }))
}

pub fn acknowledged() -> Result<Value> {
    Ok(json!({"acknowledged": true}))
}

pub fn remote_error(body: &str) -> Result<Value> {
    Err(SnapshotError::RemoteApi {
        status: 200,
        body: body.to_string(),
    })
}

/// Records notifications, optionally failing every delivery
#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: bool,
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> std::result::Result<(), NotificationError> {
        self.sent.lock().unwrap().push(notification.clone());
        if self.fail {
            return Err(NotificationError::Rejected {
                status: 503,
                body: "webhook unavailable".to_string(),
            });
        }
        Ok(())
    }
}

/// A webhook that accepts the connection and never answers
pub struct SilentNotifier;

#[async_trait]
impl Notifier for SilentNotifier {
    async fn notify(&self, _notification: &Notification) -> std::result::Result<(), NotificationError> {
        std::future::pending().await
    }
}
