//! Best-effort webhook notifications for backup outcomes
//!
//! A notification can never change the outcome of the operation it reports
//! on: [`notify_best_effort`] logs delivery failures and drops them, and gives
//! up on deliveries that take longer than [`NOTIFICATION_TIMEOUT`].

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Upper bound on one delivery attempt
pub const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised while delivering a notification
#[derive(Error, Debug)]
pub enum NotificationError {
    /// Connection, TLS or timeout failure
    #[error("Webhook transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Webhook answered with a non-success status
    #[error("Webhook rejected notification (HTTP {status}): {body}")]
    Rejected {
        /// HTTP status
        status: u16,
        /// Response body
        body: String,
    },
}

/// Outcome summary sent to the webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Whether the reported operation succeeded
    pub success: bool,
    /// Headline
    pub message: String,
    /// Secondary context line
    pub details: String,
}

impl Notification {
    /// A success report
    pub fn success(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            details: details.into(),
        }
    }

    /// A failure report
    pub fn failure(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            details: details.into(),
        }
    }

    fn marker(&self) -> &'static str {
        if self.success {
            ":white_check_mark:"
        } else {
            ":x:"
        }
    }

    /// Slack incoming-webhook body: a plain text fallback plus two blocks
    pub fn to_slack_payload(&self) -> Value {
        json!({
            "text": format!("{} {}", self.marker(), self.message),
            "blocks": [
                {
                    "type": "section",
                    "text": {
                        "type": "mrkdwn",
                        "text": format!("*{} {}*", self.marker(), self.message),
                    },
                },
                {
                    "type": "context",
                    "elements": [
                        { "type": "mrkdwn", "text": self.details },
                    ],
                },
            ],
        })
    }
}

/// Delivery channel for notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// POSTs the Slack payload to an incoming-webhook URL
pub struct WebhookNotifier {
    url: String,
    http: reqwest::Client,
}

impl WebhookNotifier {
    /// Notifier posting to `url`
    pub fn new(url: impl Into<String>) -> Result<Self, NotificationError> {
        Ok(Self {
            url: url.into(),
            http: reqwest::Client::builder()
                .timeout(NOTIFICATION_TIMEOUT)
                .build()?,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotificationError> {
        let response = self
            .http
            .post(&self.url)
            .json(&notification.to_slack_payload())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(success = notification.success, "notification delivered");
        Ok(())
    }
}

/// Send `notification` if a notifier is configured, ignoring any failure.
///
/// Returns after at most [`NOTIFICATION_TIMEOUT`].
pub async fn notify_best_effort(notifier: Option<&dyn Notifier>, notification: &Notification) {
    let Some(notifier) = notifier else {
        return;
    };

    match tokio::time::timeout(NOTIFICATION_TIMEOUT, notifier.notify(notification)).await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => warn!(error = %error, "notification delivery failed, ignoring"),
        Err(_) => warn!(
            timeout_secs = NOTIFICATION_TIMEOUT.as_secs(),
            "notification delivery timed out, ignoring"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingNotifier {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _notification: &Notification) -> Result<(), NotificationError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(NotificationError::Rejected {
                status: 500,
                body: "boom".to_string(),
            })
        }
    }

    #[test]
    fn test_success_payload() {
        let payload = Notification::success("search.example.com backup finished", "_(Snapshot: s1)_")
            .to_slack_payload();

        assert_eq!(
            payload,
            json!({
                "text": ":white_check_mark: search.example.com backup finished",
                "blocks": [
                    {"type": "section", "text": {"type": "mrkdwn", "text": "*:white_check_mark: search.example.com backup finished*"}},
                    {"type": "context", "elements": [{"type": "mrkdwn", "text": "_(Snapshot: s1)_"}]}
                ]
            })
        );
    }

    #[test]
    fn test_failure_payload_marker() {
        let payload = Notification::failure("backup failed", "detail").to_slack_payload();
        assert_eq!(payload["text"], ":x: backup failed");
    }

    struct SilentWebhook;

    #[async_trait]
    impl Notifier for SilentWebhook {
        async fn notify(&self, _notification: &Notification) -> Result<(), NotificationError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_best_effort_gives_up_on_silent_webhook() {
        let started = tokio::time::Instant::now();

        notify_best_effort(Some(&SilentWebhook as &dyn Notifier), &Notification::success("m", "d")).await;

        let elapsed = started.elapsed();
        assert!(elapsed >= NOTIFICATION_TIMEOUT && elapsed < NOTIFICATION_TIMEOUT + Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_best_effort_swallows_failures() {
        let notifier = FailingNotifier {
            attempts: AtomicUsize::new(0),
        };

        notify_best_effort(Some(&notifier as &dyn Notifier), &Notification::failure("m", "d")).await;
        notify_best_effort(None, &Notification::failure("m", "d")).await;

        assert_eq!(notifier.attempts.load(Ordering::SeqCst), 1);
    }
}
