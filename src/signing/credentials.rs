//! Credential capability used by the request signer

use std::fmt;

use async_trait::async_trait;
use aws_config::environment::EnvironmentVariableCredentialsProvider;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};

use crate::{Result, SnapshotError};

/// A resolved set of signing credentials.
///
/// The secret key and session token never appear in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Credentials {
    /// Create credentials from an access key pair
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Attach a temporary session token
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Access key id, safe to log
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Secret access key
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// Session token, when the credentials are temporary
    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***REDACTED***")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "***REDACTED***"),
            )
            .finish()
    }
}

impl From<&aws_credential_types::Credentials> for Credentials {
    fn from(resolved: &aws_credential_types::Credentials) -> Self {
        let credentials = Credentials::new(resolved.access_key_id(), resolved.secret_access_key());
        match resolved.session_token() {
            Some(token) => credentials.with_session_token(token),
            None => credentials,
        }
    }
}

/// Source of credentials for each signed request.
///
/// Resolved on every call so that rotated temporary credentials are picked up.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// Resolve the credentials to sign with
    async fn credentials(&self) -> Result<Credentials>;
}

/// Fixed credentials provide themselves.
#[async_trait]
impl CredentialsProvider for Credentials {
    async fn credentials(&self) -> Result<Credentials> {
        Ok(self.clone())
    }
}

/// Credentials resolved through an AWS SDK provider.
///
/// [`AwsCredentials::from_environment`] reads `AWS_ACCESS_KEY_ID`,
/// `AWS_SECRET_ACCESS_KEY` and `AWS_SESSION_TOKEN`; any other
/// [`ProvideCredentials`] implementation (profile, web identity, the default
/// chain) can be wrapped with [`AwsCredentials::new`].
#[derive(Debug, Clone)]
pub struct AwsCredentials {
    provider: SharedCredentialsProvider,
}

impl AwsCredentials {
    /// Wrap an SDK credentials provider
    pub fn new(provider: impl ProvideCredentials + 'static) -> Self {
        Self {
            provider: SharedCredentialsProvider::new(provider),
        }
    }

    /// Standard AWS environment variables of the current process
    pub fn from_environment() -> Self {
        Self::new(EnvironmentVariableCredentialsProvider::new())
    }
}

#[async_trait]
impl CredentialsProvider for AwsCredentials {
    async fn credentials(&self) -> Result<Credentials> {
        let resolved = self
            .provider
            .provide_credentials()
            .await
            .map_err(|e| SnapshotError::Credentials(e.to_string()))?;
        Ok(Credentials::from(&resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_types::os_shim_internal::Env;

    fn from_env(vars: &[(&str, &str)]) -> AwsCredentials {
        AwsCredentials::new(EnvironmentVariableCredentialsProvider::new_with_env(
            Env::from_slice(vars),
        ))
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credentials = Credentials::new("AKIDEXAMPLE", "super-secret").with_session_token("session-value");
        let rendered = format!("{:?}", credentials);

        assert!(rendered.contains("AKIDEXAMPLE"));
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("session-value"));
    }

    #[tokio::test]
    async fn test_environment_with_session_token() {
        let credentials = from_env(&[
            ("AWS_ACCESS_KEY_ID", "AKID"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_SESSION_TOKEN", "session"),
        ])
        .credentials()
        .await
        .unwrap();

        assert_eq!(credentials.access_key_id(), "AKID");
        assert_eq!(credentials.secret_access_key(), "secret");
        assert_eq!(credentials.session_token(), Some("session"));
    }

    #[tokio::test]
    async fn test_environment_without_session_token() {
        let credentials = from_env(&[
            ("AWS_ACCESS_KEY_ID", "AKID"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
        ])
        .credentials()
        .await
        .unwrap();

        assert_eq!(credentials.session_token(), None);
    }

    #[tokio::test]
    async fn test_environment_missing_secret() {
        let err = from_env(&[("AWS_ACCESS_KEY_ID", "AKID")])
            .credentials()
            .await
            .unwrap_err();

        assert!(matches!(err, SnapshotError::Credentials(_)));
    }

    #[tokio::test]
    async fn test_static_sdk_credentials() {
        let sdk = aws_credential_types::Credentials::new("AKID", "secret", Some("token".to_string()), None, "static");
        let credentials = AwsCredentials::new(sdk).credentials().await.unwrap();

        assert_eq!(credentials, Credentials::new("AKID", "secret").with_session_token("token"));
    }
}
