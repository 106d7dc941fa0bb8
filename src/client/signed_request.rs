// Signed request descriptor - one authenticated round-trip per call

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error};

use super::{AdminApi, Endpoint, Method};
use crate::signing::sigv4::{self, AMZ_DATE_HEADER, SECURITY_TOKEN_HEADER};
use crate::signing::{Credentials, CredentialsProvider, SignableRequest, SigningOutput, SigningParams, SEARCH_SERVICE};
use crate::{Result, SnapshotError};

/// Top-level response fields that mark a failed call, whatever the HTTP status
pub const ERROR_FIELDS: &[&str] = &["error", "errors", "Message"];

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// A fully signed request, ready to dispatch
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL whose path and query are exactly the signed ones
    pub url: String,
    /// Every header to send, `Authorization` last
    pub headers: Vec<(String, String)>,
    /// Serialized JSON body
    pub body: Option<Vec<u8>>,
    /// Intermediate and final signing values
    pub signing: SigningOutput,
}

impl PreparedRequest {
    /// First header value matching `name`, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Region, endpoint and credentials for signing calls to one cluster.
///
/// Immutable after construction. Every call resolves credentials and
/// re-derives its date-scoped signing material, so nothing is carried between
/// requests.
pub struct SignedRequest {
    region: String,
    endpoint: Endpoint,
    credentials: Arc<dyn CredentialsProvider>,
    http: reqwest::Client,
}

impl SignedRequest {
    /// Create a signer using the transport's default settings
    pub fn new(
        region: impl Into<String>,
        endpoint: Endpoint,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            region: region.into(),
            endpoint,
            credentials,
            http,
        })
    }

    /// Endpoint every request is sent to
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Build and sign a request for the given credentials and instant without
    /// sending it.
    ///
    /// `path` is given unencoded and may carry a `?query`. It is normalized
    /// into the wire URL first, and the signature covers that URL.
    pub fn prepare(
        &self,
        credentials: &Credentials,
        method: Method,
        path: &str,
        body: Option<&Value>,
        time: DateTime<Utc>,
    ) -> Result<PreparedRequest> {
        let url = self.endpoint.url(path)?;
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let payload = body.map(serde_json::to_vec).transpose()?;

        let mut headers = vec![
            ("Host".to_string(), self.endpoint.host_header()),
            ("Accept".to_string(), "application/json".to_string()),
            ("Accept-Charset".to_string(), "utf-8".to_string()),
            ("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string()),
            (AMZ_DATE_HEADER.to_string(), sigv4::amz_date(&time)),
        ];
        if let Some(token) = credentials.session_token() {
            headers.push((SECURITY_TOKEN_HEADER.to_string(), token.to_string()));
        }

        let params = SigningParams {
            credentials,
            region: &self.region,
            service: SEARCH_SERVICE,
            time,
        };
        let signing = sigv4::sign(
            &params,
            &SignableRequest {
                method: method.as_str(),
                path: url.path(),
                query: &query,
                headers: &headers,
                payload: payload.as_deref().unwrap_or_default(),
            },
        );
        headers.push(("Authorization".to_string(), signing.authorization.clone()));

        Ok(PreparedRequest {
            method,
            url: url.to_string(),
            headers,
            body: payload,
            signing,
        })
    }

    async fn dispatch(&self, prepared: PreparedRequest) -> Result<Value> {
        let mut builder = self
            .http
            .request(prepared.method.into(), prepared.url.as_str());
        for (name, value) in &prepared.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = prepared.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        // The call is complete only once the whole body is buffered
        let bytes = response.bytes().await?;
        let body = String::from_utf8_lossy(&bytes);

        debug!(status, bytes = bytes.len(), "received administrative API response");
        interpret_response(status, &body)
    }
}

/// Classify a buffered response body.
///
/// The administrative API sometimes reports failures with a success status,
/// so the body alone decides: any top-level `error`, `errors` or `Message`
/// field is a failure.
pub fn interpret_response(status: u16, body: &str) -> Result<Value> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| SnapshotError::MalformedResponse {
            reason: e.to_string(),
            body: body.to_string(),
        })?;

    if let Some(fields) = value.as_object() {
        if ERROR_FIELDS.iter().any(|field| fields.contains_key(*field)) {
            error!(status, body = %body, "administrative API reported an error");
            return Err(SnapshotError::RemoteApi {
                status,
                body: body.to_string(),
            });
        }
    }

    Ok(value)
}

#[async_trait]
impl AdminApi for SignedRequest {
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        debug!(%method, path, endpoint = %self.endpoint, "sending signed request");
        let credentials = self.credentials.credentials().await?;
        let prepared = self.prepare(&credentials, method, path, body, Utc::now())?;
        self.dispatch(prepared).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn signer() -> SignedRequest {
        SignedRequest::new(
            "eu-west-1",
            Endpoint::parse("search-logs.eu-west-1.es.amazonaws.com").unwrap(),
            Arc::new(Credentials::new("AKID", "secret")),
        )
        .unwrap()
    }

    fn credentials() -> Credentials {
        Credentials::new("AKID", "secret")
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 0).unwrap()
    }

    #[test]
    fn test_prepare_sets_deterministic_headers() {
        let prepared = signer()
            .prepare(&credentials(), Method::Get, "/_snapshot/repo/_all", None, fixed_time())
            .unwrap();

        assert_eq!(prepared.url, "https://search-logs.eu-west-1.es.amazonaws.com/_snapshot/repo/_all");
        assert_eq!(prepared.header("host"), Some("search-logs.eu-west-1.es.amazonaws.com"));
        assert_eq!(prepared.header("accept"), Some("application/json"));
        assert_eq!(prepared.header("accept-charset"), Some("utf-8"));
        assert_eq!(prepared.header("content-type"), Some(JSON_CONTENT_TYPE));
        assert_eq!(prepared.header("x-amz-date"), Some("20240305T140700Z"));
        assert!(prepared.header("x-amz-security-token").is_none());
        assert!(prepared.body.is_none());

        let authorization = prepared.header("authorization").unwrap();
        assert!(authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKID/20240305/eu-west-1/es/aws4_request, SignedHeaders=accept;accept-charset;host;x-amz-date, Signature="
        ));
    }

    #[test]
    fn test_prepare_is_deterministic_for_fixed_inputs() {
        let signer = signer();
        let body = json!({"indices": "*", "ignore_unavailable": false, "include_global_state": true});

        let first = signer
            .prepare(&credentials(), Method::Put, "/_snapshot/repo/snap", Some(&body), fixed_time())
            .unwrap();
        let second = signer
            .prepare(&credentials(), Method::Put, "/_snapshot/repo/snap", Some(&body), fixed_time())
            .unwrap();

        assert_eq!(first.header("authorization"), second.header("authorization"));
        assert_eq!(first.body, second.body);
        assert_eq!(
            first.body.as_deref(),
            Some(serde_json::to_vec(&body).unwrap().as_slice())
        );
    }

    #[test]
    fn test_session_token_is_signed() {
        let prepared = signer()
            .prepare(
                &credentials().with_session_token("token"),
                Method::Get,
                "/_snapshot/repo",
                None,
                fixed_time(),
            )
            .unwrap();

        assert_eq!(prepared.header("x-amz-security-token"), Some("token"));
        assert_eq!(
            prepared.signing.signed_headers,
            "accept;accept-charset;host;x-amz-date;x-amz-security-token"
        );
    }

    #[test]
    fn test_reserved_characters_travel_raw_and_are_signed_encoded() {
        let prepared = signer()
            .prepare(&credentials(), Method::Get, "/_snapshot/repo/2024-*,nightly", None, fixed_time())
            .unwrap();

        assert_eq!(
            prepared.url,
            "https://search-logs.eu-west-1.es.amazonaws.com/_snapshot/repo/2024-*,nightly"
        );
        let canonical_uri = prepared.signing.canonical_request.lines().nth(1);
        assert_eq!(canonical_uri, Some("/_snapshot/repo/2024-%2A%2Cnightly"));
    }

    #[test]
    fn test_escaped_segment_is_encoded_twice() {
        let prepared = signer()
            .prepare(&credentials(), Method::Get, "/_snapshot/repo/a%3Fb/_status", None, fixed_time())
            .unwrap();

        assert!(prepared.url.ends_with("/_snapshot/repo/a%3Fb/_status"));
        assert_eq!(
            prepared.signing.canonical_request.lines().nth(1),
            Some("/_snapshot/repo/a%253Fb/_status")
        );
        assert_eq!(prepared.signing.canonical_request.lines().nth(2), Some(""));
    }

    #[test]
    fn test_query_is_signed_sorted() {
        let prepared = signer()
            .prepare(&credentials(), Method::Get, "/_cat/snapshots/repo?v=true&format=json", None, fixed_time())
            .unwrap();

        assert!(prepared.url.ends_with("/_cat/snapshots/repo?v=true&format=json"));
        assert_eq!(
            prepared.signing.canonical_request.lines().nth(2),
            Some("format=json&v=true")
        );
    }

    #[test]
    fn test_interpret_success_body() {
        let value = interpret_response(200, r#"{"accepted": true}"#).unwrap();
        assert_eq!(value, json!({"accepted": true}));
    }

    #[test]
    fn test_interpret_error_fields_fail_even_on_200() {
        for body in [
            r#"{"error": {"type": "repository_exception"}, "status": 500}"#,
            r#"{"errors": true, "items": []}"#,
            r#"{"Message": "User is not authorized"}"#,
        ] {
            match interpret_response(200, body) {
                Err(SnapshotError::RemoteApi { status, body: detail }) => {
                    assert_eq!(status, 200);
                    assert_eq!(detail, body);
                }
                other => panic!("expected remote API error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_interpret_malformed_body() {
        let err = interpret_response(502, "<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, SnapshotError::MalformedResponse { ref body, .. } if body.contains("Bad Gateway")));
    }
}
