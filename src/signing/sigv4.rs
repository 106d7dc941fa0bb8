//! AWS Signature Version 4 for header-authorized requests
//!
//! The four steps are kept as separate functions so each intermediate form can
//! be inspected in tests:
//!
//! 1. [`canonical_request`]: method, re-encoded wire path, sorted query, canonical
//!    headers, signed header list and payload hash.
//! 2. [`string_to_sign`]: algorithm, timestamp, credential scope and the hash
//!    of the canonical request.
//! 3. [`derive_signing_key`]: the HMAC chain over date, region, service.
//! 4. [`sign`]: the final HMAC, assembled into an `Authorization` value.
//!
//! Signatures always travel in the `Authorization` header. There is no
//! presigned (query string) mode and no expiry.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::credentials::Credentials;

type HmacSha256 = Hmac<Sha256>;

/// Signing algorithm identifier
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Service identifier of the search-cluster administrative API
pub const SEARCH_SERVICE: &str = "es";

/// Terminator of every credential scope
const SCOPE_TERMINATOR: &str = "aws4_request";

/// Header carrying the signing timestamp
pub const AMZ_DATE_HEADER: &str = "x-amz-date";

/// Header carrying a temporary session token
pub const SECURITY_TOKEN_HEADER: &str = "x-amz-security-token";

/// Headers that are sent but never signed.
const UNSIGNABLE_HEADERS: &[&str] = &[
    "authorization",
    "content-type",
    "content-length",
    "user-agent",
    "presigned-expires",
    "expect",
    "x-amzn-trace-id",
];

/// Everything that identifies who signs, where, and when
#[derive(Debug, Clone)]
pub struct SigningParams<'a> {
    /// Key pair and optional session token
    pub credentials: &'a Credentials,
    /// Region of the credential scope
    pub region: &'a str,
    /// Service of the credential scope, [`SEARCH_SERVICE`] for the cluster API
    pub service: &'a str,
    /// Signing instant; also sent as `x-amz-date`
    pub time: DateTime<Utc>,
}

impl<'a> SigningParams<'a> {
    /// `YYYYMMDD/region/service/aws4_request`
    pub fn credential_scope(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            date_stamp(&self.time),
            self.region,
            self.service,
            SCOPE_TERMINATOR
        )
    }
}

/// The parts of an HTTP request that take part in the signature
#[derive(Debug, Clone)]
pub struct SignableRequest<'a> {
    /// HTTP method, any case
    pub method: &'a str,
    /// Path exactly as it appears on the wire, without the query
    pub path: &'a str,
    /// Decoded query parameters
    pub query: &'a [(String, String)],
    /// Headers as sent; unsignable ones are skipped
    pub headers: &'a [(String, String)],
    /// Request body bytes, empty when there is none
    pub payload: &'a [u8],
}

/// Result of signing one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningOutput {
    /// Complete `Authorization` header value
    pub authorization: String,
    /// Hex signature
    pub signature: String,
    /// `;`-separated lowercase names of the signed headers
    pub signed_headers: String,
    /// Step 1 output
    pub canonical_request: String,
    /// Step 2 output
    pub string_to_sign: String,
}

/// ISO-8601 basic format timestamp, e.g. `20150830T123600Z`
pub fn amz_date(time: &DateTime<Utc>) -> String {
    time.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Date part of the credential scope, e.g. `20150830`
pub fn date_stamp(time: &DateTime<Utc>) -> String {
    time.format("%Y%m%d").to_string()
}

/// Lowercase hex SHA-256 digest
pub fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC-SHA256 accepts keys of any length"),
    };
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// URI-encode everything except the RFC 3986 unreserved set.
fn uri_encode(input: &str, keep_slash: bool) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            b'/' if keep_slash => encoded.push('/'),
            other => encoded.push_str(&format!("%{:02X}", other)),
        }
    }
    encoded
}

/// Canonical URI of a wire path.
///
/// The wire path is already percent-encoded once, and for every service
/// except S3 the canonical form encodes it again, so `%2A` becomes `%252A`.
fn canonical_uri(wire_path: &str) -> String {
    if wire_path.is_empty() {
        return "/".to_string();
    }
    uri_encode(wire_path, true)
}

fn canonical_query(query: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .map(|(key, value)| (uri_encode(key, false), uri_encode(value, false)))
        .collect();
    pairs.sort();

    pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Lowercased, trimmed and sorted signable headers; duplicates joined by `,`.
fn canonical_headers(headers: &[(String, String)]) -> BTreeMap<String, String> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        let name = name.trim().to_ascii_lowercase();
        if UNSIGNABLE_HEADERS.contains(&name.as_str()) {
            continue;
        }
        let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
        grouped.entry(name).or_default().push(value);
    }

    grouped
        .into_iter()
        .map(|(name, values)| (name, values.join(",")))
        .collect()
}

/// Step 1: the canonical request and its signed header list
pub fn canonical_request(request: &SignableRequest<'_>) -> (String, String) {
    let headers = canonical_headers(request.headers);
    let canonical_header_block: String = headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value))
        .collect();
    let signed_headers = headers.keys().cloned().collect::<Vec<_>>().join(";");

    let canonical = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        request.method.to_ascii_uppercase(),
        canonical_uri(request.path),
        canonical_query(request.query),
        canonical_header_block,
        signed_headers,
        hex_sha256(request.payload)
    );
    (canonical, signed_headers)
}

/// Step 2: the string to sign
pub fn string_to_sign(params: &SigningParams<'_>, canonical_request: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date(&params.time),
        params.credential_scope(),
        hex_sha256(canonical_request.as_bytes())
    )
}

/// Step 3: signing key derived from the secret and the scope
pub fn derive_signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, SCOPE_TERMINATOR.as_bytes())
}

/// Step 4: sign the request and build the `Authorization` header value.
///
/// `request.headers` must already carry `host`, `x-amz-date` and, for
/// temporary credentials, `x-amz-security-token`.
pub fn sign(params: &SigningParams<'_>, request: &SignableRequest<'_>) -> SigningOutput {
    let (canonical_request, signed_headers) = canonical_request(request);
    let string_to_sign = string_to_sign(params, &canonical_request);

    let key = derive_signing_key(
        params.credentials.secret_access_key(),
        &date_stamp(&params.time),
        params.region,
        params.service,
    );
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

    let authorization = format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM,
        params.credentials.access_key_id(),
        params.credential_scope(),
        signed_headers,
        signature
    );

    SigningOutput {
        authorization,
        signature,
        signed_headers,
        canonical_request,
        string_to_sign,
    }
}
