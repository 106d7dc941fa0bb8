// Administrative endpoint address and request URLs

use std::fmt;

use url::Url;

use crate::{Result, SnapshotError};

/// Scheme, host and optional non-default port of the administrative endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl Endpoint {
    /// Parse a bare hostname (`search-x.eu-west-1.es.amazonaws.com`, implying
    /// `https`) or an absolute `http(s)://host[:port]` URL.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(SnapshotError::InvalidEndpoint("endpoint is empty".to_string()));
        }

        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        let url = Url::parse(&candidate)
            .map_err(|e| SnapshotError::InvalidEndpoint(format!("{}: {}", input, e)))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(SnapshotError::InvalidEndpoint(format!(
                    "unsupported scheme '{}' in {}",
                    other, input
                )))
            }
        }

        if url.path() != "/" || url.query().is_some() {
            return Err(SnapshotError::InvalidEndpoint(format!(
                "endpoint must not carry a path or query: {}",
                input
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| SnapshotError::InvalidEndpoint(format!("missing host in {}", input)))?
            .to_string();

        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            port: url.port(),
        })
    }

    /// `http` or `https`
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host name without port
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit port, `None` when it is the scheme default
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Value of the `Host` header; the port only appears when non-default
    pub fn host_header(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// Wire URL for an unencoded absolute `path`, optionally with a `?query`.
    ///
    /// Characters that cannot appear in a path are percent-encoded; existing
    /// escapes are kept as they are.
    pub fn url(&self, path: &str) -> Result<Url> {
        if !path.starts_with('/') {
            return Err(SnapshotError::InvalidRequest(format!(
                "request path must be absolute: {}",
                path
            )));
        }
        let mut url = Url::parse(&format!("{}{}", self, path))
            .map_err(|e| SnapshotError::InvalidRequest(format!("{}: {}", path, e)))?;
        url.set_fragment(None);
        Ok(url)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host_header())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_hostname_defaults_to_https() {
        let endpoint = Endpoint::parse("search-logs.eu-west-1.es.amazonaws.com").unwrap();
        assert_eq!(endpoint.scheme(), "https");
        assert_eq!(endpoint.host_header(), "search-logs.eu-west-1.es.amazonaws.com");
        assert_eq!(
            endpoint.url("/_snapshot/repo").unwrap().as_str(),
            "https://search-logs.eu-west-1.es.amazonaws.com/_snapshot/repo"
        );
    }

    #[test]
    fn test_explicit_port_is_kept() {
        let endpoint = Endpoint::parse("http://127.0.0.1:9200/").unwrap();
        assert_eq!(endpoint.port(), Some(9200));
        assert_eq!(endpoint.host_header(), "127.0.0.1:9200");
        assert_eq!(endpoint.to_string(), "http://127.0.0.1:9200");
    }

    #[test]
    fn test_default_port_is_dropped() {
        let endpoint = Endpoint::parse("https://search.example.com:443").unwrap();
        assert_eq!(endpoint.port(), None);
        assert_eq!(endpoint.host_header(), "search.example.com");
    }

    #[test]
    fn test_request_urls() {
        let endpoint = Endpoint::parse("http://127.0.0.1:9200").unwrap();

        let url = endpoint.url("/_snapshot/repo/2024-*,b c").unwrap();
        assert_eq!(url.path(), "/_snapshot/repo/2024-*,b%20c");
        assert_eq!(url.port(), Some(9200));

        let url = endpoint.url("/_cat/snapshots?v=true").unwrap();
        assert_eq!(url.path(), "/_cat/snapshots");
        assert_eq!(url.query(), Some("v=true"));

        assert!(endpoint.url("_snapshot").is_err());
    }

    #[test]
    fn test_rejects_invalid_endpoints() {
        assert!(Endpoint::parse("").is_err());
        assert!(Endpoint::parse("ftp://search.example.com").is_err());
        assert!(Endpoint::parse("https://search.example.com/_snapshot").is_err());
    }
}
