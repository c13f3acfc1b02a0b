use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CarbonpostError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl FromStr for Method {
    type Err = CarbonpostError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(CarbonpostError::Validation(format!(
                "Invalid HTTP method: {}",
                s
            ))),
        }
    }
}

impl Method {
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

/// One HTTP attempt, as seen by a transport backend.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: url::Url,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
    /// Enforced per attempt, not per batch.
    pub timeout: Duration,
}

impl TransportRequest {
    /// Bytes this attempt puts on the wire, by the shared accounting rule.
    pub fn bytes_sent(&self) -> u64 {
        let body_len = self.body.as_ref().map(|b| b.len() as u64).unwrap_or(0);
        serialized_header_len(&self.headers) + body_len
    }
}

/// What a transport backend hands back to the orchestrator.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl TransportResponse {
    /// Build a response with its received-byte count derived from the same
    /// serialization rule every backend uses, so estimates stay comparable
    /// across backends.
    pub fn accounted(
        status: u16,
        headers: BTreeMap<String, String>,
        body: String,
        bytes_sent: u64,
    ) -> Self {
        let bytes_received = serialized_header_len(&headers) + body.len() as u64;
        Self {
            status,
            headers,
            body,
            bytes_sent,
            bytes_received,
        }
    }
}

/// UTF-8 byte length of the JSON-serialized header map.
///
/// All backends account header bytes this way rather than measuring raw
/// wire bytes, so a given response costs the same regardless of backend.
pub fn serialized_header_len(headers: &BTreeMap<String, String>) -> u64 {
    serde_json::to_string(headers)
        .map(|s| s.len() as u64)
        .unwrap_or(0)
}

/// Lowercase header keys so the accounting rule is insensitive to how a
/// particular client library cases them.
pub(crate) fn normalize_headers(headers: &reqwest::header::HeaderMap) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for (name, value) in headers.iter() {
        map.insert(
            name.as_str().to_ascii_lowercase(),
            value.to_str().unwrap_or("").to_string(),
        );
    }
    map
}

/// Map a reqwest failure into the transport taxonomy.
pub(crate) fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> CarbonpostError {
    if err.is_timeout() {
        CarbonpostError::Timeout(timeout)
    } else {
        CarbonpostError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse() {
        assert_eq!(Method::parse("get").unwrap(), Method::Get);
        assert_eq!(Method::parse("POST").unwrap(), Method::Post);
        assert!(Method::parse("YEET").is_err());
    }

    #[test]
    fn test_empty_header_map_still_counts_braces() {
        // JSON-serializing an empty map gives "{}", two bytes.
        assert_eq!(serialized_header_len(&BTreeMap::new()), 2);
    }

    #[test]
    fn test_bytes_sent_includes_body() {
        let req = TransportRequest {
            method: Method::Post,
            url: url::Url::parse("http://example.com/").unwrap(),
            headers: BTreeMap::new(),
            body: Some(b"hello".to_vec()),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(req.bytes_sent(), 2 + 5);
    }

    #[test]
    fn test_accounted_response_bytes() {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());
        // {"content-type":"text/plain"} -> 29 bytes
        let resp = TransportResponse::accounted(200, headers, "abcd".to_string(), 10);
        assert_eq!(resp.bytes_received, 29 + 4);
        assert_eq!(resp.bytes_sent, 10);
    }
}
