use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::transport::types::Method;
use crate::{CarbonpostError, Result};

fn default_backend() -> String {
    "client".to_string()
}

fn default_repeat() -> u32 {
    1
}

/// One measurement batch, as submitted by a caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeasurementRequest {
    /// Absolute target URL.
    pub url: String,

    #[serde(default)]
    pub method: Method,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Raw string bodies are sent as-is; any other JSON value is
    /// serialized to its compact form.
    #[serde(default)]
    pub body: Option<serde_json::Value>,

    /// Transport backend key, default "client".
    #[serde(default = "default_backend")]
    pub backend: String,

    /// How many times the request is repeated, default 1.
    #[serde(default = "default_repeat")]
    pub repeat: u32,

    /// Per-attempt timeout override, in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl MeasurementRequest {
    /// A GET with defaults everywhere else; the common case in tests.
    pub fn get(url: &str) -> Self {
        Self {
            url: url.to_string(),
            method: Method::Get,
            headers: BTreeMap::new(),
            body: None,
            backend: default_backend(),
            repeat: 1,
            timeout_secs: None,
        }
    }

    pub(crate) fn body_bytes(&self) -> Result<Option<Vec<u8>>> {
        match &self.body {
            None => Ok(None),
            Some(serde_json::Value::String(s)) => Ok(Some(s.clone().into_bytes())),
            Some(value) => {
                let bytes = serde_json::to_vec(value).map_err(|e| {
                    CarbonpostError::Validation(format!("body is not serializable: {}", e))
                })?;
                Ok(Some(bytes))
            }
        }
    }
}

/// Last successful response of a batch, kept for inspection.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// Outcome of one measurement batch.
///
/// Present on both success and failure: an aborted batch still reports the
/// bytes and repetitions completed before the failing attempt, plus an
/// `error` message.
#[derive(Debug, Clone, Serialize)]
pub struct MeasurementResult {
    pub backend: String,
    pub method: String,
    pub url: String,

    /// Request plus response bytes, summed over completed repetitions.
    pub total_bytes: u64,

    /// Estimated CO₂ for the whole batch, in grams.
    pub estimated_co2_grams: f64,

    /// Per-repetition figure, `estimated_co2_grams / repeat`.
    pub avg_emissions_grams: f64,

    pub is_green_hosting: bool,
    pub repeat_requested: u32,
    pub repeat_completed: u32,

    pub last_response: Option<ResponseSnapshot>,

    /// Wall-clock duration of the batch in milliseconds.
    pub duration_ms: u64,

    /// Present only when the batch aborted.
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_defaults() {
        let request: MeasurementRequest =
            serde_json::from_str(r#"{"url": "https://example.com/a"}"#).unwrap();
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.backend, "client");
        assert_eq!(request.repeat, 1);
        assert!(request.headers.is_empty());
        assert!(request.body.is_none());
        assert!(request.timeout_secs.is_none());
    }

    #[test]
    fn test_deserialize_uppercase_method() {
        let request: MeasurementRequest = serde_json::from_str(
            r#"{"url": "https://example.com", "method": "POST", "backend": "socket", "repeat": 3}"#,
        )
        .unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.backend, "socket");
        assert_eq!(request.repeat, 3);
    }

    #[test]
    fn test_string_body_sent_raw() {
        let mut request = MeasurementRequest::get("https://example.com");
        request.body = Some(serde_json::Value::String("plain text".to_string()));
        assert_eq!(request.body_bytes().unwrap().unwrap(), b"plain text");
    }

    #[test]
    fn test_structured_body_serialized_compact() {
        let mut request = MeasurementRequest::get("https://example.com");
        request.body = Some(serde_json::json!({"a": 1, "b": [2, 3]}));
        assert_eq!(
            request.body_bytes().unwrap().unwrap(),
            br#"{"a":1,"b":[2,3]}"#
        );
    }

    #[test]
    fn test_unknown_field_rejected() {
        let parsed: std::result::Result<MeasurementRequest, _> =
            serde_json::from_str(r#"{"url": "https://example.com", "librray": "client"}"#);
        assert!(parsed.is_err());
    }
}
