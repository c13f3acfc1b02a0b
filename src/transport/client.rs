use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::Result;
use crate::transport::types::{
    Method, TransportRequest, TransportResponse, map_reqwest_error, normalize_headers,
};
use crate::transport::TransportBackend;

/// High-level client-library style: one pooled `reqwest::Client` shared
/// across requests, connections reused.
#[derive(Debug)]
pub struct ClientBackend {
    inner: reqwest::Client,
}

impl Default for ClientBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBackend {
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::builder()
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

pub(crate) fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Patch => reqwest::Method::PATCH,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

pub(crate) fn to_header_map(headers: &std::collections::BTreeMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            map.insert(name, value);
        }
    }
    map
}

/// Drive one attempt through a reqwest client and account its bytes.
/// Shared by the pooled and the fetch-style backends.
pub(crate) async fn execute_with(
    client: &reqwest::Client,
    request: &TransportRequest,
) -> Result<TransportResponse> {
    let bytes_sent = request.bytes_sent();

    let mut builder = client
        .request(to_reqwest_method(request.method), request.url.clone())
        .headers(to_header_map(&request.headers))
        .timeout(request.timeout);

    if let Some(body) = &request.body {
        builder = builder.body(body.clone());
    }

    let response = builder
        .send()
        .await
        .map_err(|e| map_reqwest_error(e, request.timeout))?;

    let status = response.status().as_u16();
    let headers = normalize_headers(response.headers());
    let body = response
        .text()
        .await
        .map_err(|e| map_reqwest_error(e, request.timeout))?;

    Ok(TransportResponse::accounted(status, headers, body, bytes_sent))
}

#[async_trait]
impl TransportBackend for ClientBackend {
    fn label(&self) -> &'static str {
        "client"
    }

    async fn execute(&self, request: &TransportRequest) -> Result<TransportResponse> {
        execute_with(&self.inner, request).await
    }
}
