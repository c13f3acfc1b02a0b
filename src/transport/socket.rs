use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::transport::TransportBackend;
use crate::transport::types::{TransportRequest, TransportResponse};
use crate::{CarbonpostError, Result};

/// Low-level socket style: HTTP/1.0 written by hand over a TCP stream.
///
/// Speaking HTTP/1.0 with `Connection: close` keeps the response framing
/// trivial (read until EOF, no chunked encoding). Plain `http` URLs only;
/// this backend does no TLS.
#[derive(Debug, Default)]
pub struct SocketBackend;

impl SocketBackend {
    pub fn new() -> Self {
        Self
    }

    async fn attempt(&self, request: &TransportRequest) -> Result<Vec<u8>> {
        let host = request
            .url
            .host_str()
            .ok_or_else(|| CarbonpostError::Transport("URL has no host".to_string()))?;
        let port = request.url.port_or_known_default().unwrap_or(80);

        let mut stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| CarbonpostError::Transport(format!("connect failed: {}", e)))?;

        let raw_request = serialize_request(request, host, port);
        stream
            .write_all(&raw_request)
            .await
            .map_err(|e| CarbonpostError::Transport(format!("write failed: {}", e)))?;

        let mut raw_response = Vec::new();
        stream
            .read_to_end(&mut raw_response)
            .await
            .map_err(|e| CarbonpostError::Transport(format!("read failed: {}", e)))?;

        Ok(raw_response)
    }
}

fn serialize_request(request: &TransportRequest, host: &str, port: u16) -> Vec<u8> {
    let mut target = request.url.path().to_string();
    if let Some(query) = request.url.query() {
        target.push('?');
        target.push_str(query);
    }

    let host_header = if port == 80 {
        host.to_string()
    } else {
        format!("{}:{}", host, port)
    };

    let mut head = format!("{} {} HTTP/1.0\r\n", request.method.as_str(), target);
    head.push_str(&format!("Host: {}\r\n", host_header));
    head.push_str("Connection: close\r\n");

    for (key, value) in &request.headers {
        // Framing headers are ours to set.
        let lower = key.to_ascii_lowercase();
        if lower == "host" || lower == "connection" || lower == "content-length" {
            continue;
        }
        head.push_str(&format!("{}: {}\r\n", key, value));
    }

    if let Some(body) = &request.body {
        head.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    head.push_str("\r\n");

    let mut raw = head.into_bytes();
    if let Some(body) = &request.body {
        raw.extend_from_slice(body);
    }
    raw
}

fn parse_response(raw: &[u8]) -> Result<(u16, BTreeMap<String, String>, String)> {
    let split_at = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .ok_or_else(|| CarbonpostError::Transport("malformed response: no header end".to_string()))?;

    let head = String::from_utf8_lossy(&raw[..split_at]);
    let body = String::from_utf8_lossy(&raw[split_at + 4..]).into_owned();

    let mut lines = head.split("\r\n");
    let status_line = lines
        .next()
        .ok_or_else(|| CarbonpostError::Transport("malformed response: empty head".to_string()))?;

    // "HTTP/1.1 200 OK"
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| {
            CarbonpostError::Transport(format!("malformed status line: {}", status_line))
        })?;

    let mut headers = BTreeMap::new();
    for line in lines {
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    Ok((status, headers, body))
}

#[async_trait]
impl TransportBackend for SocketBackend {
    fn label(&self) -> &'static str {
        "socket"
    }

    async fn execute(&self, request: &TransportRequest) -> Result<TransportResponse> {
        if request.url.scheme() != "http" {
            return Err(CarbonpostError::Transport(format!(
                "socket backend only supports plain http URLs, got {}",
                request.url.scheme()
            )));
        }

        let bytes_sent = request.bytes_sent();

        let raw = tokio::time::timeout(request.timeout, self.attempt(request))
            .await
            .map_err(|_| CarbonpostError::Timeout(request.timeout))??;

        let (status, headers, body) = parse_response(&raw)?;
        Ok(TransportResponse::accounted(status, headers, body, bytes_sent))
    }
}
