use async_trait::async_trait;

use crate::transport::TransportBackend;
use crate::transport::client::execute_with;
use crate::transport::types::{TransportRequest, TransportResponse, map_reqwest_error};
use crate::Result;

/// Fetch-style: a throwaway client per call, no connection reuse.
///
/// Every attempt pays the full connection setup, the way a one-shot
/// `fetch(url)` does.
#[derive(Debug, Default)]
pub struct FetchBackend;

impl FetchBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransportBackend for FetchBackend {
    fn label(&self) -> &'static str {
        "fetch"
    }

    async fn execute(&self, request: &TransportRequest) -> Result<TransportResponse> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| map_reqwest_error(e, request.timeout))?;

        execute_with(&client, request).await
    }
}
