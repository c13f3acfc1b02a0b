//! Asks an external registry whether a host runs on renewable energy.
//!
//! The answer is best-effort and fail-closed: any lookup problem means
//! "not green", never an error for the measurement that asked.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::ResolverConfig;
use crate::{CarbonpostError, Result};

#[async_trait]
pub trait GreenCheck: Send + Sync {
    /// Whether `hostname` is attested to run on renewable energy.
    ///
    /// Never fails outward; uncertainty degrades to `false`.
    async fn is_green(&self, hostname: &str) -> bool;
}

/// Resolver backed by the Green Web Foundation check endpoint.
pub struct GreenWebResolver {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct GreenCheckPayload {
    green: bool,
}

impl GreenWebResolver {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .build()
                .expect("Failed to build HTTP client"),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    async fn lookup(&self, hostname: &str) -> Result<bool> {
        let url = format!("{}/{}", self.endpoint, hostname);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| CarbonpostError::Resolver(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CarbonpostError::Resolver(format!(
                "green check returned {}",
                response.status()
            )));
        }

        let payload: GreenCheckPayload = response
            .json()
            .await
            .map_err(|e| CarbonpostError::Resolver(e.to_string()))?;

        Ok(payload.green)
    }
}

#[async_trait]
impl GreenCheck for GreenWebResolver {
    async fn is_green(&self, hostname: &str) -> bool {
        match self.lookup(hostname).await {
            Ok(green) => green,
            Err(e) => {
                // Absence of evidence is not evidence of green hosting.
                debug!(hostname, error = %e, "green check failed, assuming non-green");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver_for(server: &MockServer) -> GreenWebResolver {
        GreenWebResolver::new(&ResolverConfig {
            endpoint: format!("{}/greencheck", server.uri()),
            timeout_secs: 2,
        })
    }

    #[tokio::test]
    async fn test_green_host() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/greencheck/solar.example"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"green": true})),
            )
            .mount(&server)
            .await;

        assert!(resolver_for(&server).is_green("solar.example").await);
    }

    #[tokio::test]
    async fn test_grey_host() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/greencheck/coal.example"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"green": false})),
            )
            .mount(&server)
            .await;

        assert!(!resolver_for(&server).is_green("coal.example").await);
    }

    #[tokio::test]
    async fn test_non_2xx_degrades_to_false() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(!resolver_for(&server).is_green("flaky.example").await);
    }

    #[tokio::test]
    async fn test_malformed_body_degrades_to_false() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        assert!(!resolver_for(&server).is_green("weird.example").await);
    }

    #[tokio::test]
    async fn test_unreachable_registry_degrades_to_false() {
        let resolver = GreenWebResolver::new(&ResolverConfig {
            // Nothing listens here.
            endpoint: "http://127.0.0.1:1/greencheck".to_string(),
            timeout_secs: 1,
        });
        assert!(!resolver.is_green("anything.example").await);
    }
}
