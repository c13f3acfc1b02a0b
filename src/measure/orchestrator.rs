use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::estimator::{EmissionParams, estimate};
use crate::history::{HistoryEntry, HistoryStore};
use crate::measure::types::{MeasurementRequest, MeasurementResult, ResponseSnapshot};
use crate::resolver::GreenCheck;
use crate::transport::{BackendRegistry, TransportRequest};
use crate::{CarbonpostError, Result};

/// Per-attempt timeout when the caller does not supply one.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs measurement batches: repeat a request through a transport backend,
/// account the bytes, resolve green hosting once, estimate CO₂ once, and
/// record the outcome in history.
pub struct Orchestrator {
    registry: BackendRegistry,
    resolver: Arc<dyn GreenCheck>,
    params: EmissionParams,
    history: Arc<HistoryStore>,
}

impl Orchestrator {
    pub fn new(
        registry: BackendRegistry,
        resolver: Arc<dyn GreenCheck>,
        params: EmissionParams,
        history: Arc<HistoryStore>,
    ) -> Self {
        Self {
            registry,
            resolver,
            params,
            history,
        }
    }

    /// Execute one measurement batch.
    ///
    /// Validation failures (bad URL, zero repeat, unknown backend) return
    /// `Err` before any side effect: no network traffic, no history entry.
    /// Transport failures mid-batch return `Ok` with partial figures and a
    /// non-empty `error` field, and are recorded in history like successes.
    pub async fn run(&self, request: MeasurementRequest) -> Result<MeasurementResult> {
        let backend = self.registry.get(&request.backend)?;

        if request.repeat == 0 {
            return Err(CarbonpostError::Validation(
                "repeat must be a positive integer".to_string(),
            ));
        }

        let url = url::Url::parse(&request.url)
            .map_err(|e| CarbonpostError::Validation(format!("invalid URL: {}", e)))?;
        let hostname = url
            .host_str()
            .map(str::to_string)
            .ok_or_else(|| CarbonpostError::Validation("URL must include a hostname".to_string()))?;

        let body = request.body_bytes()?;
        let timeout = request
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_ATTEMPT_TIMEOUT);

        let started = Instant::now();

        // Once per batch, before the repetition loop. A host changing its
        // hosting mid-batch is not observed.
        let is_green = self.resolver.is_green(&hostname).await;

        let transport_request = TransportRequest {
            method: request.method,
            url,
            headers: request.headers.clone(),
            body,
            timeout,
        };

        let mut total_bytes: u64 = 0;
        let mut completed: u32 = 0;
        let mut last_response: Option<ResponseSnapshot> = None;
        let mut error: Option<String> = None;

        for attempt in 1..=request.repeat {
            match backend.execute(&transport_request).await {
                Ok(response) => {
                    // Only fully completed repetitions contribute bytes.
                    total_bytes += response.bytes_sent + response.bytes_received;
                    completed += 1;
                    last_response = Some(ResponseSnapshot {
                        status: response.status,
                        headers: response.headers,
                        body: response.body,
                    });
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!(
                        attempt,
                        repeat = request.repeat,
                        backend = request.backend.as_str(),
                        error = message.as_str(),
                        "attempt failed, aborting batch"
                    );
                    error = Some(message);
                    break;
                }
            }
        }

        let estimated_co2_grams = estimate(total_bytes, is_green, &self.params);

        let result = MeasurementResult {
            backend: request.backend.clone(),
            method: request.method.as_str().to_string(),
            url: request.url.clone(),
            total_bytes,
            estimated_co2_grams,
            avg_emissions_grams: estimated_co2_grams / request.repeat as f64,
            is_green_hosting: is_green,
            repeat_requested: request.repeat,
            repeat_completed: completed,
            last_response,
            duration_ms: started.elapsed().as_millis() as u64,
            error,
        };

        // Failures stay visible for diagnosis, so both paths are recorded.
        self.history.append(HistoryEntry::from_result(&result));

        info!(
            backend = result.backend.as_str(),
            url = result.url.as_str(),
            repeat_completed = result.repeat_completed,
            total_bytes = result.total_bytes,
            is_green = result.is_green_hosting,
            co2_grams = result.estimated_co2_grams,
            failed = result.error.is_some(),
            "measurement finished"
        );

        Ok(result)
    }
}
