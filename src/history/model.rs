use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::measure::MeasurementResult;

/// History record precision: grams of CO₂ keep six decimal digits.
const CO2_DECIMALS: f64 = 1e6;

/// One completed (or failed) measurement, snapshotted for history.
///
/// Pure value record: written once by the orchestrator, never mutated,
/// evicted FIFO once the retention bound is exceeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique ID (UUID)
    pub id: String,

    /// Measurement time (UTC)
    pub timestamp: DateTime<Utc>,

    pub method: String,
    pub url: String,

    /// Transport backend label the batch ran through.
    pub backend: String,

    /// Repetitions requested for the batch.
    pub repeat: u32,

    /// Best-effort green-hosting flag at measurement time.
    pub is_green: bool,

    /// Bytes accumulated across completed repetitions.
    pub total_bytes: u64,

    /// Estimated CO₂ in grams, fixed to six decimal digits.
    pub estimated_co2: f64,

    /// Present only when the batch aborted.
    pub error: Option<String>,
}

impl HistoryEntry {
    pub fn from_result(result: &MeasurementResult) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            method: result.method.clone(),
            url: result.url.clone(),
            backend: result.backend.clone(),
            repeat: result.repeat_requested,
            is_green: result.is_green_hosting,
            total_bytes: result.total_bytes,
            estimated_co2: round_grams(result.estimated_co2_grams),
            error: result.error.clone(),
        }
    }
}

pub(crate) fn round_grams(grams: f64) -> f64 {
    (grams * CO2_DECIMALS).round() / CO2_DECIMALS
}
