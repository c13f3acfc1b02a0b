//! Aggregate statistics over the measurement history, grouped by
//! transport backend.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::history::HistoryEntry;

/// Aggregate figures for one transport backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendStats {
    pub total_requests: u64,
    pub total_emissions: f64,
    pub green_requests: u64,
    pub total_bytes: u64,
    pub avg_emissions: f64,
    /// Rounded to one decimal place for display; the underlying entries
    /// keep full precision.
    pub green_percentage: f64,
}

/// Group history entries by backend label and compute totals, averages
/// and green ratios. Backends with no entries are simply absent, so the
/// averages are never divided by zero.
pub fn aggregate(entries: &[HistoryEntry]) -> BTreeMap<String, BackendStats> {
    let mut groups: BTreeMap<String, (u64, f64, u64, u64)> = BTreeMap::new();

    for entry in entries {
        let (count, emissions, green, bytes) = groups.entry(entry.backend.clone()).or_default();
        *count += 1;
        *emissions += entry.estimated_co2;
        if entry.is_green {
            *green += 1;
        }
        *bytes += entry.total_bytes;
    }

    groups
        .into_iter()
        .map(|(backend, (count, emissions, green, bytes))| {
            let stats = BackendStats {
                total_requests: count,
                total_emissions: emissions,
                green_requests: green,
                total_bytes: bytes,
                avg_emissions: emissions / count as f64,
                green_percentage: round_one_decimal(100.0 * green as f64 / count as f64),
            };
            (backend, stats)
        })
        .collect()
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
