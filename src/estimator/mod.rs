//! Converts a transferred byte count into an estimated mass of CO₂.
//!
//! The model is an estimation heuristic, not verified physics: bytes are
//! weighted by how much of them a typical visit actually re-downloads,
//! converted to energy through a per-byte intensity, and then to mass
//! through the carbon intensity of the electricity powering the host.

use serde::Deserialize;

use crate::{CarbonpostError, Result};

/// Applied exactly once, here; internal figures are kilograms.
pub const GRAMS_PER_KILOGRAM: f64 = 1000.0;

// 0.81 kWh per GB transferred
const DEFAULT_KWH_PER_BYTE: f64 = 8.1e-10;
// global average grid mix, g CO₂ per kWh
const DEFAULT_GRID_INTENSITY: f64 = 442.0;
// renewable energy mix, g CO₂ per kWh
const DEFAULT_GREEN_INTENSITY: f64 = 50.9;
const DEFAULT_DATA_RELOAD_RATIO: f64 = 0.02;
const DEFAULT_FIRST_VISIT_PERCENTAGE: f64 = 0.75;
const DEFAULT_RETURN_VISIT_PERCENTAGE: f64 = 0.25;

/// Tunable parameters of the emission model.
///
/// All fields are optional in `carbonpost.toml`; missing values fall back
/// to the defaults above.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmissionParams {
    /// Energy drawn per byte transferred, in kWh.
    pub kwh_per_byte: f64,

    /// Carbon intensity of a non-green host's grid, g CO₂ / kWh.
    pub grid_intensity: f64,

    /// Carbon intensity assumed for renewable-powered hosts, g CO₂ / kWh.
    pub green_intensity: f64,

    /// Fraction of bytes re-fetched (rather than cached) on a return visit.
    pub data_reload_ratio: f64,

    /// Share of traffic attributed to first visits.
    pub first_visit_percentage: f64,

    /// Share of traffic attributed to return visits.
    pub return_visit_percentage: f64,
}

impl Default for EmissionParams {
    fn default() -> Self {
        Self {
            kwh_per_byte: DEFAULT_KWH_PER_BYTE,
            grid_intensity: DEFAULT_GRID_INTENSITY,
            green_intensity: DEFAULT_GREEN_INTENSITY,
            data_reload_ratio: DEFAULT_DATA_RELOAD_RATIO,
            first_visit_percentage: DEFAULT_FIRST_VISIT_PERCENTAGE,
            return_visit_percentage: DEFAULT_RETURN_VISIT_PERCENTAGE,
        }
    }
}

impl EmissionParams {
    /// Reject parameter sets the model cannot make sense of.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("kwh_per_byte", self.kwh_per_byte),
            ("grid_intensity", self.grid_intensity),
            ("green_intensity", self.green_intensity),
            ("data_reload_ratio", self.data_reload_ratio),
            ("first_visit_percentage", self.first_visit_percentage),
            ("return_visit_percentage", self.return_visit_percentage),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(CarbonpostError::Config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        let visit_sum = self.first_visit_percentage + self.return_visit_percentage;
        if (visit_sum - 1.0).abs() > 1e-9 {
            return Err(CarbonpostError::Config(format!(
                "first_visit_percentage + return_visit_percentage must sum to 1.0, got {visit_sum}"
            )));
        }

        if self.green_intensity > self.grid_intensity {
            return Err(CarbonpostError::Config(
                "green_intensity must not exceed grid_intensity".to_string(),
            ));
        }

        Ok(())
    }
}

/// Estimate the CO₂ mass, in grams, attributable to `total_bytes`
/// transferred to/from a host whose green-hosting status is `is_green`.
///
/// Pure and deterministic: same inputs, same output. Monotonic
/// non-decreasing in `total_bytes`, and `estimate(0, ..) == 0`.
pub fn estimate(total_bytes: u64, is_green: bool, params: &EmissionParams) -> f64 {
    let adjusted_bytes = total_bytes as f64
        * (params.first_visit_percentage + params.return_visit_percentage * params.data_reload_ratio);

    let energy_kwh = adjusted_bytes * params.kwh_per_byte;

    let intensity = if is_green {
        params.green_intensity
    } else {
        params.grid_intensity
    };

    let kilograms = energy_kwh * intensity / 1000.0;
    kilograms * GRAMS_PER_KILOGRAM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_bytes_is_zero_grams() {
        let params = EmissionParams::default();
        assert_eq!(estimate(0, true, &params), 0.0);
        assert_eq!(estimate(0, false, &params), 0.0);
    }

    #[test]
    fn test_monotonic_in_bytes() {
        let params = EmissionParams::default();
        let sizes = [0u64, 1, 150, 1024, 1_000_000, 5_000_000_000];
        for window in sizes.windows(2) {
            for green in [true, false] {
                assert!(
                    estimate(window[0], green, &params) <= estimate(window[1], green, &params),
                    "estimate must not decrease from {} to {} bytes",
                    window[0],
                    window[1]
                );
            }
        }
    }

    #[test]
    fn test_green_never_exceeds_grey() {
        let params = EmissionParams::default();
        for bytes in [1u64, 150, 1024, 10_000_000] {
            assert!(estimate(bytes, true, &params) <= estimate(bytes, false, &params));
        }
    }

    #[test]
    fn test_hand_computed_reference_green() {
        // 150 bytes, default params, green path:
        // adjusted = 150 * (0.75 + 0.25 * 0.02) = 113.25
        // kWh      = 113.25 * 8.1e-10           = 9.173250e-8
        // kg       = 9.173250e-8 * 50.9 / 1000  = 4.669184e-9
        // grams    = kg * 1000                  = 4.669184e-6 (approx)
        let params = EmissionParams::default();
        let grams = estimate(150, true, &params);
        assert!((grams - 4.669_184_25e-6).abs() < 1e-12);
    }

    #[test]
    fn test_hand_computed_reference_grey() {
        // Same byte count on the grey path uses the full grid intensity:
        // grams = 113.25 * 8.1e-10 * 442.0 / 1000 * 1000 = 4.0545765e-5 (approx)
        let params = EmissionParams::default();
        let grams = estimate(150, false, &params);
        assert!((grams - 4.054_576_5e-5).abs() < 1e-10);
    }

    #[test]
    fn test_validate_default_params() {
        assert!(EmissionParams::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_visit_split() {
        let params = EmissionParams {
            first_visit_percentage: 0.9,
            return_visit_percentage: 0.3,
            ..EmissionParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_intensity() {
        let params = EmissionParams {
            grid_intensity: -1.0,
            ..EmissionParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_green_above_grid() {
        let params = EmissionParams {
            green_intensity: 500.0,
            ..EmissionParams::default()
        };
        assert!(params.validate().is_err());
    }
}
