//! EQ configuration
//!
//! Display cadence and response-curve mapping. Loaded from JSON by the host
//! integration; every field has a default so partial files are accepted.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{MINUS_INFINITY_DB, PeqResult};

// ============ EQ Config ============

/// Top-level EQ configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EqConfig {
    /// Interval between response-curve polls (milliseconds)
    pub refresh_interval_ms: u64,
    /// Sample rate assumed before the host reports one
    pub default_sample_rate: f64,
    /// Response curve mapping
    pub response: ResponseConfig,
}

impl Default for EqConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 60,
            default_sample_rate: 48000.0,
            response: ResponseConfig::default(),
        }
    }
}

impl EqConfig {
    pub fn from_json(json: &str) -> PeqResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> PeqResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[inline]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(1))
    }
}

// ============ Response Config ============

/// Frequency axis and dB window of the response display
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Frequency at the left edge (Hz)
    pub min_freq: f64,
    /// Frequency approached at the right edge (Hz)
    pub max_freq: f64,
    /// Level mapped to the bottom of the display
    pub display_min_db: f64,
    /// Level mapped to the top of the display
    pub display_max_db: f64,
    /// Lowest level reported for vanishing magnitudes
    pub floor_db: f64,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            min_freq: 20.0,
            max_freq: 20000.0,
            display_min_db: -24.0,
            display_max_db: 24.0,
            floor_db: MINUS_INFINITY_DB,
        }
    }
}

impl ResponseConfig {
    /// Log-interpolated frequency for a 0-1 position along the axis
    #[inline]
    pub fn frequency_at(&self, proportion: f64) -> f64 {
        self.min_freq * (self.max_freq / self.min_freq).powf(proportion)
    }

    /// Linear map of a level onto a vertical pixel range.
    ///
    /// `bottom` receives `display_min_db`, `top` receives `display_max_db`;
    /// levels outside the window extrapolate.
    #[inline]
    pub fn map_db_to_y(&self, db: f64, bottom: f64, top: f64) -> f64 {
        let span = self.display_max_db - self.display_min_db;
        if span == 0.0 {
            return bottom;
        }
        bottom + (db - self.display_min_db) / span * (top - bottom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let config = EqConfig::default();
        assert_eq!(config.refresh_interval(), Duration::from_millis(60));
        assert_eq!(config.response.min_freq, 20.0);
        assert_eq!(config.response.max_freq, 20000.0);
    }

    #[test]
    fn test_partial_json() {
        let config = EqConfig::from_json(r#"{"refresh_interval_ms": 30}"#).unwrap();
        assert_eq!(config.refresh_interval_ms, 30);
        assert_eq!(config.response, ResponseConfig::default());

        let json = r#"{"response": {"display_min_db": -12.0, "display_max_db": 12.0}}"#;
        let config = EqConfig::from_json(json).unwrap();
        assert_eq!(config.response.display_max_db, 12.0);
        assert_eq!(config.response.floor_db, MINUS_INFINITY_DB);
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = EqConfig::default();
        config.default_sample_rate = 96000.0;
        let json = config.to_json().unwrap();
        assert_eq!(EqConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_frequency_axis() {
        let response = ResponseConfig::default();
        assert_relative_eq!(response.frequency_at(0.0), 20.0);
        assert_relative_eq!(response.frequency_at(0.5), 632.4555, epsilon = 1e-3);
        assert_relative_eq!(response.frequency_at(1.0), 20000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_db_to_y() {
        let response = ResponseConfig::default();
        assert_eq!(response.map_db_to_y(-24.0, 100.0, 0.0), 100.0);
        assert_eq!(response.map_db_to_y(24.0, 100.0, 0.0), 0.0);
        assert_eq!(response.map_db_to_y(0.0, 100.0, 0.0), 50.0);
    }
}
