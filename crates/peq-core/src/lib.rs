//! peq-core: Shared types for the parametric EQ workspace
//!
//! Parameter snapshots, the parameter store that the host writes into,
//! the dirty flag used to mirror filter state across threads, and config.

mod config;
mod dirty;
mod error;
mod params;
mod settings;
mod store;

pub use config::*;
pub use dirty::*;
pub use error::*;
pub use params::*;
pub use settings::*;
pub use store::*;

/// Type alias for audio samples (always f64 for maximum precision)
pub type Sample = f64;

/// Magnitudes at or below this level are reported as this level
pub const MINUS_INFINITY_DB: f64 = -100.0;

/// Decibel value wrapper
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct Decibels(pub f64);

impl Decibels {
    pub const ZERO: Self = Self(0.0);
    pub const FLOOR: Self = Self(MINUS_INFINITY_DB);

    /// Convert a linear gain, clamping to `MINUS_INFINITY_DB` instead of -inf
    #[inline]
    pub fn from_gain(gain: f64) -> Self {
        Self::from_gain_with_floor(gain, MINUS_INFINITY_DB)
    }

    #[inline]
    pub fn from_gain_with_floor(gain: f64, floor_db: f64) -> Self {
        if gain > 0.0 && gain.is_finite() {
            Self((20.0 * gain.log10()).max(floor_db))
        } else {
            Self(floor_db)
        }
    }

    #[inline]
    pub fn to_gain(self) -> f64 {
        if self.0 <= MINUS_INFINITY_DB {
            0.0
        } else {
            10.0_f64.powf(self.0 / 20.0)
        }
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Decibels {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Reject sample rates that no filter design can use
pub fn validate_sample_rate(sample_rate: f64) -> PeqResult<f64> {
    if sample_rate > 0.0 && sample_rate.is_finite() {
        Ok(sample_rate)
    } else {
        Err(PeqError::InvalidSampleRate(sample_rate))
    }
}
