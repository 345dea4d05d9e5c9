//! Parameter types for the EQ
//!
//! The seven host-visible parameters, their ranges, and the atomic cell each
//! value lives in. Values are stored in plain units (Hz, dB, Q, slope index);
//! normalized 0-1 values only appear at the host boundary.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::Slope;

/// Identifier of one of the EQ parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamId {
    LowCutFreq,
    HighCutFreq,
    PeakFreq,
    PeakGain,
    PeakQuality,
    LowCutSlope,
    HighCutSlope,
}

impl ParamId {
    pub const COUNT: usize = 7;

    pub const ALL: [ParamId; Self::COUNT] = [
        ParamId::LowCutFreq,
        ParamId::HighCutFreq,
        ParamId::PeakFreq,
        ParamId::PeakGain,
        ParamId::PeakQuality,
        ParamId::LowCutSlope,
        ParamId::HighCutSlope,
    ];

    /// Stable identifier used for persistence and host registration
    pub fn identifier(self) -> &'static str {
        match self {
            ParamId::LowCutFreq => "LowCutFreq",
            ParamId::HighCutFreq => "HighCutFreq",
            ParamId::PeakFreq => "PeakFreq",
            ParamId::PeakGain => "PeakGain",
            ParamId::PeakQuality => "PeakQuality",
            ParamId::LowCutSlope => "LowCutSlope",
            ParamId::HighCutSlope => "HighCutSlope",
        }
    }

    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.identifier() == identifier)
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Range, step and default of this parameter
    pub fn range(self) -> ParamRange {
        match self {
            ParamId::LowCutFreq => ParamRange::frequency(20.0),
            ParamId::HighCutFreq => ParamRange::frequency(20000.0),
            ParamId::PeakFreq => ParamRange::frequency(750.0),
            ParamId::PeakGain => ParamRange::linear(-24.0, 24.0, 0.0).with_step(0.5),
            ParamId::PeakQuality => ParamRange::linear(0.1, 10.0, 1.0).with_step(0.05),
            ParamId::LowCutSlope | ParamId::HighCutSlope => ParamRange::choice(Slope::COUNT),
        }
    }
}

/// Parameter value (normalized 0.0-1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedValue(f64);

impl NormalizedValue {
    pub const ZERO: Self = Self(0.0);
    pub const ONE: Self = Self(1.0);

    #[inline]
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self::ZERO
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

/// Atomic parameter for lock-free access
#[derive(Debug)]
pub struct AtomicParam {
    bits: AtomicU64,
}

impl AtomicParam {
    pub fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    #[inline]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Store a value, returning the previous one
    #[inline]
    pub fn replace(&self, value: f64) -> f64 {
        f64::from_bits(self.bits.swap(value.to_bits(), Ordering::Relaxed))
    }
}

impl Default for AtomicParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Range, default, step and skew of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
    pub default: f64,
    /// Snapping interval, 0 for continuous
    pub step: f64,
    pub skew: ParamSkew,
}

impl ParamRange {
    pub fn linear(min: f64, max: f64, default: f64) -> Self {
        Self {
            min,
            max,
            default,
            step: 0.0,
            skew: ParamSkew::Linear,
        }
    }

    /// 20 Hz - 20 kHz in 1 Hz steps, skewed so the low end gets most of the travel
    pub fn frequency(default: f64) -> Self {
        Self {
            min: 20.0,
            max: 20000.0,
            default,
            step: 1.0,
            skew: ParamSkew::Exponential(4.0),
        }
    }

    /// Integer choice index in `0..count`
    pub fn choice(count: usize) -> Self {
        Self {
            min: 0.0,
            max: count.saturating_sub(1) as f64,
            default: 0.0,
            step: 1.0,
            skew: ParamSkew::Linear,
        }
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Clamp to range and snap to the step grid
    pub fn snap(&self, value: f64) -> f64 {
        let clamped = value.clamp(self.min, self.max);
        if self.step > 0.0 {
            let snapped = self.min + ((clamped - self.min) / self.step).round() * self.step;
            snapped.clamp(self.min, self.max)
        } else {
            clamped
        }
    }

    /// Denormalize a 0-1 value to actual value
    pub fn denormalize(&self, normalized: NormalizedValue) -> f64 {
        let n = normalized.get();
        let value = match self.skew {
            ParamSkew::Linear => self.min + n * (self.max - self.min),
            ParamSkew::Exponential(exp) => self.min + n.powf(exp) * (self.max - self.min),
        };
        self.snap(value)
    }

    /// Normalize an actual value to 0-1
    pub fn normalize(&self, value: f64) -> NormalizedValue {
        if self.max <= self.min {
            return NormalizedValue::ZERO;
        }
        let clamped = value.clamp(self.min, self.max);
        let linear = (clamped - self.min) / (self.max - self.min);
        match self.skew {
            ParamSkew::Linear => NormalizedValue::new(linear),
            ParamSkew::Exponential(exp) => NormalizedValue::new(linear.powf(1.0 / exp)),
        }
    }
}

/// Parameter skew type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamSkew {
    Linear,
    Exponential(f64),
}
