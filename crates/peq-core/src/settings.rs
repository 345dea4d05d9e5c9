//! Chain settings snapshot and cut-filter slopes

use serde::{Deserialize, Serialize};

/// Rolloff of a cut filter, one second-order section per 12 dB/oct
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Slope {
    #[default]
    Db12,
    Db24,
    Db36,
    Db48,
}

impl Slope {
    pub const COUNT: usize = 4;

    pub const ALL: [Slope; Self::COUNT] = [Slope::Db12, Slope::Db24, Slope::Db36, Slope::Db48];

    /// Ordinal 0..3
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Slope for a choice index, `None` outside 0..3
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Slope from a stored choice value, rounded and clamped to the valid range
    pub fn from_choice(value: f64) -> Self {
        if !value.is_finite() {
            return Slope::Db12;
        }
        let index = value.round().clamp(0.0, (Self::COUNT - 1) as f64) as usize;
        Self::ALL[index]
    }

    /// Number of cascaded second-order sections
    #[inline]
    pub fn stages(self) -> usize {
        self.index() + 1
    }

    /// Butterworth order of the full cascade (2, 4, 6 or 8)
    #[inline]
    pub fn order(self) -> usize {
        self.stages() * 2
    }

    #[inline]
    pub fn db_per_octave(self) -> f64 {
        (self.stages() * 12) as f64
    }

    pub fn label(self) -> &'static str {
        match self {
            Slope::Db12 => "12 db/Oct",
            Slope::Db24 => "24 db/Oct",
            Slope::Db36 => "36 db/Oct",
            Slope::Db48 => "48 db/Oct",
        }
    }

    /// Choice labels in index order, as presented to the host
    pub fn choices() -> [&'static str; Self::COUNT] {
        Self::ALL.map(Slope::label)
    }
}

/// Snapshot of every parameter that shapes the filter chain
///
/// Read fresh from the parameter store for each recompute and never cached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainSettings {
    pub peak_freq: f64,
    pub peak_gain_db: f64,
    pub peak_quality: f64,
    pub low_cut_freq: f64,
    pub high_cut_freq: f64,
    pub low_cut_slope: Slope,
    pub high_cut_slope: Slope,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            peak_freq: 750.0,
            peak_gain_db: 0.0,
            peak_quality: 1.0,
            low_cut_freq: 20.0,
            high_cut_freq: 20000.0,
            low_cut_slope: Slope::Db12,
            high_cut_slope: Slope::Db12,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slope_stages() {
        assert_eq!(Slope::Db12.stages(), 1);
        assert_eq!(Slope::Db24.stages(), 2);
        assert_eq!(Slope::Db36.stages(), 3);
        assert_eq!(Slope::Db48.stages(), 4);
        assert_eq!(Slope::Db48.order(), 8);
        assert_eq!(Slope::Db36.db_per_octave(), 36.0);
    }

    #[test]
    fn test_slope_from_choice() {
        assert_eq!(Slope::from_choice(0.0), Slope::Db12);
        assert_eq!(Slope::from_choice(2.6), Slope::Db48);
        assert_eq!(Slope::from_choice(9.0), Slope::Db48);
        assert_eq!(Slope::from_choice(-1.0), Slope::Db12);
        assert_eq!(Slope::from_choice(f64::NAN), Slope::Db12);
        assert_eq!(Slope::from_index(4), None);
    }

    #[test]
    fn test_slope_labels() {
        assert_eq!(
            Slope::choices(),
            ["12 db/Oct", "24 db/Oct", "36 db/Oct", "48 db/Oct"]
        );
    }
}
