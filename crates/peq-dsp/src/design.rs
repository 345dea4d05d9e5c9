//! Coefficient design for the peak stage and the cut cascades
//!
//! Pure functions over f64. The `try_*` forms report why a design was
//! rejected; the plain forms log the problem and hand back identity sections
//! so the audio path always has something valid to run.

use std::f64::consts::PI;

use peq_core::{ChainSettings, PeqError, PeqResult, validate_sample_rate};

use crate::biquad::BiquadCoeffs;

/// Second-order sections per cut cascade (8th order maximum)
pub const MAX_CUT_STAGES: usize = 4;

/// Which side of the spectrum a cut cascade removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutType {
    /// Highpass: removes content below the cutoff
    LowCut,
    /// Lowpass: removes content above the cutoff
    HighCut,
}

/// Sections of one Butterworth cut design, in cascade order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutCoefficients {
    sections: [BiquadCoeffs; MAX_CUT_STAGES],
    len: usize,
}

impl CutCoefficients {
    /// `len` pass-through sections
    pub fn identity(len: usize) -> Self {
        Self {
            sections: [BiquadCoeffs::bypass(); MAX_CUT_STAGES],
            len: len.min(MAX_CUT_STAGES),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[BiquadCoeffs] {
        &self.sections[..self.len]
    }

    /// Section `index`, or identity past the end of the design
    #[inline]
    pub fn section(&self, index: usize) -> BiquadCoeffs {
        self.as_slice()
            .get(index)
            .copied()
            .unwrap_or_else(BiquadCoeffs::bypass)
    }
}

/// Q of pole pair `k` in an order-`order` Butterworth decomposition
#[inline]
pub fn butterworth_q(order: usize, k: usize) -> f64 {
    let angle = PI * (2 * k + 1) as f64 / (2 * order) as f64;
    1.0 / (2.0 * angle.cos())
}

fn check_frequency(what: &'static str, freq: f64, sample_rate: f64) -> PeqResult<()> {
    if freq > 0.0 && freq < sample_rate / 2.0 {
        Ok(())
    } else {
        Err(PeqError::InvalidParameter { what, value: freq })
    }
}

fn check_finite(what: &'static str, coeffs: &BiquadCoeffs) -> PeqResult<()> {
    if coeffs.is_finite() {
        Ok(())
    } else {
        Err(PeqError::NumericDegeneracy { what })
    }
}

// ============ Peak ============

/// Bell filter for the peak stage
pub fn try_design_peak(settings: &ChainSettings, sample_rate: f64) -> PeqResult<BiquadCoeffs> {
    let sample_rate = validate_sample_rate(sample_rate)?;
    check_frequency("peak frequency", settings.peak_freq, sample_rate)?;

    if !(settings.peak_quality > 0.0 && settings.peak_quality.is_finite()) {
        return Err(PeqError::InvalidParameter {
            what: "peak quality",
            value: settings.peak_quality,
        });
    }
    if !settings.peak_gain_db.is_finite() {
        return Err(PeqError::InvalidParameter {
            what: "peak gain",
            value: settings.peak_gain_db,
        });
    }

    let gain = 10.0_f64.powf(settings.peak_gain_db / 20.0);
    let coeffs =
        BiquadCoeffs::peaking(settings.peak_freq, settings.peak_quality, gain, sample_rate);
    check_finite("peak", &coeffs)?;
    Ok(coeffs)
}

/// Bell filter for the peak stage, identity if the settings are unusable
pub fn design_peak(settings: &ChainSettings, sample_rate: f64) -> BiquadCoeffs {
    try_design_peak(settings, sample_rate).unwrap_or_else(|e| {
        log::warn!("peak design fell back to identity: {e}");
        BiquadCoeffs::bypass()
    })
}

// ============ Cut cascades ============

/// Butterworth cut filter of even `order` (2, 4, 6 or 8) as `order / 2`
/// cascaded sections
pub fn try_design_cut_cascade(
    cutoff: f64,
    sample_rate: f64,
    order: usize,
    cut_type: CutType,
) -> PeqResult<CutCoefficients> {
    let sample_rate = validate_sample_rate(sample_rate)?;
    if order == 0 || order % 2 != 0 || order > 2 * MAX_CUT_STAGES {
        return Err(PeqError::InvalidParameter {
            what: "cut order",
            value: order as f64,
        });
    }
    check_frequency("cutoff", cutoff, sample_rate)?;

    let mut design = CutCoefficients::identity(order / 2);
    for k in 0..design.len {
        let q = butterworth_q(order, k);
        let coeffs = match cut_type {
            CutType::LowCut => BiquadCoeffs::highpass(cutoff, q, sample_rate),
            CutType::HighCut => BiquadCoeffs::lowpass(cutoff, q, sample_rate),
        };
        check_finite("cut section", &coeffs)?;
        design.sections[k] = coeffs;
    }

    Ok(design)
}

/// Butterworth cut filter, identity sections if the inputs are unusable
pub fn design_cut_cascade(
    cutoff: f64,
    sample_rate: f64,
    order: usize,
    cut_type: CutType,
) -> CutCoefficients {
    try_design_cut_cascade(cutoff, sample_rate, order, cut_type).unwrap_or_else(|e| {
        log::warn!("{cut_type:?} design fell back to identity: {e}");
        CutCoefficients::identity(order / 2)
    })
}

/// Low-cut cascade for the settings' cutoff and slope
pub fn try_design_low_cut(
    settings: &ChainSettings,
    sample_rate: f64,
) -> PeqResult<CutCoefficients> {
    try_design_cut_cascade(
        settings.low_cut_freq,
        sample_rate,
        settings.low_cut_slope.order(),
        CutType::LowCut,
    )
}

/// High-cut cascade for the settings' cutoff and slope
pub fn try_design_high_cut(
    settings: &ChainSettings,
    sample_rate: f64,
) -> PeqResult<CutCoefficients> {
    try_design_cut_cascade(
        settings.high_cut_freq,
        sample_rate,
        settings.high_cut_slope.order(),
        CutType::HighCut,
    )
}
