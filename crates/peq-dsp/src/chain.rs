//! Fixed low-cut → peak → high-cut filter chain
//!
//! Each cut cascade has four second-order slots. Slope selection enables the
//! first N slots and bypasses the rest. Coefficients are swapped in as whole
//! `BiquadCoeffs` values; a chain is only ever touched through `&mut` by the
//! thread that owns it, so readers never see a half-written section.

use peq_core::{ChainSettings, PeqError, PeqResult, Sample, Slope};

use crate::biquad::{BiquadCoeffs, BiquadTDF2};
use crate::design::{
    CutCoefficients, try_design_high_cut, try_design_low_cut, try_design_peak,
};
use crate::{MonoProcessor, Processor};

pub use crate::design::MAX_CUT_STAGES;

/// Position of a stage group within the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPosition {
    LowCut,
    Peak,
    HighCut,
}

impl ChainPosition {
    pub const ALL: [ChainPosition; 3] = [
        ChainPosition::LowCut,
        ChainPosition::Peak,
        ChainPosition::HighCut,
    ];
}

// ============ Stage ============

/// One biquad slot plus its bypass switch
#[derive(Debug, Clone, Default)]
pub struct Stage {
    filter: BiquadTDF2,
    bypassed: bool,
}

impl Stage {
    pub fn new(bypassed: bool) -> Self {
        Self {
            filter: BiquadTDF2::new(),
            bypassed,
        }
    }

    #[inline]
    pub fn coeffs(&self) -> &BiquadCoeffs {
        self.filter.coeffs()
    }

    #[inline]
    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.filter.set_coeffs(coeffs);
    }

    #[inline]
    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    #[inline]
    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    /// Linear magnitude at `freq`, 1.0 when bypassed
    #[inline]
    pub fn magnitude_for_frequency(&self, freq: f64, sample_rate: f64) -> f64 {
        if self.bypassed {
            1.0
        } else {
            self.coeffs().magnitude_for_frequency(freq, sample_rate)
        }
    }

    #[inline]
    fn process_sample(&mut self, input: Sample) -> Sample {
        if self.bypassed {
            input
        } else {
            self.filter.process_sample(input)
        }
    }

    fn reset(&mut self) {
        self.filter.reset();
    }
}

// ============ Cut cascade ============

/// Four cascaded second-order slots of a cut filter
#[derive(Debug, Clone)]
pub struct CutCascade {
    stages: [Stage; MAX_CUT_STAGES],
}

impl CutCascade {
    /// Cascade with every slot bypassed
    pub fn new() -> Self {
        Self {
            stages: std::array::from_fn(|_| Stage::new(true)),
        }
    }

    #[inline]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    #[inline]
    pub fn stage(&self, index: usize) -> &Stage {
        &self.stages[index]
    }

    #[inline]
    pub fn stage_mut(&mut self, index: usize) -> &mut Stage {
        &mut self.stages[index]
    }

    pub fn bypass_all(&mut self) {
        for stage in &mut self.stages {
            stage.set_bypassed(true);
        }
    }

    /// Number of slots currently running
    pub fn enabled_count(&self) -> usize {
        self.stages.iter().filter(|s| !s.is_bypassed()).count()
    }
}

impl Default for CutCascade {
    fn default() -> Self {
        Self::new()
    }
}

/// Install a cut design for `slope`: bypass every slot, then enable the
/// first `slope.stages()` slots with the matching designed sections.
///
/// A steeper slope always re-enables every lower slot; stages are never
/// blended.
pub fn update_cut_filter(cascade: &mut CutCascade, designed: &CutCoefficients, slope: Slope) {
    cascade.bypass_all();

    for index in 0..slope.stages() {
        let stage = cascade.stage_mut(index);
        stage.set_coeffs(designed.section(index));
        stage.set_bypassed(false);
    }
}

/// Replace the peak stage's coefficients wholesale and enable it
pub fn install_peak(chain: &mut FilterChain, coeffs: BiquadCoeffs) {
    chain.peak.set_coeffs(coeffs);
    chain.peak.set_bypassed(false);
}

// ============ Filter chain ============

/// Low-cut cascade, peak stage, high-cut cascade
#[derive(Debug, Clone)]
pub struct FilterChain {
    low_cut: CutCascade,
    peak: Stage,
    high_cut: CutCascade,
    /// Sample rate the current coefficients were designed for
    designed_rate: Option<f64>,
}

impl FilterChain {
    /// Transparent chain: cut slots bypassed, identity peak
    pub fn new() -> Self {
        Self {
            low_cut: CutCascade::new(),
            peak: Stage::new(false),
            high_cut: CutCascade::new(),
            designed_rate: None,
        }
    }

    /// Chain designed for `settings` at `sample_rate`
    pub fn with_settings(settings: &ChainSettings, sample_rate: f64) -> Self {
        let mut chain = Self::new();
        chain.update(settings, sample_rate).log_warnings();
        chain
    }

    #[inline]
    pub fn low_cut(&self) -> &CutCascade {
        &self.low_cut
    }

    #[inline]
    pub fn low_cut_mut(&mut self) -> &mut CutCascade {
        &mut self.low_cut
    }

    #[inline]
    pub fn peak(&self) -> &Stage {
        &self.peak
    }

    #[inline]
    pub fn peak_mut(&mut self) -> &mut Stage {
        &mut self.peak
    }

    #[inline]
    pub fn high_cut(&self) -> &CutCascade {
        &self.high_cut
    }

    #[inline]
    pub fn high_cut_mut(&mut self) -> &mut CutCascade {
        &mut self.high_cut
    }

    /// Stages at `position`, in processing order
    pub fn stages(&self, position: ChainPosition) -> &[Stage] {
        match position {
            ChainPosition::LowCut => self.low_cut.stages(),
            ChainPosition::Peak => std::slice::from_ref(&self.peak),
            ChainPosition::HighCut => self.high_cut.stages(),
        }
    }

    /// Every stage in processing order
    pub fn iter_stages(&self) -> impl Iterator<Item = &Stage> {
        ChainPosition::ALL
            .into_iter()
            .flat_map(move |position| self.stages(position))
    }

    /// Sample rate of the last `update`, if any
    #[inline]
    pub fn designed_rate(&self) -> Option<f64> {
        self.designed_rate
    }

    /// Redesign every stage for `settings` at `sample_rate`
    ///
    /// Invalid settings install identity sections. A design that turns out
    /// numerically degenerate leaves that stage group on its previous
    /// coefficients. Nothing here fails, allocates or logs; the returned
    /// report says which groups fell back.
    pub fn update(&mut self, settings: &ChainSettings, sample_rate: f64) -> UpdateReport {
        let mut report = UpdateReport::default();

        match try_design_peak(settings, sample_rate) {
            Ok(coeffs) => install_peak(self, coeffs),
            Err(e @ PeqError::NumericDegeneracy { .. }) => report.peak = Some(e),
            Err(e) => {
                install_peak(self, BiquadCoeffs::bypass());
                report.peak = Some(e);
            }
        }

        report.low_cut = Self::update_cut(
            &mut self.low_cut,
            try_design_low_cut(settings, sample_rate),
            settings.low_cut_slope,
        );
        report.high_cut = Self::update_cut(
            &mut self.high_cut,
            try_design_high_cut(settings, sample_rate),
            settings.high_cut_slope,
        );

        self.designed_rate = Some(sample_rate);
        report
    }

    fn update_cut(
        cascade: &mut CutCascade,
        design: PeqResult<CutCoefficients>,
        slope: Slope,
    ) -> Option<PeqError> {
        match design {
            Ok(designed) => {
                update_cut_filter(cascade, &designed, slope);
                None
            }
            Err(e @ PeqError::NumericDegeneracy { .. }) => Some(e),
            Err(e) => {
                update_cut_filter(cascade, &CutCoefficients::identity(slope.stages()), slope);
                Some(e)
            }
        }
    }
}

// ============ Update report ============

/// Design failures from one `FilterChain::update`, per stage group
#[derive(Debug, Default)]
pub struct UpdateReport {
    pub low_cut: Option<PeqError>,
    pub peak: Option<PeqError>,
    pub high_cut: Option<PeqError>,
}

impl UpdateReport {
    /// Every group got its designed coefficients
    pub fn is_clean(&self) -> bool {
        self.low_cut.is_none() && self.peak.is_none() && self.high_cut.is_none()
    }

    /// Log each fallback. Not for the audio thread.
    pub fn log_warnings(&self) {
        let groups = [
            ("low cut", &self.low_cut),
            ("peak", &self.peak),
            ("high cut", &self.high_cut),
        ];
        for (name, error) in groups {
            match error {
                Some(e @ PeqError::NumericDegeneracy { .. }) => {
                    log::warn!("keeping previous {name} coefficients: {e}");
                }
                Some(e) => log::warn!("{name} set to identity: {e}"),
                None => {}
            }
        }
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for FilterChain {
    fn reset(&mut self) {
        for stage in self.low_cut.stages.iter_mut() {
            stage.reset();
        }
        self.peak.reset();
        for stage in self.high_cut.stages.iter_mut() {
            stage.reset();
        }
    }
}

impl MonoProcessor for FilterChain {
    #[inline]
    fn process_sample(&mut self, input: Sample) -> Sample {
        let mut out = input;
        for stage in self.low_cut.stages.iter_mut() {
            out = stage.process_sample(out);
        }
        out = self.peak.process_sample(out);
        for stage in self.high_cut.stages.iter_mut() {
            out = stage.process_sample(out);
        }
        out
    }
}
