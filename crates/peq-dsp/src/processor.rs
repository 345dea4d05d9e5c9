//! Stereo EQ processor for the audio thread
//!
//! Holds one chain per channel plus its own watcher on the parameter store.
//! A pending edit is picked up once at the top of each block, so a block is
//! always filtered with a single coefficient set.
//!
//! Block-time recomputes never log. A design fallback only raises the
//! processor's degraded flag, which the host claims and reports from a
//! non-real-time thread.

use std::sync::Arc;

use peq_core::{DirtyFlag, EqConfig, ParameterStore, PeqResult, Sample, validate_sample_rate};

use crate::chain::FilterChain;
use crate::mirror::ChainWatcher;
use crate::{MonoProcessor, Processor, StereoProcessor};

pub struct EqProcessor {
    watcher: ChainWatcher,
    left: FilterChain,
    right: FilterChain,
    sample_rate: f64,
    degraded: DirtyFlag,
}

impl EqProcessor {
    /// Processor designed for `config.default_sample_rate` until the host
    /// calls `prepare`
    pub fn new(store: Arc<ParameterStore>, config: &EqConfig) -> Self {
        let mut processor = Self {
            watcher: ChainWatcher::new(store),
            left: FilterChain::new(),
            right: FilterChain::new(),
            sample_rate: config.default_sample_rate,
            degraded: DirtyFlag::new(),
        };
        processor.refresh();
        processor
    }

    /// Redesign both channels for a new sample rate and clear filter state
    pub fn prepare(&mut self, sample_rate: f64) -> PeqResult<()> {
        let sample_rate = validate_sample_rate(sample_rate)?;
        // Claim first so the next block doesn't redo this work
        self.watcher.flag().claim();
        let settings = self.watcher.store().chain_settings();
        self.left.update(&settings, sample_rate).log_warnings();
        self.right.update(&settings, sample_rate);
        self.sample_rate = sample_rate;
        self.reset();
        log::debug!("EQ prepared at {sample_rate} Hz");
        Ok(())
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    #[inline]
    pub fn left_chain(&self) -> &FilterChain {
        &self.left
    }

    #[inline]
    pub fn right_chain(&self) -> &FilterChain {
        &self.right
    }

    /// Raised when a block-time recompute fell back to identity or kept
    /// stale coefficients. Claim it off the audio thread and report it.
    pub fn degraded_flag(&self) -> DirtyFlag {
        self.degraded.clone()
    }

    /// Claim the degraded flag and, if it was raised, log the current
    /// fallbacks. Not for the audio thread.
    pub fn report_degraded(&self) -> bool {
        if !self.degraded.claim() {
            return false;
        }
        let settings = self.watcher.store().chain_settings();
        FilterChain::new().update(&settings, self.sample_rate).log_warnings();
        true
    }

    /// Pick up pending parameter edits. Returns whether the chains changed.
    fn refresh(&mut self) -> bool {
        let sample_rate = self.sample_rate;
        let (left, right, degraded) = (&mut self.left, &mut self.right, &self.degraded);
        self.watcher.poll(|settings| {
            let report = left.update(settings, sample_rate);
            right.update(settings, sample_rate);
            if !report.is_clean() {
                degraded.mark_dirty();
            }
        })
    }
}

impl Processor for EqProcessor {
    fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}

impl StereoProcessor for EqProcessor {
    #[inline]
    fn process_sample(&mut self, left: Sample, right: Sample) -> (Sample, Sample) {
        (
            self.left.process_sample(left),
            self.right.process_sample(right),
        )
    }

    fn process_block(&mut self, left: &mut [Sample], right: &mut [Sample]) {
        debug_assert_eq!(left.len(), right.len());
        self.refresh();
        MonoProcessor::process_block(&mut self.left, left);
        MonoProcessor::process_block(&mut self.right, right);
    }
}
