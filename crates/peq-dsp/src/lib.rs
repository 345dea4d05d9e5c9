//! peq-dsp: Filter design and state for the three-stage parametric EQ
//!
//! ## Modules
//! - `biquad` - TDF-II biquad, coefficient sets and their frequency response
//! - `design` - Peak (bell) and Butterworth cut-cascade coefficient design
//! - `chain` - Fixed low-cut → peak → high-cut chain and the slope policy
//! - `mirror` - Dirty-flag polling that keeps a chain in sync with parameters
//! - `response` - Log-frequency magnitude response for display
//! - `processor` - Stereo block processor for the audio thread

pub mod biquad;
pub mod chain;
pub mod design;
pub mod mirror;
pub mod processor;
pub mod response;

pub use chain::{ChainPosition, CutCascade, FilterChain, MAX_CUT_STAGES, Stage, UpdateReport};
pub use mirror::ChainWatcher;
pub use processor::EqProcessor;
pub use response::{ResponseCurve, evaluate_response};

use peq_core::Sample;

/// Trait for all DSP processors
pub trait Processor: Send + Sync {
    /// Reset processor state
    fn reset(&mut self);

    /// Get latency in samples
    fn latency(&self) -> usize {
        0
    }
}

/// Mono processor trait
pub trait MonoProcessor: Processor {
    /// Process a single sample
    fn process_sample(&mut self, input: Sample) -> Sample;

    /// Process a block of samples
    fn process_block(&mut self, buffer: &mut [Sample]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}

/// Stereo processor trait
pub trait StereoProcessor: Processor {
    /// Process a stereo sample pair
    fn process_sample(&mut self, left: Sample, right: Sample) -> (Sample, Sample);

    /// Process stereo blocks
    fn process_block(&mut self, left: &mut [Sample], right: &mut [Sample]) {
        debug_assert_eq!(left.len(), right.len());
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.process_sample(*l, *r);
        }
    }
}
