//! Magnitude response of a filter chain for display
//!
//! The curve is sampled on a log-frequency axis (20 Hz - 20 kHz by default),
//! one point per pixel column. Bypassed stages contribute unity gain and are
//! skipped. Evaluation only reads the chain.

use std::sync::Arc;

use peq_core::{Decibels, ParameterStore, ResponseConfig, validate_sample_rate};

use crate::chain::FilterChain;
use crate::mirror::ChainWatcher;

/// Frequency shown at pixel column `index` of a `width`-wide display
#[inline]
pub fn frequency_for_pixel(config: &ResponseConfig, index: usize, width: usize) -> f64 {
    config.frequency_at(index as f64 / width as f64)
}

/// Combined linear magnitude of every enabled stage at `freq`
pub fn chain_magnitude(chain: &FilterChain, freq: f64, sample_rate: f64) -> f64 {
    chain
        .iter_stages()
        .map(|stage| stage.magnitude_for_frequency(freq, sample_rate))
        .product()
}

/// Combined magnitude at `freq` in dB, floored at `config.floor_db`
pub fn chain_magnitude_db(
    chain: &FilterChain,
    freq: f64,
    sample_rate: f64,
    config: &ResponseConfig,
) -> f64 {
    let magnitude = chain_magnitude(chain, freq, sample_rate);
    Decibels::from_gain_with_floor(magnitude, config.floor_db).value()
}

/// Fill `out` with one dB value per pixel column.
///
/// An unusable sample rate yields a flat 0 dB line rather than NaNs.
pub fn evaluate_response_into(
    chain: &FilterChain,
    sample_rate: f64,
    config: &ResponseConfig,
    out: &mut [f64],
) {
    if validate_sample_rate(sample_rate).is_err() {
        log::warn!("response requested at invalid sample rate {sample_rate}, drawing flat");
        out.fill(0.0);
        return;
    }

    let width = out.len();
    for (index, db) in out.iter_mut().enumerate() {
        let freq = frequency_for_pixel(config, index, width);
        *db = chain_magnitude_db(chain, freq, sample_rate, config);
    }
}

/// dB response over the configured axis, `width` points long
pub fn evaluate_response_with(
    chain: &FilterChain,
    sample_rate: f64,
    width: usize,
    config: &ResponseConfig,
) -> Vec<f64> {
    let mut mags = vec![0.0; width];
    evaluate_response_into(chain, sample_rate, config, &mut mags);
    mags
}

/// dB response from 20 Hz to 20 kHz, `width` points long
pub fn evaluate_response(chain: &FilterChain, sample_rate: f64, width: usize) -> Vec<f64> {
    evaluate_response_with(chain, sample_rate, width, &ResponseConfig::default())
}

// ============ Response Curve ============

/// Display-side owner of a chain mirror and its cached curve
///
/// Driven by the host's refresh timer through `timer_tick`; the audio path
/// keeps its own chain and is never consulted.
pub struct ResponseCurve {
    watcher: ChainWatcher,
    chain: FilterChain,
    config: ResponseConfig,
    magnitudes: Vec<f64>,
}

impl ResponseCurve {
    pub fn new(store: Arc<ParameterStore>, config: ResponseConfig) -> Self {
        Self {
            watcher: ChainWatcher::new(store),
            chain: FilterChain::new(),
            config,
            magnitudes: Vec::new(),
        }
    }

    /// One refresh tick. Returns `true` when the curve changed and should be
    /// redrawn.
    pub fn timer_tick(&mut self, sample_rate: f64, width: usize) -> bool {
        let rebuilt = self.watcher.poll_chain(&mut self.chain, sample_rate);
        let resized = self.magnitudes.len() != width;
        if !rebuilt && !resized {
            return false;
        }

        self.magnitudes.resize(width, 0.0);
        evaluate_response_into(&self.chain, sample_rate, &self.config, &mut self.magnitudes);
        true
    }

    /// Cached dB curve from the last refresh
    #[inline]
    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    #[inline]
    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }

    #[inline]
    pub fn config(&self) -> &ResponseConfig {
        &self.config
    }

    /// Vertical pixel coordinate of each cached point for a display spanning
    /// `top..bottom`
    pub fn path_points(&self, top: f64, bottom: f64) -> Vec<f64> {
        self.magnitudes
            .iter()
            .map(|&db| self.config.map_db_to_y(db, bottom, top))
            .collect()
    }
}
