//! Keeps a privately owned `FilterChain` in step with the parameter store
//!
//! Every chain owner (the audio processor, the response display) holds its
//! own `ChainWatcher`. The watcher registers a `DirtyFlag` with the store; a
//! parameter edit on any thread only sets that flag. The owner polls on its
//! own cadence and, if it wins the claim, rebuilds its chain from a fresh
//! snapshot. Owners never wait on each other and never share chain memory.

use std::sync::Arc;

use peq_core::{ChainSettings, DirtyFlag, ListenerId, ParameterStore};

use crate::chain::FilterChain;

/// Dirty-flag subscription to a parameter store
pub struct ChainWatcher {
    store: Arc<ParameterStore>,
    flag: DirtyFlag,
    listener: ListenerId,
}

impl ChainWatcher {
    /// Subscribe to `store`. The watcher starts pending so the first poll
    /// designs the owner's chain.
    pub fn new(store: Arc<ParameterStore>) -> Self {
        let flag = DirtyFlag::new_dirty();
        let listener = store.add_listener(Arc::new(flag.clone()));
        Self {
            store,
            flag,
            listener,
        }
    }

    #[inline]
    pub fn store(&self) -> &Arc<ParameterStore> {
        &self.store
    }

    #[inline]
    pub fn flag(&self) -> &DirtyFlag {
        &self.flag
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.flag.is_dirty()
    }

    /// Claim a pending change and hand the latest settings to `apply`.
    ///
    /// Any number of edits since the previous poll collapse into a single
    /// call. Returns whether `apply` ran.
    pub fn poll(&self, apply: impl FnOnce(&ChainSettings)) -> bool {
        if !self.flag.claim() {
            return false;
        }
        let settings = self.store.chain_settings();
        apply(&settings);
        true
    }

    /// Poll and rebuild `chain` for `sample_rate`, logging any design
    /// fallback. For owners off the audio thread.
    ///
    /// A chain last designed for a different sample rate is rebuilt even
    /// without a pending change.
    pub fn poll_chain(&self, chain: &mut FilterChain, sample_rate: f64) -> bool {
        let claimed = self.flag.claim();
        let rate_changed = chain.designed_rate() != Some(sample_rate);
        if !claimed && !rate_changed {
            return false;
        }

        let settings = self.store.chain_settings();
        chain.update(&settings, sample_rate).log_warnings();
        log::debug!(
            "chain recomputed at {sample_rate} Hz (claimed={claimed}, rate_changed={rate_changed})"
        );
        true
    }
}

impl Drop for ChainWatcher {
    fn drop(&mut self) {
        self.store.remove_listener(self.listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peq_core::{ParamId, Slope};

    const SAMPLE_RATE: f64 = 48000.0;

    #[test]
    fn test_first_poll_populates() {
        let store = Arc::new(ParameterStore::new());
        let watcher = ChainWatcher::new(Arc::clone(&store));
        let mut chain = FilterChain::new();

        assert!(watcher.poll_chain(&mut chain, SAMPLE_RATE));
        assert_eq!(chain.low_cut().enabled_count(), 1);
        assert!(!watcher.poll_chain(&mut chain, SAMPLE_RATE));
    }

    #[test]
    fn test_edits_coalesce_into_one_recompute() {
        let store = Arc::new(ParameterStore::new());
        let watcher = ChainWatcher::new(Arc::clone(&store));
        assert!(watcher.poll(|_| {}));

        store.set(ParamId::HighCutSlope, 1.0).unwrap();
        store.set(ParamId::HighCutSlope, 2.0).unwrap();
        store.set(ParamId::HighCutSlope, 3.0).unwrap();

        let mut recomputes = 0;
        let mut seen = None;
        for _ in 0..3 {
            watcher.poll(|settings| {
                recomputes += 1;
                seen = Some(settings.high_cut_slope);
            });
        }

        assert_eq!(recomputes, 1);
        assert_eq!(seen, Some(Slope::Db48));
    }

    #[test]
    fn test_edit_during_recompute_is_not_lost() {
        let store = Arc::new(ParameterStore::new());
        let watcher = ChainWatcher::new(Arc::clone(&store));

        let applied = watcher.poll(|_| {
            // Lands after the claim, before the owner finishes
            store.set(ParamId::PeakGain, 12.0).unwrap();
        });
        assert!(applied);
        assert!(watcher.is_pending());

        let mut gain = None;
        assert!(watcher.poll(|settings| gain = Some(settings.peak_gain_db)));
        assert_eq!(gain, Some(12.0));
    }

    #[test]
    fn test_sample_rate_change_forces_rebuild() {
        let store = Arc::new(ParameterStore::new());
        let watcher = ChainWatcher::new(Arc::clone(&store));
        let mut chain = FilterChain::new();

        assert!(watcher.poll_chain(&mut chain, 44100.0));
        assert!(!watcher.poll_chain(&mut chain, 44100.0));
        assert!(watcher.poll_chain(&mut chain, 96000.0));
        assert_eq!(chain.designed_rate(), Some(96000.0));
    }

    #[test]
    fn test_watchers_are_independent() {
        let store = Arc::new(ParameterStore::new());
        let audio = ChainWatcher::new(Arc::clone(&store));
        let display = ChainWatcher::new(Arc::clone(&store));
        audio.poll(|_| {});
        display.poll(|_| {});

        store.set(ParamId::PeakFreq, 3000.0).unwrap();

        assert!(audio.poll(|_| {}));
        assert!(display.is_pending());
        assert!(display.poll(|_| {}));
    }

    #[test]
    fn test_drop_unregisters() {
        let store = Arc::new(ParameterStore::new());
        {
            let _watcher = ChainWatcher::new(Arc::clone(&store));
            assert_eq!(store.listener_count(), 1);
        }
        assert_eq!(store.listener_count(), 0);
    }
}
