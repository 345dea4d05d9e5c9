//! Parameter store owned by the host integration
//!
//! Values live in atomics so the audio thread can build a `ChainSettings`
//! without locking. The listener list is published through `ArcSwap`:
//! notification only loads the current list, so a setter running on the audio
//! thread never waits on a registration in progress. Registrations copy the
//! list and are serialized by a `parking_lot` mutex.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::{
    AtomicParam, ChainSettings, NormalizedValue, ParamId, PeqError, PeqResult, Slope,
};

/// Callback invoked on whichever thread changed a parameter
///
/// Implementations must stay cheap and never block; the only thing the filter
/// mirrors do here is set their dirty flag.
pub trait ParameterListener: Send + Sync {
    fn parameter_changed(&self, id: ParamId, value: f64);
}

/// Handle returned by `ParameterStore::add_listener`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ListenerList = Vec<(ListenerId, Arc<dyn ParameterListener>)>;

/// Current value of every EQ parameter
pub struct ParameterStore {
    values: [AtomicParam; ParamId::COUNT],
    listeners: ArcSwap<ListenerList>,
    /// Held while a registration copies and republishes `listeners`
    registry: Mutex<()>,
    next_listener: AtomicU64,
}

impl ParameterStore {
    /// Store initialized to every parameter's default
    pub fn new() -> Self {
        Self {
            values: ParamId::ALL.map(|id| AtomicParam::new(id.range().default)),
            listeners: ArcSwap::from_pointee(Vec::new()),
            registry: Mutex::new(()),
            next_listener: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn get(&self, id: ParamId) -> f64 {
        self.values[id.index()].get()
    }

    /// Current value as the host sees it (0-1)
    pub fn get_normalized(&self, id: ParamId) -> NormalizedValue {
        id.range().normalize(self.get(id))
    }

    /// Set a parameter in plain units
    ///
    /// The value is clamped and snapped to the parameter's range. Listeners are
    /// notified only when the stored value actually changes. Returns the value
    /// that was stored. Never blocks and never allocates.
    pub fn set(&self, id: ParamId, value: f64) -> PeqResult<f64> {
        if !value.is_finite() {
            return Err(PeqError::InvalidParameter {
                what: id.identifier(),
                value,
            });
        }

        let snapped = id.range().snap(value);
        let previous = self.values[id.index()].replace(snapped);
        if previous.to_bits() != snapped.to_bits() {
            self.notify(id, snapped);
        }
        Ok(snapped)
    }

    /// Set a parameter from a host-normalized 0-1 value
    pub fn set_normalized(&self, id: ParamId, value: NormalizedValue) -> f64 {
        let plain = id.range().denormalize(value);
        let previous = self.values[id.index()].replace(plain);
        if previous.to_bits() != plain.to_bits() {
            self.notify(id, plain);
        }
        plain
    }

    /// Set a parameter by its persistence identifier
    pub fn set_by_identifier(&self, identifier: &str, value: f64) -> PeqResult<f64> {
        let id = ParamId::from_identifier(identifier)
            .ok_or_else(|| PeqError::UnknownParameter(identifier.to_owned()))?;
        self.set(id, value)
    }

    /// Build a fresh snapshot of the chain-shaping parameters
    pub fn chain_settings(&self) -> ChainSettings {
        ChainSettings {
            peak_freq: self.get(ParamId::PeakFreq),
            peak_gain_db: self.get(ParamId::PeakGain),
            peak_quality: self.get(ParamId::PeakQuality),
            low_cut_freq: self.get(ParamId::LowCutFreq),
            high_cut_freq: self.get(ParamId::HighCutFreq),
            low_cut_slope: Slope::from_choice(self.get(ParamId::LowCutSlope)),
            high_cut_slope: Slope::from_choice(self.get(ParamId::HighCutSlope)),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn ParameterListener>) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        let _registry = self.registry.lock();
        let mut next = ListenerList::clone(&self.listeners.load());
        next.push((id, listener));
        self.listeners.store(Arc::new(next));
        log::trace!("parameter listener {id:?} registered");
        id
    }

    /// Unregister a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let _registry = self.registry.lock();
        let current = self.listeners.load_full();
        if !current.iter().any(|(lid, _)| *lid == id) {
            return false;
        }
        let next: ListenerList = current
            .iter()
            .filter(|(lid, _)| *lid != id)
            .cloned()
            .collect();
        self.listeners.store(Arc::new(next));
        log::trace!("parameter listener {id:?} removed");
        true
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.load().len()
    }

    fn notify(&self, id: ParamId, value: f64) {
        for (_, listener) in self.listeners.load().iter() {
            listener.parameter_changed(id, value);
        }
    }

    /// Serialize every parameter value, keyed by identifier
    pub fn save_state(&self) -> PeqResult<String> {
        let state: BTreeMap<&str, f64> = ParamId::ALL
            .iter()
            .map(|&id| (id.identifier(), self.get(id)))
            .collect();
        Ok(serde_json::to_string(&state)?)
    }

    /// Restore values written by `save_state`
    ///
    /// Unknown identifiers and non-finite values are skipped with a warning,
    /// missing ones keep their current value. Changed values notify listeners
    /// like any other edit.
    pub fn load_state(&self, json: &str) -> PeqResult<()> {
        let state: BTreeMap<String, f64> = serde_json::from_str(json)?;
        for (identifier, value) in state {
            if let Err(e) = self.set_by_identifier(&identifier, value) {
                log::warn!("ignoring saved value for {identifier}: {e}");
            }
        }
        Ok(())
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DirtyFlag;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    struct Counter(AtomicUsize);

    impl ParameterListener for Counter {
        fn parameter_changed(&self, _id: ParamId, _value: f64) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_defaults() {
        let store = ParameterStore::new();
        assert_eq!(store.chain_settings(), ChainSettings::default());
    }

    #[test]
    fn test_set_clamps_and_snaps() {
        let store = ParameterStore::new();
        assert_eq!(store.set(ParamId::PeakGain, 40.0).unwrap(), 24.0);
        assert_eq!(store.set(ParamId::PeakFreq, 1000.4).unwrap(), 1000.0);
        assert_eq!(store.set(ParamId::HighCutSlope, 3.0).unwrap(), 3.0);

        let settings = store.chain_settings();
        assert_eq!(settings.peak_gain_db, 24.0);
        assert_eq!(settings.peak_freq, 1000.0);
        assert_eq!(settings.high_cut_slope, Slope::Db48);
    }

    #[test]
    fn test_set_rejects_non_finite() {
        let store = ParameterStore::new();
        assert!(store.set(ParamId::PeakQuality, f64::NAN).is_err());
        assert_eq!(store.get(ParamId::PeakQuality), 1.0);
    }

    #[test]
    fn test_listeners_notified_on_change_only() {
        let store = ParameterStore::new();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        store.add_listener(counter.clone());

        store.set(ParamId::PeakGain, 6.0).unwrap();
        store.set(ParamId::PeakGain, 6.0).unwrap();
        store.set(ParamId::PeakGain, 6.1).unwrap(); // snaps back to 6.0
        assert_eq!(counter.0.load(Ordering::Relaxed), 1);

        store.set_normalized(ParamId::LowCutSlope, NormalizedValue::ONE);
        assert_eq!(counter.0.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_remove_listener() {
        let store = ParameterStore::new();
        let flag = DirtyFlag::new();
        let id = store.add_listener(Arc::new(flag.clone()));
        assert_eq!(store.listener_count(), 1);

        assert!(store.remove_listener(id));
        assert!(!store.remove_listener(id));
        assert_eq!(store.listener_count(), 0);

        store.set(ParamId::PeakFreq, 5000.0).unwrap();
        assert!(!flag.is_dirty());
    }

    #[test]
    fn test_state_round_trip() {
        let store = ParameterStore::new();
        store.set(ParamId::PeakFreq, 2500.0).unwrap();
        store.set(ParamId::PeakGain, -4.5).unwrap();
        store.set(ParamId::LowCutSlope, 2.0).unwrap();
        let saved = store.save_state().unwrap();

        let restored = ParameterStore::new();
        let flag = DirtyFlag::new();
        restored.add_listener(Arc::new(flag.clone()));
        restored.load_state(&saved).unwrap();

        assert_eq!(restored.chain_settings(), store.chain_settings());
        assert!(flag.claim());
    }

    #[test]
    fn test_load_state_skips_unknown_keys() {
        let store = ParameterStore::new();
        store
            .load_state(r#"{"PeakGain": 3.0, "Drive": 11.0}"#)
            .unwrap();
        assert_eq!(store.get(ParamId::PeakGain), 3.0);
        assert_eq!(store.get(ParamId::PeakFreq), 750.0);
    }

    #[test]
    fn test_set_by_identifier() {
        let store = ParameterStore::new();
        assert_eq!(store.set_by_identifier("PeakGain", 3.3).unwrap(), 3.5);
        assert!(matches!(
            store.set_by_identifier("Drive", 1.0),
            Err(PeqError::UnknownParameter(name)) if name == "Drive"
        ));
    }

    #[test]
    fn test_get_normalized_matches_set_normalized() {
        let store = ParameterStore::new();
        store.set_normalized(ParamId::PeakGain, NormalizedValue::new(0.75));
        assert_eq!(store.get(ParamId::PeakGain), 12.0);
        assert_eq!(store.get_normalized(ParamId::PeakGain).get(), 0.75);
        assert_eq!(store.get_normalized(ParamId::HighCutFreq), NormalizedValue::ONE);
    }

    #[test]
    fn test_set_does_not_wait_for_registration() {
        let store = Arc::new(ParameterStore::new());
        let flag = DirtyFlag::new();
        store.add_listener(Arc::new(flag.clone()));

        // A registration in progress on another thread
        let registry = store.registry.lock();

        let (done_tx, done_rx) = mpsc::channel();
        let setter = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store.set(ParamId::PeakGain, 6.0).unwrap();
                done_tx.send(()).unwrap();
            })
        };

        let finished = done_rx.recv_timeout(Duration::from_secs(2));
        drop(registry);
        setter.join().unwrap();

        assert!(finished.is_ok(), "set blocked behind the registry lock");
        assert!(flag.claim());
    }

    #[test]
    fn test_load_state_rejects_malformed_json() {
        let store = ParameterStore::new();
        assert!(matches!(
            store.load_state("not json"),
            Err(PeqError::Serialization(_))
        ));
    }
}
