//! Dirty flag shared between a change notifier and a single polling consumer
//!
//! The notifier side only ever stores `true`. The consumer claims the change
//! with a compare-and-swap from `true` to `false`, so exactly one poll wins per
//! pending change. A notification that lands while the winner is recomputing
//! sets the flag again and is picked up by the next poll.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{ParamId, ParameterListener};

/// Cloneable handle to one atomic dirty bit
#[derive(Debug, Clone, Default)]
pub struct DirtyFlag {
    flag: Arc<AtomicBool>,
}

impl DirtyFlag {
    /// Clean flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag that is already pending, so the first poll populates its consumer
    pub fn new_dirty() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Mark pending (wait-free, callable from any thread)
    #[inline]
    pub fn mark_dirty(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Take the pending change. Returns `true` for exactly one caller per change.
    #[inline]
    pub fn claim(&self) -> bool {
        self.flag
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl ParameterListener for DirtyFlag {
    fn parameter_changed(&self, _id: ParamId, _value: f64) {
        self.mark_dirty();
    }
}
