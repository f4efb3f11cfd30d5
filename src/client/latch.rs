//! Single-slot payload mailbox
//!
//! Each device interface owns one latch per data/response subtype it
//! understands. The router thread publishes freshly decoded payloads; any
//! application thread may poll readiness or fetch the latest value. The
//! readiness check is edge-triggered: it reports `true` at most once per
//! publish and clears the flag as a side effect.

use std::sync::Mutex;

struct Slot<T> {
    value: Option<T>,
    fresh: bool,
}

/// One-item mailbox with an atomic take-and-clear readiness flag.
pub struct Latch<T> {
    slot: Mutex<Slot<T>>,
}

impl<T: Clone> Latch<T> {
    /// Create an empty latch
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                value: None,
                fresh: false,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot<T>> {
        self.slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Replace the stored payload and mark it unconsumed.
    ///
    /// Called from the router thread after a successful decode. The swap
    /// happens under the lock, so readers never observe a torn value.
    pub fn publish(&self, value: T) {
        let mut slot = self.lock();
        slot.value = Some(value);
        slot.fresh = true;
    }

    /// Edge-triggered readiness check.
    ///
    /// Returns `true` at most once per [`Latch::publish`]; the flag is
    /// cleared before returning. Two consecutive calls without an
    /// intervening publish yield `true` then `false`.
    pub fn take_ready(&self) -> bool {
        let mut slot = self.lock();
        std::mem::replace(&mut slot.fresh, false)
    }

    /// Most recently published payload, or `None` before the first one.
    ///
    /// Does not touch the readiness flag.
    pub fn get(&self) -> Option<T> {
        self.lock().value.clone()
    }
}

impl<T: Clone> Default for Latch<T> {
    fn default() -> Self {
        Self::new()
    }
}
