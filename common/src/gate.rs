//! Single-slot admission gate for backend requests
//!
//! At most one gateway call is in flight per session. The permit releases
//! the slot when dropped, so every exit path of a request re-enables the
//! actions that depend on `is_busy`.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle to one session's in-flight slot
#[derive(Clone, Default)]
pub struct RequestGate {
    busy: Arc<AtomicBool>,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the slot, or `None` while another request holds it
    pub fn try_acquire(&self) -> Option<RequestPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RequestPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl fmt::Debug for RequestGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestGate")
            .field("busy", &self.is_busy())
            .finish()
    }
}

/// Proof of holding the in-flight slot
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct RequestPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for RequestPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

impl fmt::Debug for RequestPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RequestPermit")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_slot() {
        let gate = RequestGate::new();
        assert!(!gate.is_busy());

        let permit = gate.try_acquire().expect("slot should be free");
        assert!(gate.is_busy());
        assert!(gate.try_acquire().is_none());

        drop(permit);
        assert!(!gate.is_busy());
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn test_clones_share_slot() {
        let gate = RequestGate::new();
        let other = gate.clone();
        let _permit = gate.try_acquire().unwrap();
        assert!(other.is_busy());
        assert!(other.try_acquire().is_none());
    }

    #[test]
    fn test_released_on_panic() {
        let gate = RequestGate::new();
        let handle = gate.clone();
        let result = std::thread::spawn(move || {
            let _permit = handle.try_acquire().unwrap();
            panic!("request failed mid-flight");
        })
        .join();

        assert!(result.is_err());
        assert!(!gate.is_busy());
    }
}
