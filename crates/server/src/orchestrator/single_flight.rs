use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide guard ensuring at most one benchmark run is in flight.
/// Acquisition is a compare-and-set; while a [`RunPermit`] is alive every
/// further `try_acquire` fails. There is no persisted lock: if the hosting
/// process dies mid-run the permit dies with it.
#[derive(Clone, Default)]
pub struct SingleFlight {
    busy: Arc<AtomicBool>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<RunPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held for the full Staging/Running/Finalizing window. Releasing it is the
/// very last step of a run, after cleanup, so an accepted follow-up request
/// never observes half-cleaned state.
pub struct RunPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
