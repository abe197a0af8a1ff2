use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Observable "is casting" flag owned by the casting subsystem.
///
/// Cloning shares the flag. Every change bumps a version so watchers can
/// tell a flip from a spurious wake-up.
#[derive(Clone, Debug, Default)]
pub struct CastSignal {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<SignalState>,
    changed: Condvar,
}

#[derive(Debug, Default, Clone, Copy)]
struct SignalState {
    casting: bool,
    version: u64,
}

impl CastSignal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SignalState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_casting(&self) -> bool {
        self.lock().casting
    }

    pub fn version(&self) -> u64 {
        self.lock().version
    }

    /// Setting the current value again is not a change.
    pub fn set_casting(&self, casting: bool) {
        let mut state = self.lock();
        if state.casting != casting {
            state.casting = casting;
            state.version += 1;
            self.inner.changed.notify_all();
        }
    }

    /// Block until the version moves past `seen` or `timeout` elapses.
    /// Returns the current value and version either way.
    pub fn wait_for_change(&self, seen: u64, timeout: Duration) -> (bool, u64) {
        let guard = self.lock();
        let (state, _) = self
            .inner
            .changed
            .wait_timeout_while(guard, timeout, |s| s.version == seen)
            .unwrap_or_else(PoisonError::into_inner);
        (state.casting, state.version)
    }

    /// Wake every waiter without changing the value.
    pub fn wake(&self) {
        let _state = self.lock();
        self.inner.changed.notify_all();
    }
}
