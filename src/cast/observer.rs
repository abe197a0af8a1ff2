use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::publisher::{StreamPublisher, apply_cast_transition};
use super::signal::CastSignal;

const WAIT: Duration = Duration::from_millis(250);

/// Background watcher that keeps the stream publisher in step with the cast
/// signal: running while casting, stopped and emptied otherwise.
pub struct CastObserver {
    signal: CastSignal,
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl CastObserver {
    pub fn spawn(signal: CastSignal, publisher: Arc<dyn StreamPublisher>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));

        let stop_for_thread = stop.clone();
        let signal_for_thread = signal.clone();
        let join = thread::Builder::new()
            .name("cadenza-cast-observer".into())
            .spawn(move || {
                let signal = signal_for_thread;
                let mut seen = signal.version();
                let mut casting = signal.is_casting();
                apply_cast_transition(publisher.as_ref(), casting);

                while !stop_for_thread.load(Ordering::Acquire) {
                    let (now, version) = signal.wait_for_change(seen, WAIT);
                    if stop_for_thread.load(Ordering::Acquire) {
                        break;
                    }
                    seen = version;
                    if now != casting {
                        casting = now;
                        tracing::info!(casting, "cast connectivity changed");
                        apply_cast_transition(publisher.as_ref(), casting);
                    }
                }
            })
            .map_err(|e| tracing::error!("failed to spawn cast observer: {e}"))
            .ok();

        Self { signal, stop, join }
    }

    /// Stop watching. Returns once the watcher thread has exited.
    pub fn cancel(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.signal.wake();
        if let Some(handle) = self.join.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CastObserver {
    fn drop(&mut self) {
        self.cancel();
    }
}
