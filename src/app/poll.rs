//! Periodic position poll.
//!
//! One thread per running loop. Each loop carries the epoch it was started
//! under and only publishes while the cell still holds that epoch, so bumping
//! the epoch under the state lock is enough to silence it.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::audio::BackendRouter;

use super::model::{SharedCell, lock};

pub(super) type SharedRouter = Arc<Mutex<BackendRouter>>;

struct Running {
    // Dropping the sender wakes the thread.
    cancel: Sender<()>,
    join: JoinHandle<()>,
}

pub(super) struct PollLoop {
    interval: Duration,
    running: Option<Running>,
}

impl PollLoop {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start polling, replacing any loop already running.
    pub fn start(&mut self, router: &SharedRouter, cell: &SharedCell) {
        self.cancel(cell);

        let epoch = {
            let mut cell = lock(cell);
            cell.poll_epoch += 1;
            cell.poll_epoch
        };
        let (cancel, cancel_rx) = mpsc::channel::<()>();
        let router = router.clone();
        let cell = cell.clone();
        let interval = self.interval;

        match thread::Builder::new()
            .name("cadenza-poll".into())
            .spawn(move || poll_until_cancelled(&router, &cell, epoch, interval, &cancel_rx))
        {
            Ok(join) => {
                tracing::debug!(epoch, "poll loop started");
                self.running = Some(Running { cancel, join });
            }
            Err(e) => tracing::error!("failed to spawn poll loop: {e}"),
        }
    }

    /// Stop polling. Nothing from the old loop is published once this returns.
    pub fn cancel(&mut self, cell: &SharedCell) {
        lock(cell).poll_epoch += 1;
        if let Some(Running { cancel, join }) = self.running.take() {
            drop(cancel);
            let _ = join.join();
            tracing::debug!("poll loop stopped");
        }
    }
}

fn poll_until_cancelled(
    router: &SharedRouter,
    cell: &SharedCell,
    epoch: u64,
    interval: Duration,
    cancel: &Receiver<()>,
) {
    loop {
        match cancel.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
        if lock(cell).poll_epoch != epoch {
            return;
        }

        // The router lock is released before the state lock is taken.
        let polled = lock(router).poll();

        let mut cell = lock(cell);
        if cell.poll_epoch != epoch {
            return;
        }
        cell.state.apply_poll(polled);
    }
}
