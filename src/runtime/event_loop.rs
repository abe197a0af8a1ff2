use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::app::{PlaybackCoordinator, SessionState};
use crate::audio::{BackendEvent, PlaybackStatus};
use crate::mpris::{ControlCmd, MprisHandle};

use super::startup::LoadResult;

const TICK: Duration = Duration::from_millis(50);

/// Receivers the event loop drains on every tick.
pub struct Inbox {
    pub control: Receiver<ControlCmd>,
    pub backend: Receiver<BackendEvent>,
    pub library: Receiver<LoadResult>,
}

/// The parts of the state that D-Bus clients are told about when they change.
#[derive(Debug, Clone, PartialEq)]
struct Observed {
    status: PlaybackStatus,
    index: Option<usize>,
    volume: f32,
    shuffle: bool,
    duration: Duration,
    folder: Option<PathBuf>,
    folder_count: usize,
}

impl Observed {
    fn of(s: &SessionState) -> Self {
        Self {
            status: s.status,
            index: s.current_index,
            volume: s.volume,
            shuffle: s.shuffle,
            duration: s.duration,
            folder: s.selected_folder.clone(),
            folder_count: s.folders.len(),
        }
    }
}

/// Main loop: the only place coordinator operations are invoked from.
/// Returns when a `Quit` command arrives.
pub fn run(
    coordinator: &mut PlaybackCoordinator,
    mpris: &MprisHandle,
    inbox: &Inbox,
) -> Result<(), Box<dyn std::error::Error>> {
    let view = coordinator.view();
    let mut last = view.read(Observed::of);

    loop {
        match inbox.control.recv_timeout(TICK) {
            Ok(cmd) => {
                if handle_control_cmd(cmd, coordinator) {
                    return Ok(());
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        }
        while let Ok(cmd) = inbox.control.try_recv() {
            if handle_control_cmd(cmd, coordinator) {
                return Ok(());
            }
        }

        while let Ok(event) = inbox.backend.try_recv() {
            coordinator.handle_backend_event(event);
        }
        while let Ok(result) = inbox.library.try_recv() {
            coordinator.finish_load(result);
        }

        let now = view.read(Observed::of);
        if now != last {
            mpris.notify_changed();
            last = now;
        }
    }
}

/// Apply one control command. Returns `true` when shutdown is requested.
pub fn handle_control_cmd(cmd: ControlCmd, coordinator: &mut PlaybackCoordinator) -> bool {
    let status = coordinator.view().read(|s| s.status);
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => {
            if status != PlaybackStatus::Playing {
                coordinator.toggle();
            }
        }
        ControlCmd::Pause => {
            if status == PlaybackStatus::Playing {
                coordinator.toggle();
            }
        }
        ControlCmd::PlayPause => coordinator.toggle(),
        ControlCmd::Stop => coordinator.stop(),
        ControlCmd::Next => coordinator.play_next(),
        ControlCmd::Prev => coordinator.play_previous(),
        ControlCmd::SeekBy(offset) => {
            let position = coordinator.view().read(|s| s.position);
            let target = if offset < 0 {
                position.saturating_sub(Duration::from_micros(offset.unsigned_abs()))
            } else {
                position.saturating_add(Duration::from_micros(offset.unsigned_abs()))
            };
            coordinator.seek_to(target);
        }
        ControlCmd::SetPosition(position) => coordinator.seek_to(position),
        ControlCmd::SetVolume(level) => coordinator.set_volume(level as f32),
        ControlCmd::VolumeUp => coordinator.volume_up(),
        ControlCmd::VolumeDown => coordinator.volume_down(),
        ControlCmd::SetShuffle(enabled) => coordinator.set_shuffle(enabled),
        ControlCmd::ActivateFolder(index) => coordinator.select_folder_at(index),
        ControlCmd::ShowFolders => coordinator.show_folder_browser(),
        ControlCmd::ForgetFolder => coordinator.clear_saved_folder(),
        ControlCmd::ClearError => coordinator.clear_error(),
    }
    false
}
