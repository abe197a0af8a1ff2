//! Observable session state and the read-only handle given to control surfaces.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::audio::{PlaybackStatus, PolledState};
use crate::library::{AudioTrack, Folder};

pub const NO_FOLDER_SELECTED: &str = "No folder selected";

/// Everything a front end needs to render the player.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Tracks of the selected folder, sorted by display name.
    pub tracks: Vec<AudioTrack>,
    /// Always `None` or a valid index into `tracks`.
    pub current_index: Option<usize>,
    pub status: PlaybackStatus,
    pub shuffle: bool,
    pub volume: f32,
    pub position: Duration,
    pub duration: Duration,
    pub selected_folder: Option<PathBuf>,
    pub selected_folder_name: String,
    pub folders: Vec<Folder>,
    pub show_folder_browser: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            current_index: None,
            status: PlaybackStatus::Idle,
            shuffle: false,
            volume: 0.5,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            selected_folder: None,
            selected_folder_name: NO_FOLDER_SELECTED.to_string(),
            folders: Vec::new(),
            show_folder_browser: true,
            loading: false,
            error: None,
        }
    }
}

impl SessionState {
    pub fn current_track(&self) -> Option<&AudioTrack> {
        self.current_index.and_then(|i| self.tracks.get(i))
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    /// Replace the active list. Index, status, position and duration are reset
    /// together so none of them can refer to the previous list.
    pub(super) fn replace_tracks(&mut self, tracks: Vec<AudioTrack>, index: Option<usize>) {
        self.current_index = index.filter(|i| *i < tracks.len());
        self.tracks = tracks;
        self.reset_playback();
    }

    pub(super) fn reset_playback(&mut self) {
        self.status = PlaybackStatus::Idle;
        self.position = Duration::ZERO;
        self.duration = Duration::ZERO;
    }

    pub(super) fn apply_poll(&mut self, polled: PolledState) {
        self.status = polled.status;
        self.position = polled.position;
        // Some backends only learn the length once the stream is open.
        if !polled.duration.is_zero() {
            self.duration = polled.duration;
        }
    }
}

/// State plus the generation of the poll loop allowed to publish into it.
#[derive(Debug, Default)]
pub(super) struct SessionCell {
    pub state: SessionState,
    pub poll_epoch: u64,
}

pub(super) type SharedCell = Arc<Mutex<SessionCell>>;

pub(super) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cheap, cloneable read handle on the coordinator's state.
#[derive(Clone)]
pub struct SessionView {
    cell: SharedCell,
}

impl SessionView {
    pub(super) fn new(cell: SharedCell) -> Self {
        Self { cell }
    }

    /// A view over a fixed state with no coordinator behind it.
    #[cfg(test)]
    pub(crate) fn detached(state: SessionState) -> Self {
        Self::new(Arc::new(Mutex::new(SessionCell {
            state,
            poll_epoch: 0,
        })))
    }

    pub fn snapshot(&self) -> SessionState {
        lock(&self.cell).state.clone()
    }

    /// Borrow the state without cloning the track list.
    pub fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&lock(&self.cell).state)
    }
}
