//! The playback state machine.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::audio::{BackendEvent, BackendRouter, PlaybackStatus, ShuffleTracker};
use crate::cast::{CastObserver, CastSession, StreamPublisher};
use crate::config::PlaybackSettings;
use crate::library::{AudioTrack, Folder, LibraryError, LibraryProvider, LibrarySnapshot};
use crate::session::PersistentSessionStore;

use super::model::{SessionCell, SessionState, SessionView, SharedCell, lock};
use super::poll::{PollLoop, SharedRouter};
use super::restore::SessionRestorer;

/// Owns the session state and is the only caller of the backend router.
///
/// All operations are meant to be called from one owner thread. The poll loop
/// is the only thing that touches the state concurrently, and it only ever
/// writes status, position and duration.
pub struct PlaybackCoordinator {
    router: SharedRouter,
    cell: SharedCell,
    store: PersistentSessionStore,
    shuffle: ShuffleTracker,
    poll: PollLoop,
    volume_step: f32,
    library: LibrarySnapshot,
    observer: Option<CastObserver>,
    cast_session: Option<Box<dyn CastSession>>,
    /// Set by `play_track`, cleared by an explicit stop or list reset. A
    /// completion queued before either of those must not advance.
    awaiting_completion: bool,
    disposed: bool,
}

impl PlaybackCoordinator {
    pub fn new(
        router: BackendRouter,
        store: PersistentSessionStore,
        settings: &PlaybackSettings,
    ) -> Self {
        let state = SessionState {
            volume: clamp_volume(settings.initial_volume),
            ..SessionState::default()
        };
        Self {
            router: Arc::new(Mutex::new(router)),
            cell: Arc::new(Mutex::new(SessionCell {
                state,
                poll_epoch: 0,
            })),
            store,
            shuffle: ShuffleTracker::new(),
            poll: PollLoop::new(Duration::from_millis(settings.poll_interval_ms.max(1))),
            volume_step: settings.volume_step,
            library: LibrarySnapshot::default(),
            observer: None,
            cast_session: None,
            awaiting_completion: false,
            disposed: false,
        }
    }

    /// Attach the cast session and keep `publisher` in step with its signal.
    pub fn with_cast(
        mut self,
        session: Box<dyn CastSession>,
        publisher: Arc<dyn StreamPublisher>,
    ) -> Self {
        self.observer = Some(CastObserver::spawn(session.signal(), publisher));
        self.cast_session = Some(session);
        self
    }

    pub fn view(&self) -> SessionView {
        SessionView::new(self.cell.clone())
    }

    pub fn snapshot(&self) -> SessionState {
        lock(&self.cell).state.clone()
    }

    pub fn library(&self) -> &LibrarySnapshot {
        &self.library
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut lock(&self.cell).state)
    }

    fn restart_poll(&mut self) {
        self.poll.start(&self.router, &self.cell);
    }

    fn cancel_poll(&mut self) {
        self.poll.cancel(&self.cell);
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_running()
    }

    // ---- library --------------------------------------------------------

    /// Query `provider` and apply the result. Blocks for the whole scan; the
    /// runtime calls `begin_load`/`finish_load` around a worker thread instead.
    pub fn load_library(&mut self, provider: &dyn LibraryProvider) {
        self.begin_load();
        let result = provider.query_tracks();
        self.finish_load(result);
    }

    pub fn begin_load(&mut self) {
        self.with_state(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    /// Publish a finished load: folders, grouping and the restored selection
    /// land in one state update. A failure only sets the error message.
    pub fn finish_load(&mut self, result: Result<LibrarySnapshot, LibraryError>) {
        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!("library load failed: {e}");
                self.with_state(|s| {
                    s.loading = false;
                    s.error = Some(format!("Failed to load music: {e}"));
                });
                return;
            }
        };

        tracing::info!(
            folders = snapshot.folders.len(),
            tracks = snapshot.track_count(),
            "library loaded"
        );
        let plan = SessionRestorer::restore(&snapshot, &self.store.load());
        self.library = snapshot;
        let folders = self.library.folders.clone();

        let selection = plan
            .folder
            .as_ref()
            .map(|folder| (folder, self.prepare_folder(folder, true)));

        let mut cell = lock(&self.cell);
        let state = &mut cell.state;
        state.folders = folders;
        state.loading = false;
        state.error = None;
        state.shuffle = plan.shuffle;
        state.show_folder_browser = plan.show_folder_browser;
        if let Some((folder, (tracks, index))) = selection {
            apply_folder(state, folder, tracks, index);
        }
    }

    pub fn clear_error(&mut self) {
        self.with_state(|s| s.error = None);
    }

    // ---- folders --------------------------------------------------------

    /// Stop playback and make `folder` the active list.
    ///
    /// With `restore`, the saved track index is reused when it fits the new
    /// list; otherwise the first track is selected. Nothing starts playing.
    pub fn select_folder(&mut self, folder: &Folder, restore: bool) {
        let (tracks, index) = self.prepare_folder(folder, restore);
        self.with_state(|s| apply_folder(s, folder, tracks, index));
        tracing::info!(folder = %folder.path.display(), ?index, "folder selected");
    }

    /// Select the folder at `index` in the library's folder list.
    pub fn select_folder_at(&mut self, index: usize) {
        if let Some(folder) = self.library.folders.get(index).cloned() {
            self.select_folder(&folder, false);
        }
    }

    /// Stop playback, drop the active list and go back to the folder chooser.
    pub fn show_folder_browser(&mut self) {
        self.stop_for_reset();
        self.shuffle.initialize(0);
        self.with_state(|s| {
            s.replace_tracks(Vec::new(), None);
            s.show_folder_browser = true;
        });
    }

    pub fn clear_saved_folder(&mut self) {
        self.store.clear_folder();
    }

    fn stop_for_reset(&mut self) {
        self.awaiting_completion = false;
        self.cancel_poll();
        lock(&self.router).stop();
    }

    fn prepare_folder(&mut self, folder: &Folder, restore: bool) -> (Vec<AudioTrack>, Option<usize>) {
        self.stop_for_reset();

        let tracks = self.library.tracks_for_folder(&folder.path);
        let saved = if restore {
            self.store.last_track_index().filter(|i| *i < tracks.len())
        } else {
            None
        };
        let index = saved.or(if tracks.is_empty() { None } else { Some(0) });

        self.shuffle.initialize(tracks.len());
        self.store.save_folder_path(&folder.path);
        (tracks, index)
    }

    // ---- transport ------------------------------------------------------

    /// Play `index` of the active list. Out-of-range indices are ignored.
    ///
    /// Every play goes through here so persistence and shuffle bookkeeping
    /// happen exactly once per started track.
    pub fn play_track(&mut self, index: usize) {
        let Some((track, volume, folder)) = self.with_state(|s| {
            s.tracks
                .get(index)
                .map(|t| (t.clone(), s.volume, s.selected_folder.clone()))
        }) else {
            return;
        };

        self.cancel_poll();
        {
            let mut router = lock(&self.router);
            router.play(&track);
            router.set_volume(volume);
        }
        self.with_state(|s| {
            s.current_index = Some(index);
            s.status = PlaybackStatus::Playing;
            s.position = Duration::ZERO;
            s.duration = track.duration;
        });
        self.awaiting_completion = true;
        self.restart_poll();

        if let Some(folder) = folder {
            self.store.save_folder_path(&folder);
        }
        self.store.save_last_track_index(index);
        if self.with_state(|s| s.shuffle) {
            self.shuffle.mark_played(index);
        }
        tracing::debug!(index, track = %track.display_name, "playing");
    }

    pub fn toggle(&mut self) {
        let (status, current, has_tracks) =
            self.with_state(|s| (s.status, s.current_index, s.has_tracks()));
        match status {
            PlaybackStatus::Playing => {
                lock(&self.router).pause();
                self.cancel_poll();
                self.with_state(|s| s.status = PlaybackStatus::Paused);
            }
            PlaybackStatus::Paused => {
                lock(&self.router).resume();
                self.with_state(|s| s.status = PlaybackStatus::Playing);
                self.restart_poll();
            }
            PlaybackStatus::Idle | PlaybackStatus::Stopped | PlaybackStatus::Error => {
                if has_tracks {
                    self.play_track(current.unwrap_or(0));
                }
            }
        }
    }

    pub fn play_next(&mut self) {
        let (len, current, shuffle) =
            self.with_state(|s| (s.tracks.len(), s.current_index, s.shuffle));
        if len == 0 {
            return;
        }

        let next = if shuffle {
            if self.shuffle.is_all_played() {
                self.shuffle.reset();
            }
            self.shuffle.next_unplayed_index().unwrap_or(0)
        } else {
            current.map_or(0, |c| (c + 1) % len)
        };
        self.play_track(next);
    }

    /// Always steps back through the list order, shuffle or not.
    pub fn play_previous(&mut self) {
        let (len, current) = self.with_state(|s| (s.tracks.len(), s.current_index));
        if len == 0 {
            return;
        }
        let previous = match current {
            Some(0) | None => len - 1,
            Some(k) => k - 1,
        };
        self.play_track(previous);
    }

    pub fn stop(&mut self) {
        self.stop_for_reset();
        self.with_state(|s| {
            s.status = PlaybackStatus::Stopped;
            s.position = Duration::ZERO;
        });
    }

    /// Seek within the current track. The new position is visible immediately,
    /// also while paused.
    pub fn seek_to(&mut self, position: Duration) {
        let Some(duration) = self.with_state(|s| s.current_index.map(|_| s.duration)) else {
            return;
        };
        let position = if duration.is_zero() {
            position
        } else {
            position.min(duration)
        };
        lock(&self.router).seek_to(position);
        self.with_state(|s| s.position = position);
    }

    // ---- shuffle --------------------------------------------------------

    pub fn toggle_shuffle(&mut self) {
        let enabled = self.with_state(|s| {
            s.shuffle = !s.shuffle;
            s.shuffle
        });
        self.store.save_shuffle_enabled(enabled);
        if enabled {
            self.shuffle.reset();
        }
    }

    pub fn set_shuffle(&mut self, enabled: bool) {
        if self.with_state(|s| s.shuffle) != enabled {
            self.toggle_shuffle();
        }
    }

    pub fn shuffle_tracker(&self) -> &ShuffleTracker {
        &self.shuffle
    }

    // ---- volume ---------------------------------------------------------

    /// Set the volume, clamped to `0.0..=1.0`, on the active backend.
    pub fn set_volume(&mut self, level: f32) {
        let level = clamp_volume(level);
        lock(&self.router).set_volume(level);
        self.with_state(|s| s.volume = level);
    }

    pub fn volume_up(&mut self) {
        let volume = self.with_state(|s| s.volume);
        self.set_volume(volume + self.volume_step);
    }

    pub fn volume_down(&mut self) {
        let volume = self.with_state(|s| s.volume);
        self.set_volume(volume - self.volume_step);
    }

    // ---- events & teardown ---------------------------------------------

    /// React to a backend notification. Completion of the active backend's
    /// track advances to the next one. Events from an inactive backend, or
    /// arriving after a stop or folder change, are dropped.
    pub fn handle_backend_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Completed { backend } => {
                if !self.awaiting_completion {
                    tracing::debug!(%backend, "ignoring completion after stop");
                    return;
                }
                let active = lock(&self.router).active_kind();
                if backend != active {
                    tracing::debug!(%backend, %active, "ignoring completion from inactive backend");
                    return;
                }
                if self.with_state(|s| s.current_index.is_some()) {
                    self.play_next();
                }
            }
        }
    }

    /// Tear down in dependency order: poll loop, cast observer, backends,
    /// cast session, publisher. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        self.cancel_poll();
        if let Some(mut observer) = self.observer.take() {
            observer.cancel();
        }
        let mut router = lock(&self.router);
        router.release();
        if let Some(mut session) = self.cast_session.take() {
            session.release();
        }
        router.shutdown_publisher();
        tracing::debug!("playback coordinator disposed");
    }
}

impl Drop for PlaybackCoordinator {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn apply_folder(
    state: &mut SessionState,
    folder: &Folder,
    tracks: Vec<AudioTrack>,
    index: Option<usize>,
) {
    state.replace_tracks(tracks, index);
    state.selected_folder = Some(folder.path.clone());
    state.selected_folder_name = folder.display_name.clone();
    state.show_folder_browser = false;
}

/// Clamp to `0.0..=1.0` and round to two decimals so repeated steps do not drift.
fn clamp_volume(level: f32) -> f32 {
    if level.is_nan() {
        return 0.0;
    }
    (level.clamp(0.0, 1.0) * 100.0).round() / 100.0
}
