//! Builders and recording fakes shared by the unit tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::audio::{Backend, BackendKind, PlaybackStatus, PolledState};
use crate::cast::{
    CastError, CastSession, CastSignal, PublisherError, RemoteMedia, RemoteSink, RemoteState,
    RemoteStatus, StreamPublisher,
};
use crate::library::{AudioTrack, mime_type_for};

pub const TRACK_LEN: Duration = Duration::from_secs(180);

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A track at `path`, named after its file and owned by its parent directory.
pub fn track(path: &str) -> AudioTrack {
    let path = PathBuf::from(path);
    let display_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    AudioTrack {
        mime_type: mime_type_for(&path).to_string(),
        folder: path.parent().map(Path::to_path_buf).unwrap_or_default(),
        display_name,
        size: 1024,
        duration: TRACK_LEN,
        album_id: 0,
        album_art: None,
        artist: String::new(),
        album: String::new(),
        path,
    }
}

/// `count` tracks named `01.mp3`, `02.mp3`, ... inside `dir`.
pub fn tracks_in(dir: &str, count: usize) -> Vec<AudioTrack> {
    (1..=count)
        .map(|i| track(&format!("{dir}/{i:02}.mp3")))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Play(PathBuf),
    Pause,
    Resume,
    Stop,
    Seek(Duration),
    Volume(f32),
    Release,
}

#[derive(Default)]
struct ProbeState {
    calls: Vec<Call>,
    polled: PolledState,
    polls: usize,
}

/// Shared view into a [`FakeBackend`], kept by the test after the backend is
/// boxed and handed to the router.
#[derive(Clone, Default)]
pub struct Probe {
    inner: Arc<Mutex<ProbeState>>,
}

impl Probe {
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.inner).calls.clone()
    }

    pub fn played(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Play(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn clear(&self) {
        lock(&self.inner).calls.clear();
    }

    pub fn polls(&self) -> usize {
        lock(&self.inner).polls
    }

    /// What the next polls will report.
    pub fn set_polled(&self, polled: PolledState) {
        lock(&self.inner).polled = polled;
    }
}

/// Backend that records every command and answers polls from its probe.
pub struct FakeBackend {
    kind: BackendKind,
    probe: Probe,
}

impl FakeBackend {
    pub fn new(kind: BackendKind) -> (Self, Probe) {
        let probe = Probe::default();
        (
            Self {
                kind,
                probe: probe.clone(),
            },
            probe,
        )
    }

    fn record(&self, call: Call) -> MutexGuard<'_, ProbeState> {
        let mut state = lock(&self.probe.inner);
        state.calls.push(call);
        state
    }
}

impl Backend for FakeBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn play(&mut self, track: &AudioTrack) {
        let mut state = self.record(Call::Play(track.path.clone()));
        state.polled = PolledState {
            status: PlaybackStatus::Playing,
            position: Duration::ZERO,
            duration: track.duration,
        };
    }

    fn pause(&mut self) {
        self.record(Call::Pause).polled.status = PlaybackStatus::Paused;
    }

    fn resume(&mut self) {
        self.record(Call::Resume).polled.status = PlaybackStatus::Playing;
    }

    fn stop(&mut self) {
        let mut state = self.record(Call::Stop);
        state.polled.status = PlaybackStatus::Stopped;
        state.polled.position = Duration::ZERO;
    }

    fn seek_to(&mut self, position: Duration) {
        self.record(Call::Seek(position)).polled.position = position;
    }

    fn set_volume(&mut self, level: f32) {
        self.record(Call::Volume(level));
    }

    fn poll(&mut self) -> PolledState {
        let mut state = lock(&self.probe.inner);
        state.polls += 1;
        state.polled
    }

    fn release(&mut self) {
        self.record(Call::Release);
    }
}

/// Publisher that tracks its running flag and hands out fake URLs.
#[derive(Default)]
pub struct FakePublisher {
    running: AtomicBool,
    starts: AtomicUsize,
    stops: AtomicUsize,
    clears: AtomicUsize,
    registered: Mutex<Vec<PathBuf>>,
}

impl FakePublisher {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn registered(&self) -> Vec<PathBuf> {
        lock(&self.registered).clone()
    }
}

impl StreamPublisher for FakePublisher {
    fn start(&self) -> Result<(), PublisherError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(PublisherError::AlreadyRunning);
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> Result<(), PublisherError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(PublisherError::NotRunning);
        }
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn register(&self, path: &Path) -> Result<String, PublisherError> {
        if !self.is_running() {
            return Err(PublisherError::NotRunning);
        }
        let mut registered = lock(&self.registered);
        registered.push(path.to_path_buf());
        Ok(format!("http://receiver.test/media/{}", registered.len()))
    }

    fn clear_registered_media(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
        lock(&self.registered).clear();
    }
}

#[derive(Debug)]
pub struct RemoteProbeState {
    pub loaded: Vec<RemoteMedia>,
    pub commands: Vec<&'static str>,
    pub status: RemoteStatus,
    pub disconnected: bool,
    pub released: bool,
}

impl Default for RemoteProbeState {
    fn default() -> Self {
        Self {
            loaded: Vec::new(),
            commands: Vec::new(),
            status: RemoteStatus {
                state: RemoteState::Idle,
                position: Duration::ZERO,
                duration: Duration::ZERO,
            },
            disconnected: false,
            released: false,
        }
    }
}

/// Receiver stand-in; the test drives its reported status through the shared state.
#[derive(Clone, Default)]
pub struct FakeRemoteSink {
    pub state: Arc<Mutex<RemoteProbeState>>,
}

impl FakeRemoteSink {
    pub fn with<R>(&self, f: impl FnOnce(&mut RemoteProbeState) -> R) -> R {
        f(&mut lock(&self.state))
    }

    fn command(&self, name: &'static str) -> Result<(), CastError> {
        let mut state = lock(&self.state);
        if state.disconnected {
            return Err(CastError::Disconnected);
        }
        state.commands.push(name);
        Ok(())
    }
}

impl RemoteSink for FakeRemoteSink {
    fn load(&mut self, media: &RemoteMedia) -> Result<(), CastError> {
        self.command("load")?;
        let mut state = lock(&self.state);
        state.loaded.push(media.clone());
        state.status = RemoteStatus {
            state: RemoteState::Buffering,
            position: Duration::ZERO,
            duration: Duration::ZERO,
        };
        Ok(())
    }

    fn pause(&mut self) -> Result<(), CastError> {
        self.command("pause")
    }

    fn resume(&mut self) -> Result<(), CastError> {
        self.command("resume")
    }

    fn stop(&mut self) -> Result<(), CastError> {
        self.command("stop")
    }

    fn seek(&mut self, _position: Duration) -> Result<(), CastError> {
        self.command("seek")
    }

    fn set_volume(&mut self, _level: f32) -> Result<(), CastError> {
        self.command("volume")
    }

    fn status(&mut self) -> Result<RemoteStatus, CastError> {
        let state = lock(&self.state);
        if state.disconnected {
            return Err(CastError::Disconnected);
        }
        Ok(state.status)
    }

    fn release(&mut self) {
        lock(&self.state).released = true;
    }
}

pub struct FakeSession {
    pub signal: CastSignal,
    pub released: Arc<AtomicBool>,
}

impl FakeSession {
    pub fn new(signal: CastSignal) -> (Self, Arc<AtomicBool>) {
        let released = Arc::new(AtomicBool::new(false));
        (
            Self {
                signal,
                released: released.clone(),
            },
            released,
        )
    }
}

impl CastSession for FakeSession {
    fn signal(&self) -> CastSignal {
        self.signal.clone()
    }

    fn release(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Poll `cond` every few milliseconds for up to two seconds.
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}
