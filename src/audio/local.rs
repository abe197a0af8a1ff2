//! The local playback backend: a dedicated audio thread driving `rodio`.
//!
//! The thread owns the output stream and the current sink. Commands arrive
//! over a channel; between commands the thread refreshes the shared status and
//! watches for the end of the track.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink};

use crate::config::AudioSettings;
use crate::library::AudioTrack;

use super::sink::create_sink_at;
use super::types::{Backend, BackendError, BackendEvent, BackendKind, PlaybackStatus, PolledState};

const TICK: Duration = Duration::from_millis(200);

#[derive(Debug)]
enum EngineCmd {
    Play { path: PathBuf, duration: Duration },
    Pause,
    Resume,
    Stop,
    Seek(Duration),
    SetVolume(f32),
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

type StatusHandle = Arc<Mutex<PolledState>>;

pub struct LocalEngine {
    tx: Sender<EngineCmd>,
    status: StatusHandle,
    fade_out: Duration,
    join: Option<JoinHandle<()>>,
}

impl LocalEngine {
    /// Spawn the audio thread. End-of-track notifications go to `events`.
    pub fn spawn(settings: &AudioSettings, events: Sender<BackendEvent>) -> Self {
        let (tx, rx) = mpsc::channel::<EngineCmd>();
        let status: StatusHandle = Arc::new(Mutex::new(PolledState::default()));

        let status_for_thread = status.clone();
        let join = thread::Builder::new()
            .name("cadenza-audio".into())
            .spawn(move || EngineThread::open(status_for_thread, events).run(rx))
            .map_err(|e| tracing::error!("failed to spawn audio thread: {e}"))
            .ok();

        Self {
            tx,
            status,
            fade_out: Duration::from_millis(settings.quit_fade_out_ms),
            join,
        }
    }

    fn send(&self, cmd: EngineCmd) {
        if self.tx.send(cmd).is_err() {
            tracing::warn!("{}", BackendError::EngineGone);
            if let Ok(mut s) = self.status.lock() {
                s.status = PlaybackStatus::Error;
            }
        }
    }
}

impl Backend for LocalEngine {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn play(&mut self, track: &AudioTrack) {
        self.send(EngineCmd::Play {
            path: track.path.clone(),
            duration: track.duration,
        });
    }

    fn pause(&mut self) {
        self.send(EngineCmd::Pause);
    }

    fn resume(&mut self) {
        self.send(EngineCmd::Resume);
    }

    fn stop(&mut self) {
        self.send(EngineCmd::Stop);
    }

    fn seek_to(&mut self, position: Duration) {
        self.send(EngineCmd::Seek(position));
    }

    fn set_volume(&mut self, level: f32) {
        self.send(EngineCmd::SetVolume(level.clamp(0.0, 1.0)));
    }

    fn poll(&mut self) -> PolledState {
        self.status.lock().map(|s| *s).unwrap_or_default()
    }

    fn release(&mut self) {
        let Some(handle) = self.join.take() else {
            return;
        };
        let _ = self.tx.send(EngineCmd::Quit {
            fade_out_ms: self.fade_out.as_millis() as u64,
        });
        let _ = handle.join();
    }
}

impl Drop for LocalEngine {
    fn drop(&mut self) {
        self.release();
    }
}

struct EngineThread {
    stream: Option<OutputStream>,
    sink: Option<Sink>,
    current: Option<PathBuf>,
    /// Where the current sink started inside the file.
    offset: Duration,
    duration: Duration,
    volume: f32,
    status: PlaybackStatus,
    shared: StatusHandle,
    events: Sender<BackendEvent>,
}

impl EngineThread {
    fn open(shared: StatusHandle, events: Sender<BackendEvent>) -> Self {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(mut stream) => {
                // rodio logs to stderr when OutputStream is dropped; keep it quiet.
                stream.log_on_drop(false);
                Some(stream)
            }
            Err(e) => {
                tracing::error!("{}", BackendError::NoOutput(e.to_string()));
                None
            }
        };

        Self {
            stream,
            sink: None,
            current: None,
            offset: Duration::ZERO,
            duration: Duration::ZERO,
            volume: 1.0,
            status: PlaybackStatus::Idle,
            shared,
            events,
        }
    }

    fn run(mut self, rx: Receiver<EngineCmd>) {
        loop {
            match rx.recv_timeout(TICK) {
                Ok(EngineCmd::Quit { fade_out_ms }) => {
                    if let Some(ref s) = self.sink {
                        fade_out_sink(s, self.volume, fade_out_ms);
                        s.stop();
                    }
                    self.sink = None;
                    self.status = PlaybackStatus::Stopped;
                    self.publish();
                    break;
                }
                Ok(cmd) => self.handle(cmd),
                Err(RecvTimeoutError::Timeout) => self.check_finished(),
                Err(RecvTimeoutError::Disconnected) => break,
            }
            self.publish();
        }
    }

    fn handle(&mut self, cmd: EngineCmd) {
        match cmd {
            EngineCmd::Play { path, duration } => {
                self.duration = duration;
                self.start(path, Duration::ZERO, true);
            }
            EngineCmd::Pause => {
                if let Some(ref s) = self.sink {
                    s.pause();
                    self.status = PlaybackStatus::Paused;
                }
            }
            EngineCmd::Resume => {
                if let Some(ref s) = self.sink {
                    s.play();
                    self.status = PlaybackStatus::Playing;
                }
            }
            EngineCmd::Stop => {
                if let Some(s) = self.sink.take() {
                    s.stop();
                }
                self.offset = Duration::ZERO;
                self.status = PlaybackStatus::Stopped;
            }
            EngineCmd::Seek(position) => {
                // Rebuild the current sink and skip into the file.
                let Some(path) = self.current.clone() else {
                    return;
                };
                if self.sink.is_none() {
                    return;
                }
                let keep_playing = self.status == PlaybackStatus::Playing;
                self.start(path, position, keep_playing);
                if !keep_playing && self.status != PlaybackStatus::Error {
                    self.status = PlaybackStatus::Paused;
                }
            }
            EngineCmd::SetVolume(level) => {
                self.volume = level;
                if let Some(ref s) = self.sink {
                    s.set_volume(level);
                }
            }
            EngineCmd::Quit { .. } => {}
        }
    }

    fn start(&mut self, path: PathBuf, start_at: Duration, play: bool) {
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        self.current = Some(path.clone());
        self.offset = start_at;

        let Some(stream) = self.stream.as_ref() else {
            self.status = PlaybackStatus::Error;
            return;
        };

        match create_sink_at(stream, &path, start_at) {
            Ok((sink, total)) => {
                if self.duration.is_zero() {
                    self.duration = total.unwrap_or_default();
                }
                sink.set_volume(self.volume);
                if play {
                    sink.play();
                }
                self.sink = Some(sink);
                self.status = PlaybackStatus::Playing;
            }
            Err(e) => {
                tracing::warn!("{e}");
                self.status = PlaybackStatus::Error;
            }
        }
    }

    fn check_finished(&mut self) {
        let finished = self.status == PlaybackStatus::Playing
            && self.sink.as_ref().is_some_and(|s| s.empty());
        if !finished {
            return;
        }
        self.sink = None;
        self.offset = self.duration;
        self.status = PlaybackStatus::Stopped;
        self.publish();
        let _ = self.events.send(BackendEvent::Completed {
            backend: BackendKind::Local,
        });
    }

    fn position(&self) -> Duration {
        let played = self.sink.as_ref().map_or(Duration::ZERO, |s| s.get_pos());
        self.offset + played
    }

    fn publish(&self) {
        if let Ok(mut s) = self.shared.lock() {
            s.status = self.status;
            s.position = self.position();
            s.duration = self.duration;
        }
    }
}

fn fade_out_sink(sink: &Sink, from: f32, fade_out_ms: u64) {
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(from * (1.0 - t));
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}
