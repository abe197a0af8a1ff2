//! The remote playback backend: a cast receiver fed over HTTP.

use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use thiserror::Error;

use crate::audio::{Backend, BackendEvent, BackendKind, PlaybackStatus, PolledState};
use crate::library::AudioTrack;

use super::publisher::StreamPublisher;

#[derive(Debug, Error)]
pub enum CastError {
    #[error("cast session disconnected")]
    Disconnected,
    #[error("receiver rejected request: {0}")]
    Rejected(String),
}

/// What the receiver is asked to load.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteMedia {
    pub url: String,
    pub mime_type: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub art_url: Option<String>,
    pub duration: Duration,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RemoteState {
    Idle,
    Buffering,
    Playing,
    Paused,
    /// The loaded media played to its end.
    Finished,
    Failed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RemoteStatus {
    pub state: RemoteState,
    pub position: Duration,
    pub duration: Duration,
}

/// Control channel to a cast receiver. The wire protocol is up to the implementor.
pub trait RemoteSink: Send {
    fn load(&mut self, media: &RemoteMedia) -> Result<(), CastError>;
    fn pause(&mut self) -> Result<(), CastError>;
    fn resume(&mut self) -> Result<(), CastError>;
    fn stop(&mut self) -> Result<(), CastError>;
    fn seek(&mut self, position: Duration) -> Result<(), CastError>;
    fn set_volume(&mut self, level: f32) -> Result<(), CastError>;
    fn status(&mut self) -> Result<RemoteStatus, CastError>;
    fn release(&mut self);
}

/// [`Backend`] that plays tracks on a cast receiver.
pub struct CastPlayer {
    sink: Box<dyn RemoteSink>,
    publisher: Arc<dyn StreamPublisher>,
    events: Sender<BackendEvent>,
    last: PolledState,
    failed: bool,
    completion_sent: bool,
}

impl CastPlayer {
    pub fn new(
        sink: Box<dyn RemoteSink>,
        publisher: Arc<dyn StreamPublisher>,
        events: Sender<BackendEvent>,
    ) -> Self {
        Self {
            sink,
            publisher,
            events,
            last: PolledState::default(),
            failed: false,
            completion_sent: false,
        }
    }

    fn fail(&mut self, what: &str, err: impl std::fmt::Display) {
        tracing::warn!("cast {what} failed: {err}");
        self.failed = true;
        self.last.status = PlaybackStatus::Error;
    }

    fn command(&mut self, what: &str, res: Result<(), CastError>) -> bool {
        match res {
            Ok(()) => true,
            Err(CastError::Disconnected) => {
                self.fail(what, CastError::Disconnected);
                false
            }
            Err(e) => {
                tracing::warn!("cast {what} rejected: {e}");
                false
            }
        }
    }
}

impl Backend for CastPlayer {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    fn play(&mut self, track: &AudioTrack) {
        self.failed = false;
        self.completion_sent = false;
        self.last = PolledState {
            status: PlaybackStatus::Playing,
            position: Duration::ZERO,
            duration: track.duration,
        };

        let url = match self.publisher.register(&track.path) {
            Ok(url) => url,
            Err(e) => return self.fail("publish", e),
        };
        // Art is optional; a failed registration just leaves it out.
        let art_url = track
            .album_art
            .as_deref()
            .and_then(|art| self.publisher.register(art).ok());
        let media = RemoteMedia {
            url,
            mime_type: track.mime_type.clone(),
            title: track.display_name.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            art_url,
            duration: track.duration,
        };
        if let Err(e) = self.sink.load(&media) {
            self.fail("load", e);
        }
    }

    fn pause(&mut self) {
        let res = self.sink.pause();
        if self.command("pause", res) {
            self.last.status = PlaybackStatus::Paused;
        }
    }

    fn resume(&mut self) {
        let res = self.sink.resume();
        if self.command("resume", res) {
            self.last.status = PlaybackStatus::Playing;
        }
    }

    fn stop(&mut self) {
        let res = self.sink.stop();
        if self.command("stop", res) {
            self.last.status = PlaybackStatus::Stopped;
        }
    }

    fn seek_to(&mut self, position: Duration) {
        let res = self.sink.seek(position);
        if self.command("seek", res) {
            self.last.position = position;
        }
    }

    fn set_volume(&mut self, level: f32) {
        let res = self.sink.set_volume(level.clamp(0.0, 1.0));
        self.command("volume", res);
    }

    fn poll(&mut self) -> PolledState {
        if self.failed {
            return self.last;
        }

        let remote = match self.sink.status() {
            Ok(s) => s,
            Err(e) => {
                self.fail("status", e);
                return self.last;
            }
        };

        let status = match remote.state {
            RemoteState::Idle => PlaybackStatus::Idle,
            RemoteState::Buffering | RemoteState::Playing => PlaybackStatus::Playing,
            RemoteState::Paused => PlaybackStatus::Paused,
            RemoteState::Finished => PlaybackStatus::Stopped,
            RemoteState::Failed => PlaybackStatus::Error,
        };
        self.last = PolledState {
            status,
            position: remote.position,
            // Receivers report 0 until the stream header is parsed.
            duration: if remote.duration.is_zero() {
                self.last.duration
            } else {
                remote.duration
            },
        };

        if remote.state == RemoteState::Finished && !self.completion_sent {
            self.completion_sent = true;
            let _ = self.events.send(BackendEvent::Completed {
                backend: BackendKind::Remote,
            });
        }
        self.last
    }

    fn release(&mut self) {
        self.sink.release();
    }
}
