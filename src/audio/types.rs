//! Audio-related small types shared by both playback backends.
//!
//! This module defines the status enum, the polled playback snapshot, the
//! backend events and the `Backend` trait that the router dispatches to.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::library::AudioTrack;

/// Playback status as observed from a backend and republished by the coordinator.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Nothing loaded or played yet.
    #[default]
    Idle,
    Playing,
    Paused,
    Stopped,
    /// The backend failed to play the current track.
    Error,
}

/// One answer to a position poll.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PolledState {
    pub status: PlaybackStatus,
    pub position: Duration,
    pub duration: Duration,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Remote,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Remote => f.write_str("remote"),
        }
    }
}

/// Notifications sent from a backend back to whoever owns the coordinator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendEvent {
    /// The current track played to its end.
    Completed { backend: BackendKind },
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("no audio output device: {0}")]
    NoOutput(String),
    #[error("audio engine thread is gone")]
    EngineGone,
}

/// Uniform command surface implemented by the local engine and the cast player.
///
/// Commands never fail loudly: a track that cannot be played is reported by
/// `poll` returning [`PlaybackStatus::Error`].
pub trait Backend: Send {
    fn kind(&self) -> BackendKind;
    fn play(&mut self, track: &AudioTrack);
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    fn seek_to(&mut self, position: Duration);
    /// `level` is in `0.0..=1.0`.
    fn set_volume(&mut self, level: f32);
    fn poll(&mut self) -> PolledState;
    fn release(&mut self);
}
