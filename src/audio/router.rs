//! Routing of playback commands to the local engine or the cast player.

use std::sync::Arc;
use std::time::Duration;

use crate::cast::{CastSignal, StreamPublisher, apply_cast_transition};
use crate::library::AudioTrack;

use super::types::{Backend, BackendKind, PolledState};

struct RemoteRoute {
    backend: Box<dyn Backend>,
    publisher: Arc<dyn StreamPublisher>,
}

/// Single command surface over both backends.
///
/// The active backend is re-evaluated from the cast signal on every call, so
/// a connect or disconnect mid-session takes effect on the next command.
pub struct BackendRouter {
    local: Box<dyn Backend>,
    remote: Option<RemoteRoute>,
    signal: CastSignal,
    remote_active: bool,
}

impl BackendRouter {
    pub fn new(local: Box<dyn Backend>, signal: CastSignal) -> Self {
        Self {
            local,
            remote: None,
            signal,
            remote_active: false,
        }
    }

    /// Attach the cast player and the publisher it streams through.
    pub fn with_remote(mut self, backend: Box<dyn Backend>, publisher: Arc<dyn StreamPublisher>) -> Self {
        self.remote = Some(RemoteRoute { backend, publisher });
        self
    }

    pub fn signal(&self) -> &CastSignal {
        &self.signal
    }

    /// Which backend the next command goes to.
    pub fn active_kind(&mut self) -> BackendKind {
        self.refresh();
        if self.remote_active {
            BackendKind::Remote
        } else {
            BackendKind::Local
        }
    }

    fn refresh(&mut self) {
        let want_remote = self.remote.is_some() && self.signal.is_casting();
        if want_remote == self.remote_active {
            return;
        }

        // Whatever was playing on the old backend must not keep going.
        match (&mut self.remote, self.remote_active) {
            (Some(route), true) => route.backend.stop(),
            _ => self.local.stop(),
        }
        if let Some(route) = &self.remote {
            apply_cast_transition(route.publisher.as_ref(), want_remote);
        }
        self.remote_active = want_remote;
        let backend = if want_remote {
            BackendKind::Remote
        } else {
            BackendKind::Local
        };
        tracing::info!(%backend, "playback backend switched");
    }

    fn active(&mut self) -> &mut dyn Backend {
        self.refresh();
        match (&mut self.remote, self.remote_active) {
            (Some(route), true) => route.backend.as_mut(),
            _ => self.local.as_mut(),
        }
    }

    pub fn play(&mut self, track: &AudioTrack) {
        self.refresh();
        if let (Some(route), true) = (&self.remote, self.remote_active) {
            // The receiver fetches from the publisher, so it has to be up first.
            if let Err(e) = route.publisher.start() {
                tracing::debug!("stream publisher start ignored: {e}");
            }
        }
        self.active().play(track);
    }

    pub fn pause(&mut self) {
        self.active().pause();
    }

    pub fn resume(&mut self) {
        self.active().resume();
    }

    pub fn stop(&mut self) {
        self.active().stop();
    }

    pub fn seek_to(&mut self, position: Duration) {
        self.active().seek_to(position);
    }

    pub fn set_volume(&mut self, level: f32) {
        self.active().set_volume(level);
    }

    pub fn poll(&mut self) -> PolledState {
        self.active().poll()
    }

    /// Release both backends. The router must not be used afterwards.
    pub fn release(&mut self) {
        self.local.release();
        if let Some(route) = self.remote.as_mut() {
            route.backend.release();
        }
    }

    /// Stop the publisher and forget its media, whatever the signal says.
    pub fn shutdown_publisher(&self) {
        if let Some(route) = &self.remote {
            apply_cast_transition(route.publisher.as_ref(), false);
        }
    }
}
