//! Folder-based music player core.
//!
//! The [`app::PlaybackCoordinator`] owns the session and drives either the
//! local `rodio` engine or a cast receiver through [`audio::BackendRouter`].
//! The last folder, track and shuffle flag survive restarts via
//! [`session::PersistentSessionStore`].

pub mod app;
pub mod audio;
pub mod cast;
pub mod config;
pub mod library;
pub mod mpris;
pub mod runtime;
pub mod session;

#[cfg(test)]
mod test_support;
