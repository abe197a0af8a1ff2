use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/cadenza/config.toml` or `~/.config/cadenza/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `CADENZA__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub playback: PlaybackSettings,
    pub library: LibrarySettings,
    pub session: SessionSettings,
    pub cast: CastSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            quit_fade_out_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// How often the active backend is polled for status and position (milliseconds).
    pub poll_interval_ms: u64,
    /// Increment applied by volume up/down.
    pub volume_step: f32,
    /// Volume used until the user changes it.
    pub initial_volume: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            volume_step: 0.1,
            initial_volume: 0.5,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    /// File name including its extension.
    #[serde(alias = "file_name", alias = "file-name")]
    Filename,
    /// File name without its extension.
    Stem,
    Title,
    Artist,
    Album,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Directory scanned when none is given on the command line.
    pub root: Option<PathBuf>,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,

    /// Which fields build `AudioTrack::display_name`, which also drives ordering.
    ///
    /// Example: ["artist", "title"] -> "Artist - Title"
    pub display_fields: Vec<TrackDisplayField>,
    /// Separator used to join `display_fields`.
    pub display_separator: String,
    /// Image file names looked up next to a track and used as its album art.
    pub album_art_names: Vec<String>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            root: None,
            extensions: ["mp3", "flac", "wav", "ogg", "m4a", "opus"]
                .into_iter()
                .map(String::from)
                .collect(),
            follow_links: true,
            include_hidden: false,
            recursive: true,
            max_depth: None,
            display_fields: vec![TrackDisplayField::Filename],
            display_separator: " - ".to_string(),
            album_art_names: ["cover.jpg", "cover.png", "folder.jpg", "folder.png", "front.jpg"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Where the last folder/track/shuffle state is kept.
    /// Defaults to `$XDG_STATE_HOME/cadenza/session.toml`.
    pub path: Option<PathBuf>,
}

/// Media server settings, read by `HttpStreamPublisher::new`.
///
/// Only used when an embedding application attaches a cast receiver. The
/// headless binary plays locally and never starts the media server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CastSettings {
    /// Interface the media server listens on while casting.
    pub bind_address: String,
    /// Port for the media server; 0 picks a free one.
    pub port: u16,
    /// Host written into published media URLs, as seen by the cast receiver.
    pub advertise_host: String,
}

impl Default for CastSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 0,
            advertise_host: "127.0.0.1".to_string(),
        }
    }
}
