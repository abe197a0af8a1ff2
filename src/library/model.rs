use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One playable file from the library. Identity is the `path`.
#[derive(Debug, Clone)]
pub struct AudioTrack {
    pub path: PathBuf,
    pub display_name: String,
    pub mime_type: String,
    pub size: u64,
    pub duration: Duration,
    /// Stable id derived from artist and album; 0 when the album is unknown.
    pub album_id: u64,
    pub album_art: Option<PathBuf>,
    pub artist: String,
    pub album: String,
    pub folder: PathBuf,
}

impl PartialEq for AudioTrack {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for AudioTrack {}

/// A directory holding at least one track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub path: PathBuf,
    pub display_name: String,
    pub track_count: usize,
    pub album_art: Option<PathBuf>,
}

impl Folder {
    /// Final path segment, or the whole path when it has none (e.g. `/` or ``).
    pub fn display_name_for(path: &Path) -> String {
        path.file_name()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string())
    }
}

/// Tracks grouped by folder, as produced by one library load.
#[derive(Debug, Clone, Default)]
pub struct LibrarySnapshot {
    /// Sorted case-insensitively by display name.
    pub folders: Vec<Folder>,
    pub tracks_by_folder: HashMap<PathBuf, Vec<AudioTrack>>,
}

impl LibrarySnapshot {
    pub fn folder(&self, path: &Path) -> Option<&Folder> {
        self.folders.iter().find(|f| f.path == path)
    }

    pub fn track_count(&self) -> usize {
        self.tracks_by_folder.values().map(Vec::len).sum()
    }

    pub fn tracks_for_folder(&self, path: &Path) -> Vec<AudioTrack> {
        super::group::tracks_for_folder(path, self)
    }
}
