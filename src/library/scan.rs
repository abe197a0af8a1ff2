use std::collections::HashMap;
use std::fs;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::prelude::*;
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::display::{display_from_fields, mime_type_for};
use super::group::group_tracks;
use super::model::{AudioTrack, LibrarySnapshot};

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("library path not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Source of the track library. Loading may be slow and is expected to run
/// off the coordinator's thread.
pub trait LibraryProvider: Send {
    fn query_tracks(&self) -> Result<LibrarySnapshot, LibraryError>;
}

/// Library backed by a directory tree on disk.
#[derive(Debug, Clone)]
pub struct FsLibrary {
    root: PathBuf,
    settings: LibrarySettings,
}

impl FsLibrary {
    pub fn new(root: impl Into<PathBuf>, settings: LibrarySettings) -> Self {
        Self {
            root: root.into(),
            settings,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl LibraryProvider for FsLibrary {
    fn query_tracks(&self) -> Result<LibrarySnapshot, LibraryError> {
        let meta = fs::metadata(&self.root).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LibraryError::NotFound(self.root.clone()),
            io::ErrorKind::PermissionDenied => LibraryError::PermissionDenied(self.root.clone()),
            _ => LibraryError::Io(e),
        })?;
        if !meta.is_dir() {
            return Err(LibraryError::NotADirectory(self.root.clone()));
        }

        let tracks = scan(&self.root, &self.settings);
        tracing::info!(root = %self.root.display(), tracks = tracks.len(), "library scanned");
        Ok(group_tracks(tracks))
    }
}

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn album_id(artist: &str, album: &str) -> u64 {
    if album.is_empty() {
        return 0;
    }
    let mut hasher = DefaultHasher::new();
    artist.to_lowercase().hash(&mut hasher);
    album.to_lowercase().hash(&mut hasher);
    // Keep 0 reserved for "no album".
    hasher.finish().max(1)
}

fn find_album_art(folder: &Path, names: &[String]) -> Option<PathBuf> {
    names
        .iter()
        .map(|n| folder.join(n))
        .find(|candidate| candidate.is_file())
}

/// Walk `dir` and read every audio file's tags. Unreadable entries are skipped.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<AudioTrack> {
    let mut tracks: Vec<AudioTrack> = Vec::new();
    let mut art_by_folder: HashMap<PathBuf, Option<PathBuf>> = HashMap::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !path.is_file()
            || (!settings.include_hidden && is_hidden(path))
            || !is_audio_file(path, settings)
        {
            continue;
        }

        let mut title: Option<String> = None;
        let mut artist = String::new();
        let mut album = String::new();
        let mut duration = Duration::ZERO;

        if let Ok(tagged) = lofty::read_from_path(path) {
            duration = tagged.properties().duration();

            if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                title = tag.title().map(|v| v.trim().to_string());
                artist = tag.artist().map(|v| v.trim().to_string()).unwrap_or_default();
                album = tag.album().map(|v| v.trim().to_string()).unwrap_or_default();
            }
        }

        let folder = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let album_art = art_by_folder
            .entry(folder.clone())
            .or_insert_with(|| find_album_art(&folder, &settings.album_art_names))
            .clone();

        let display_name = display_from_fields(
            path,
            title.as_deref(),
            Some(artist.as_str()),
            Some(album.as_str()),
            &settings.display_fields,
            &settings.display_separator,
        );

        tracks.push(AudioTrack {
            path: path.to_path_buf(),
            display_name,
            mime_type: mime_type_for(path).to_string(),
            size: entry.metadata().map(|m| m.len()).unwrap_or(0),
            duration,
            album_id: album_id(&artist, &album),
            album_art,
            artist,
            album,
            folder,
        });
    }

    tracks
}
