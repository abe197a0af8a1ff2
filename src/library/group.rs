//! Grouping of a flat track list into folders.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::model::{AudioTrack, Folder, LibrarySnapshot};

/// Group `tracks` by their owning folder.
///
/// Every track lands in exactly one folder; nothing is dropped or duplicated.
/// Folders are sorted case-insensitively by display name.
pub fn group_tracks(tracks: Vec<AudioTrack>) -> LibrarySnapshot {
    let mut tracks_by_folder: HashMap<PathBuf, Vec<AudioTrack>> = HashMap::new();
    for track in tracks {
        tracks_by_folder
            .entry(track.folder.clone())
            .or_default()
            .push(track);
    }

    let mut folders: Vec<Folder> = tracks_by_folder
        .iter()
        .map(|(path, files)| Folder {
            path: path.clone(),
            display_name: Folder::display_name_for(path),
            track_count: files.len(),
            album_art: files.iter().find_map(|t| t.album_art.clone()),
        })
        .collect();

    // Path breaks ties so equal names keep a deterministic order.
    folders.sort_by(|a, b| {
        a.display_name
            .to_lowercase()
            .cmp(&b.display_name.to_lowercase())
            .then_with(|| a.path.cmp(&b.path))
    });

    LibrarySnapshot {
        folders,
        tracks_by_folder,
    }
}

/// Tracks of the folder at `path`, sorted case-insensitively by display name.
/// Unknown paths yield an empty list.
pub fn tracks_for_folder(path: &Path, snapshot: &LibrarySnapshot) -> Vec<AudioTrack> {
    let Some(files) = snapshot.tracks_by_folder.get(path) else {
        return Vec::new();
    };
    let mut files = files.clone();
    files.sort_by_cached_key(|t| t.display_name.to_lowercase());
    files
}
