use std::path::{Path, PathBuf};

use super::store::{KeyValueStore, StoreError};

const KEY_FOLDER_PATH: &str = "selected_folder_path";
const KEY_LAST_TRACK_INDEX: &str = "last_track_index";
const KEY_SHUFFLE_ENABLED: &str = "shuffle_enabled";

/// What survives a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedSession {
    pub folder: Option<PathBuf>,
    pub last_track_index: Option<usize>,
    pub shuffle: bool,
}

/// Typed view over a [`KeyValueStore`] holding the last session.
///
/// Writes are best effort: a failing store is logged and otherwise ignored so
/// that playback never stops over a full disk.
pub struct PersistentSessionStore {
    store: Box<dyn KeyValueStore>,
}

impl PersistentSessionStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> PersistedSession {
        PersistedSession {
            folder: self.folder_path(),
            last_track_index: self.last_track_index(),
            shuffle: self.shuffle_enabled(),
        }
    }

    pub fn folder_path(&self) -> Option<PathBuf> {
        self.store.get_string(KEY_FOLDER_PATH).map(PathBuf::from)
    }

    /// Paths that are not valid UTF-8 cannot be stored as they are; the saved
    /// folder is dropped instead so a restart shows the folder chooser.
    pub fn save_folder_path(&mut self, path: &Path) {
        let Some(text) = path.to_str() else {
            tracing::warn!(path = %path.display(), "folder path is not UTF-8, not remembering it");
            self.clear_folder();
            return;
        };
        let res = self.store.set_string(KEY_FOLDER_PATH, text);
        log_failure("folder", res);
    }

    /// Negative or missing values mean nothing was played.
    pub fn last_track_index(&self) -> Option<usize> {
        self.store
            .get_int(KEY_LAST_TRACK_INDEX)
            .and_then(|i| usize::try_from(i).ok())
    }

    pub fn save_last_track_index(&mut self, index: usize) {
        let value = i64::try_from(index).unwrap_or(i64::MAX);
        let res = self.store.set_int(KEY_LAST_TRACK_INDEX, value);
        log_failure("track index", res);
    }

    pub fn shuffle_enabled(&self) -> bool {
        self.store.get_bool(KEY_SHUFFLE_ENABLED).unwrap_or(false)
    }

    pub fn save_shuffle_enabled(&mut self, enabled: bool) {
        let res = self.store.set_bool(KEY_SHUFFLE_ENABLED, enabled);
        log_failure("shuffle flag", res);
    }

    /// Forget the folder and the track played in it.
    pub fn clear_folder(&mut self) {
        let res = self
            .store
            .remove(KEY_FOLDER_PATH)
            .and_then(|()| self.store.remove(KEY_LAST_TRACK_INDEX));
        log_failure("folder reset", res);
    }
}

fn log_failure(what: &str, res: Result<(), StoreError>) {
    if let Err(e) = res {
        tracing::warn!("could not persist {what}: {e}");
    }
}
