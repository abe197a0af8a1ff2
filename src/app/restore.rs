use crate::library::{Folder, LibrarySnapshot};
use crate::session::PersistedSession;

/// What to do with a freshly loaded library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestorePlan {
    /// Folder to reopen with its saved track, if it still exists.
    pub folder: Option<Folder>,
    pub shuffle: bool,
    pub show_folder_browser: bool,
}

/// Decides between resuming the last folder and showing the folder chooser.
pub struct SessionRestorer;

impl SessionRestorer {
    /// A saved folder is only reopened when it is among the loaded folders;
    /// a folder that was deleted or is no longer indexed falls back to the chooser.
    pub fn restore(snapshot: &LibrarySnapshot, persisted: &PersistedSession) -> RestorePlan {
        let folder = persisted
            .folder
            .as_deref()
            .and_then(|path| snapshot.folder(path))
            .cloned();

        if let Some(f) = &folder {
            tracing::info!(folder = %f.path.display(), "restoring last folder");
        }

        RestorePlan {
            show_folder_browser: folder.is_none(),
            folder,
            shuffle: persisted.shuffle,
        }
    }
}
