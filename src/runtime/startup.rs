use std::env;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;

use crate::config;
use crate::library::{FsLibrary, LibraryError, LibraryProvider, LibrarySnapshot};
use crate::session::{KeyValueStore, MemoryStore, PersistentSessionStore, TomlFileStore};

pub type LoadResult = Result<LibrarySnapshot, LibraryError>;

/// Library directory: first CLI argument, then `library.root`, then the
/// working directory.
pub fn library_root(settings: &config::Settings) -> PathBuf {
    env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| settings.library.root.clone())
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("Music"))
}

/// Open the session file, or keep the session in memory when it cannot be used.
pub fn open_session_store(settings: &config::Settings) -> PersistentSessionStore {
    let path = settings
        .session
        .path
        .clone()
        .or_else(config::default_session_path);

    let store: Box<dyn KeyValueStore> = match path.map(TomlFileStore::open) {
        Some(Ok(store)) => {
            tracing::debug!(path = %store.path().display(), "session store opened");
            Box::new(store)
        }
        Some(Err(e)) => {
            tracing::warn!("session will not be saved: {e}");
            Box::new(MemoryStore::new())
        }
        None => {
            tracing::warn!("no session path available, session will not be saved");
            Box::new(MemoryStore::new())
        }
    };
    PersistentSessionStore::new(store)
}

/// Scan the library on a worker thread and send the result back once.
pub fn spawn_library_load(library: FsLibrary, tx: Sender<LoadResult>) -> std::io::Result<()> {
    thread::Builder::new()
        .name("cadenza-library".into())
        .spawn(move || {
            tracing::info!(root = %library.root().display(), "scanning library");
            let _ = tx.send(library.query_tracks());
        })?;
    Ok(())
}
