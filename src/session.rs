//! Persistence of the last folder, track and shuffle flag across restarts.

mod persisted;
mod store;

pub use persisted::{PersistedSession, PersistentSessionStore};
pub use store::{KeyValueStore, MemoryStore, StoreError, TomlFileStore};
