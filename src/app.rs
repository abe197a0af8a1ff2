//! Application core: the session state, the coordinator that drives the
//! backends and the restore logic applied when a library finishes loading.

mod coordinator;
mod model;
mod poll;
mod restore;

pub use coordinator::PlaybackCoordinator;
pub use model::{NO_FOLDER_SELECTED, SessionState, SessionView};
pub use restore::{RestorePlan, SessionRestorer};
