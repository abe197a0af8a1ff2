//! Playback backends and the router in front of them.
//!
//! `LocalEngine` plays through `rodio` on a dedicated thread, the cast player
//! (see `crate::cast`) streams to a receiver, and `BackendRouter` hides which
//! one is active. `ShuffleTracker` provides the no-repeat shuffle order.

mod local;
mod router;
mod shuffle;
mod sink;
mod types;

pub use local::LocalEngine;
pub use router::BackendRouter;
pub use shuffle::ShuffleTracker;
pub use types::*;
