//! Casting: the connectivity signal, the remote backend and the HTTP publisher
//! that serves local files to the receiver.

mod observer;
mod publisher;
mod remote;
mod session;
mod signal;

pub use observer::CastObserver;
pub use publisher::{HttpStreamPublisher, PublisherError, StreamPublisher, apply_cast_transition};
pub use remote::{CastError, CastPlayer, RemoteMedia, RemoteSink, RemoteState, RemoteStatus};
pub use session::CastSession;
pub use signal::CastSignal;
