use super::signal::CastSignal;

/// A connection to the casting subsystem.
///
/// The session owns the connectivity signal; the player only observes it.
pub trait CastSession: Send {
    fn signal(&self) -> CastSignal;
    /// Disconnect from the receiver and drop any discovery state.
    fn release(&mut self);
}
