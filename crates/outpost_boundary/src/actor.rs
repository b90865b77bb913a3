//! Collaborator contracts consumed by the boundary loop.
//!
//! The manager never talks to the game world directly; it goes through
//! these capability traits, which the hosting runtime implements per actor.
//! All calls are in-process and must not block on I/O; `tick()` runs to
//! completion inside the world-update cadence.

use crate::error::BoundaryError;
use outpost_event_system::Position;

/// Source of an actor's current world position.
///
/// `Ok(None)` means the position cannot currently be determined (the actor
/// is mid-transfer, in limbo, or otherwise unlocated); the boundary check
/// skips the actor for that sweep. `Err` means the query itself failed,
/// typically because the handle went stale after a disconnect.
pub trait PositionSource: Send + Sync {
    /// Returns the actor's current position, if it can be determined.
    fn position(&self) -> Result<Option<Position>, BoundaryError>;
}

/// Handle to a tracked actor: permission state and corrective actions.
pub trait ActorHandle: Send + Sync {
    /// Returns whether this actor is exempt from boundary enforcement.
    fn has_bypass(&self) -> Result<bool, BoundaryError>;

    /// Performs a corrective move to the designated safe location.
    ///
    /// Where the safe location is and how the move happens are the world
    /// runtime's concern; the boundary loop only decides *when* to move.
    fn relocate(&self) -> Result<(), BoundaryError>;
}
