//! Error types for boundary enforcement.

use outpost_event_system::PlayerId;
use thiserror::Error;

/// Errors raised by the world-facing collaborators during a boundary check.
///
/// These are expected, recoverable conditions: a sweep that hits one treats
/// the affected actor's check as a no-op and moves on. Nothing here is
/// fatal to the manager.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// The actor's handle went stale, typically after a disconnect
    #[error("actor {0} is unreachable")]
    ActorUnreachable(PlayerId),
    /// The world runtime failed to answer a position or permission query
    #[error("world query failed: {0}")]
    WorldQuery(String),
}
