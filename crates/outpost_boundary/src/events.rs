//! Event payloads published by boundary enforcement.

use outpost_event_system::{PlayerId, Position};
use serde::{Deserialize, Serialize};

/// Published when an actor has been moved back to the safe location.
///
/// Emitted for both sweep-time and registration-time corrections, once per
/// corrective relocation. Subscribers typically log the violation or feed
/// moderation tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorRelocatedEvent {
    /// The relocated actor
    pub player_id: PlayerId,
    /// The out-of-bounds position that triggered the correction
    pub position: Position,
    /// Unix timestamp of the correction, in seconds
    pub timestamp: u64,
}
