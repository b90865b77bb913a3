//! # Utility Functions
//!
//! Convenience helpers shared across the Outpost subsystems: consistent
//! timestamp generation and a factory for the shared bus instance.

use crate::bus::EventBus;
use std::sync::Arc;

/// Returns the current Unix timestamp in seconds.
///
/// All event payloads should use this function for timestamp generation to
/// ensure consistency.
///
/// # Panics
///
/// Panics if the system clock is set to a time before the Unix epoch
/// (January 1, 1970). This should never happen in practice on modern systems.
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs()
}

/// Creates a new shared event bus instance.
///
/// The returned bus is fully initialized and ready to accept handler
/// registrations and publishes. It can be safely shared across threads and
/// stored in any subsystem that needs to publish or subscribe.
pub fn create_event_bus() -> Arc<EventBus> {
    Arc::new(EventBus::new())
}
