//! # Outpost Boundary Enforcement
//!
//! Keeps tracked actors inside the permitted spatial region. A
//! world-update context drives [`BoundaryManager::tick`] at a fixed
//! cadence; the manager rate-limits its own sweeps, skips actors holding
//! the bypass permission, and opens a time-bounded grace window after each
//! corrective relocation so an actor hovering near the region edge is not
//! relocated every sweep.
//!
//! The manager talks to the game world only through the [`ActorHandle`]
//! and [`PositionSource`] collaborator traits and reads its configuration
//! live through [`SettingsSource`] on every tick, so settings changes
//! apply on the next sweep. When an [`EventBus`](outpost_event_system::EventBus) is attached,
//! each relocation publishes an [`ActorRelocatedEvent`].
//!
//! ## Wiring Example
//!
//! ```
//! use outpost_boundary::{BoundaryManager, BoundarySettings, SharedSettings};
//! use std::sync::Arc;
//!
//! let settings = Arc::new(SharedSettings::new(BoundarySettings::default()));
//! let manager = BoundaryManager::new(settings.clone());
//!
//! // The hosting runtime registers actors as they connect and calls
//! // manager.tick() from its world-update loop.
//! assert_eq!(manager.tracked_count(), 0);
//! ```

mod actor;
mod error;
mod events;
mod manager;
mod settings;

pub use actor::{ActorHandle, PositionSource};
pub use error::BoundaryError;
pub use events::ActorRelocatedEvent;
pub use manager::{BoundaryManager, DEFAULT_GRACE_PERIOD};
pub use settings::{BoundarySettings, SettingsSource, SharedSettings};
