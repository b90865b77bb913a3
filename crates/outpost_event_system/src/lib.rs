//! # Outpost Event System
//!
//! A type-safe, concurrency-safe event dispatch bus for the Outpost plugin
//! ecosystem. Independent subsystems publish immutable event values through
//! the bus; handlers registered for an event's kind are invoked in
//! registration order, with full failure isolation between handlers.
//!
//! ## Core Features
//!
//! - **Type Safety**: events are routed by their structural type; each
//!   handler is bound to its kind at registration time
//! - **Concurrency Safety**: registration and publication may happen from
//!   any number of execution contexts with no external locking
//! - **Failure Isolation**: a handler that errors or panics is logged and
//!   skipped; remaining handlers still observe the event
//! - **Fire-and-Forget Dispatch**: `publish_async` hands delivery to an
//!   independent Tokio task and never blocks the publisher
//!
//! ## Quick Start
//!
//! ```
//! use outpost_event_system::create_event_bus;
//!
//! #[derive(Debug)]
//! struct QueueJoinedEvent {
//!     queue: String,
//! }
//!
//! let events = create_event_bus();
//!
//! events.on("queue_logger", |event: &QueueJoinedEvent| {
//!     println!("player joined queue {}", event.queue);
//!     Ok(())
//! });
//!
//! events.publish(&QueueJoinedEvent { queue: "ranked".to_string() });
//! ```
//!
//! The bus has process-wide relevance but is modeled as an explicitly
//! constructed, explicitly passed-in object rather than ambient global
//! state, keeping lifecycle and testability explicit.

mod bus;
mod events;
mod types;
mod utils;


pub use bus::{BusStats, EventBus};
pub use events::{Event, EventError, EventHandler, TypedEventHandler};
pub use types::{PlayerId, Position, RegionBounds};
pub use utils::{create_event_bus, current_timestamp};
