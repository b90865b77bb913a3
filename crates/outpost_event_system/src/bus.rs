//! # Event Bus Core Implementation
//!
//! The [`EventBus`] routes published events to the handlers registered for
//! their kind. It is the central coordination point between Outpost
//! subsystems: producers publish facts, subscribers react to them, and
//! neither side holds a reference to the other.
//!
//! ## Concurrency
//!
//! Registration and publication may happen concurrently from any number of
//! execution contexts. The handler table is a [`DashMap`] keyed by the
//! event's `TypeId`; publication clones the per-kind handler list and drops
//! the shard guard before invoking anything, so an in-flight publish
//! observes either the pre- or post-mutation list (never a torn one) and
//! a handler may freely subscribe or unsubscribe without deadlocking the
//! bus.
//!
//! ## Failure Isolation
//!
//! A handler that returns an error or panics is logged with the event kind
//! and message, and delivery continues to the remaining handlers. Nothing a
//! handler does can surface to the publisher.

use crate::events::{Event, EventError, EventHandler, TypedEventHandler};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, trace};

/// The process-wide event dispatch bus.
///
/// Constructed explicitly and passed into subsystems rather than living in
/// ambient global state, so lifecycle (construction, shutdown) and
/// testability stay explicit. Share it as `Arc<EventBus>`.
///
/// # Examples
///
/// ```
/// use outpost_event_system::EventBus;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
///
/// #[derive(Debug)]
/// struct GoldAwardedEvent {
///     amount: u32,
/// }
///
/// let bus = EventBus::new();
/// let total = Arc::new(AtomicU32::new(0));
///
/// let tally = total.clone();
/// bus.on("gold_tally", move |event: &GoldAwardedEvent| {
///     tally.fetch_add(event.amount, Ordering::SeqCst);
///     Ok(())
/// });
///
/// bus.publish(&GoldAwardedEvent { amount: 25 });
/// assert_eq!(total.load(Ordering::SeqCst), 25);
/// ```
pub struct EventBus {
    /// Map of event kinds to their registered handlers, in registration order
    handlers: DashMap<TypeId, Vec<Arc<dyn EventHandler>>>,
    /// Cleared on shutdown; checked lock-free on every publish
    active: AtomicBool,
    /// Delivery counters, shared with spawned async delivery tasks
    counters: Arc<BusCounters>,
}

#[derive(Debug, Default)]
struct BusCounters {
    events_published: AtomicU64,
    events_delivered: AtomicU64,
    handler_failures: AtomicU64,
}

impl EventBus {
    /// Creates a new event bus with no registered handlers.
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
            active: AtomicBool::new(true),
            counters: Arc::new(BusCounters::default()),
        }
    }

    /// Registers a closure as a handler for events of kind `E`.
    ///
    /// Convenience wrapper that erases the closure into a
    /// [`TypedEventHandler`] and subscribes it. The returned handler object
    /// is the subscription's identity: pass it to [`unsubscribe`] to remove
    /// this registration.
    ///
    /// Multiple handlers may be registered for the same kind; each is
    /// invoked independently, in registration order.
    ///
    /// # Arguments
    ///
    /// * `label` - Short name for this handler in logs (e.g. "boundary_notifier")
    /// * `handler` - Function invoked with each published event of kind `E`
    ///
    /// [`unsubscribe`]: EventBus::unsubscribe
    pub fn on<E, F>(&self, label: &str, handler: F) -> Arc<dyn EventHandler>
    where
        E: Event,
        F: Fn(&E) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let name = format!("{}::{}", label, E::kind());
        let handler: Arc<dyn EventHandler> = Arc::new(TypedEventHandler::new(name, handler));
        self.subscribe(handler.clone());
        handler
    }

    /// Registers an already-erased handler under its own expected kind.
    ///
    /// The registration key is the handler's [`expected_type_id`], so a
    /// subscription is always the pairing of a kind and a handler. No-op if
    /// the bus has been shut down.
    ///
    /// [`expected_type_id`]: EventHandler::expected_type_id
    pub fn subscribe(&self, handler: Arc<dyn EventHandler>) {
        if !self.active.load(Ordering::Acquire) {
            debug!(
                "ignoring subscription of {} on inactive bus",
                handler.handler_name()
            );
            return;
        }
        debug!("registered handler {}", handler.handler_name());
        self.handlers
            .entry(handler.expected_type_id())
            .or_insert_with(Vec::new)
            .push(handler);
    }

    /// Removes one registration matching `handler` by identity.
    ///
    /// Identity is `Arc` pointer equality: only the exact handler object
    /// returned by [`on`](EventBus::on) (or passed to `subscribe`) matches.
    /// If the same handler object was subscribed more than once, a single
    /// call removes only the first registration. Returns whether a
    /// registration was removed; unknown handlers are a no-op.
    pub fn unsubscribe(&self, handler: &Arc<dyn EventHandler>) -> bool {
        let type_id = handler.expected_type_id();
        let removed = {
            let Some(mut list) = self.handlers.get_mut(&type_id) else {
                return false;
            };
            match list.iter().position(|h| Arc::ptr_eq(h, handler)) {
                Some(index) => {
                    list.remove(index);
                    true
                }
                None => false,
            }
        };
        if removed {
            // Drop the kind's entry once its list empties out.
            self.handlers.remove_if(&type_id, |_, list| list.is_empty());
            debug!("unsubscribed handler {}", handler.handler_name());
        }
        removed
    }

    /// Publishes an event synchronously, in registration order.
    ///
    /// Blocks only for the duration of handler execution. Handler errors
    /// and panics are caught and logged; they never surface here. If the
    /// bus has been shut down, or no handlers are registered for the kind,
    /// this is a cheap no-op.
    pub fn publish<E: Event>(&self, event: &E) {
        if !self.active.load(Ordering::Acquire) {
            return;
        }
        let snapshot = self
            .handlers
            .get(&TypeId::of::<E>())
            .map(|entry| entry.value().clone());
        let Some(snapshot) = snapshot else {
            trace!("no handlers for {}", E::kind());
            return;
        };
        deliver(&snapshot, event, &self.counters);
    }

    /// Publishes an event on an independent task and returns immediately.
    ///
    /// The current handler list is snapshotted at the call site and the
    /// delivery loop runs fire-and-forget on the Tokio runtime; within that
    /// one delivery, handlers still run in registration order. No ordering
    /// is guaranteed relative to other publishes or to the caller's
    /// subsequent code.
    ///
    /// Must be called from within a Tokio runtime context.
    pub fn publish_async<E: Event>(&self, event: E) {
        if !self.active.load(Ordering::Acquire) {
            return;
        }
        let snapshot = self
            .handlers
            .get(&TypeId::of::<E>())
            .map(|entry| entry.value().clone());
        let Some(snapshot) = snapshot else {
            trace!("no handlers for {}", E::kind());
            return;
        };
        let counters = Arc::clone(&self.counters);
        tokio::spawn(async move {
            deliver(&snapshot, &event, &counters);
        });
    }

    /// Returns whether any handler is currently registered for kind `E`.
    ///
    /// Point-in-time: may race with concurrent subscribe/unsubscribe and
    /// report a value that was true only recently.
    pub fn has_handlers<E: Event>(&self) -> bool {
        self.handler_count::<E>() > 0
    }

    /// Returns the number of handlers currently registered for kind `E`.
    pub fn handler_count<E: Event>(&self) -> usize {
        self.handlers
            .get(&TypeId::of::<E>())
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }

    /// Removes every handler registered for kind `E`.
    ///
    /// Returns the number of registrations removed.
    pub fn clear<E: Event>(&self) -> usize {
        let removed = self
            .handlers
            .remove(&TypeId::of::<E>())
            .map(|(_, list)| list.len())
            .unwrap_or(0);
        if removed > 0 {
            debug!("cleared {} handlers for {}", removed, E::kind());
        }
        removed
    }

    /// Removes every registration for every kind.
    pub fn clear_all(&self) -> usize {
        let removed = self.total_handlers();
        self.handlers.clear();
        if removed > 0 {
            debug!("cleared all {} handlers", removed);
        }
        removed
    }

    /// Marks the bus inactive and clears all registrations.
    ///
    /// All subsequent `publish`/`publish_async` calls become silent no-ops,
    /// which lets in-flight producers finish without special-casing
    /// teardown order. Irreversible. The active flag is checked without a
    /// lock, so a publish that started just before shutdown may still
    /// complete delivering to the then-current handlers.
    pub fn shutdown(&self) {
        self.active.store(false, Ordering::Release);
        let removed = self.clear_all();
        info!("event bus shut down, {} handlers dropped", removed);
    }

    /// Returns whether the bus is still accepting publishes.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Returns a snapshot of the bus's delivery statistics.
    pub fn stats(&self) -> BusStats {
        BusStats {
            events_published: self.counters.events_published.load(Ordering::Relaxed),
            events_delivered: self.counters.events_delivered.load(Ordering::Relaxed),
            handler_failures: self.counters.handler_failures.load(Ordering::Relaxed),
            total_handlers: self.total_handlers(),
        }
    }

    fn total_handlers(&self) -> usize {
        self.handlers.iter().map(|entry| entry.value().len()).sum()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("active", &self.is_active())
            .field("total_handlers", &self.total_handlers())
            .finish()
    }
}

/// Runs one delivery pass over a snapshotted handler list.
///
/// Shared by the synchronous and spawned delivery paths. Each handler runs
/// behind `catch_unwind` so neither an `Err` nor a panic can prevent
/// delivery to subsequent handlers.
fn deliver<E: Event>(handlers: &[Arc<dyn EventHandler>], event: &E, counters: &BusCounters) {
    trace!("delivering {} to {} handlers", E::kind(), handlers.len());
    for handler in handlers {
        let outcome = catch_unwind(AssertUnwindSafe(|| handler.handle(event.as_any())));
        match outcome {
            Ok(Ok(())) => {
                counters.events_delivered.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(e)) => {
                counters.handler_failures.fetch_add(1, Ordering::Relaxed);
                error!(
                    "handler {} failed for {}: {}",
                    handler.handler_name(),
                    E::kind(),
                    e
                );
            }
            Err(payload) => {
                counters.handler_failures.fetch_add(1, Ordering::Relaxed);
                let e = EventError::HandlerPanic(panic_message(payload));
                error!(
                    "handler {} failed for {}: {}",
                    handler.handler_name(),
                    E::kind(),
                    e
                );
            }
        }
    }
    counters.events_published.fetch_add(1, Ordering::Relaxed);
}

/// Recovers a printable message from a panic payload.
fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Statistics about the bus's delivery activity.
///
/// Useful for monitoring system health and understanding event traffic
/// patterns. Counters are approximate under concurrency (relaxed atomics).
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BusStats {
    /// Number of publish calls that found at least one handler
    pub events_published: u64,
    /// Number of successful handler invocations
    pub events_delivered: u64,
    /// Number of handler invocations that errored or panicked
    pub handler_failures: u64,
    /// Number of currently registered handlers across all kinds
    pub total_handlers: usize,
}
