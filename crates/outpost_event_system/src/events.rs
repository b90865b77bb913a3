//! # Event Traits and Core Infrastructure
//!
//! The building blocks of the dispatch bus: the [`Event`] marker trait, the
//! type-erased [`EventHandler`] invocation interface, and the
//! [`TypedEventHandler`] wrapper that re-establishes the concrete event type
//! at delivery time.
//!
//! Events are routed by their structural type: the dispatch key is
//! `TypeId::of::<E>()`, and each registered handler closes over the event
//! type it was registered for. The bus never inspects a runtime value to
//! guess a type.

use std::any::{Any, TypeId};
use std::fmt::Debug;
use thiserror::Error;

/// Core trait that all events must implement.
///
/// An event is an immutable value representing a fact that occurred. It is
/// identified by its *kind* (its structural type) and carries only the
/// fields relevant to that fact. Events never mutate after construction.
///
/// A blanket implementation covers every `Send + Sync + Debug + 'static`
/// type, so plain data structs are events without further ceremony:
///
/// ```
/// use outpost_event_system::Event;
///
/// #[derive(Debug)]
/// struct MatchStartedEvent {
///     round: u32,
/// }
///
/// // MatchStartedEvent implements Event automatically.
/// assert!(<MatchStartedEvent as Event>::kind().contains("MatchStartedEvent"));
/// ```
pub trait Event: Send + Sync + Debug + Any {
    /// Returns the kind name of this event for logging and diagnostics.
    ///
    /// This is a stable, human-readable identifier for the event type. It is
    /// not the dispatch key; routing uses the `TypeId`.
    fn kind() -> &'static str
    where
        Self: Sized;

    /// Returns a reference to this event as `&dyn Any` for dynamic typing.
    fn as_any(&self) -> &dyn Any;
}

impl<T> Event for T
where
    T: Send + Sync + Debug + Any,
{
    fn kind() -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Errors surfaced by handler execution.
///
/// These never propagate out of a publish call; the bus catches them, logs
/// the event kind and message, and continues delivery to the remaining
/// handlers.
#[derive(Debug, Error)]
pub enum EventError {
    /// Handler execution failed during event processing
    #[error("handler execution error: {0}")]
    HandlerExecution(String),
    /// Handler panicked; the payload was recovered for logging
    #[error("handler panicked: {0}")]
    HandlerPanic(String),
    /// A handler received an event of a kind it was not registered for
    #[error("event type mismatch: handler expects {expected}")]
    TypeMismatch {
        /// Kind name the handler was registered for
        expected: &'static str,
    },
}

/// Handler trait for processing events.
///
/// This trait abstracts over the type-specific handling logic and provides a
/// uniform interface for the bus to call handlers. Most users will not
/// implement this directly but go through [`EventBus::on`](crate::EventBus::on),
/// which wraps a closure in a [`TypedEventHandler`].
pub trait EventHandler: Send + Sync {
    /// Handles a type-erased event.
    ///
    /// The value behind `event` is guaranteed by the bus to be of the kind
    /// this handler was registered under; the implementation downcasts to
    /// recover it.
    fn handle(&self, event: &dyn Any) -> Result<(), EventError>;

    /// Returns the `TypeId` of the event kind this handler expects.
    ///
    /// This is the registration key: `subscribe` files the handler under
    /// this id, and publication looks handlers up by it.
    fn expected_type_id(&self) -> TypeId;

    /// Returns the kind name this handler expects, for logging.
    fn event_kind(&self) -> &'static str;

    /// Returns a human-readable name for this handler for debugging.
    fn handler_name(&self) -> &str;
}

/// Type-safe wrapper for event handlers.
///
/// Bridges between the generic [`EventHandler`] trait and a specific event
/// type, providing compile-time type safety while allowing runtime
/// polymorphism. The concrete type is bound at registration time and
/// re-established on delivery by downcast.
pub struct TypedEventHandler<E, F>
where
    E: Event,
    F: Fn(&E) -> Result<(), EventError> + Send + Sync,
{
    handler: F,
    name: String,
    _phantom: std::marker::PhantomData<fn(&E)>,
}

impl<E, F> TypedEventHandler<E, F>
where
    E: Event,
    F: Fn(&E) -> Result<(), EventError> + Send + Sync,
{
    /// Creates a new typed event handler.
    ///
    /// # Arguments
    ///
    /// * `name` - Human-readable name for debugging
    /// * `handler` - Function to handle events of type E
    pub fn new(name: String, handler: F) -> Self {
        Self {
            handler,
            name,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<E, F> EventHandler for TypedEventHandler<E, F>
where
    E: Event,
    F: Fn(&E) -> Result<(), EventError> + Send + Sync,
{
    fn handle(&self, event: &dyn Any) -> Result<(), EventError> {
        let event = event
            .downcast_ref::<E>()
            .ok_or(EventError::TypeMismatch { expected: E::kind() })?;
        (self.handler)(event)
    }

    fn expected_type_id(&self) -> TypeId {
        TypeId::of::<E>()
    }

    fn event_kind(&self) -> &'static str {
        E::kind()
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}
