//! Handler abstractions bridging typed closures and the erased dispatch path.

use crate::events::{CancelFlag, Event, EventError};
use std::any::TypeId;
use std::sync::Arc;
use tracing::warn;

/// Uniform interface the bus calls during dispatch.
///
/// Users rarely implement this directly; [`EventBus::register`] and
/// [`Subscription::new`] wrap plain closures in a [`TypedEventHandler`].
///
/// [`EventBus::register`]: crate::EventBus::register
/// [`Subscription::new`]: crate::Subscription::new
pub trait EventHandler: Send + Sync + 'static {
    /// Handles one event instance.
    fn handle(&self, event: &dyn Event) -> Result<(), EventError>;

    /// The exact event type this handler expects.
    fn expected_type_id(&self) -> TypeId;

    /// Human-readable name for logs.
    fn handler_name(&self) -> &str;
}

/// Type-safe wrapper binding a closure to a concrete event type.
///
/// Bridges between the erased [`EventHandler`] trait and a specific event
/// type: dispatch downcasts the incoming event and skips (with a warning)
/// on a mismatch, which cannot happen through the bus itself because buckets
/// are keyed by `TypeId`.
pub struct TypedEventHandler<E, F>
where
    E: Event,
    F: Fn(&E) -> Result<(), EventError> + Send + Sync + 'static,
{
    handler: F,
    name: String,
    _phantom: std::marker::PhantomData<fn(&E)>,
}

impl<E, F> TypedEventHandler<E, F>
where
    E: Event,
    F: Fn(&E) -> Result<(), EventError> + Send + Sync + 'static,
{
    /// Creates a new typed handler with a name used in logs.
    pub fn new(name: String, handler: F) -> Self {
        Self {
            handler,
            name,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<E, F> std::fmt::Debug for TypedEventHandler<E, F>
where
    E: Event,
    F: Fn(&E) -> Result<(), EventError> + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedEventHandler")
            .field("name", &self.name)
            .finish()
    }
}

impl<E, F> EventHandler for TypedEventHandler<E, F>
where
    E: Event,
    F: Fn(&E) -> Result<(), EventError> + Send + Sync + 'static,
{
    fn handle(&self, event: &dyn Event) -> Result<(), EventError> {
        match event.as_any().downcast_ref::<E>() {
            Some(event) => (self.handler)(event),
            None => {
                warn!(
                    "handler '{}' received an event that is not a '{}', skipping",
                    self.name,
                    E::type_name()
                );
                Ok(())
            }
        }
    }

    fn expected_type_id(&self) -> TypeId {
        TypeId::of::<E>()
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

/// Wrapper synthesized for `ignore_cancelled` subscriptions.
///
/// Consults the event's cancelled flag immediately before invoking the inner
/// handler, so a handler earlier in the same dispatch pass can suppress it.
pub(crate) struct CancelAwareHandler {
    inner: Arc<dyn EventHandler>,
}

impl CancelAwareHandler {
    pub(crate) fn new(inner: Arc<dyn EventHandler>) -> Self {
        Self { inner }
    }
}

impl EventHandler for CancelAwareHandler {
    fn handle(&self, event: &dyn Event) -> Result<(), EventError> {
        if event.cancel_flag().is_some_and(CancelFlag::is_cancelled) {
            return Ok(());
        }
        self.inner.handle(event)
    }

    fn expected_type_id(&self) -> TypeId {
        self.inner.expected_type_id()
    }

    fn handler_name(&self) -> &str {
        self.inner.handler_name()
    }
}
