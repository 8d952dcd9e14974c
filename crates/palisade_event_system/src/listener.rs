//! # Declarative Listener Registration
//!
//! Lets an arbitrary object declare event handlers without implementing a
//! handler interface per event type. A listener describes its handler methods
//! as [`Subscription`]s, each tagged with a [`Listen`] marker carrying the
//! priority band and the `ignore_cancelled` flag; the bus translates those
//! descriptions into ordinary handlers once, at registration time. Nothing on
//! the hot dispatch path inspects the listener again.
//!
//! Parameter shape is enforced by the type system: a subscription binds
//! exactly one closure taking exactly one event reference. The remaining
//! runtime configuration error, `ignore_cancelled` on an event type without a
//! cancelled flag, is rejected synchronously when the listener is registered.

use crate::events::{Event, EventError, ListenOrder};
use crate::handlers::{EventHandler, TypedEventHandler};
use std::any::TypeId;
use std::sync::Arc;

/// Marker attached to one handler method of a listener.
///
/// # Examples
///
/// ```rust
/// use palisade_event_system::{Listen, ListenOrder};
///
/// let marker = Listen::order(ListenOrder::Early).ignore_cancelled();
/// assert!(marker.ignore_cancelled);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Listen {
    /// Priority band the handler runs in.
    pub order: ListenOrder,
    /// Skip invocation when the event has already been cancelled.
    pub ignore_cancelled: bool,
}

impl Listen {
    /// Marker for the given band, not skipping cancelled events.
    pub fn order(order: ListenOrder) -> Self {
        Self {
            order,
            ignore_cancelled: false,
        }
    }

    /// Requests that the handler be skipped once the event is cancelled.
    ///
    /// Only valid for cancellable event types; registration fails otherwise.
    pub fn ignore_cancelled(mut self) -> Self {
        self.ignore_cancelled = true;
        self
    }
}

/// One marker-tagged handler binding produced by a listener.
///
/// Created by [`Subscription::new`], which captures the event type, its
/// cancellability and an erased handler in one step.
pub struct Subscription {
    pub(crate) listen: Listen,
    pub(crate) event_type: TypeId,
    pub(crate) event_name: &'static str,
    pub(crate) cancellable: bool,
    pub(crate) handler: Arc<dyn EventHandler>,
}

impl Subscription {
    /// Binds `method` to events of type `E` under the given marker.
    ///
    /// `name` identifies the binding in logs and errors; by convention it is
    /// the `listener::method` pair.
    pub fn new<E, F>(listen: Listen, name: impl Into<String>, method: F) -> Self
    where
        E: Event,
        F: Fn(&E) -> Result<(), EventError> + Send + Sync + 'static,
    {
        Self {
            listen,
            event_type: TypeId::of::<E>(),
            event_name: E::type_name(),
            cancellable: E::cancellable(),
            handler: Arc::new(TypedEventHandler::new(name.into(), method)),
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("listen", &self.listen)
            .field("event", &self.event_name)
            .field("handler", &self.handler.handler_name())
            .finish()
    }
}

/// An object that declares event handlers for the bus.
///
/// # Examples
///
/// ```rust
/// use palisade_event_system::{
///     impl_event, Listen, ListenOrder, Listener, Subscription,
/// };
/// use std::sync::Arc;
///
/// #[derive(Debug)]
/// struct TickEvent {
///     number: u64,
/// }
/// impl_event!(TickEvent);
///
/// struct TickCounter;
///
/// impl TickCounter {
///     fn on_tick(&self, event: &TickEvent) {
///         let _ = event.number;
///     }
/// }
///
/// impl Listener for TickCounter {
///     fn name(&self) -> &str {
///         "tick_counter"
///     }
///
///     fn subscriptions(self: Arc<Self>) -> Vec<Subscription> {
///         let this = Arc::clone(&self);
///         vec![Subscription::new(
///             Listen::order(ListenOrder::Monitor),
///             "tick_counter::on_tick",
///             move |event: &TickEvent| {
///                 this.on_tick(event);
///                 Ok(())
///             },
///         )]
///     }
/// }
/// ```
pub trait Listener: Send + Sync + 'static {
    /// Name used in logs when the listener is attached.
    fn name(&self) -> &str;

    /// Describes every handler method of this listener.
    ///
    /// Called once per registration; the returned bindings are validated and
    /// then installed as ordinary handlers.
    fn subscriptions(self: Arc<Self>) -> Vec<Subscription>;
}

/// Identifies one `register_listener` call so its handlers can later be
/// removed together with [`EventBus::unregister_all`].
///
/// [`EventBus::unregister_all`]: crate::EventBus::unregister_all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);
