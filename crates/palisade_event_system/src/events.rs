//! # Event Traits and Core Infrastructure
//!
//! This module defines the fundamental event abstractions for the Palisade
//! event system: the [`Event`] trait, the [`CancelFlag`] carried by
//! cancellable events, the [`ListenOrder`] priority bands, and the error
//! types shared across the crate.
//!
//! ## Design Principles
//!
//! - **Exact-type routing**: events are matched by their exact runtime type
//!   (`TypeId`), never by any notion of sub- or supertype.
//! - **In-process values**: events are plain typed values handed to handlers
//!   by reference; nothing is serialized on the dispatch path.
//! - **Thread safety**: events may be posted from any thread, so every event
//!   must be `Send + Sync`.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};

// ============================================================================
// Event Trait
// ============================================================================

/// Core trait that all events must implement.
///
/// Dispatch is keyed on the event's exact runtime type: a handler registered
/// for one event type never receives values of any other type, and there is
/// no subtype delivery of any kind.
///
/// Most event types only need to provide [`Event::as_any`]; the
/// [`impl_event!`](crate::impl_event) and
/// [`impl_cancellable_event!`](crate::impl_cancellable_event) macros generate
/// the implementation.
///
/// # Examples
///
/// ```rust
/// use palisade_event_system::{impl_event, Event};
///
/// #[derive(Debug)]
/// struct ChunkLoadedEvent {
///     chunk_x: i32,
///     chunk_z: i32,
/// }
/// impl_event!(ChunkLoadedEvent);
/// ```
pub trait Event: Any + Send + Sync + Debug {
    /// Returns a stable name for this event type, used in logs and handler
    /// names.
    fn type_name() -> &'static str
    where
        Self: Sized,
    {
        std::any::type_name::<Self>()
    }

    /// Whether this event type carries a cancelled flag.
    ///
    /// Consulted once at registration time to validate `ignore_cancelled`
    /// subscriptions; never consulted on the dispatch path.
    fn cancellable() -> bool
    where
        Self: Sized,
    {
        false
    }

    /// Returns this event as `&dyn Any` so handlers can downcast to the
    /// concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Returns the cancelled flag for cancellable events, `None` otherwise.
    fn cancel_flag(&self) -> Option<&CancelFlag> {
        None
    }
}

// ============================================================================
// Cancellation
// ============================================================================

/// Mutable cancelled flag embedded in cancellable events.
///
/// Any handler may set the flag during dispatch; handlers subscribed with
/// `ignore_cancelled` consult it immediately before their own invocation and
/// skip when it is set. Handlers without that marker always run, whatever the
/// flag says.
#[derive(Debug, Default)]
pub struct CancelFlag(AtomicBool);

impl CancelFlag {
    /// Creates a flag in the not-cancelled state.
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Returns true if a handler has cancelled the event.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Sets or clears the cancelled state.
    pub fn set_cancelled(&self, cancelled: bool) {
        self.0.store(cancelled, Ordering::Release);
    }
}

// ============================================================================
// Priority Bands
// ============================================================================

/// Priority band determining the relative execution order of handlers
/// registered for the same event type.
///
/// Bands run in declaration order: `Early`, then `Normal`, then `Late`, then
/// `Monitor`. Within one band, handlers run in registration order. `Monitor`
/// is intended for observers that must see the final state of an event
/// (including its cancelled flag) without modifying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ListenOrder {
    /// Runs first; the usual band for handlers that cancel or rewrite events.
    Early,
    /// Default band for ordinary game logic.
    Normal,
    /// Runs after the normal band, seeing the effects of earlier handlers.
    Late,
    /// Runs last; observation only.
    Monitor,
}

impl ListenOrder {
    /// Number of bands.
    pub const COUNT: usize = 4;

    /// Every band, in dispatch order.
    pub const ALL: [ListenOrder; Self::COUNT] = [
        ListenOrder::Early,
        ListenOrder::Normal,
        ListenOrder::Late,
        ListenOrder::Monitor,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            ListenOrder::Early => 0,
            ListenOrder::Normal => 1,
            ListenOrder::Late => 2,
            ListenOrder::Monitor => 3,
        }
    }
}

impl Default for ListenOrder {
    fn default() -> Self {
        ListenOrder::Normal
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors produced by event handlers during dispatch.
///
/// These never propagate to the caller of `post`; the bus catches them, logs
/// them with handler context, and continues with the remaining handlers.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Handler execution failed during event processing.
    #[error("handler execution failed: {0}")]
    HandlerExecution(String),
    /// Anything else a handler wants to report.
    #[error("an unexpected error occurred: {0}")]
    Other(String),
}

/// Errors raised synchronously by declarative listener registration.
///
/// These indicate programmer misuse and are fatal to the registration call
/// that produced them, never to the bus itself.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// A subscription asked to skip cancelled events, but its event type
    /// carries no cancelled flag.
    #[error("handler '{handler}' sets ignore_cancelled but event type '{event_type}' is not cancellable")]
    IgnoreCancelledNotApplicable {
        /// Name of the offending handler binding.
        handler: String,
        /// The event type the binding subscribed to.
        event_type: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_round_trip() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());

        flag.set_cancelled(true);
        assert!(flag.is_cancelled());

        flag.set_cancelled(false);
        assert!(!flag.is_cancelled());
    }

    #[test]
    fn test_listen_order_dispatch_sequence() {
        assert_eq!(ListenOrder::ALL.len(), ListenOrder::COUNT);
        let indices: Vec<usize> = ListenOrder::ALL.iter().map(|o| o.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert!(ListenOrder::Early < ListenOrder::Monitor);
    }

    #[test]
    fn test_default_band_is_normal() {
        assert_eq!(ListenOrder::default(), ListenOrder::Normal);
    }
}
