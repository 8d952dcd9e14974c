//! # Palisade Event System
//!
//! A concurrent, priority-ordered event dispatch bus for game servers.
//! Subsystems post typed events; the bus delivers each event to every handler
//! registered for its exact runtime type, grouped by priority band and kept
//! in registration order within a band.
//!
//! ## Core Features
//!
//! - **Exact-type dispatch**: buckets are keyed by `TypeId`, so a handler
//!   registered for one event type never sees another, related or not.
//! - **Priority bands**: `Early`, `Normal`, `Late`, `Monitor`, executed in
//!   that order for every post.
//! - **Cancellation**: cancellable events carry an atomic flag; handlers
//!   subscribed with `ignore_cancelled` are skipped once it is set, while
//!   plain handlers always run.
//! - **Declarative listeners**: arbitrary objects describe their handler
//!   methods as marker-tagged [`Subscription`]s; the bus turns them into
//!   ordinary handlers once, at registration time.
//! - **Failure containment**: a handler that errors or panics is logged and
//!   counted, and the rest of the dispatch pass still runs.
//! - **Sharded locking**: unrelated event types never contend on a common
//!   lock; operations on one event type are serialized by its own mutex.
//!
//! ## Quick Start
//!
//! ```rust
//! use palisade_event_system::{
//!     create_event_bus, impl_cancellable_event, CancelFlag, ListenOrder,
//! };
//!
//! #[derive(Debug)]
//! struct DamageEvent {
//!     amount: u32,
//!     cancelled: CancelFlag,
//! }
//! impl_cancellable_event!(DamageEvent, cancelled);
//!
//! let bus = create_event_bus();
//!
//! bus.register(ListenOrder::Early, |event: &DamageEvent| {
//!     if event.amount > 100 {
//!         event.cancelled.set_cancelled(true);
//!     }
//!     Ok(())
//! });
//!
//! let event = DamageEvent { amount: 250, cancelled: CancelFlag::new() };
//! bus.post(&event);
//! assert!(event.cancelled.is_cancelled());
//! ```

mod bus;
mod events;
mod handlers;
mod listener;
mod macros;
mod stats;

pub use bus::EventBus;
pub use events::{CancelFlag, Event, EventError, ListenOrder, RegistrationError};
pub use handlers::{EventHandler, TypedEventHandler};
pub use listener::{Listen, Listener, ListenerId, Subscription};
pub use stats::BusStats;

use std::sync::Arc;

/// Creates a new event bus ready to be shared across threads.
pub fn create_event_bus() -> Arc<EventBus> {
    Arc::new(EventBus::new())
}

#[cfg(test)]
mod tests;
