//! # Event Bus Core
//!
//! The central publish/subscribe hub: handlers are registered into per-type,
//! per-band buckets and every posted event is delivered to the handlers bound
//! to its exact runtime type, band by band.
//!
//! ## Locking Discipline
//!
//! Two levels, never held across each other:
//!
//! 1. The type map is a sharded concurrent map; its shard lock is held only
//!    long enough to fetch or create the per-type band map.
//! 2. Each band map sits behind its own mutex, held for the duration of one
//!    bucket mutation or one full dispatch pass.
//!
//! Registration and posting against different event types therefore never
//! contend with each other, while operations on the same event type are
//! serialized. A `post` holds the per-type lock for its whole traversal, so
//! registering for the same event type from inside one of its own handlers
//! deadlocks; register against other types, or ahead of time.

use crate::events::{Event, EventError, ListenOrder, RegistrationError};
use crate::handlers::{CancelAwareHandler, EventHandler, TypedEventHandler};
use crate::listener::{Listener, ListenerId, Subscription};
use crate::stats::{BusCounters, BusStats};
use dashmap::DashMap;
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::any::TypeId;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// One registered handler plus the listener it came from, if any.
struct HandlerEntry {
    handler: Arc<dyn EventHandler>,
    owner: Option<ListenerId>,
}

/// Band-indexed handler buckets for a single event type.
#[derive(Default)]
struct OrderMap {
    buckets: [SmallVec<[HandlerEntry; 4]>; ListenOrder::COUNT],
}

/// The event dispatch bus.
///
/// Safe to share across threads behind an `Arc`; every operation takes
/// `&self`.
///
/// # Examples
///
/// ```rust
/// use palisade_event_system::{create_event_bus, impl_event, ListenOrder};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
///
/// #[derive(Debug)]
/// struct BlockPlacedEvent {
///     y: i32,
/// }
/// impl_event!(BlockPlacedEvent);
///
/// let bus = create_event_bus();
/// let seen = Arc::new(AtomicU32::new(0));
///
/// let probe = Arc::clone(&seen);
/// bus.register(ListenOrder::Normal, move |event: &BlockPlacedEvent| {
///     probe.fetch_add(event.y as u32, Ordering::SeqCst);
///     Ok(())
/// });
///
/// bus.post(&BlockPlacedEvent { y: 64 });
/// assert_eq!(seen.load(Ordering::SeqCst), 64);
/// ```
pub struct EventBus {
    /// Sharded map of event type to its band map.
    handlers: DashMap<TypeId, Arc<Mutex<OrderMap>>>,
    /// Source of listener ids for declarative registration.
    next_listener_id: AtomicU64,
    /// Activity counters for monitoring.
    counters: BusCounters,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("event_types", &self.handlers.len())
            .field("stats", &self.counters.snapshot())
            .finish()
    }
}

impl EventBus {
    /// Creates a bus with no registered handlers.
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
            next_listener_id: AtomicU64::new(1),
            counters: BusCounters::default(),
        }
    }

    /// Registers `handler` for events of type `E` in the given band.
    ///
    /// Returns the erased handler so the caller can [`unregister`] it later;
    /// removal is by handler identity.
    ///
    /// [`unregister`]: EventBus::unregister
    pub fn register<E, F>(&self, order: ListenOrder, handler: F) -> Arc<dyn EventHandler>
    where
        E: Event,
        F: Fn(&E) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let name = format!("{}@{:?}", E::type_name(), order);
        let handler: Arc<dyn EventHandler> = Arc::new(TypedEventHandler::new(name, handler));
        self.insert_entry(
            TypeId::of::<E>(),
            order,
            HandlerEntry {
                handler: Arc::clone(&handler),
                owner: None,
            },
        );
        handler
    }

    /// Removes a specific handler instance from the `(E, order)` bucket.
    ///
    /// No-op when the bucket does not exist or the handler is not in it.
    pub fn unregister<E: Event>(&self, order: ListenOrder, handler: &Arc<dyn EventHandler>) {
        let orders = match self.handlers.get(&TypeId::of::<E>()) {
            Some(entry) => Arc::clone(entry.value()),
            None => return,
        };
        let mut orders = orders.lock();
        let bucket = &mut orders.buckets[order.index()];
        let before = bucket.len();
        bucket.retain(|entry| !Arc::ptr_eq(&entry.handler, handler));
        let removed = before - bucket.len();
        if removed > 0 {
            self.counters
                .total_handlers
                .fetch_sub(removed, Ordering::Relaxed);
            debug!("unregistered handler for {}", E::type_name());
        }
    }

    /// Installs every handler a listener declares.
    ///
    /// All subscriptions are validated before any of them is registered: an
    /// `ignore_cancelled` binding for a non-cancellable event type fails the
    /// whole call and the bus is left untouched. On success, every binding is
    /// tagged with the returned [`ListenerId`] so that
    /// [`unregister_all`](EventBus::unregister_all) can remove them together.
    pub fn register_listener(
        &self,
        listener: Arc<dyn Listener>,
    ) -> Result<ListenerId, RegistrationError> {
        let name = listener.name().to_string();
        let subscriptions = Arc::clone(&listener).subscriptions();

        for subscription in &subscriptions {
            if subscription.listen.ignore_cancelled && !subscription.cancellable {
                return Err(RegistrationError::IgnoreCancelledNotApplicable {
                    handler: subscription.handler.handler_name().to_string(),
                    event_type: subscription.event_name,
                });
            }
        }

        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        let count = subscriptions.len();
        for subscription in subscriptions {
            let Subscription {
                listen,
                event_type,
                handler,
                ..
            } = subscription;
            let handler = if listen.ignore_cancelled {
                Arc::new(CancelAwareHandler::new(handler)) as Arc<dyn EventHandler>
            } else {
                handler
            };
            self.insert_entry(
                event_type,
                listen.order,
                HandlerEntry {
                    handler,
                    owner: Some(id),
                },
            );
        }

        info!("📝 registered {count} handler(s) for listener '{name}'");
        Ok(id)
    }

    /// Removes every handler that was installed by the given
    /// `register_listener` call. Returns how many were removed.
    ///
    /// Directly registered handlers carry no owner and are never swept.
    pub fn unregister_all(&self, owner: ListenerId) -> usize {
        // Collect the per-type maps first so no shard guard is held while a
        // band map is locked.
        let order_maps: Vec<Arc<Mutex<OrderMap>>> = self
            .handlers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut removed = 0;
        for orders in order_maps {
            let mut orders = orders.lock();
            for bucket in orders.buckets.iter_mut() {
                let before = bucket.len();
                bucket.retain(|entry| entry.owner != Some(owner));
                removed += before - bucket.len();
            }
        }

        if removed > 0 {
            self.counters
                .total_handlers
                .fetch_sub(removed, Ordering::Relaxed);
            info!("unregistered {removed} handler(s) for listener {owner:?}");
        }
        removed
    }

    /// Delivers `event` to every handler registered for its exact type.
    ///
    /// Bands run in [`ListenOrder::ALL`] order and handlers within a band run
    /// in registration order. A handler that returns an error or panics is
    /// logged and counted; the remaining handlers still run and nothing
    /// surfaces to the caller. Posting an event type with no handlers is a
    /// silent no-op.
    ///
    /// The per-type lock is held for the whole traversal, so a complete
    /// dispatch pass is never interleaved with registration or another post
    /// for the same event type.
    pub fn post<E: Event>(&self, event: &E) {
        self.counters.events_posted.fetch_add(1, Ordering::Relaxed);

        let orders = match self.handlers.get(&TypeId::of::<E>()) {
            Some(entry) => Arc::clone(entry.value()),
            None => return,
        };

        let orders = orders.lock();
        for order in ListenOrder::ALL {
            for entry in &orders.buckets[order.index()] {
                let outcome = catch_unwind(AssertUnwindSafe(|| entry.handler.handle(event)));
                match outcome {
                    Ok(Ok(())) => {
                        self.counters.handlers_invoked.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(Err(err)) => {
                        self.counters.handler_failures.fetch_add(1, Ordering::Relaxed);
                        error!(
                            "handler '{}' failed while handling {}: {err}",
                            entry.handler.handler_name(),
                            E::type_name(),
                        );
                    }
                    Err(panic) => {
                        self.counters.handler_failures.fetch_add(1, Ordering::Relaxed);
                        error!(
                            "handler '{}' panicked while handling {}: {}",
                            entry.handler.handler_name(),
                            E::type_name(),
                            panic_message(&panic),
                        );
                    }
                }
            }
        }
    }

    /// Number of handlers currently registered across all event types.
    pub fn handler_count(&self) -> usize {
        self.counters.snapshot().total_handlers
    }

    /// Current activity counters.
    pub fn stats(&self) -> BusStats {
        self.counters.snapshot()
    }

    fn insert_entry(&self, event_type: TypeId, order: ListenOrder, entry: HandlerEntry) {
        let orders = {
            let slot = self.handlers.entry(event_type).or_default();
            Arc::clone(slot.value())
        };
        orders.lock().buckets[order.index()].push(entry);
        self.counters.total_handlers.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts a printable message from a caught handler panic.
fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
