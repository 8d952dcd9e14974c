//! Statistics tracking for the event bus.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Internal atomic counters, updated on the dispatch and registration paths.
#[derive(Debug, Default)]
pub(crate) struct BusCounters {
    pub(crate) total_handlers: AtomicUsize,
    pub(crate) events_posted: AtomicU64,
    pub(crate) handlers_invoked: AtomicU64,
    pub(crate) handler_failures: AtomicU64,
}

impl BusCounters {
    pub(crate) fn snapshot(&self) -> BusStats {
        BusStats {
            total_handlers: self.total_handlers.load(Ordering::Relaxed),
            events_posted: self.events_posted.load(Ordering::Relaxed),
            handlers_invoked: self.handlers_invoked.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of bus activity for monitoring.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BusStats {
    /// Number of handlers currently registered across all event types.
    pub total_handlers: usize,
    /// Total number of events posted since the bus was created.
    pub events_posted: u64,
    /// Total number of successful handler invocations.
    pub handlers_invoked: u64,
    /// Handler invocations that returned an error or panicked.
    pub handler_failures: u64,
}
