//! # Lifecycle Orchestrator
//!
//! Owns the server's worker threads: starts them in a fixed order at boot
//! and runs the graceful-then-forced shutdown sequence when the process is
//! asked to stop.
//!
//! Shutdown proceeds in phases. Every worker first gets its cooperative stop
//! signal, fire-and-forget, so they all begin winding down at once. Each is
//! then joined with a bounded wait; a worker that does not comply within its
//! bound is abandoned with a warning and shutdown carries on. Whatever path
//! each worker took, the logging writer guard is released exactly once at
//! the end, including when a join panics.

use crate::context::ServerContext;
use crate::error::ServerError;
use crate::logging::LogGuard;
use crate::net::{FrameSink, NetQueues};
use crate::workers::{
    console_loop, network_input_loop, network_output_loop, ManagedThread, WorkerState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Bounded wait granted to each worker before forced termination.
pub const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_millis(1000);

/// Thread lifecycle manager for one server instance.
pub struct Lifecycle {
    context: Arc<ServerContext>,
    queues: NetQueues,
    sink: Arc<dyn FrameSink>,
    workers: Vec<ManagedThread>,
    log_guard: Option<LogGuard>,
}

impl Lifecycle {
    /// Creates an orchestrator that will manage workers for `context`.
    ///
    /// The log guard, if any, is held until the end of [`shutdown`]
    /// so buffered log output survives the whole stop sequence.
    ///
    /// [`shutdown`]: Lifecycle::shutdown
    pub fn new(
        context: Arc<ServerContext>,
        queues: NetQueues,
        sink: Arc<dyn FrameSink>,
        log_guard: Option<LogGuard>,
    ) -> Self {
        Self {
            context,
            queues,
            sink,
            workers: Vec::new(),
            log_guard,
        }
    }

    /// Starts the managed workers in their fixed order: console input,
    /// network input, network output.
    ///
    /// Not idempotent; callers start a lifecycle exactly once.
    pub fn start_all(&mut self) -> Result<(), ServerError> {
        info!("🚀 starting workers");

        let context = Arc::clone(&self.context);
        self.workers.push(ManagedThread::spawn("console-input", {
            move |signal| console_loop(context, signal)
        })?);

        let context = Arc::clone(&self.context);
        let inbound = self.queues.inbound_receiver();
        self.workers.push(ManagedThread::spawn("network-input", {
            move |signal| network_input_loop(context, inbound, signal)
        })?);

        let sink = Arc::clone(&self.sink);
        let outbound = self.queues.outbound_receiver();
        self.workers.push(ManagedThread::spawn("network-output", {
            move |signal| network_output_loop(sink, outbound, signal)
        })?);

        info!("✅ {} workers running", self.workers.len());
        Ok(())
    }

    /// Stops the managed workers and releases the logging resources.
    ///
    /// Safe to call from a process shutdown hook; always completes, whatever
    /// the individual workers do.
    pub fn shutdown(&mut self) {
        // Take the guard first: it drops at the end of this scope even if a
        // join below unwinds, releasing the log writer exactly once.
        let _log_release = self.log_guard.take();

        info!("🛑 stopping workers");
        for worker in &mut self.workers {
            worker.stop_nicely();
        }

        for worker in &mut self.workers {
            match worker.join_within(SHUTDOWN_JOIN_TIMEOUT) {
                WorkerState::Stopped => info!("worker '{}' stopped cleanly", worker.name()),
                WorkerState::ForciblyStopped => {
                    warn!("worker '{}' was forcibly stopped", worker.name())
                }
                other => warn!("worker '{}' in unexpected state {other:?}", worker.name()),
            }
        }

        info!("✅ shutdown complete");
    }

    /// Current state of every managed worker, in start order.
    pub fn worker_states(&self) -> Vec<(&'static str, WorkerState)> {
        self.workers
            .iter()
            .map(|worker| (worker.name(), worker.state()))
            .collect()
    }
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("workers", &self.worker_states())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::FrameReceivedEvent;
    use crate::net::{DiscardSink, InboundFrame, OutboundFrame};
    use crate::types::Location;
    use palisade_event_system::{create_event_bus, ListenOrder};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    fn test_context() -> Arc<ServerContext> {
        Arc::new(ServerContext::new(
            create_event_bus(),
            "lifecycle test",
            20,
            Location::new("overworld", 0.0, 64.0, 0.0),
        ))
    }

    #[test]
    fn test_workers_start_in_declared_order_and_stop() {
        let context = test_context();
        let queues = NetQueues::bounded(16);
        let mut lifecycle = Lifecycle::new(
            Arc::clone(&context),
            queues.clone(),
            Arc::new(DiscardSink),
            None,
        );

        lifecycle.start_all().unwrap();
        let names: Vec<_> = lifecycle
            .worker_states()
            .iter()
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(names, vec!["console-input", "network-input", "network-output"]);

        // Frames flow through the input worker while the server runs.
        let frames_seen = Arc::new(AtomicUsize::new(0));
        let probe = Arc::clone(&frames_seen);
        context
            .events()
            .register(ListenOrder::Normal, move |_: &FrameReceivedEvent| {
                probe.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });

        queues
            .inbound_sender()
            .send(InboundFrame {
                connection_id: 1,
                payload: b"hello".to_vec(),
            })
            .unwrap();
        queues
            .outbound_sender()
            .send(OutboundFrame {
                connection_id: 1,
                payload: b"pong".to_vec(),
            })
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while frames_seen.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(frames_seen.load(Ordering::SeqCst), 1);

        lifecycle.shutdown();
        for (name, state) in lifecycle.worker_states() {
            assert!(
                matches!(state, WorkerState::Stopped | WorkerState::ForciblyStopped),
                "worker '{name}' left in state {state:?}"
            );
        }
    }

    #[test]
    fn test_shutdown_twice_is_harmless() {
        let context = test_context();
        let mut lifecycle = Lifecycle::new(
            context,
            NetQueues::bounded(4),
            Arc::new(DiscardSink),
            None,
        );
        lifecycle.start_all().unwrap();

        lifecycle.shutdown();
        let first: Vec<_> = lifecycle.worker_states();
        lifecycle.shutdown();
        assert_eq!(first, lifecycle.worker_states());
    }
}
