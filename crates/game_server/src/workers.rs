//! # Worker Threads
//!
//! The long-running loops the server owns: console input, network input and
//! network output, each on its own OS thread. Every loop polls a shared stop
//! flag and exits voluntarily when it is raised; a loop that cannot comply
//! in time is abandoned by [`ManagedThread::join_within`].

use crate::context::ServerContext;
use crate::events::{ConsoleInputEvent, FrameReceivedEvent};
use crate::net::{FrameSink, InboundFrame, OutboundFrame};
use crossbeam::channel::{Receiver, RecvTimeoutError};
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// How often a blocked queue drain wakes up to poll the stop flag.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How often a bounded join re-checks whether the thread has finished.
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Shared cooperative-stop flag polled by a worker loop.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    stop: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the worker to exit its loop at the next poll.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// True once a cooperative stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}

/// Lifecycle state of one managed worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    NotStarted,
    Running,
    /// Stop requested, thread not yet joined.
    StoppingCooperatively,
    /// Thread exited and was joined within its bound.
    Stopped,
    /// Thread ignored its stop window and was abandoned. Shared state it was
    /// touching may be inconsistent; last resort only.
    ForciblyStopped,
}

/// A worker thread plus its stop flag and observed lifecycle state.
pub struct ManagedThread {
    name: &'static str,
    signal: StopSignal,
    handle: Option<JoinHandle<()>>,
    state: WorkerState,
}

impl ManagedThread {
    /// Spawns a named OS thread running `body` with a fresh stop flag.
    pub fn spawn(
        name: &'static str,
        body: impl FnOnce(StopSignal) + Send + 'static,
    ) -> std::io::Result<Self> {
        let signal = StopSignal::new();
        let loop_signal = signal.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(loop_signal))?;
        Ok(Self {
            name,
            signal,
            handle: Some(handle),
            state: WorkerState::Running,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Signals cooperative stop without waiting for the thread.
    pub fn stop_nicely(&mut self) {
        if self.state == WorkerState::Running {
            self.signal.request_stop();
            self.state = WorkerState::StoppingCooperatively;
        }
    }

    /// Waits up to `timeout` for the thread to finish, then escalates.
    ///
    /// A thread that does not finish within the bound is abandoned: its join
    /// handle is dropped, it keeps whatever it was doing, and the state
    /// becomes [`WorkerState::ForciblyStopped`]. The shutdown sequence
    /// carries on regardless.
    pub fn join_within(&mut self, timeout: Duration) -> WorkerState {
        let Some(handle) = self.handle.take() else {
            return self.state;
        };

        let deadline = Instant::now() + timeout;
        loop {
            if handle.is_finished() {
                if handle.join().is_err() {
                    warn!("worker '{}' terminated by panic", self.name);
                }
                self.state = WorkerState::Stopped;
                return self.state;
            }
            if Instant::now() >= deadline {
                break;
            }
            thread::sleep(JOIN_POLL_INTERVAL);
        }

        warn!(
            "worker '{}' did not stop within {:?}, abandoning it",
            self.name, timeout
        );
        self.state = WorkerState::ForciblyStopped;
        self.state
    }
}

impl std::fmt::Debug for ManagedThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedThread")
            .field("name", &self.name)
            .field("state", &self.state)
            .finish()
    }
}

// ============================================================================
// Worker Loops
// ============================================================================

/// Console input loop: reads stdin lines and posts them as
/// [`ConsoleInputEvent`]s.
///
/// `read_line` blocks without a timeout, so this worker usually cannot honor
/// its cooperative stop window and is the expected taker of the forced-stop
/// path during shutdown.
pub(crate) fn console_loop(context: Arc<ServerContext>, signal: StopSignal) {
    info!("console worker started");
    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        if signal.is_stop_requested() {
            break;
        }
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    context.events().post(&ConsoleInputEvent {
                        line: trimmed.to_string(),
                    });
                }
            }
            Err(err) => {
                error!("console read failed: {err}");
                break;
            }
        }
    }
    info!("console worker stopped");
}

/// Network input loop: drains the inbound frame queue and posts each frame
/// as a [`FrameReceivedEvent`].
pub(crate) fn network_input_loop(
    context: Arc<ServerContext>,
    inbound: Receiver<InboundFrame>,
    signal: StopSignal,
) {
    info!("network input worker started");
    loop {
        if signal.is_stop_requested() {
            break;
        }
        match inbound.recv_timeout(STOP_POLL_INTERVAL) {
            Ok(frame) => context.events().post(&FrameReceivedEvent { frame }),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("inbound queue closed");
                break;
            }
        }
    }
    info!("network input worker stopped");
}

/// Network output loop: drains the outbound frame queue into the transport's
/// [`FrameSink`].
pub(crate) fn network_output_loop(
    sink: Arc<dyn FrameSink>,
    outbound: Receiver<OutboundFrame>,
    signal: StopSignal,
) {
    info!("network output worker started");
    loop {
        if signal.is_stop_requested() {
            break;
        }
        match outbound.recv_timeout(STOP_POLL_INTERVAL) {
            Ok(frame) => {
                if let Err(err) = sink.deliver(&frame) {
                    warn!(
                        "failed to deliver frame to connection {}: {err}",
                        frame.connection_id
                    );
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("outbound queue closed");
                break;
            }
        }
    }
    info!("network output worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_signal_round_trip() {
        let signal = StopSignal::new();
        assert!(!signal.is_stop_requested());
        signal.request_stop();
        assert!(signal.is_stop_requested());
    }

    #[test]
    fn test_compliant_worker_joins_within_bound() {
        let mut worker = ManagedThread::spawn("compliant", |signal| {
            while !signal.is_stop_requested() {
                thread::sleep(Duration::from_millis(5));
            }
        })
        .unwrap();

        assert_eq!(worker.state(), WorkerState::Running);
        worker.stop_nicely();
        assert_eq!(worker.state(), WorkerState::StoppingCooperatively);
        assert_eq!(
            worker.join_within(Duration::from_millis(1000)),
            WorkerState::Stopped
        );
    }

    #[test]
    fn test_stubborn_worker_is_forcibly_stopped() {
        let mut worker = ManagedThread::spawn("stubborn", |_signal| {
            // Ignores its stop flag entirely.
            thread::sleep(Duration::from_secs(60));
        })
        .unwrap();

        worker.stop_nicely();
        assert_eq!(
            worker.join_within(Duration::from_millis(100)),
            WorkerState::ForciblyStopped
        );
        // A second join is a no-op on an abandoned thread.
        assert_eq!(
            worker.join_within(Duration::from_millis(10)),
            WorkerState::ForciblyStopped
        );
    }

    #[test]
    fn test_mixed_compliance_shutdown_sequence() {
        let compliant = |signal: StopSignal| {
            while !signal.is_stop_requested() {
                thread::sleep(Duration::from_millis(5));
            }
        };
        let mut workers = vec![
            ManagedThread::spawn("worker-a", compliant).unwrap(),
            ManagedThread::spawn("worker-b", |_signal| {
                thread::sleep(Duration::from_secs(60));
            })
            .unwrap(),
            ManagedThread::spawn("worker-c", compliant).unwrap(),
        ];

        // Fire-and-forget stop signals first, bounded joins second.
        for worker in &mut workers {
            worker.stop_nicely();
        }
        let states: Vec<_> = workers
            .iter_mut()
            .map(|worker| worker.join_within(Duration::from_millis(1000)))
            .collect();

        assert_eq!(
            states,
            vec![
                WorkerState::Stopped,
                WorkerState::ForciblyStopped,
                WorkerState::Stopped
            ]
        );
    }

    #[test]
    fn test_panicking_worker_still_counts_as_stopped() {
        let mut worker = ManagedThread::spawn("panicky", |_signal| {
            panic!("worker blew up");
        })
        .unwrap();

        worker.stop_nicely();
        assert_eq!(
            worker.join_within(Duration::from_millis(1000)),
            WorkerState::Stopped
        );
    }
}
