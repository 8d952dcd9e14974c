//! # Palisade Server Core
//!
//! The coordination backbone of the Palisade server: the entity kind
//! registry, the shared server state container, the worker threads and the
//! lifecycle orchestration that starts and stops them. Protocol codecs,
//! socket transports, world simulation and command handling are separate
//! collaborators that talk to this core through the event bus and the
//! [`ServerContext`] handle.
//!
//! ## Architecture
//!
//! * **[`ServerContext`]**: shared mutable state (motd, player cap, spawn,
//!   online players, worlds) plus the event bus and entity registry handles.
//!   Passed explicitly to every component; there is no global instance.
//! * **[`EntityRegistry`]**: interns entity kind descriptors once at boot,
//!   then serves concurrent id and name lookups.
//! * **[`Lifecycle`]**: starts the console and network workers in a fixed
//!   order and runs the graceful-then-forced shutdown sequence.
//! * **Events**: the core posts [`events::ConsoleInputEvent`],
//!   [`events::FrameReceivedEvent`] and the player login/join/leave events;
//!   everything else is defined by collaborators.

pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod listeners;
pub mod logging;
pub mod net;
pub mod registry;
pub mod types;
pub mod workers;

pub use config::{LoggingConfig, ServerConfig};
pub use context::ServerContext;
pub use error::ServerError;
pub use lifecycle::{Lifecycle, SHUTDOWN_JOIN_TIMEOUT};
pub use logging::{setup_logging, LogGuard};
pub use net::{DiscardSink, FrameSink, InboundFrame, NetQueues, OutboundFrame};
pub use registry::{EntityId, EntityRegistry, EntityType, RegistryError};
pub use types::{Location, Player, PlayerId, World};
pub use workers::{ManagedThread, StopSignal, WorkerState};
