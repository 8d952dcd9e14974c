//! # Core Server Events
//!
//! Event types the server core itself posts to the bus. Gameplay and
//! protocol collaborators define their own event types on top of the same
//! bus; nothing here is special-cased by dispatch.

use crate::net::InboundFrame;
use crate::types::Player;
use palisade_event_system::{impl_cancellable_event, impl_event, CancelFlag};
use std::sync::Arc;

/// A line read from the server console, posted by the console input worker.
///
/// Interpreting the line (command parsing and execution) is the command
/// subsystem's job.
#[derive(Debug)]
pub struct ConsoleInputEvent {
    /// The trimmed console line.
    pub line: String,
}
impl_event!(ConsoleInputEvent);

/// A frame drained from the inbound queue, posted by the network input
/// worker. The packet codec subscribes to this to decode and route packets.
#[derive(Debug)]
pub struct FrameReceivedEvent {
    pub frame: InboundFrame,
}
impl_event!(FrameReceivedEvent);

/// A player attempting to join, posted before the player is added to the
/// online set. Cancellable: a handler that cancels it (capacity check, bans,
/// whitelist) keeps the player out.
#[derive(Debug)]
pub struct PlayerLoginEvent {
    pub player: Arc<Player>,
    pub cancelled: CancelFlag,
}
impl_cancellable_event!(PlayerLoginEvent, cancelled);

impl PlayerLoginEvent {
    pub fn new(player: Arc<Player>) -> Self {
        Self {
            player,
            cancelled: CancelFlag::new(),
        }
    }
}

/// A player was admitted and is now in the online set.
#[derive(Debug)]
pub struct PlayerJoinedEvent {
    pub player: Arc<Player>,
}
impl_event!(PlayerJoinedEvent);

/// A player left the server and was removed from the online set.
#[derive(Debug)]
pub struct PlayerLeftEvent {
    pub player: Arc<Player>,
}
impl_event!(PlayerLeftEvent);
