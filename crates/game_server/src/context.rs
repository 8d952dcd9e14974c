//! # Server State Container
//!
//! [`ServerContext`] holds the shared mutable server state every subsystem
//! reads and writes: motd, player cap, spawn location, the online player set
//! and the world table, together with handles to the event bus and the
//! entity registry.
//!
//! There is no process-global instance. One context is built at boot and an
//! explicit `Arc<ServerContext>` handle is passed to every component that
//! needs it, so tests can build as many independent contexts as they like.
//!
//! ## Concurrency
//!
//! The scalar fields are simple value replacements: readers always observe
//! either the old or the new complete value (`ArcSwap` for motd and spawn,
//! an atomic for max players), never a partial update, and no lock is
//! involved. The player set and world table are internally synchronized
//! concurrent maps; iteration tolerates concurrent mutation with weak
//! consistency, which is all the callers need.

use crate::config::ServerConfig;
use crate::events::{PlayerJoinedEvent, PlayerLeftEvent, PlayerLoginEvent};
use crate::registry::EntityRegistry;
use crate::types::{Location, Player, PlayerId, World};
use arc_swap::ArcSwap;
use dashmap::DashMap;
use palisade_event_system::EventBus;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::info;

/// Shared mutable server state plus the core service handles.
pub struct ServerContext {
    events: Arc<EventBus>,
    entities: EntityRegistry,
    motd: ArcSwap<String>,
    max_players: AtomicU32,
    spawn: ArcSwap<Location>,
    players: DashMap<PlayerId, Arc<Player>>,
    worlds: DashMap<String, Arc<World>>,
}

impl ServerContext {
    /// Builds a context from the server configuration.
    pub fn from_config(events: Arc<EventBus>, config: &ServerConfig) -> Self {
        Self::new(
            events,
            config.motd.clone(),
            config.max_players,
            config.spawn.clone(),
        )
    }

    /// Builds a context with explicit initial values.
    pub fn new(
        events: Arc<EventBus>,
        motd: impl Into<String>,
        max_players: u32,
        spawn: Location,
    ) -> Self {
        Self {
            events,
            entities: EntityRegistry::new(),
            motd: ArcSwap::from_pointee(motd.into()),
            max_players: AtomicU32::new(max_players),
            spawn: ArcSwap::from_pointee(spawn),
            players: DashMap::new(),
            worlds: DashMap::new(),
        }
    }

    /// The event dispatch bus.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// The entity kind registry.
    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    // ------------------------------------------------------------------
    // Scalar state
    // ------------------------------------------------------------------

    /// Current message of the day.
    pub fn motd(&self) -> Arc<String> {
        self.motd.load_full()
    }

    /// Publishes a new message of the day.
    pub fn set_motd(&self, motd: impl Into<String>) {
        self.motd.store(Arc::new(motd.into()));
    }

    /// Maximum number of concurrently online players.
    pub fn max_players(&self) -> u32 {
        self.max_players.load(Ordering::Acquire)
    }

    pub fn set_max_players(&self, max_players: u32) {
        self.max_players.store(max_players, Ordering::Release);
    }

    /// Current spawn location.
    pub fn spawn(&self) -> Arc<Location> {
        self.spawn.load_full()
    }

    pub fn set_spawn(&self, spawn: Location) {
        self.spawn.store(Arc::new(spawn));
    }

    // ------------------------------------------------------------------
    // Online players
    // ------------------------------------------------------------------

    /// Runs a player through the login gate and, if no handler cancels,
    /// admits them to the online set.
    ///
    /// Posts [`PlayerLoginEvent`] first; when it comes back cancelled the
    /// player is not added and `false` is returned. Otherwise the player
    /// joins the online set and [`PlayerJoinedEvent`] is posted.
    pub fn admit_player(&self, player: Arc<Player>) -> bool {
        let login = PlayerLoginEvent::new(Arc::clone(&player));
        self.events.post(&login);
        if login.cancelled.is_cancelled() {
            info!("login of '{}' was cancelled", player.name);
            return false;
        }

        self.players.insert(player.id, Arc::clone(&player));
        self.events.post(&PlayerJoinedEvent { player });
        true
    }

    /// Removes a player from the online set and announces the departure.
    pub fn expel_player(&self, id: PlayerId) -> Option<Arc<Player>> {
        let (_, player) = self.players.remove(&id)?;
        self.events.post(&PlayerLeftEvent {
            player: Arc::clone(&player),
        });
        Some(player)
    }

    /// Looks up an online player by account id.
    pub fn player_by_id(&self, id: PlayerId) -> Option<Arc<Player>> {
        self.players.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Looks up an online player by display name (linear scan).
    pub fn player_by_name(&self, name: &str) -> Option<Arc<Player>> {
        self.players
            .iter()
            .find(|entry| entry.value().name == name)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Weakly consistent snapshot of the online players.
    pub fn online_players(&self) -> Vec<Arc<Player>> {
        self.players
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Number of online players.
    pub fn online_count(&self) -> usize {
        self.players.len()
    }

    /// True when the online count has reached the player cap.
    pub fn is_full(&self) -> bool {
        self.online_count() >= self.max_players() as usize
    }

    // ------------------------------------------------------------------
    // Worlds
    // ------------------------------------------------------------------

    /// Registers a world under its name. A world already registered under
    /// the same name is replaced silently (last write wins).
    pub fn register_world(&self, world: Arc<World>) {
        self.worlds.insert(world.name().to_string(), world);
    }

    /// Removes a world by name.
    pub fn unregister_world(&self, name: &str) -> Option<Arc<World>> {
        self.worlds.remove(name).map(|(_, world)| world)
    }

    /// Looks up a world by its unique name.
    pub fn world(&self, name: &str) -> Option<Arc<World>> {
        self.worlds.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Weakly consistent snapshot of the registered worlds.
    pub fn worlds(&self) -> Vec<Arc<World>> {
        self.worlds
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }
}

impl std::fmt::Debug for ServerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerContext")
            .field("motd", &self.motd.load())
            .field("max_players", &self.max_players())
            .field("online", &self.online_count())
            .field("worlds", &self.worlds.len())
            .finish()
    }
}
