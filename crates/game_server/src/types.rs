//! # Core Type Definitions
//!
//! Fundamental types shared across the server core: player identity, world
//! handles, and locations. Wrapper types keep the different kinds of ids from
//! being confused with each other.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique account identifier for a player.
///
/// A wrapper around UUID so player ids cannot be mixed up with other ids in
/// the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Creates a new random player id using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A connected player as the coordination core sees it: account identity
/// plus display name. Everything else about a player belongs to the
/// networking and gameplay collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Account identifier, stable across sessions.
    pub id: PlayerId,
    /// Display name, unique among online players by convention.
    pub name: String,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A point in a named world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Name of the world this location belongs to.
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }
}

/// Handle to a loaded world, keyed by its unique name.
///
/// World content (chunks, entities, persistence) lives entirely in the world
/// subsystem; the core only tracks which worlds exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    name: String,
}

impl World {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
