//! # Entity Type Registry
//!
//! Bidirectional registry interning entity kind descriptors once at startup:
//! each descriptor gets a numeric id (bound into the descriptor exactly once)
//! and is afterwards retrievable both by id and by its unique name.
//!
//! One coarse lock covers both maps so they can never disagree; every
//! operation holds it for its whole critical section. Registration happens a
//! handful of times at boot, lookups are frequent and cheap, so the coarse
//! lock is never contended in practice.

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Numeric id assigned to an entity kind at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Descriptor for one kind of entity ("zombie", "skeleton", ...).
///
/// Created unregistered; registration binds the numeric id exactly once and
/// the id never changes afterwards.
#[derive(Debug)]
pub struct EntityType {
    name: String,
    id: OnceCell<EntityId>,
}

impl EntityType {
    /// Creates an unregistered descriptor with the given unique name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: OnceCell::new(),
        }
    }

    /// Unique name of this entity kind.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Numeric id, or `None` if the descriptor has not been registered yet.
    pub fn id(&self) -> Option<EntityId> {
        self.id.get().copied()
    }

    fn bind_id(&self, id: EntityId) -> Result<(), RegistryError> {
        self.id
            .set(id)
            .map_err(|_| RegistryError::AlreadyRegistered(self.name.clone()))
    }
}

/// Errors raised by registry registration.
///
/// Lookups never error; an unknown id or name is an ordinary `None`.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The descriptor already carries an id from an earlier registration.
    #[error("entity type '{0}' is already registered")]
    AlreadyRegistered(String),

    /// The requested numeric id is bound to another descriptor.
    #[error("entity id {id} is already bound to '{bound_to}'")]
    IdInUse {
        /// The colliding id.
        id: EntityId,
        /// Name of the descriptor currently holding it.
        bound_to: String,
    },

    /// The descriptor's name is bound to another descriptor.
    #[error("entity name '{0}' is already bound")]
    NameInUse(String),
}

#[derive(Default)]
struct RegistryMaps {
    by_id: HashMap<u32, Arc<EntityType>>,
    by_name: HashMap<String, Arc<EntityType>>,
}

/// Concurrency-safe id/name registry for entity kinds.
///
/// # Examples
///
/// ```rust
/// use game_server::registry::{EntityRegistry, EntityType};
/// use std::sync::Arc;
///
/// let registry = EntityRegistry::new();
/// let zombie = Arc::new(EntityType::new("zombie"));
/// let id = registry.register(Arc::clone(&zombie)).unwrap();
///
/// assert_eq!(id.0, 0);
/// assert_eq!(zombie.id(), Some(id));
/// assert!(registry.contains_name("zombie"));
/// ```
pub struct EntityRegistry {
    inner: Mutex<RegistryMaps>,
}

impl EntityRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryMaps::default()),
        }
    }

    /// Registers a descriptor under the next sequential id.
    ///
    /// The id equals the current number of registered entries, so pure
    /// auto-id usage yields `0..N-1` in registration order.
    pub fn register(&self, entity: Arc<EntityType>) -> Result<EntityId, RegistryError> {
        let mut maps = self.inner.lock();
        let id = EntityId(maps.by_id.len() as u32);
        Self::bind(&mut maps, entity, id)
    }

    /// Registers a descriptor under a caller-chosen id.
    ///
    /// Unlike a silent overwrite, a collision on either the id or the name is
    /// rejected and leaves the registry untouched.
    pub fn register_with_id(
        &self,
        entity: Arc<EntityType>,
        id: EntityId,
    ) -> Result<EntityId, RegistryError> {
        let mut maps = self.inner.lock();
        Self::bind(&mut maps, entity, id)
    }

    fn bind(
        maps: &mut RegistryMaps,
        entity: Arc<EntityType>,
        id: EntityId,
    ) -> Result<EntityId, RegistryError> {
        if let Some(existing) = maps.by_id.get(&id.0) {
            return Err(RegistryError::IdInUse {
                id,
                bound_to: existing.name().to_string(),
            });
        }
        if maps.by_name.contains_key(entity.name()) {
            return Err(RegistryError::NameInUse(entity.name().to_string()));
        }
        entity.bind_id(id)?;
        maps.by_name
            .insert(entity.name().to_string(), Arc::clone(&entity));
        maps.by_id.insert(id.0, entity);
        Ok(id)
    }

    /// Looks up a descriptor by its numeric id.
    pub fn by_id(&self, id: EntityId) -> Option<Arc<EntityType>> {
        self.inner.lock().by_id.get(&id.0).cloned()
    }

    /// Looks up a descriptor by its unique name.
    pub fn by_name(&self, name: &str) -> Option<Arc<EntityType>> {
        self.inner.lock().by_name.get(name).cloned()
    }

    pub fn contains_id(&self, id: EntityId) -> bool {
        self.inner.lock().by_id.contains_key(&id.0)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.inner.lock().by_name.contains_key(name)
    }

    /// Number of registered entity kinds.
    pub fn len(&self) -> usize {
        self.inner.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("entries", &self.len())
            .finish()
    }
}

/// Entity kinds every server knows about, registered during boot in this
/// order.
pub const BUILTIN_CREATURES: &[&str] = &[
    "zombie", "skeleton", "creeper", "spider", "enderman", "slime", "witch", "cow", "pig",
    "sheep", "chicken", "villager",
];

/// Interns the built-in creature kinds.
pub fn register_builtin(registry: &EntityRegistry) -> Result<(), RegistryError> {
    for name in BUILTIN_CREATURES {
        registry.register(Arc::new(EntityType::new(*name)))?;
    }
    info!("registered {} built-in entity kinds", BUILTIN_CREATURES.len());
    Ok(())
}
