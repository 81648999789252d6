use slotmap::SlotMap;

use crate::api::types::EntityId;
use crate::components::entity::{Entity, EntityKind};

/// Entity arena with deferred removal.
///
/// Ids stay valid while an entity lives and never alias once it is gone.
/// Removal requested while the caller may be iterating is queued and applied
/// by [`Scene::flush_removals`].
pub struct Scene {
    entities: SlotMap<EntityId, Entity>,
    pending: Vec<EntityId>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            entities: SlotMap::with_capacity_and_key(256),
            pending: Vec::new(),
        }
    }

    /// Add an entity built from its freshly allocated id.
    pub fn spawn_with(&mut self, build: impl FnOnce(EntityId) -> Entity) -> EntityId {
        self.entities.insert_with_key(build)
    }

    /// Queue an entity for removal. Returns `false` if it is unknown or already queued.
    pub fn despawn_later(&mut self, id: EntityId) -> bool {
        if !self.entities.contains_key(id) || self.pending.contains(&id) {
            return false;
        }
        self.pending.push(id);
        true
    }

    /// Remove an entity immediately. Never call while iterating the scene.
    pub fn despawn_now(&mut self, id: EntityId) -> Option<Entity> {
        self.pending.retain(|p| *p != id);
        self.entities.remove(id)
    }

    /// Apply queued removals, returning the removed entities in request order.
    pub fn flush_removals(&mut self) -> Vec<Entity> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .filter_map(|id| self.entities.remove(id))
            .collect()
    }

    pub fn is_pending_removal(&self, id: EntityId) -> bool {
        self.pending.contains(&id)
    }

    /// Present and not queued for removal.
    pub fn is_live(&self, id: EntityId) -> bool {
        self.entities.contains_key(id) && !self.is_pending_removal(id)
    }

    /// Get a reference to an entity by ID, queued or not.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Take the entity's kind out so its behavior can borrow the world.
    pub fn check_out(&mut self, id: EntityId) -> Option<EntityKind> {
        self.entities.get_mut(id)?.take_kind()
    }

    /// Put back a kind taken with [`Scene::check_out`].
    pub fn check_in(&mut self, id: EntityId, kind: EntityKind) {
        if let Some(entity) = self.entities.get_mut(id) {
            entity.put_kind(kind);
        }
    }

    /// Live entities (queued removals excluded).
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities
            .values()
            .filter(|e| !self.pending.contains(&e.id()))
    }

    /// Snapshot of live ids, safe to walk while the scene changes.
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(Entity::id).collect()
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len() - self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
