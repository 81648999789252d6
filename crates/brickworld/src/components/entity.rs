use glam::Vec2;

use crate::api::types::{Category, EntityId};
use crate::components::block::Block;
use crate::components::item::DroppedItem;
use crate::components::mob::Mob;
use crate::components::player::Player;
use crate::core::physics::BodyHandle;
use crate::core::world::World;

/// Per-variant gameplay reactions.
///
/// `on_hit` runs when the dispatcher accepts a collision between this entity
/// and `other` (the player, or another mob). `step` runs once per tick for
/// timers and animation. Both receive the whole world; the player is reached
/// through [`World::player_mut`].
pub trait Behavior {
    fn on_hit(&mut self, _this: EntityId, _other: EntityId, _world: &mut World) {}

    fn step(&mut self, _this: EntityId, _dt: f32, _world: &mut World) {}
}

/// Health clamped to `[0, max]` on every change. Zero means dead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    current: f32,
    max: f32,
}

impl Health {
    /// Full health. A negative maximum is treated as zero.
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self { current: max, max }
    }

    /// Non-finite deltas are ignored.
    pub fn change(&mut self, delta: f32) {
        if !delta.is_finite() {
            return;
        }
        self.current = (self.current + delta).clamp(0.0, self.max);
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}

/// Invisible edge of the world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryWall {
    id: String,
}

impl BoundaryWall {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// `left`, `right`, `top` or `bottom`.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Closed set of everything that can live in a world.
#[derive(Debug, Clone)]
pub enum EntityKind {
    /// Stand-in for a grid token nobody knows how to build.
    Placeholder,
    Wall(BoundaryWall),
    Block(Block),
    Item(DroppedItem),
    Mob(Mob),
    Player(Player),
}

impl EntityKind {
    pub fn category(&self) -> Category {
        match self {
            EntityKind::Placeholder => Category::Placeholder,
            EntityKind::Wall(_) => Category::Wall,
            EntityKind::Block(_) => Category::Block,
            EntityKind::Item(_) => Category::Item,
            EntityKind::Mob(_) => Category::Mob,
            EntityKind::Player(_) => Category::Player,
        }
    }
}

impl Behavior for EntityKind {
    fn on_hit(&mut self, this: EntityId, other: EntityId, world: &mut World) {
        match self {
            EntityKind::Block(block) => block.on_hit(this, other, world),
            EntityKind::Mob(mob) => mob.on_hit(this, other, world),
            EntityKind::Placeholder
            | EntityKind::Wall(_)
            | EntityKind::Item(_)
            | EntityKind::Player(_) => {}
        }
    }

    fn step(&mut self, this: EntityId, dt: f32, world: &mut World) {
        match self {
            EntityKind::Block(block) => block.step(this, dt, world),
            EntityKind::Mob(mob) => mob.step(this, dt, world),
            EntityKind::Player(player) => player.step(this, dt, world),
            EntityKind::Placeholder | EntityKind::Wall(_) | EntityKind::Item(_) => {}
        }
    }
}

/// A world resident: identity, category, physics body and its variant state.
///
/// The category is fixed at construction. The kind is briefly absent while the
/// entity's own behavior runs.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    category: Category,
    body: BodyHandle,
    anchor: Vec2,
    kind: Option<EntityKind>,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, body: BodyHandle, anchor: Vec2) -> Self {
        Self {
            id,
            category: kind.category(),
            body,
            anchor,
            kind: Some(kind),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// The point the entity was placed at. For blocks this is the centre of
    /// their top-left grid cell; for everything else the body's initial centre.
    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    pub fn kind(&self) -> Option<&EntityKind> {
        self.kind.as_ref()
    }

    pub fn kind_mut(&mut self) -> Option<&mut EntityKind> {
        self.kind.as_mut()
    }

    pub(crate) fn take_kind(&mut self) -> Option<EntityKind> {
        self.kind.take()
    }

    pub(crate) fn put_kind(&mut self, kind: EntityKind) {
        debug_assert_eq!(kind.category(), self.category);
        self.kind = Some(kind);
    }

    pub fn into_kind(self) -> Option<EntityKind> {
        self.kind
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self.kind.as_ref()? {
            EntityKind::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_mob(&self) -> Option<&Mob> {
        match self.kind.as_ref()? {
            EntityKind::Mob(mob) => Some(mob),
            _ => None,
        }
    }

    pub fn as_item(&self) -> Option<&DroppedItem> {
        match self.kind.as_ref()? {
            EntityKind::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_player(&self) -> Option<&Player> {
        match self.kind.as_ref()? {
            EntityKind::Player(player) => Some(player),
            _ => None,
        }
    }

    pub fn as_wall(&self) -> Option<&BoundaryWall> {
        match self.kind.as_ref()? {
            EntityKind::Wall(wall) => Some(wall),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_clamps_both_ways() {
        let mut health = Health::new(20.0);
        health.change(-5.0);
        assert_eq!(health.current(), 15.0);
        health.change(-30.0);
        assert_eq!(health.current(), 0.0);
        assert!(health.is_dead());
        health.change(1e9);
        assert_eq!(health.current(), 20.0);
    }

    #[test]
    fn health_stays_in_range_for_any_delta() {
        let mut health = Health::new(7.0);
        for delta in [-1e6, 3.5, -0.25, 1e6, f32::MIN, 0.0, 2.0, f32::MAX] {
            health.change(delta);
            assert!((0.0..=7.0).contains(&health.current()), "{delta} -> {:?}", health);
        }
    }

    #[test]
    fn non_finite_deltas_leave_health_alone() {
        let mut health = Health::new(7.0);
        health.change(-2.0);
        for delta in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            health.change(delta);
            assert_eq!(health.current(), 5.0, "{delta}");
        }
    }

    #[test]
    fn kind_category_is_stable() {
        let entity = Entity::new(
            EntityId::default(),
            EntityKind::Wall(BoundaryWall::new("left")),
            BodyHandle::default(),
            Vec2::ZERO,
        );
        assert_eq!(entity.category(), Category::Wall);
        assert_eq!(entity.as_wall().unwrap().id(), "left");
        assert!(entity.as_block().is_none());
    }
}
