use glam::Vec2;

use crate::api::error::{Error, Result};
use crate::api::types::{Category, Direction, EntityId, GameEvent};
use crate::components::block::Block;
use crate::components::entity::{Behavior, BoundaryWall, Entity, EntityKind};
use crate::components::item::DroppedItem;
use crate::components::mob::Mob;
use crate::components::player::Player;
use crate::core::physics::{Aabb, BodyDesc, PhysicsWorld};
use crate::core::rng::Rng;
use crate::core::scene::Scene;
use crate::systems::collision::{self, CollisionDispatcher, CollisionHandler};

/// Player collision box (width and height) in pixels.
pub const PLAYER_SIZE: f32 = 16.0;

/// Everything that exists in one loaded level: bodies, entities, collision
/// handlers and the events waiting for an observer.
pub struct World {
    physics: PhysicsWorld,
    scene: Scene,
    handlers: CollisionDispatcher,
    events: Vec<GameEvent>,
    rng: Rng,
    pixel_size: Vec2,
    block_size: f32,
    player: Option<EntityId>,
}

impl World {
    /// `gravity` is in pixels/s², positive y pulling down.
    pub fn new(pixel_size: Vec2, block_size: f32, gravity: Vec2) -> Self {
        Self {
            physics: PhysicsWorld::new(gravity).with_length_unit(block_size),
            scene: Scene::new(),
            handlers: CollisionDispatcher::new(),
            events: Vec::new(),
            rng: Rng::default(),
            pixel_size,
            block_size,
            player: None,
        }
    }

    /// Reseed the gameplay RNG.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Rng::new(seed);
        self
    }

    pub fn pixel_size(&self) -> Vec2 {
        self.pixel_size
    }

    pub fn block_size(&self) -> f32 {
        self.block_size
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    pub fn rng_mut(&mut self) -> &mut Rng {
        &mut self.rng
    }

    // -- Population --

    /// Add a block whose top-left cell is centred on `anchor`. Larger blocks
    /// extend right and down from there.
    pub fn add_block(&mut self, block: Block, anchor: Vec2) -> EntityId {
        let size = block.cell_size().as_vec2() * self.block_size;
        let centre = anchor + (size - self.block_size) * 0.5;
        let desc = BodyDesc::fixed(size * 0.5).with_position(centre);
        self.spawn(EntityKind::Block(block), anchor, desc)
    }

    /// Add a dropped item centred on `centre`. Items are half a block square and fall.
    pub fn add_item(&mut self, item: DroppedItem, centre: Vec2) -> EntityId {
        let desc = BodyDesc::dynamic(Vec2::splat(self.block_size * 0.25)).with_position(centre);
        self.spawn(EntityKind::Item(item), centre, desc)
    }

    pub fn add_mob(&mut self, mob: Mob, centre: Vec2) -> EntityId {
        let desc = BodyDesc::dynamic(mob.size() * 0.5)
            .with_position(centre)
            .with_mass(mob.weight())
            .with_gravity_scale(mob.gravity_scale());
        self.spawn(EntityKind::Mob(mob), centre, desc)
    }

    /// Add the player. A world tracks one player; adding another replaces the reference.
    pub fn add_player(&mut self, player: Player, centre: Vec2, mass: f32) -> EntityId {
        let desc = BodyDesc::dynamic(Vec2::splat(PLAYER_SIZE * 0.5))
            .with_position(centre)
            .with_mass(mass);
        let id = self.spawn(EntityKind::Player(player), centre, desc);
        self.player = Some(id);
        id
    }

    /// Add any other entity as a static box of `size` centred on `centre`.
    pub fn add_thing(&mut self, kind: EntityKind, centre: Vec2, size: Vec2) -> EntityId {
        let desc = BodyDesc::fixed(size * 0.5).with_position(centre);
        self.spawn(kind, centre, desc)
    }

    /// Enclose the level in four static walls just outside its cells.
    pub fn add_boundary_walls(&mut self) -> [EntityId; 4] {
        let bs = self.block_size;
        let half = bs * 0.5;
        let Vec2 { x: w, y: h } = self.pixel_size;
        // The level spans [-bs/2, w] x [-bs/2, h].
        let span = Vec2::new(w + 2.0 * bs, h + 2.0 * bs);
        let mid = Vec2::new((w - half) * 0.5, (h - half) * 0.5);
        let walls = [
            ("left", Vec2::new(-bs, mid.y), Vec2::new(bs, span.y)),
            ("right", Vec2::new(w + half, mid.y), Vec2::new(bs, span.y)),
            ("top", Vec2::new(mid.x, -bs), Vec2::new(span.x, bs)),
            ("bottom", Vec2::new(mid.x, h + half), Vec2::new(span.x, bs)),
        ];
        walls.map(|(id, centre, size)| {
            self.add_thing(EntityKind::Wall(BoundaryWall::new(id)), centre, size)
        })
    }

    fn spawn(&mut self, kind: EntityKind, anchor: Vec2, desc: BodyDesc) -> EntityId {
        let desc = desc.with_category(kind.category().mask());
        let physics = &mut self.physics;
        self.scene.spawn_with(|id| {
            let body = physics.create_body(id, &desc);
            Entity::new(id, kind, body, anchor)
        })
    }

    // -- Removal --

    /// Queue an entity for removal at the end of the step. Its body stops
    /// colliding immediately. Returns `false` if it is unknown or already queued.
    pub fn remove(&mut self, id: EntityId) -> bool {
        if !self.scene.despawn_later(id) {
            return false;
        }
        if let Some(entity) = self.scene.get(id) {
            self.physics.set_enabled(entity.body(), false);
        }
        true
    }

    /// Apply queued removals. Returns how many entities were dropped.
    ///
    /// Contacts ended by removals are dispatched first, while both entities
    /// are still stored, so `on_separate` handlers can inspect them.
    pub fn flush_removals(&mut self) -> usize {
        loop {
            let separations = self.physics.take_separations();
            if separations.is_empty() {
                break;
            }
            collision::dispatch(self, &separations);
        }
        let removed = self.scene.flush_removals();
        for entity in &removed {
            self.physics.remove_body(entity.body());
            if self.player == Some(entity.id()) {
                self.player = None;
            }
        }
        removed.len()
    }

    /// Detach the player from this world so it can be placed in the next one.
    pub fn take_player(&mut self) -> Option<Player> {
        let id = self.player.take()?;
        let entity = self.scene.despawn_now(id)?;
        self.physics.remove_body(entity.body());
        match entity.into_kind()? {
            EntityKind::Player(player) => Some(player),
            _ => None,
        }
    }

    // -- Lookup --

    pub fn is_live(&self, id: EntityId) -> bool {
        self.scene.is_live(id)
    }

    pub fn is_pending_removal(&self, id: EntityId) -> bool {
        self.scene.is_pending_removal(id)
    }

    /// Any entity still stored, including those queued for removal.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.scene.get(id)
    }

    /// All live entities, for the renderer.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.scene.iter()
    }

    pub fn entity_count(&self) -> usize {
        self.scene.len()
    }

    pub fn category_of(&self, id: EntityId) -> Option<Category> {
        self.scene.get(id).map(Entity::category)
    }

    pub fn player_id(&self) -> Option<EntityId> {
        self.player
    }

    pub fn player(&self) -> Option<&Player> {
        self.scene.get(self.player?)?.as_player()
    }

    pub fn player_mut(&mut self) -> Option<&mut Player> {
        match self.scene.get_mut(self.player?)?.kind_mut()? {
            EntityKind::Player(player) => Some(player),
            _ => None,
        }
    }

    pub fn block(&self, id: EntityId) -> Option<&Block> {
        self.scene.get(id)?.as_block()
    }

    pub fn mob(&self, id: EntityId) -> Option<&Mob> {
        self.scene.get(id)?.as_mob()
    }

    pub fn mob_mut(&mut self, id: EntityId) -> Option<&mut Mob> {
        match self.scene.get_mut(id)?.kind_mut()? {
            EntityKind::Mob(mob) => Some(mob),
            _ => None,
        }
    }

    pub fn item(&self, id: EntityId) -> Option<&DroppedItem> {
        self.scene.get(id)?.as_item()
    }

    // -- Spatial queries --

    /// Centre of the entity's box.
    pub fn position(&self, id: EntityId) -> Result<Vec2> {
        let body = self.scene.get(id).ok_or(Error::NotFound(id))?.body();
        self.physics.position(body).ok_or(Error::NotFound(id))
    }

    pub fn aabb(&self, id: EntityId) -> Result<Aabb> {
        let body = self.scene.get(id).ok_or(Error::NotFound(id))?.body();
        self.physics.aabb(body).ok_or(Error::NotFound(id))
    }

    /// Whether `point` lies strictly inside the entity's box.
    pub fn query_point(&self, id: EntityId, point: Vec2) -> Result<bool> {
        let body = self.scene.get(id).ok_or(Error::NotFound(id))?.body();
        self.physics
            .point_inside(body, point)
            .ok_or(Error::NotFound(id))
    }

    /// Live entities whose box touches the circle.
    pub fn things_in_range(&self, centre: Vec2, radius: f32) -> Vec<EntityId> {
        self.physics
            .query_circle(centre, radius)
            .into_iter()
            .map(|(_, id)| id)
            .filter(|id| self.scene.is_live(*id))
            .collect()
    }

    /// Which side of `other` the moving entity `mover` struck. `None` if no
    /// sample point of `mover` lies inside `other`.
    pub fn collision_direction(&self, mover: EntityId, other: EntityId) -> Result<Option<Direction>> {
        let mover_box = self.aabb(mover)?;
        let other_box = self.aabb(other)?;
        Ok(collision::collision_direction(&mover_box, |p| other_box.contains(p)))
    }

    // -- Motion --

    pub fn velocity(&self, id: EntityId) -> Option<Vec2> {
        self.physics.velocity(self.scene.get(id)?.body())
    }

    pub fn set_velocity(&mut self, id: EntityId, velocity: Vec2) {
        if let Some(entity) = self.scene.get(id) {
            self.physics.set_velocity(entity.body(), velocity);
        }
    }

    /// Teleport an entity's body centre.
    pub fn set_position(&mut self, id: EntityId, position: Vec2) {
        if let Some(entity) = self.scene.get(id) {
            self.physics.set_position(entity.body(), position);
        }
    }

    // -- Collision handlers --

    /// Register the reaction to `a` meeting `b`. Handlers receive the entities
    /// in the order of the categories given here.
    pub fn add_collision_handler(&mut self, a: Category, b: Category, handler: CollisionHandler) {
        self.handlers.register(a, b, handler);
    }

    /// Handler for a category pair and whether the pair had to be swapped to find it.
    pub fn collision_handler(&self, a: Category, b: Category) -> Option<(CollisionHandler, bool)> {
        self.handlers.lookup(a, b)
    }

    // -- Events --

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // -- Behaviors --

    /// Run `target`'s hit reaction against `other`.
    pub fn hit(&mut self, target: EntityId, other: EntityId) {
        if !self.scene.is_live(target) {
            return;
        }
        let Some(mut kind) = self.scene.check_out(target) else {
            return;
        };
        kind.on_hit(target, other, self);
        self.scene.check_in(target, kind);
    }

    /// Give every live entity its per-tick step. Entities added during the walk
    /// wait for the next tick; entities removed during it are skipped.
    pub fn step_entities(&mut self, dt: f32) {
        for id in self.scene.ids() {
            if !self.scene.is_live(id) {
                continue;
            }
            let Some(mut kind) = self.scene.check_out(id) else {
                continue;
            };
            kind.step(id, dt, self);
            self.scene.check_in(id, kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(Vec2::new(200.0, 100.0), 16.0, Vec2::new(0.0, 300.0))
    }

    #[test]
    fn blocks_grow_right_and_down_from_their_anchor() {
        let mut world = world();
        let id = world.add_block(
            Block::new("pipe").with_cell_size(glam::UVec2::new(2, 3)),
            Vec2::new(32.0, 16.0),
        );
        let aabb = world.aabb(id).unwrap();
        assert_eq!(aabb.min, Vec2::new(24.0, 8.0));
        assert_eq!(aabb.max, Vec2::new(56.0, 56.0));
        assert_eq!(world.entity(id).unwrap().anchor(), Vec2::new(32.0, 16.0));
    }

    #[test]
    fn queries_on_missing_entities_fail_with_not_found() {
        let mut world = world();
        let id = world.add_item(DroppedItem::coin(1), Vec2::ZERO);
        assert!(world.remove(id));
        assert!(!world.remove(id));
        assert!(world.position(id).is_ok(), "still stored until the flush");
        assert_eq!(world.flush_removals(), 1);

        assert!(matches!(world.position(id), Err(Error::NotFound(missing)) if missing == id));
        assert!(matches!(world.query_point(id, Vec2::ZERO), Err(Error::NotFound(_))));
        assert!(world.velocity(id).is_none());
    }

    #[test]
    fn removed_entities_leave_range_queries_at_once() {
        let mut world = world();
        let a = world.add_block(Block::new("brick"), Vec2::new(16.0, 0.0));
        let b = world.add_block(Block::new("brick"), Vec2::new(-16.0, 0.0));
        let mut found = world.things_in_range(Vec2::ZERO, 10.0);
        found.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(found, expected);

        world.remove(a);
        assert_eq!(world.things_in_range(Vec2::ZERO, 10.0), vec![b]);
    }

    #[test]
    fn player_can_move_between_worlds() {
        let mut first = world();
        let id = first.add_player(Player::new("mario", 5.0), Vec2::new(10.0, 10.0), 1.0);
        first.player_mut().unwrap().change_score(42);
        assert_eq!(first.player_id(), Some(id));

        let player = first.take_player().unwrap();
        assert!(first.player().is_none());
        assert_eq!(first.physics().body_count(), 0);

        let mut second = world();
        second.add_player(player, Vec2::ZERO, 1.0);
        assert_eq!(second.player().unwrap().score(), 42);
    }

    #[test]
    fn boundary_walls_enclose_the_cells() {
        let mut world = World::new(Vec2::new(40.0, 24.0), 16.0, Vec2::ZERO);
        let walls = world.add_boundary_walls();
        let left = world.aabb(walls[0]).unwrap();
        let right = world.aabb(walls[1]).unwrap();
        let top = world.aabb(walls[2]).unwrap();
        let bottom = world.aabb(walls[3]).unwrap();
        assert_eq!(left.max.x, -8.0);
        assert_eq!(right.min.x, 40.0);
        assert_eq!(top.max.y, -8.0);
        assert_eq!(bottom.min.y, 24.0);
        assert_eq!(world.entity(walls[3]).unwrap().as_wall().unwrap().id(), "bottom");
    }

    #[test]
    fn events_drain_in_order() {
        let mut world = world();
        world.emit(GameEvent::FlagReached);
        world.emit(GameEvent::PlayerDied);
        assert_eq!(world.events().len(), 2);
        assert_eq!(
            world.drain_events(),
            vec![GameEvent::FlagReached, GameEvent::PlayerDied]
        );
        assert!(world.events().is_empty());
    }
}
