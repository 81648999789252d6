use std::collections::BTreeSet;
use std::sync::Mutex;

use glam::Vec2;
use rapier2d::prelude::*;
use slotmap::{new_key_type, Key, KeyData, SlotMap};

use crate::api::types::EntityId;

new_key_type! {
    /// Handle to a body inside [`PhysicsWorld`].
    pub struct BodyHandle;
}

/// Typical object size in pixels. Rapier scales its tolerances by it.
pub const DEFAULT_LENGTH_UNIT: f32 = 16.0;

// ---------------------------------------------------------------------------
// Conversion helpers (private): glam <-> nalgebra, handle <-> user data
// ---------------------------------------------------------------------------

fn to_na(v: Vec2) -> Vector<Real> {
    vector![v.x, v.y]
}

fn to_vec2(v: &Vector<Real>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn handle_to_user_data(handle: BodyHandle) -> u128 {
    u128::from(handle.data().as_ffi())
}

fn user_data_to_handle(data: u128) -> BodyHandle {
    BodyHandle::from(KeyData::from_ffi(data as u64))
}

fn collider_body(colliders: &ColliderSet, collider: ColliderHandle) -> Option<BodyHandle> {
    colliders.get(collider).map(|co| user_data_to_handle(co.user_data))
}

// ---------------------------------------------------------------------------
// Bounding boxes
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box. Y grows downward, so `min.y` is the visual top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Strict containment: points on the boundary are outside.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x > self.min.x && p.x < self.max.x && p.y > self.min.y && p.y < self.max.y
    }
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// The kind of rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    /// Moved by gravity, velocity and blocking contacts.
    Dynamic,
    /// Never moves on its own; only explicit position sets move it.
    Fixed,
}

impl BodyType {
    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Fixed => RigidBodyType::Fixed,
        }
    }
}

/// Builder for describing a box body before creation.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub position: Vec2,
    pub velocity: Vec2,
    pub half_extents: Vec2,
    pub gravity_scale: f32,
    pub mass: f32,
    /// Category bit of the owning entity.
    pub category: u32,
    /// Categories this body may touch.
    pub mask: u32,
}

impl BodyDesc {
    /// Create a dynamic box body description.
    pub fn dynamic(half_extents: Vec2) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            half_extents,
            gravity_scale: 1.0,
            mass: 1.0,
            category: 1,
            mask: u32::MAX,
        }
    }

    /// Create a fixed (static) box body description.
    pub fn fixed(half_extents: Vec2) -> Self {
        Self {
            body_type: BodyType::Fixed,
            gravity_scale: 0.0,
            ..Self::dynamic(half_extents)
        }
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.position = pos;
        self
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.velocity = vel;
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    /// Collider mass. Non-positive means 1.
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_category(mut self, category: u32) -> Self {
        self.category = category;
        self
    }

    pub fn with_mask(mut self, mask: u32) -> Self {
        self.mask = mask;
        self
    }

    fn collision_groups(&self) -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_truncate(self.category),
            Group::from_bits_truncate(self.mask),
        )
    }
}

/// A contact transition between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub entity_a: EntityId,
    pub entity_b: EntityId,
    /// `true` when the contact just started, `false` when it ended.
    pub started: bool,
}

#[derive(Debug, Clone, Copy)]
struct BodyEntry {
    entity: EntityId,
    rigid_body: RigidBodyHandle,
    collider: ColliderHandle,
    enabled: bool,
}

type PairKey = (BodyHandle, BodyHandle);

fn pair_key(a: BodyHandle, b: BodyHandle) -> PairKey {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

// ---------------------------------------------------------------------------
// Event collector and contact filter
// ---------------------------------------------------------------------------

struct DirectEventCollector {
    collisions: Mutex<Vec<CollisionEvent>>,
}

impl DirectEventCollector {
    fn new() -> Self {
        Self {
            collisions: Mutex::new(Vec::new()),
        }
    }

    fn drain_collisions(&self) -> Vec<CollisionEvent> {
        match self.collisions.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl EventHandler for DirectEventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let Ok(mut events) = self.collisions.lock() {
            events.push(event);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// Contacts the gameplay marked as blocking. Every other contact is still
/// computed (so it reports begin and separate) but the solver ignores it.
#[derive(Default)]
struct ContactFilter {
    blocking: BTreeSet<PairKey>,
}

impl PhysicsHooks for ContactFilter {
    fn filter_contact_pair(&self, context: &PairFilterContext) -> Option<SolverFlags> {
        let pair = collider_body(context.colliders, context.collider1)
            .zip(collider_body(context.colliders, context.collider2))
            .map(|(a, b)| pair_key(a, b));
        if pair.is_some_and(|key| self.blocking.contains(&key)) {
            Some(SolverFlags::COMPUTE_IMPULSES)
        } else {
            Some(SolverFlags::empty())
        }
    }
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// Box physics on top of Rapier2D, with contact transitions reported per
/// step and a per-contact choice of whether it blocks.
///
/// A new contact never blocks in the step that found it. Once gameplay marks
/// it with [`set_resolution`](Self::set_resolution), the solver pushes the
/// bodies apart from the next step on.
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    event_collector: DirectEventCollector,
    contact_filter: ContactFilter,
    entries: SlotMap<BodyHandle, BodyEntry>,
    contacts: BTreeSet<PairKey>,
    /// Contacts ended by disabling or removing a body, not yet handed out.
    separations: Vec<CollisionPair>,
}

impl PhysicsWorld {
    /// Create a new physics world. Y points down, so positive `gravity.y` pulls bodies down.
    pub fn new(gravity: Vec2) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.length_unit = DEFAULT_LENGTH_UNIT;
        Self {
            gravity: to_na(gravity),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            event_collector: DirectEventCollector::new(),
            contact_filter: ContactFilter::default(),
            entries: SlotMap::with_key(),
            contacts: BTreeSet::new(),
            separations: Vec::new(),
        }
    }

    /// Scale the solver tolerances to the level's cell size.
    pub fn with_length_unit(mut self, length_unit: f32) -> Self {
        if length_unit > 0.0 {
            self.integration_parameters.length_unit = length_unit;
        }
        self
    }

    /// Create a box body. The body handle is kept in the collider's user data
    /// for contact lookups.
    pub fn create_body(&mut self, entity: EntityId, desc: &BodyDesc) -> BodyHandle {
        let rb = RigidBodyBuilder::new(desc.body_type.to_rapier())
            .translation(to_na(desc.position))
            .linvel(to_na(desc.velocity))
            .gravity_scale(desc.gravity_scale)
            .lock_rotations()
            .can_sleep(false)
            .build();
        let rigid_body = self.bodies.insert(rb);

        let mass = if desc.mass > 0.0 { desc.mass } else { 1.0 };
        let bodies = &mut self.bodies;
        let colliders = &mut self.colliders;
        let handle = self.entries.insert_with_key(|handle| {
            let collider = ColliderBuilder::cuboid(desc.half_extents.x, desc.half_extents.y)
                .friction(0.0)
                .restitution(0.0)
                .mass(mass)
                .collision_groups(desc.collision_groups())
                .active_events(ActiveEvents::COLLISION_EVENTS)
                .active_hooks(ActiveHooks::FILTER_CONTACT_PAIRS)
                .user_data(handle_to_user_data(handle))
                .build();
            let collider = colliders.insert_with_parent(collider, rigid_body, bodies);
            BodyEntry {
                entity,
                rigid_body,
                collider,
                enabled: true,
            }
        });
        self.sync_queries();
        handle
    }

    /// Remove a body. Its live contacts are reported as separated through
    /// [`take_separations`](Self::take_separations).
    pub fn remove_body(&mut self, handle: BodyHandle) -> bool {
        self.end_contacts_of(handle);
        let Some(entry) = self.entries.remove(handle) else {
            return false;
        };
        self.bodies.remove(
            entry.rigid_body,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        self.sync_queries();
        true
    }

    /// Disabled bodies stop moving, colliding and showing up in queries.
    /// Disabling ends the body's contacts the same way removal does.
    pub fn set_enabled(&mut self, handle: BodyHandle, enabled: bool) {
        let Some(entry) = self.entries.get_mut(handle) else {
            return;
        };
        if entry.enabled == enabled {
            return;
        }
        entry.enabled = enabled;
        let (rigid_body, collider) = (entry.rigid_body, entry.collider);
        if let Some(rb) = self.bodies.get_mut(rigid_body) {
            rb.set_enabled(enabled);
        }
        if let Some(co) = self.colliders.get_mut(collider) {
            co.set_enabled(enabled);
        }
        if !enabled {
            self.end_contacts_of(handle);
        }
        self.sync_queries();
    }

    /// Step the simulation by `dt` and collect the contact transitions it produced.
    ///
    /// Blocking contacts are solved inside the step. New contacts are added as
    /// non-blocking; ended contacts forget their resolution.
    pub fn step_into(&mut self, dt: f32, collision_events: &mut Vec<CollisionPair>) {
        if dt > 0.0 {
            self.integration_parameters.dt = dt;
            self.physics_pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.bodies,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                &mut self.ccd_solver,
                Some(&mut self.query_pipeline),
                &self.contact_filter,
                &self.event_collector,
            );
        }

        for event in self.event_collector.drain_collisions() {
            let (h1, h2, started) = match event {
                CollisionEvent::Started(h1, h2, _) => (h1, h2, true),
                CollisionEvent::Stopped(h1, h2, _) => (h1, h2, false),
            };
            // Colliders removed since the event was raised have already
            // reported their separation.
            let (Some(a), Some(b)) = (self.live_body(h1), self.live_body(h2)) else {
                continue;
            };
            let key = pair_key(a, b);
            let changed = if started {
                self.contacts.insert(key)
            } else {
                self.contact_filter.blocking.remove(&key);
                self.contacts.remove(&key)
            };
            if let Some(pair) = changed.then(|| self.pair_event(key, started)).flatten() {
                collision_events.push(pair);
            }
        }
    }

    /// Separations caused by disabling or removing bodies since the last call.
    pub fn take_separations(&mut self) -> Vec<CollisionPair> {
        std::mem::take(&mut self.separations)
    }

    /// Decide whether an active contact blocks movement.
    pub fn set_resolution(&mut self, a: BodyHandle, b: BodyHandle, resolve: bool) {
        let key = pair_key(a, b);
        if !self.contacts.contains(&key) {
            return;
        }
        if resolve {
            self.contact_filter.blocking.insert(key);
        } else {
            self.contact_filter.blocking.remove(&key);
        }
    }

    /// Whether an active contact blocks movement. `None` when the bodies are not in contact.
    pub fn resolution(&self, a: BodyHandle, b: BodyHandle) -> Option<bool> {
        let key = pair_key(a, b);
        self.contacts
            .contains(&key)
            .then(|| self.contact_filter.blocking.contains(&key))
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, vel: Vec2) {
        if let Some(rb) = self.rigid_body_mut(handle) {
            rb.set_linvel(to_na(vel), true);
        }
    }

    pub fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.rigid_body(handle).map(|rb| to_vec2(rb.linvel()))
    }

    /// Teleport a body.
    pub fn set_position(&mut self, handle: BodyHandle, pos: Vec2) {
        let Some(rb) = self.rigid_body_mut(handle) else {
            return;
        };
        rb.set_translation(to_na(pos), true);
        self.sync_queries();
    }

    pub fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.rigid_body(handle).map(|rb| to_vec2(rb.translation()))
    }

    pub fn aabb(&self, handle: BodyHandle) -> Option<Aabb> {
        let entry = self.entries.get(handle)?;
        let cuboid = self.colliders.get(entry.collider)?.shape().as_cuboid()?;
        let centre = self.position(handle)?;
        Some(Aabb::from_center(centre, to_vec2(&cuboid.half_extents)))
    }

    /// Whether `point` lies strictly inside the body's box. A disabled body
    /// contains nothing. `None` if the body is gone.
    pub fn point_inside(&self, handle: BodyHandle, point: Vec2) -> Option<bool> {
        let entry = self.entries.get(handle)?;
        let aabb = self.aabb(handle)?;
        let mut hit = false;
        if entry.enabled {
            self.query_pipeline.intersections_with_point(
                &self.bodies,
                &self.colliders,
                &point![point.x, point.y],
                QueryFilter::default(),
                |collider| {
                    hit = collider == entry.collider;
                    !hit
                },
            );
        }
        // Rapier counts the boundary as inside.
        Some(hit && aabb.contains(point))
    }

    /// Every enabled body whose box intersects the circle, in handle order.
    pub fn query_circle(&self, center: Vec2, radius: f32) -> Vec<(BodyHandle, EntityId)> {
        let mut hits = Vec::new();
        self.query_pipeline.intersections_with_shape(
            &self.bodies,
            &self.colliders,
            &Isometry::translation(center.x, center.y),
            &Ball::new(radius),
            QueryFilter::default(),
            |collider| {
                if let Some(handle) = self.live_body(collider) {
                    if let Some(entry) = self.entries.get(handle) {
                        hits.push((handle, entry.entity));
                    }
                }
                true
            },
        );
        hits.sort_by_key(|(handle, _)| *handle);
        hits
    }

    /// Number of bodies in the simulation.
    pub fn body_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of active contacts.
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    // -- private helpers --

    fn rigid_body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(self.entries.get(handle)?.rigid_body)
    }

    fn rigid_body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(self.entries.get(handle)?.rigid_body)
    }

    /// Body behind a collider, if it still exists and is enabled.
    fn live_body(&self, collider: ColliderHandle) -> Option<BodyHandle> {
        let handle = collider_body(&self.colliders, collider)?;
        self.entries
            .get(handle)
            .filter(|entry| entry.enabled && entry.collider == collider)
            .map(|_| handle)
    }

    fn pair_event(&self, (a, b): PairKey, started: bool) -> Option<CollisionPair> {
        Some(CollisionPair {
            body_a: a,
            body_b: b,
            entity_a: self.entries.get(a)?.entity,
            entity_b: self.entries.get(b)?.entity,
            started,
        })
    }

    fn end_contacts_of(&mut self, handle: BodyHandle) {
        let ended: Vec<PairKey> = self
            .contacts
            .iter()
            .filter(|(a, b)| *a == handle || *b == handle)
            .copied()
            .collect();
        for key in ended {
            self.contacts.remove(&key);
            self.contact_filter.blocking.remove(&key);
            if let Some(pair) = self.pair_event(key, false) {
                self.separations.push(pair);
            }
        }
    }

    /// Move colliders to their bodies and refresh the query structure, so
    /// queries between steps see teleports, new bodies and removals.
    fn sync_queries(&mut self) {
        self.bodies
            .propagate_modified_body_positions_to_colliders(&mut self.colliders);
        self.query_pipeline.update(&self.colliders);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn eid(n: u64) -> EntityId {
        EntityId::from(KeyData::from_ffi(n))
    }

    fn floor(world: &mut PhysicsWorld) -> BodyHandle {
        world.create_body(
            eid(1),
            &BodyDesc::fixed(Vec2::new(100.0, 8.0)).with_position(Vec2::new(0.0, 100.0)),
        )
    }

    fn step(world: &mut PhysicsWorld, dt: f32) -> Vec<CollisionPair> {
        let mut events = Vec::new();
        world.step_into(dt, &mut events);
        events
    }

    /// Run one step, marking every new contact as blocking.
    fn blocking_step(world: &mut PhysicsWorld, dt: f32) -> Vec<CollisionPair> {
        let events = step(world, dt);
        for e in events.iter().filter(|e| e.started) {
            world.set_resolution(e.body_a, e.body_b, true);
        }
        events
    }

    #[test]
    fn create_and_remove_body() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let body = world.create_body(eid(1), &BodyDesc::dynamic(Vec2::splat(8.0)));
        assert_eq!(world.body_count(), 1);
        assert!(world.remove_body(body));
        assert!(!world.remove_body(body));
        assert_eq!(world.body_count(), 0);
        assert!(world.position(body).is_none());
    }

    #[test]
    fn gravity_affects_dynamic_body() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 100.0));
        let body = world.create_body(eid(1), &BodyDesc::dynamic(Vec2::splat(5.0)));
        for _ in 0..10 {
            step(&mut world, 1.0 / 60.0);
        }
        let pos = world.position(body).unwrap();
        assert!(pos.y > 0.0, "body should fall: y={}", pos.y);
        assert!(world.velocity(body).unwrap().y > 0.0);
    }

    #[test]
    fn gravity_scale_zero_floats() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 100.0));
        let body = world.create_body(
            eid(1),
            &BodyDesc::dynamic(Vec2::splat(5.0)).with_gravity_scale(0.0),
        );
        step(&mut world, 0.5);
        assert_eq!(world.position(body).unwrap(), Vec2::ZERO);
    }

    #[test]
    fn fixed_body_does_not_move() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 100.0));
        let body = floor(&mut world);
        for _ in 0..10 {
            step(&mut world, 1.0 / 60.0);
        }
        assert_eq!(world.position(body).unwrap(), Vec2::new(0.0, 100.0));
    }

    #[test]
    fn resting_body_lands_and_keeps_a_single_contact() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 300.0));
        let ground = floor(&mut world);
        let body = world.create_body(
            eid(2),
            &BodyDesc::dynamic(Vec2::splat(8.0)).with_position(Vec2::new(0.0, 80.0)),
        );

        let mut events = Vec::new();
        for _ in 0..200 {
            events.extend(blocking_step(&mut world, 0.01));
        }

        let pos = world.position(body).unwrap();
        assert!((pos.y - 84.0).abs() < 0.5, "should rest on the floor: y={}", pos.y);
        assert_eq!(events.iter().filter(|e| e.started).count(), 1);
        assert_eq!(events.iter().filter(|e| !e.started).count(), 0);
        assert_eq!(world.contact_count(), 1);
        assert_eq!(world.resolution(ground, body), Some(true));
    }

    #[test]
    fn side_contact_stops_horizontal_motion() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world.create_body(
            eid(1),
            &BodyDesc::fixed(Vec2::splat(8.0)).with_position(Vec2::new(20.0, 0.0)),
        );
        let body = world.create_body(
            eid(2),
            &BodyDesc::dynamic(Vec2::splat(8.0)).with_velocity(Vec2::new(100.0, 0.0)),
        );
        for _ in 0..50 {
            blocking_step(&mut world, 0.01);
        }
        let x = world.position(body).unwrap().x;
        assert!(x < 5.0, "body should stop against the box: x={x}");
        assert!(world.velocity(body).unwrap().x.abs() < 1.0);
    }

    #[test]
    fn non_blocking_contact_passes_through() {
        let mut world = PhysicsWorld::new(Vec2::new(0.0, 300.0));
        let ground = floor(&mut world);
        let body = world.create_body(
            eid(2),
            &BodyDesc::dynamic(Vec2::splat(8.0)).with_position(Vec2::new(0.0, 80.0)),
        );
        let mut events = Vec::new();
        for _ in 0..200 {
            world.step_into(0.01, &mut events);
        }
        assert!(world.position(body).unwrap().y > 120.0);
        assert_eq!(events.iter().filter(|e| e.started).count(), 1);
        assert_eq!(events.iter().filter(|e| !e.started).count(), 1);
        assert_eq!(world.resolution(ground, body), None);
    }

    #[test]
    fn stable_overlap_begins_once_and_separates_once() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world.create_body(eid(1), &BodyDesc::fixed(Vec2::splat(8.0)));
        let mover = world.create_body(
            eid(2),
            &BodyDesc::dynamic(Vec2::splat(8.0)).with_position(Vec2::new(4.0, 0.0)),
        );

        let mut events = Vec::new();
        for _ in 0..5 {
            world.step_into(0.01, &mut events);
        }
        assert_eq!(events.len(), 1);
        assert!(events[0].started);
        assert_eq!([events[0].entity_a, events[0].entity_b], [eid(1), eid(2)]);

        world.set_position(mover, Vec2::new(100.0, 0.0));
        for _ in 0..5 {
            world.step_into(0.01, &mut events);
        }
        assert_eq!(events.len(), 2);
        assert!(!events[1].started);
    }

    #[test]
    fn fixed_pairs_and_masked_pairs_never_touch() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world.create_body(eid(1), &BodyDesc::fixed(Vec2::splat(8.0)));
        world.create_body(eid(2), &BodyDesc::fixed(Vec2::splat(8.0)));
        world.create_body(
            eid(3),
            &BodyDesc::dynamic(Vec2::splat(8.0))
                .with_category(0b10)
                .with_mask(0b10),
        );
        assert!(step(&mut world, 0.01).is_empty());
        assert_eq!(world.contact_count(), 0);
    }

    #[test]
    fn heavier_body_gives_way_less() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let light = world.create_body(eid(1), &BodyDesc::dynamic(Vec2::splat(8.0)).with_mass(1.0));
        let heavy = world.create_body(
            eid(2),
            &BodyDesc::dynamic(Vec2::splat(8.0))
                .with_mass(10.0)
                .with_position(Vec2::new(12.0, 0.0)),
        );
        for _ in 0..30 {
            blocking_step(&mut world, 0.01);
        }
        let (pl, ph) = (world.position(light).unwrap(), world.position(heavy).unwrap());
        assert!(ph.x - pl.x > 12.0, "bodies should be pushed apart: {pl} {ph}");
        assert!(-pl.x > ph.x - 12.0, "light body should move more: {pl} {ph}");
    }

    #[test]
    fn point_inside_is_strict() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let body = world.create_body(eid(1), &BodyDesc::fixed(Vec2::splat(8.0)));
        assert_eq!(world.point_inside(body, Vec2::ZERO), Some(true));
        assert_eq!(world.point_inside(body, Vec2::new(8.0, 0.0)), Some(false));
        assert_eq!(world.point_inside(body, Vec2::new(30.0, 0.0)), Some(false));
        world.remove_body(body);
        assert_eq!(world.point_inside(body, Vec2::ZERO), None);
    }

    #[test]
    fn queries_follow_teleports_without_a_step() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let body = world.create_body(eid(1), &BodyDesc::dynamic(Vec2::splat(8.0)));
        world.set_position(body, Vec2::new(50.0, 0.0));
        assert_eq!(world.point_inside(body, Vec2::new(50.0, 0.0)), Some(true));
        assert!(world.query_circle(Vec2::ZERO, 4.0).is_empty());
    }

    #[test]
    fn circle_query_skips_disabled_bodies() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let near = world.create_body(
            eid(1),
            &BodyDesc::fixed(Vec2::splat(8.0)).with_position(Vec2::new(16.0, 0.0)),
        );
        world.create_body(
            eid(2),
            &BodyDesc::fixed(Vec2::splat(8.0)).with_position(Vec2::new(32.0, 0.0)),
        );
        let hits = world.query_circle(Vec2::ZERO, 20.0);
        assert_eq!(hits, vec![(near, eid(1))]);

        world.set_enabled(near, false);
        assert!(world.query_circle(Vec2::ZERO, 20.0).is_empty());
        assert_eq!(world.point_inside(near, Vec2::new(16.0, 0.0)), Some(false));
    }

    #[test]
    fn disabling_a_body_reports_its_contacts_as_separated() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        let block = world.create_body(eid(1), &BodyDesc::fixed(Vec2::splat(8.0)));
        world.create_body(
            eid(2),
            &BodyDesc::dynamic(Vec2::splat(8.0)).with_position(Vec2::new(4.0, 0.0)),
        );
        assert_eq!(step(&mut world, 0.01).len(), 1);
        assert!(world.take_separations().is_empty());

        world.set_enabled(block, false);
        let separations = world.take_separations();
        assert_eq!(separations.len(), 1);
        assert!(!separations[0].started);
        assert_eq!(world.contact_count(), 0);
        // Handed out once, and not reported again by the next step.
        assert!(world.take_separations().is_empty());
        assert!(step(&mut world, 0.01).is_empty());
    }

    #[test]
    fn removing_a_body_reports_its_contacts_as_separated() {
        let mut world = PhysicsWorld::new(Vec2::ZERO);
        world.create_body(eid(1), &BodyDesc::fixed(Vec2::splat(8.0)));
        let mover = world.create_body(eid(2), &BodyDesc::dynamic(Vec2::splat(8.0)));
        assert_eq!(step(&mut world, 0.01).len(), 1);

        world.remove_body(mover);
        let separations = world.take_separations();
        assert_eq!(separations.len(), 1);
        assert_eq!([separations[0].entity_a, separations[0].entity_b], [eid(1), eid(2)]);
        assert!(step(&mut world, 0.01).is_empty());
    }

    #[test]
    fn aabb_contains_is_strict() {
        let a = Aabb::from_center(Vec2::ZERO, Vec2::splat(8.0));
        assert_eq!(a.center(), Vec2::ZERO);
        assert!(a.contains(Vec2::new(7.9, -7.9)));
        assert!(!a.contains(Vec2::new(8.0, 0.0)));
    }
}
