use glam::Vec2;

use crate::api::types::{Direction, EntityId, GameEvent};
use crate::components::entity::{Behavior, Health};
use crate::components::item::DroppedItem;
use crate::components::player::{bounce_player, hurt_player};
use crate::core::world::World;

pub const MOB_DEFAULT_TEMPO: f32 = 30.0;
pub const MOB_DEFAULT_WEIGHT: f32 = 30.0;
pub const MOB_MAX_HEALTH: f32 = 20.0;

/// A squished mushroom lingers this long before it disappears.
pub const SQUISH_SECONDS: f32 = 0.5;
/// Minimum time between two cloud drops.
pub const CLOUD_FIRE_INTERVAL: f32 = 2.0;
/// Cloud drops appear this far below the cloud centre.
const CLOUD_DROP_OFFSET: f32 = 22.0;

/// A computer-controlled creature walking at a constant `tempo`.
#[derive(Debug, Clone)]
pub struct Mob {
    id: String,
    size: Vec2,
    weight: f32,
    tempo: f32,
    health: Health,
    variant: MobVariant,
}

#[derive(Debug, Clone)]
pub enum MobVariant {
    Generic,
    Mushroom(Mushroom),
    Fireball,
    Cloud(Cloud),
}

impl Mob {
    pub fn new(id: impl Into<String>, size: Vec2) -> Self {
        Self {
            id: id.into(),
            size,
            weight: MOB_DEFAULT_WEIGHT,
            tempo: MOB_DEFAULT_TEMPO,
            health: Health::new(MOB_MAX_HEALTH),
            variant: MobVariant::Generic,
        }
    }

    /// Walks left at first; hurts the player from the side, squished from above.
    pub fn mushroom() -> Self {
        Self {
            weight: 40.0,
            tempo: -30.0,
            variant: MobVariant::Mushroom(Mushroom {
                pressed: false,
                since_pressed: 0.0,
                walk_time: 0.0,
                image: "1",
            }),
            ..Self::new("mushroom", Vec2::splat(16.0))
        }
    }

    /// Falls straight down and explodes on whatever it hits.
    pub fn fireball() -> Self {
        Self {
            weight: 300.0,
            tempo: 0.0,
            variant: MobVariant::Fireball,
            ..Self::new("fireball", Vec2::splat(16.0))
        }
    }

    /// Floats toward the player and drops fireballs once within `fire_range`.
    pub fn cloud(fire_range: f32) -> Self {
        Self {
            weight: 0.0,
            tempo: 80.0,
            variant: MobVariant::Cloud(Cloud {
                fire_range,
                since_drop: 0.0,
            }),
            ..Self::new("cloud", Vec2::new(16.0, 24.0))
        }
    }

    /// Mob for a mob id (`mushroom`, `fireball`, `cloud`); anything else is a 1x1 generic walker.
    pub fn from_id(id: &str) -> Self {
        match id {
            "mushroom" => Self::mushroom(),
            "fireball" => Self::fireball(),
            "cloud" => Self::cloud(10.0),
            other => Self::new(other, Vec2::ONE),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Physical (width, height) in pixels.
    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn tempo(&self) -> f32 {
        self.tempo
    }

    pub fn set_tempo(&mut self, tempo: f32) {
        self.tempo = tempo;
    }

    /// Turn around.
    pub fn reverse(&mut self) {
        self.tempo = -self.tempo;
    }

    pub fn health(&self) -> f32 {
        self.health.current()
    }

    pub fn change_health(&mut self, change: f32) {
        self.health.change(change);
    }

    pub fn variant(&self) -> &MobVariant {
        &self.variant
    }

    /// Clouds float.
    pub fn gravity_scale(&self) -> f32 {
        match self.variant {
            MobVariant::Cloud(_) => 0.0,
            _ => 1.0,
        }
    }

    pub fn is_mushroom(&self) -> bool {
        matches!(self.variant, MobVariant::Mushroom(_))
    }

    pub fn is_fireball(&self) -> bool {
        matches!(self.variant, MobVariant::Fireball)
    }

    pub fn is_cloud(&self) -> bool {
        matches!(self.variant, MobVariant::Cloud(_))
    }

    /// Squished mushroom.
    pub fn is_pressed(&self) -> bool {
        match &self.variant {
            MobVariant::Mushroom(mushroom) => mushroom.pressed,
            _ => false,
        }
    }

    pub fn image(&self) -> &str {
        match &self.variant {
            MobVariant::Mushroom(mushroom) => mushroom.image,
            _ => "default",
        }
    }

    /// Walk at `tempo`, keeping whatever vertical speed gravity gave us.
    fn walk(&self, this: EntityId, world: &mut World) {
        let vy = world.velocity(this).map_or(0.0, |v| v.y);
        world.set_velocity(this, Vec2::new(self.tempo, vy));
    }
}

impl Behavior for Mob {
    fn on_hit(&mut self, this: EntityId, other: EntityId, world: &mut World) {
        match &mut self.variant {
            MobVariant::Mushroom(mushroom) => mushroom.on_hit(this, other, world),
            MobVariant::Fireball => {
                hurt_player(world);
                world.remove(this);
            }
            MobVariant::Generic | MobVariant::Cloud(_) => {}
        }
    }

    fn step(&mut self, this: EntityId, dt: f32, world: &mut World) {
        let tempo = self.tempo;
        match &mut self.variant {
            MobVariant::Cloud(cloud) => cloud.seek_and_fire(this, tempo, dt, world),
            MobVariant::Mushroom(mushroom) => {
                mushroom.animate(this, dt, world);
                self.walk(this, world);
            }
            MobVariant::Generic | MobVariant::Fireball => self.walk(this, world),
        }
    }
}

// ---------------------------------------------------------------------------
// Variant state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Mushroom {
    pressed: bool,
    since_pressed: f32,
    walk_time: f32,
    image: &'static str,
}

impl Mushroom {
    fn on_hit(&mut self, this: EntityId, player: EntityId, world: &mut World) {
        let Ok(Some(direction)) = world.collision_direction(player, this) else {
            return;
        };
        let repel = 2.0 * world.player().map_or(0.0, |p| p.max_velocity());
        match direction {
            Direction::Left => {
                hurt_player(world);
                world.set_velocity(player, Vec2::new(-repel, 0.0));
            }
            Direction::Right => {
                hurt_player(world);
                world.set_velocity(player, Vec2::new(repel, 0.0));
            }
            Direction::Above => {
                bounce_player(world, player);
                self.pressed = true;
                self.since_pressed = 0.0;
            }
            Direction::Below => {}
        }
    }

    // 1-2-1-2, 0.2 s per frame; gone half a second after being squished.
    fn animate(&mut self, this: EntityId, dt: f32, world: &mut World) {
        self.walk_time += dt;
        if self.walk_time <= 0.2 {
            self.image = "1";
        } else if self.walk_time <= 0.4 {
            self.image = "2";
        } else {
            self.walk_time = 0.0;
        }

        if self.pressed {
            self.since_pressed += dt;
            if self.since_pressed > SQUISH_SECONDS {
                world.remove(this);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cloud {
    fire_range: f32,
    since_drop: f32,
}

impl Cloud {
    pub fn fire_range(&self) -> f32 {
        self.fire_range
    }

    fn seek_and_fire(&mut self, this: EntityId, tempo: f32, dt: f32, world: &mut World) {
        self.since_drop += dt;
        let Ok(me) = world.position(this) else {
            return;
        };
        let target = world.player_id().and_then(|p| world.position(p).ok());

        let vx = match target {
            Some(player) if (player.x - me.x).abs() < self.fire_range => {
                if self.since_drop >= CLOUD_FIRE_INTERVAL {
                    self.since_drop = 0.0;
                    Self::fire(me, world);
                }
                0.0
            }
            Some(player) if player.x < me.x => -tempo,
            Some(player) if player.x > me.x => tempo,
            _ => 0.0,
        };
        world.set_velocity(this, Vec2::new(vx, 0.0));
    }

    // One in ten drops is a coin.
    fn fire(from: Vec2, world: &mut World) {
        let at = Vec2::new(from.x, from.y + CLOUD_DROP_OFFSET);
        let id = if world.rng_mut().range_inclusive(1, 10) == 1 {
            world.add_item(DroppedItem::coin(1), at)
        } else {
            world.add_mob(Mob::fireball(), at)
        };
        log::debug!("cloud dropped {:?} at {}", id, at);
        world.emit(GameEvent::Spawned { id });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_mobs_have_their_stats() {
        let mushroom = Mob::from_id("mushroom");
        assert_eq!(mushroom.size(), Vec2::splat(16.0));
        assert_eq!(mushroom.tempo(), -30.0);
        assert_eq!(mushroom.weight(), 40.0);

        let cloud = Mob::from_id("cloud");
        assert_eq!(cloud.size(), Vec2::new(16.0, 24.0));
        assert_eq!(cloud.gravity_scale(), 0.0);

        let fireball = Mob::fireball();
        assert_eq!(fireball.tempo(), 0.0);
        assert_eq!(fireball.weight(), 300.0);

        let blob = Mob::from_id("blob");
        assert_eq!(blob.id(), "blob");
        assert_eq!(blob.size(), Vec2::ONE);
        assert_eq!(blob.tempo(), MOB_DEFAULT_TEMPO);
    }

    #[test]
    fn reverse_flips_direction() {
        let mut mob = Mob::mushroom();
        mob.reverse();
        assert_eq!(mob.tempo(), 30.0);
        mob.reverse();
        assert_eq!(mob.tempo(), -30.0);
    }

    #[test]
    fn mob_health_is_clamped() {
        let mut mob = Mob::mushroom();
        mob.change_health(-100.0);
        assert_eq!(mob.health(), 0.0);
        mob.change_health(100.0);
        assert_eq!(mob.health(), MOB_MAX_HEALTH);
    }
}
