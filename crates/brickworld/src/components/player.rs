use glam::Vec2;

use crate::api::types::EntityId;
use crate::components::entity::{Behavior, Health};
use crate::core::world::World;

/// Seconds a star keeps the player invincible.
pub const INVINCIBLE_SECONDS: f32 = 10.0;

/// The controllable character.
#[derive(Debug, Clone)]
pub struct Player {
    name: String,
    health: Health,
    score: i64,
    /// Allowed to jump (set on landing, cleared by a jump or a bounce).
    jumping: bool,
    invincible: bool,
    invincible_time: f32,
    on_tunnel: bool,
    bonus_health: bool,
    bounced: bool,
    max_velocity: f32,
    image: &'static str,
    image_time: f32,
}

impl Player {
    pub fn new(name: impl Into<String>, max_health: f32) -> Self {
        Self {
            name: name.into(),
            health: Health::new(max_health),
            score: 0,
            jumping: false,
            invincible: false,
            invincible_time: 0.0,
            on_tunnel: false,
            bonus_health: false,
            bounced: false,
            max_velocity: 0.0,
            image: "default",
            image_time: 0.0,
        }
    }

    pub fn with_max_velocity(mut self, max_velocity: f32) -> Self {
        self.max_velocity = max_velocity;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn health(&self) -> f32 {
        self.health.current()
    }

    pub fn max_health(&self) -> f32 {
        self.health.max()
    }

    pub fn is_dead(&self) -> bool {
        self.health.is_dead()
    }

    /// Heal or damage. Damage is ignored while invincible; the result is
    /// always clamped to `[0, max_health]`.
    pub fn change_health(&mut self, change: f32) {
        if change > 0.0 || !self.invincible {
            self.health.change(change);
        }
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn change_score(&mut self, change: i64) {
        self.score = self.score.saturating_add(change);
    }

    pub fn is_jumping(&self) -> bool {
        self.jumping
    }

    pub fn set_jumping(&mut self, jumping: bool) {
        self.jumping = jumping;
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible
    }

    /// Turning invincibility on (again) restarts its countdown.
    pub fn set_invincible(&mut self, invincible: bool) {
        self.invincible = invincible;
        self.invincible_time = 0.0;
    }

    pub fn on_tunnel(&self) -> bool {
        self.on_tunnel
    }

    pub fn set_on_tunnel(&mut self, on_tunnel: bool) {
        self.on_tunnel = on_tunnel;
    }

    /// Whether the flagpole heal was already granted on this level visit.
    pub fn bonus_health(&self) -> bool {
        self.bonus_health
    }

    pub fn set_bonus_health(&mut self, bonus_health: bool) {
        self.bonus_health = bonus_health;
    }

    pub fn is_bounced(&self) -> bool {
        self.bounced
    }

    pub fn set_bounced(&mut self, bounced: bool) {
        self.bounced = bounced;
    }

    pub fn max_velocity(&self) -> f32 {
        self.max_velocity
    }

    pub fn set_max_velocity(&mut self, max_velocity: f32) {
        self.max_velocity = max_velocity;
    }

    /// Current animation frame: `default` when standing, `1`..`3` while walking.
    pub fn image(&self) -> &str {
        self.image
    }

    fn animate(&mut self, dt: f32, moving: bool) {
        if !moving {
            self.image = "default";
            return;
        }
        // 3-2-1-2-3...
        self.image_time += dt;
        let t = self.image_time;
        self.image = if t <= 0.1 {
            "3"
        } else if t <= 0.2 || (0.3 < t && t <= 0.4) {
            "2"
        } else if t <= 0.3 {
            "1"
        } else {
            self.image_time = 0.0;
            "3"
        };
    }
}

impl Behavior for Player {
    fn step(&mut self, this: EntityId, dt: f32, world: &mut World) {
        if self.invincible {
            self.invincible_time += dt;
            if self.invincible_time > INVINCIBLE_SECONDS {
                self.set_invincible(false);
            }
        }
        let vx = world.velocity(this).map_or(0.0, |v| v.x);
        self.animate(dt, vx != 0.0);
    }
}

/// Launch the player upward off a bouncy surface. The player may not jump
/// again until it lands.
pub fn bounce_player(world: &mut World, player: EntityId) {
    let Some(state) = world.player_mut() else {
        return;
    };
    let speed = 3.0 * state.max_velocity();
    state.set_jumping(false);
    state.set_bounced(true);
    world.set_velocity(player, Vec2::new(0.0, -speed));
}

/// Take one point of damage, unless invincible.
pub fn hurt_player(world: &mut World) {
    if let Some(player) = world.player_mut() {
        player.change_health(-1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heal_is_capped_and_damage_floors_at_zero() {
        let mut player = Player::new("mario", 20.0);
        player.change_health(-5.0);
        player.change_health(-30.0);
        assert_eq!(player.health(), 0.0);
        assert!(player.is_dead());
        player.change_health(100.0);
        assert_eq!(player.health(), 20.0);
    }

    #[test]
    fn invincible_player_ignores_damage_but_heals() {
        let mut player = Player::new("mario", 5.0);
        player.change_health(-2.0);
        player.set_invincible(true);
        player.change_health(-2.0);
        assert_eq!(player.health(), 3.0);
        player.change_health(1.0);
        assert_eq!(player.health(), 4.0);
    }

    #[test]
    fn score_is_not_clamped() {
        let mut player = Player::new("luigi", 1.0);
        player.change_score(-3);
        assert_eq!(player.score(), -3);
        player.change_score(10);
        assert_eq!(player.score(), 7);
    }

    #[test]
    fn walk_cycle_is_three_two_one_two() {
        let mut player = Player::new("mario", 1.0);
        let mut frames = Vec::new();
        for _ in 0..5 {
            player.animate(0.1, true);
            frames.push(player.image().to_string());
        }
        // 0.1, 0.2, 0.3 (rounding may land just above), 0.4, >0.4
        assert_eq!(frames[0], "3");
        assert_eq!(frames[1], "2");
        assert!(frames[2] == "1" || frames[2] == "2");
        assert_eq!(frames[4], "3");

        player.animate(0.1, false);
        assert_eq!(player.image(), "default");
    }
}
