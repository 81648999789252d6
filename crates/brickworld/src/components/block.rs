use glam::{UVec2, Vec2};

use crate::api::types::{Direction, EntityId, GameEvent};
use crate::components::entity::Behavior;
use crate::components::item::DroppedItem;
use crate::components::player::bounce_player;
use crate::core::world::World;

/// Radius around a switch whose blocks vanish while it is pressed.
pub const SWITCH_RADIUS: f32 = 20.0;
/// Seconds a switch stays pressed.
pub const SWITCH_SECONDS: f32 = 10.0;

/// Mystery drops land this far above the block centre...
const DROP_LIFT: f32 = 25.0;
/// ...scattered horizontally by up to this much.
const DROP_SCATTER: i32 = 10;

/// A static tile of the level.
#[derive(Debug, Clone)]
pub struct Block {
    id: String,
    cell_size: UVec2,
    variant: BlockVariant,
}

#[derive(Debug, Clone)]
pub enum BlockVariant {
    /// Solid and inert (`brick`, `brick_base`, `cube`, ...).
    Plain,
    Mystery(MysteryBlock),
    Bounce(BounceBlock),
    Flagpole,
    Tunnel,
    Switch(Switch),
}

impl Block {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_variant(id, BlockVariant::Plain)
    }

    /// Drops `drop` items a random number of times in `drop_range` when hit
    /// from below. Named `mystery_<drop>`, or `mystery_empty` without a drop.
    pub fn mystery(drop: Option<&str>, drop_range: (i32, i32)) -> Self {
        let id = drop.map_or_else(|| "mystery_empty".to_string(), |d| format!("mystery_{d}"));
        Self::with_variant(
            id,
            BlockVariant::Mystery(MysteryBlock {
                drop: drop.map(str::to_string),
                drop_range,
                active: true,
            }),
        )
    }

    pub fn bounce() -> Self {
        Self::with_variant(
            "bounce_block",
            BlockVariant::Bounce(BounceBlock {
                active: false,
                elapsed: 0.0,
                image: "default",
            }),
        )
    }

    pub fn flagpole() -> Self {
        Self::with_variant("flag", BlockVariant::Flagpole)
    }

    pub fn tunnel() -> Self {
        Self::with_variant("tunnel", BlockVariant::Tunnel)
    }

    pub fn switch() -> Self {
        Self::with_variant(
            "switch",
            BlockVariant::Switch(Switch {
                pressed: false,
                elapsed: 0.0,
                captured: Vec::new(),
            }),
        )
    }

    fn with_variant(id: impl Into<String>, variant: BlockVariant) -> Self {
        Self {
            id: id.into(),
            cell_size: UVec2::ONE,
            variant,
        }
    }

    /// Size in grid cells. Zero components are raised to one.
    pub fn with_cell_size(mut self, cell_size: UVec2) -> Self {
        self.cell_size = cell_size.max(UVec2::ONE);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cell_size(&self) -> UVec2 {
        self.cell_size
    }

    pub fn variant(&self) -> &BlockVariant {
        &self.variant
    }

    pub fn is_switch(&self) -> bool {
        matches!(self.variant, BlockVariant::Switch(_))
    }

    pub fn is_flagpole(&self) -> bool {
        matches!(self.variant, BlockVariant::Flagpole)
    }

    pub fn is_tunnel(&self) -> bool {
        matches!(self.variant, BlockVariant::Tunnel)
    }

    /// Mystery: still holds its drops. Bounce: animating. Others: `false`.
    pub fn is_active(&self) -> bool {
        match &self.variant {
            BlockVariant::Mystery(mystery) => mystery.active,
            BlockVariant::Bounce(bounce) => bounce.active,
            _ => false,
        }
    }

    /// Only switches can be pressed.
    pub fn is_pressed(&self) -> bool {
        match &self.variant {
            BlockVariant::Switch(switch) => switch.pressed,
            _ => false,
        }
    }

    /// Animation frame for the renderer.
    pub fn image(&self) -> &str {
        match &self.variant {
            BlockVariant::Bounce(bounce) => bounce.image,
            _ => "default",
        }
    }
}

impl Behavior for Block {
    fn on_hit(&mut self, this: EntityId, other: EntityId, world: &mut World) {
        let Ok(Some(direction)) = world.collision_direction(other, this) else {
            return;
        };
        match &mut self.variant {
            BlockVariant::Plain => {}
            BlockVariant::Mystery(mystery) => {
                if direction == Direction::Below {
                    mystery.open(this, world);
                }
            }
            BlockVariant::Bounce(bounce) => {
                if direction == Direction::Above {
                    bounce.active = true;
                    bounce_player(world, other);
                }
            }
            BlockVariant::Flagpole => {
                if direction != Direction::Above {
                    return;
                }
                if let Some(player) = world.player_mut() {
                    if !player.bonus_health() {
                        player.change_health(1.0);
                        player.set_bonus_health(true);
                    }
                }
            }
            BlockVariant::Tunnel => {
                if let Some(player) = world.player_mut() {
                    player.set_on_tunnel(direction == Direction::Above);
                }
            }
            BlockVariant::Switch(switch) => {
                if direction == Direction::Above {
                    switch.press(this, world);
                }
            }
        }
    }

    fn step(&mut self, _this: EntityId, dt: f32, world: &mut World) {
        match &mut self.variant {
            BlockVariant::Bounce(bounce) => bounce.animate(dt),
            BlockVariant::Switch(switch) => switch.tick(dt, world),
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Variant state
// ---------------------------------------------------------------------------

/// Drops its contents the first time it is hit from below, then stays empty.
#[derive(Debug, Clone)]
pub struct MysteryBlock {
    drop: Option<String>,
    drop_range: (i32, i32),
    active: bool,
}

impl MysteryBlock {
    pub fn drop_id(&self) -> Option<&str> {
        self.drop.as_deref()
    }

    pub fn drop_range(&self) -> (i32, i32) {
        self.drop_range
    }

    fn open(&mut self, this: EntityId, world: &mut World) {
        if !self.active {
            return;
        }
        self.active = false;
        let Ok(centre) = world.position(this) else {
            return;
        };
        let count = world
            .rng_mut()
            .range_inclusive(self.drop_range.0, self.drop_range.1);
        let Some(drop) = self.drop.as_deref() else {
            return;
        };
        for _ in 0..count.max(0) {
            let dx = world.rng_mut().range_inclusive(-DROP_SCATTER, DROP_SCATTER) as f32;
            let at = Vec2::new(centre.x + dx, centre.y - DROP_LIFT);
            let id = world.add_item(DroppedItem::from_id(drop), at);
            world.emit(GameEvent::Spawned { id });
        }
        log::debug!("mystery block {:?} dropped {} x {}", this, count, drop);
    }
}

/// Throws the player upward when landed on, then plays a one second animation.
#[derive(Debug, Clone)]
pub struct BounceBlock {
    active: bool,
    elapsed: f32,
    image: &'static str,
}

impl BounceBlock {
    // 1-2-3-2-1, 0.2 s per frame.
    fn animate(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        self.elapsed += dt;
        let t = self.elapsed;
        self.image = if t <= 0.2 || (0.8 < t && t <= 1.0) {
            "1"
        } else if t <= 0.4 || (0.6 < t && t <= 0.8) {
            "2"
        } else if t <= 0.6 {
            "3"
        } else {
            self.elapsed = 0.0;
            self.active = false;
            "default"
        };
    }
}

/// Hides the blocks around it for a while after being stepped on.
#[derive(Debug, Clone)]
pub struct Switch {
    pressed: bool,
    elapsed: f32,
    /// Removed neighbours and the anchors to restore them at.
    captured: Vec<(Block, Vec2)>,
}

impl Switch {
    pub fn captured(&self) -> impl Iterator<Item = (&Block, Vec2)> {
        self.captured.iter().map(|(block, anchor)| (block, *anchor))
    }

    fn press(&mut self, this: EntityId, world: &mut World) {
        if self.pressed {
            return;
        }
        self.pressed = true;
        self.elapsed = 0.0;
        if !self.captured.is_empty() {
            return;
        }
        let Ok(centre) = world.position(this) else {
            return;
        };
        for id in world.things_in_range(centre, SWITCH_RADIUS) {
            if id == this {
                continue;
            }
            let Some(entity) = world.entity(id) else {
                continue;
            };
            let Some(block) = entity.as_block().filter(|b| !b.is_switch()) else {
                continue;
            };
            self.captured.push((block.clone(), entity.anchor()));
            world.remove(id);
        }
        log::info!("switch pressed, {} blocks hidden", self.captured.len());
    }

    fn tick(&mut self, dt: f32, world: &mut World) {
        if !self.pressed {
            return;
        }
        self.elapsed += dt;
        if self.elapsed <= SWITCH_SECONDS {
            return;
        }
        self.pressed = false;
        self.elapsed = 0.0;
        let restored = self.captured.len();
        for (block, anchor) in self.captured.drain(..) {
            world.add_block(block, anchor);
        }
        log::info!("switch released, {} blocks restored", restored);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounce_animation_runs_one_second_then_resets() {
        let mut bounce = BounceBlock {
            active: true,
            elapsed: 0.0,
            image: "default",
        };
        let mut frames = Vec::new();
        for _ in 0..30 {
            bounce.animate(0.05);
            frames.push(bounce.image);
            if !bounce.active {
                break;
            }
        }
        assert_eq!(frames.first(), Some(&"1"));
        assert!(frames.contains(&"2"));
        assert!(frames.contains(&"3"));
        assert_eq!(frames.last(), Some(&"default"));
        assert!(!bounce.active);
        assert_eq!(bounce.elapsed, 0.0);
    }

    #[test]
    fn inactive_bounce_block_does_not_animate() {
        let mut bounce = BounceBlock {
            active: false,
            elapsed: 0.0,
            image: "default",
        };
        bounce.animate(0.3);
        assert_eq!(bounce.image, "default");
        assert_eq!(bounce.elapsed, 0.0);
    }

    #[test]
    fn variant_flags() {
        assert!(Block::mystery(Some("coin"), (3, 6)).is_active());
        assert!(!Block::bounce().is_active());
        assert!(Block::switch().is_switch());
        assert!(!Block::switch().is_pressed());
        assert_eq!(Block::flagpole().id(), "flag");
        assert_eq!(Block::mystery(Some("coin"), (3, 6)).id(), "mystery_coin");
        assert_eq!(Block::mystery(None, (1, 1)).id(), "mystery_empty");
        assert_eq!(Block::new("brick").image(), "default");
        assert_eq!(
            Block::new("pipe").with_cell_size(UVec2::new(2, 0)).cell_size(),
            UVec2::new(2, 1)
        );
    }
}
