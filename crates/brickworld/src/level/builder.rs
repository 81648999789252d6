use std::collections::HashMap;

use glam::Vec2;

use crate::api::error::{Error, Result};
use crate::components::block::Block;
use crate::components::entity::EntityKind;
use crate::components::item::DroppedItem;
use crate::components::mob::Mob;
use crate::core::world::World;

/// Places the entity for one grid token. Receives the world being built, the
/// token, its grid cell and any extra arguments given to [`WorldBuilder::add_entity`].
pub type Constructor = fn(&mut World, char, u32, u32, &[String]);

/// Grid tokens handled by [`create_block`], [`create_item`] and [`create_mob`].
pub const BLOCK_TOKENS: &str = "#%?$^bI=S";
pub const ITEM_TOKENS: &str = "C*";
pub const MOB_TOKENS: &str = "&@";

#[derive(Debug, Clone)]
struct Placement {
    token: char,
    x: u32,
    y: u32,
    args: Vec<String>,
}

/// Collects token placements, then turns them into a [`World`].
pub struct WorldBuilder {
    block_size: f32,
    gravity: Vec2,
    constructors: HashMap<char, Constructor>,
    fallback: Option<Constructor>,
    placements: Vec<Placement>,
    pixel_size: Vec2,
    seed: Option<u64>,
}

impl WorldBuilder {
    /// An empty builder: no tokens known, no fallback.
    pub fn new(block_size: f32, gravity: Vec2) -> Self {
        Self {
            block_size,
            gravity,
            constructors: HashMap::new(),
            fallback: None,
            placements: Vec::new(),
            pixel_size: Vec2::ZERO,
            seed: None,
        }
    }

    /// A builder that knows every block, item and mob token of the game, and
    /// places a placeholder for anything else.
    pub fn standard(block_size: f32, gravity: Vec2) -> Self {
        let mut builder = Self::new(block_size, gravity).with_fallback(create_unknown);
        builder.register_builders(BLOCK_TOKENS.chars(), create_block);
        builder.register_builders(ITEM_TOKENS.chars(), create_item);
        builder.register_builders(MOB_TOKENS.chars(), create_mob);
        builder
    }

    pub fn with_fallback(mut self, fallback: Constructor) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Seed the RNG of every world this builder produces.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn block_size(&self) -> f32 {
        self.block_size
    }

    pub fn register_builder(&mut self, token: char, constructor: Constructor) {
        self.constructors.insert(token, constructor);
    }

    pub fn register_builders(
        &mut self,
        tokens: impl IntoIterator<Item = char>,
        constructor: Constructor,
    ) {
        for token in tokens {
            self.register_builder(token, constructor);
        }
    }

    /// Record a token at grid cell `(x, y)`. The world grows to cover the
    /// cell's centre plus half a cell.
    pub fn add_entity(&mut self, token: char, x: u32, y: u32, args: &[&str]) -> &mut Self {
        let (px, py) = (x as f32 * self.block_size, y as f32 * self.block_size);
        if px >= self.pixel_size.x {
            self.pixel_size.x = px + self.block_size * 0.5;
        }
        if py >= self.pixel_size.y {
            self.pixel_size.y = py + self.block_size * 0.5;
        }
        self.placements.push(Placement {
            token,
            x,
            y,
            args: args.iter().map(|a| a.to_string()).collect(),
        });
        self
    }

    /// Size the next world will have, in pixels.
    pub fn pixel_size(&self) -> Vec2 {
        self.pixel_size
    }

    pub fn placement_count(&self) -> usize {
        self.placements.len()
    }

    /// Create a world and run every recorded placement through its constructor.
    ///
    /// Fails with [`Error::UnknownToken`] on the first token that has no
    /// constructor when no fallback is set.
    pub fn build(&self) -> Result<World> {
        let mut world = World::new(self.pixel_size, self.block_size, self.gravity);
        if let Some(seed) = self.seed {
            world = world.with_seed(seed);
        }
        for placement in &self.placements {
            let constructor = self
                .constructors
                .get(&placement.token)
                .copied()
                .or(self.fallback)
                .ok_or(Error::UnknownToken {
                    token: placement.token,
                })?;
            constructor(
                &mut world,
                placement.token,
                placement.x,
                placement.y,
                &placement.args,
            );
        }
        log::info!(
            "built {}x{} world with {} entities",
            self.pixel_size.x,
            self.pixel_size.y,
            world.entity_count()
        );
        Ok(world)
    }

    /// Forget all placements and bounds. Registered constructors stay.
    pub fn clear(&mut self) {
        self.placements.clear();
        self.pixel_size = Vec2::ZERO;
    }
}

fn cell_centre(world: &World, x: u32, y: u32) -> Vec2 {
    Vec2::new(x as f32, y as f32) * world.block_size()
}

pub fn create_block(world: &mut World, token: char, x: u32, y: u32, _args: &[String]) {
    let block = match token {
        '#' => Block::new("brick"),
        '%' => Block::new("brick_base"),
        '?' => Block::mystery(None, (1, 1)),
        '$' => Block::mystery(Some("coin"), (3, 6)),
        '^' => Block::new("cube"),
        'b' => Block::bounce(),
        'I' => Block::flagpole(),
        '=' => Block::tunnel(),
        'S' => Block::switch(),
        other => Block::new(other.to_string()),
    };
    let at = cell_centre(world, x, y);
    world.add_block(block, at);
}

pub fn create_item(world: &mut World, token: char, x: u32, y: u32, _args: &[String]) {
    let item = match token {
        'C' => DroppedItem::coin(1),
        '*' => DroppedItem::star(),
        other => DroppedItem::generic(other.to_string()),
    };
    let at = cell_centre(world, x, y);
    world.add_item(item, at);
}

pub fn create_mob(world: &mut World, token: char, x: u32, y: u32, _args: &[String]) {
    let mob = match token {
        '&' => Mob::cloud(10.0),
        '@' => Mob::mushroom(),
        other => Mob::from_id(&other.to_string()),
    };
    let at = cell_centre(world, x, y);
    world.add_mob(mob, at);
}

/// Fallback: a block-sized placeholder that nothing collides with.
pub fn create_unknown(world: &mut World, token: char, x: u32, y: u32, _args: &[String]) {
    log::warn!("unknown level token {:?} at ({}, {})", token, x, y);
    let at = cell_centre(world, x, y);
    let size = Vec2::splat(world.block_size());
    world.add_thing(EntityKind::Placeholder, at, size);
}
