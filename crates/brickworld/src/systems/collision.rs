use std::collections::HashMap;
use std::fmt;

use glam::Vec2;

use crate::api::types::{Category, Direction, EntityId};
use crate::core::physics::{Aabb, CollisionPair};
use crate::core::world::World;

/// Gameplay reaction to two entities meeting. Receives the entities in the
/// order of the categories the handler was registered for.
///
/// For `on_begin` the return value decides whether the contact blocks
/// movement. It is ignored for `on_separate`.
pub type HandlerFn = fn(&mut World, EntityId, EntityId) -> bool;

/// Begin/separate callbacks for one category pair.
#[derive(Clone, Copy, Default)]
pub struct CollisionHandler {
    pub on_begin: Option<HandlerFn>,
    pub on_separate: Option<HandlerFn>,
}

impl fmt::Debug for CollisionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollisionHandler")
            .field("on_begin", &self.on_begin.is_some())
            .field("on_separate", &self.on_separate.is_some())
            .finish()
    }
}

impl CollisionHandler {
    /// A handler with no callbacks: the pair simply blocks.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_begin(mut self, handler: HandlerFn) -> Self {
        self.on_begin = Some(handler);
        self
    }

    pub fn on_separate(mut self, handler: HandlerFn) -> Self {
        self.on_separate = Some(handler);
        self
    }
}

/// Handler table keyed by ordered category pair.
#[derive(Debug, Default)]
pub struct CollisionDispatcher {
    handlers: HashMap<(Category, Category), CollisionHandler>,
}

impl CollisionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the handler for `a` meeting `b`.
    pub fn register(&mut self, a: Category, b: Category, handler: CollisionHandler) {
        self.handlers.insert((a, b), handler);
    }

    /// Find the handler for a pair, trying `(a, b)` before `(b, a)`. The flag
    /// is `true` when the swapped order matched.
    pub fn lookup(&self, a: Category, b: Category) -> Option<(CollisionHandler, bool)> {
        if let Some(handler) = self.handlers.get(&(a, b)) {
            return Some((*handler, false));
        }
        self.handlers.get(&(b, a)).map(|handler| (*handler, true))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Route contact transitions to the world's collision handlers.
///
/// New contacts resolve only if a handler exists and its `on_begin` says so
/// (a handler without `on_begin` blocks). Pairs without a handler are
/// ignored. A begin touching an entity queued for removal is skipped, which
/// includes entities removed by an earlier handler in the same batch. A
/// separate still reaches its handler until the removal is flushed.
pub fn dispatch(world: &mut World, pairs: &[CollisionPair]) {
    for pair in pairs {
        let (a, b) = (pair.entity_a, pair.entity_b);
        let present = if pair.started {
            world.is_live(a) && world.is_live(b)
        } else {
            world.entity(a).is_some() && world.entity(b).is_some()
        };
        if !present {
            continue;
        }
        let (Some(cat_a), Some(cat_b)) = (world.category_of(a), world.category_of(b)) else {
            continue;
        };
        let Some((handler, swapped)) = world.collision_handler(cat_a, cat_b) else {
            log::debug!("no collision handler for {:?}/{:?}", cat_a, cat_b);
            continue;
        };
        let (first, second) = if swapped { (b, a) } else { (a, b) };

        if pair.started {
            let resolve = match handler.on_begin {
                Some(on_begin) => on_begin(world, first, second),
                None => true,
            };
            world
                .physics_mut()
                .set_resolution(pair.body_a, pair.body_b, resolve);
        } else if let Some(on_separate) = handler.on_separate {
            on_separate(world, first, second);
        }
    }
}

/// Classify which side of another box the `mover` box struck.
///
/// Samples eight points of `mover` and returns the label of the first one for
/// which `inside` holds: feet (centre, left, right of centre) give `Above`,
/// head the same way gives `Below`, then the left edge gives `Right` and the
/// right edge gives `Left`. Horizontal labels name the side of the other box
/// that was touched: a mover whose left edge is inside hit the other's right.
pub fn collision_direction(mover: &Aabb, mut inside: impl FnMut(Vec2) -> bool) -> Option<Direction> {
    let centre = mover.center();
    let offset = (centre.x - mover.min.x) * 0.5;
    let (lx, rx) = (centre.x - offset, centre.x + offset);
    let (top, bottom) = (mover.min.y, mover.max.y);

    let samples = [
        (Vec2::new(centre.x, bottom), Direction::Above),
        (Vec2::new(lx, bottom), Direction::Above),
        (Vec2::new(rx, bottom), Direction::Above),
        (Vec2::new(centre.x, top), Direction::Below),
        (Vec2::new(lx, top), Direction::Below),
        (Vec2::new(rx, top), Direction::Below),
        (Vec2::new(mover.min.x, centre.y), Direction::Right),
        (Vec2::new(mover.max.x, centre.y), Direction::Left),
    ];
    samples
        .into_iter()
        .find(|(point, _)| inside(*point))
        .map(|(_, direction)| direction)
}
