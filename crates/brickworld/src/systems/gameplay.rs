//! The platformer's collision rules, registered on a freshly loaded world.

use crate::api::types::{Category, Direction, EntityId, GameEvent};
use crate::core::world::World;
use crate::systems::collision::CollisionHandler;

/// Install the standard handler set. Pairs not listed here pass through each other.
pub fn register_default_handlers(world: &mut World) {
    let blocking = CollisionHandler::new();
    world.add_collision_handler(Category::Player, Category::Wall, blocking);
    world.add_collision_handler(Category::Mob, Category::Wall, blocking);
    world.add_collision_handler(Category::Item, Category::Wall, blocking);
    world.add_collision_handler(Category::Item, Category::Block, blocking);

    world.add_collision_handler(
        Category::Player,
        Category::Item,
        CollisionHandler::new().on_begin(player_collects_item),
    );
    world.add_collision_handler(
        Category::Player,
        Category::Block,
        CollisionHandler::new()
            .on_begin(player_hits_block)
            .on_separate(player_leaves_block),
    );
    world.add_collision_handler(
        Category::Player,
        Category::Mob,
        CollisionHandler::new().on_begin(player_hits_mob),
    );
    world.add_collision_handler(
        Category::Mob,
        Category::Block,
        CollisionHandler::new().on_begin(mob_hits_block),
    );
    world.add_collision_handler(
        Category::Mob,
        Category::Mob,
        CollisionHandler::new().on_begin(mob_hits_mob),
    );
    world.add_collision_handler(
        Category::Mob,
        Category::Item,
        CollisionHandler::new().on_begin(pass_through),
    );
}

fn pass_through(_: &mut World, _: EntityId, _: EntityId) -> bool {
    false
}

/// Pick the item up. Items never block.
fn player_collects_item(world: &mut World, _player: EntityId, item: EntityId) -> bool {
    let Some(dropped) = world.item(item).cloned() else {
        return false;
    };
    if let Some(player) = world.player_mut() {
        dropped.collect(player);
    }
    world.remove(item);
    world.emit(GameEvent::ItemCollected {
        item: dropped.id().to_string(),
    });
    false
}

fn player_hits_block(world: &mut World, player: EntityId, block: EntityId) -> bool {
    if let Ok(Some(Direction::Above)) = world.collision_direction(player, block) {
        if let Some(state) = world.player_mut() {
            state.set_jumping(true);
            state.set_bounced(false);
        }
    }

    world.hit(block, player);

    let Some(target) = world.block(block) else {
        return true;
    };
    if target.is_flagpole() {
        let direction = world.collision_direction(player, block).ok().flatten();
        if direction != Some(Direction::Above) {
            log::info!("flag reached");
            world.emit(GameEvent::FlagReached);
        }
        return true;
    }
    // A pressed switch lets the player fall through.
    !target.is_pressed()
}

fn player_leaves_block(world: &mut World, _player: EntityId, block: EntityId) -> bool {
    if world.block(block).is_some_and(|b| b.is_tunnel()) {
        if let Some(state) = world.player_mut() {
            state.set_on_tunnel(false);
        }
    }
    false
}

fn player_hits_mob(world: &mut World, player: EntityId, mob: EntityId) -> bool {
    if world.player().is_some_and(|p| p.is_invincible()) {
        world.remove(mob);
        return true;
    }
    world.hit(mob, player);
    if let Some(state) = world.mob_mut(mob) {
        if state.is_mushroom() {
            state.reverse();
        }
    }
    true
}

fn mob_hits_block(world: &mut World, mob: EntityId, block: EntityId) -> bool {
    let Some(state) = world.mob(mob) else {
        return true;
    };
    if state.is_fireball() {
        if world.block(block).is_some_and(|b| b.id() == "brick") {
            world.remove(block);
        }
        world.remove(mob);
    } else if state.is_mushroom() {
        let side = world.collision_direction(mob, block).ok().flatten();
        if matches!(side, Some(Direction::Left | Direction::Right)) {
            if let Some(state) = world.mob_mut(mob) {
                state.reverse();
            }
        }
    }
    true
}

fn mob_hits_mob(world: &mut World, a: EntityId, b: EntityId) -> bool {
    let fireball = |id| world.mob(id).is_some_and(|m| m.is_fireball());
    if fireball(a) || fireball(b) {
        world.remove(a);
        world.remove(b);
        return false;
    }
    for id in [a, b] {
        if let Some(mob) = world.mob_mut(id) {
            if mob.is_mushroom() {
                mob.reverse();
            }
        }
    }
    false
}
