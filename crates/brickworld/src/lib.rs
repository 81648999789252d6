pub mod api;
pub mod config;
pub mod core;
pub mod components;
pub mod level;
pub mod session;
pub mod systems;

// Re-export key types at crate root for convenience
pub use api::error::{Error, Result};
pub use api::types::{Category, Direction, EntityId, GameEvent};
pub use components::block::{Block, BlockVariant};
pub use components::entity::{Behavior, Entity, EntityKind, Health};
pub use components::item::{DroppedItem, ItemKind};
pub use components::mob::{Mob, MobVariant};
pub use components::player::Player;
pub use config::{GameConfig, LevelConfig, PlayerConfig, WorldConfig};
pub use core::physics::{Aabb, BodyDesc, BodyType, CollisionPair, PhysicsWorld};
pub use core::scene::Scene;
pub use core::time::FixedTimestep;
pub use core::world::World;
pub use level::builder::WorldBuilder;
pub use level::grid::load_world;
pub use session::{DirLevels, GameSession, LevelRecord, LevelSource, SessionState};
pub use systems::collision::{CollisionDispatcher, CollisionHandler};
pub use systems::gameplay::register_default_handlers;
pub use systems::stepper::{RunState, Simulation};
