pub mod block;
pub mod entity;
pub mod item;
pub mod mob;
pub mod player;
