pub mod builder;
pub mod grid;
