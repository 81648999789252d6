//! Level text: rows of single-character tokens, space meaning empty.

use crate::api::error::Result;
use crate::core::world::World;
use crate::level::builder::WorldBuilder;

/// Right-pad every row with spaces to the width of the longest one.
/// Trailing whitespace (including `\r`) is dropped first.
pub fn pad_level(text: &str) -> String {
    let rows: Vec<&str> = text.lines().map(str::trim_end).collect();
    let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    rows.iter()
        .map(|row| format!("{:<width$}", row, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `(rows, columns)` of a padded level.
pub fn level_size(level: &str) -> (usize, usize) {
    let rows = level.split('\n').count();
    let columns = level.split('\n').next().map_or(0, |r| r.chars().count());
    (rows, columns)
}

/// Record every token of `text` in `builder` and build the world.
pub fn load_world(builder: &mut WorldBuilder, text: &str) -> Result<World> {
    let level = pad_level(text);
    for (y, row) in level.split('\n').enumerate() {
        for (x, token) in row.chars().enumerate() {
            if token == ' ' {
                continue;
            }
            builder.add_entity(token, x as u32, y as u32, &[]);
        }
    }
    builder.build()
}
