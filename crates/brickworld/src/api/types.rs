use slotmap::new_key_type;

new_key_type! {
    /// Stable handle for an entity in the world. Generational, so a handle to a
    /// removed entity never aliases a newer one.
    pub struct EntityId;
}

/// Collision category of an entity class.
///
/// Each category owns one bit of a `u32` mask. The same bit filters physical
/// contacts and keys the dispatcher's handler table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Placeholder,
    Wall,
    Block,
    Player,
    Item,
    Mob,
}

impl Category {
    /// Bit index of this category (the mask is `1 << index`).
    pub const fn index(self) -> u32 {
        match self {
            Category::Placeholder => 0,
            Category::Wall => 1,
            Category::Block => 2,
            Category::Player => 3,
            Category::Item => 4,
            Category::Mob => 5,
        }
    }

    pub const fn mask(self) -> u32 {
        1 << self.index()
    }
}

/// Side of an entity that a collision struck.
///
/// `Above` means the moving entity landed on top of the other one and `Below`
/// means it hit the other's underside. `Left` and `Right` name the side of the
/// *other* entity that was touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Above,
    Below,
    Left,
    Right,
}

/// Something the simulation wants an outside observer (view, session) to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Player health reached zero.
    PlayerDied,
    /// Player touched a flagpole anywhere but its top. Requests a level change.
    FlagReached,
    /// Player picked up an item.
    ItemCollected { item: String },
    /// An entity was added by gameplay (mystery drop, cloud fire).
    Spawned { id: EntityId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_masks_are_unique_powers_of_two() {
        let mut seen = 0u32;
        for c in [
            Category::Placeholder,
            Category::Wall,
            Category::Block,
            Category::Player,
            Category::Item,
            Category::Mob,
        ] {
            let m = c.mask();
            assert!(m.is_power_of_two());
            assert_eq!(seen & m, 0, "{:?} shares a bit", c);
            seen |= m;
        }
    }
}
