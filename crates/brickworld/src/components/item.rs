use crate::components::player::Player;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// Adds `value` to the score.
    Coin { value: i64 },
    /// Makes the player invincible for a while.
    Star,
    /// Unknown item id: collectable, no effect.
    Generic,
}

/// A pickup lying in the world. Items fall under gravity and never block the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedItem {
    id: String,
    kind: ItemKind,
}

impl DroppedItem {
    pub fn coin(value: i64) -> Self {
        Self {
            id: "coin".to_string(),
            kind: ItemKind::Coin { value },
        }
    }

    pub fn star() -> Self {
        Self {
            id: "star".to_string(),
            kind: ItemKind::Star,
        }
    }

    pub fn generic(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::Generic,
        }
    }

    /// Item for a drop/item id (`coin`, `star`, anything else is generic).
    pub fn from_id(id: &str) -> Self {
        match id {
            "coin" => Self::coin(1),
            "star" => Self::star(),
            other => Self::generic(other),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    /// Apply the pickup to the player that touched it.
    pub fn collect(&self, player: &mut Player) {
        match self.kind {
            ItemKind::Coin { value } => player.change_score(value),
            ItemKind::Star => player.set_invincible(true),
            ItemKind::Generic => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coin_scores_and_star_protects() {
        let mut player = Player::new("mario", 3.0);
        DroppedItem::coin(5).collect(&mut player);
        DroppedItem::from_id("coin").collect(&mut player);
        assert_eq!(player.score(), 6);

        DroppedItem::from_id("star").collect(&mut player);
        assert!(player.is_invincible());
    }

    #[test]
    fn unknown_ids_are_inert() {
        let mut player = Player::new("mario", 3.0);
        let item = DroppedItem::from_id("mushroom_cap");
        assert_eq!(item.id(), "mushroom_cap");
        item.collect(&mut player);
        assert_eq!(player.score(), 0);
        assert!(!player.is_invincible());
    }
}
