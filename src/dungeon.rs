//! Dungeon definitions and reward rolls.

use rand::Rng;
use schema::{RewardBundle, RewardItem};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dungeon {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub boss_pokedex_id: u16,
    pub boss_level: u8,
    pub spawn_levels: [u8; 3],
    pub is_active: bool,
}

/// Lookup table over the configured dungeons. Inactive dungeons are
/// invisible to players.
pub struct DungeonTable {
    by_id: HashMap<u32, Dungeon>,
}

impl DungeonTable {
    pub fn from_ron_str(content: &str) -> Result<Self, ron::error::SpannedError> {
        let dungeons: Vec<Dungeon> = ron::from_str(content)?;
        Ok(Self {
            by_id: dungeons.into_iter().map(|d| (d.id, d)).collect(),
        })
    }

    /// The dungeon table compiled into the binary.
    pub fn bundled() -> Self {
        Self::from_ron_str(include_str!("../data/dungeons.ron"))
            .expect("bundled dungeon data must parse")
    }

    pub fn get(&self, id: u32) -> Option<&Dungeon> {
        self.by_id.get(&id).filter(|d| d.is_active)
    }
}

/// Roll a reward bundle for a dungeon. Money carries a random spread, so
/// the preview shown at run start and the bundle granted at completion are
/// independent draws.
pub fn dynamic_rewards<R: Rng>(dungeon: &Dungeon, rng: &mut R) -> RewardBundle {
    let base = dungeon.id * 100;
    RewardBundle {
        money: base + rng.random_range(0..200),
        experience: base * 2,
        items: vec![
            RewardItem {
                name: "Potion".to_string(),
                quantity: rng.random_range(1..=3),
                rarity: "common".to_string(),
            },
            RewardItem {
                name: "Super Ball".to_string(),
                quantity: rng.random_range(1..=2),
                rarity: "uncommon".to_string(),
            },
        ],
    }
}
