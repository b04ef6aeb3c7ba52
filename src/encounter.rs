//! Encounter generation: the wild catch candidate a player searches up,
//! and the minion/boss roster a dungeon run is fought against.
//!
//! All randomness comes through a caller-supplied [`rand::Rng`] so tests
//! can drive generation with a seeded source.

use crate::catalog::{species_or_fallback, GenderRatio, SpeciesCatalog, SpeciesRecord};
use crate::errors::{EncounterError, GameError, GameResult};
use crate::battle::state::{BattleMove, Combatant};
use crate::moves;
use crate::stats::{scaled_hp, scaled_speed, scaled_stat};
use rand::Rng;
use schema::{BossPreview, ElementType, EnemyPreview, Gender, MovePreview, OpponentStats};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Species eligible as dungeon minions.
const MINION_ROSTER: [u16; 36] = [
    1, 4, 7, 25, 39, 52, 54, 58, 60, 63, 66, 69, 72, 74, 81, 84, 86, 90, 92, 95, 100, 102, 104,
    109, 111, 116, 118, 120, 129, 133, 138, 140, 147, 152, 155, 158,
];

/// The single pending catchable creature a player has outside any dungeon
/// run. Creating a new one discards the old.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WildEncounter {
    pub pokedex_id: u16,
    pub name: String,
    pub level: u8,
    pub shiny: bool,
    pub gender: Gender,
    /// Catch-rate snapshot taken at generation time; 35 when the catalog
    /// record carries none.
    pub catch_rate: u8,
    pub sprite: String,
    pub zone: u16,
}

/// A generated dungeon opponent: the battle-ready combatant plus the
/// display data DUNGEON_READY previews carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opponent {
    pub combatant: Combatant,
    pub sprite: String,
    pub types: Vec<ElementType>,
    pub gender: Gender,
    pub shiny: bool,
    pub special_attack: u16,
    pub special_defense: u16,
    pub is_boss: bool,
}

impl Opponent {
    pub fn stats(&self) -> OpponentStats {
        OpponentStats {
            hp: self.combatant.max_hp,
            attack: self.combatant.attack,
            defense: self.combatant.defense,
            speed: self.combatant.speed,
            special_attack: self.special_attack,
            special_defense: self.special_defense,
        }
    }

    pub fn preview(&self) -> EnemyPreview {
        EnemyPreview {
            id: self.combatant.id.clone(),
            pokedex_id: self.combatant.pokedex_id,
            name: self.combatant.name.clone(),
            level: self.combatant.level,
            hp: self.combatant.current_hp,
            max_hp: self.combatant.max_hp,
            sprite: self.sprite.clone(),
            types: self.types.clone(),
            moves: self
                .combatant
                .moves
                .iter()
                .map(|m| MovePreview {
                    id: m.record.id,
                    name: m.record.name.clone(),
                    power: m.record.power,
                    element: m.record.element,
                })
                .collect(),
        }
    }

    pub fn boss_preview(&self) -> BossPreview {
        BossPreview {
            pokedex_id: self.combatant.pokedex_id,
            name: self.combatant.name.clone(),
            level: self.combatant.level,
            sprite: self.sprite.clone(),
            types: self.types.clone(),
            stats: self.stats(),
        }
    }
}

pub struct EncounterGenerator {
    catalog: Arc<dyn SpeciesCatalog>,
}

impl EncounterGenerator {
    pub fn new(catalog: Arc<dyn SpeciesCatalog>) -> Self {
        Self { catalog }
    }

    /// Roll a fresh wild encounter for a zone. Capture correctness
    /// depends on the zone pool, so provider failures propagate instead
    /// of degrading.
    pub async fn generate_wild<R: Rng>(
        &self,
        zone: u16,
        rng: &mut R,
    ) -> GameResult<WildEncounter> {
        let pool = self.catalog.zone_pool(zone).await?;
        if pool.is_empty() {
            return Err(GameError::Encounter(EncounterError::EmptySpeciesPool(zone)));
        }

        let record = &pool[rng.random_range(0..pool.len())];
        let level = random_level(rng);
        let shiny = level >= 10 && rng.random_range(0..300) == 0;
        let gender = roll_gender(record.gender_ratio, rng);

        Ok(WildEncounter {
            pokedex_id: record.pokedex_id,
            name: record.name.clone(),
            level,
            shiny,
            gender,
            catch_rate: record.catch_rate.unwrap_or(35),
            sprite: record.sprite.clone(),
            zone,
        })
    }

    /// Generate the full opponent roster for a dungeon run: three minions
    /// at the requested spawn levels, then the boss. Display data degrades
    /// to the fallback record if the catalog fails.
    pub async fn generate_dungeon_opponents<R: Rng>(
        &self,
        spawn_levels: [u8; 3],
        boss_pokedex_id: u16,
        boss_level: u8,
        rng: &mut R,
    ) -> Vec<Opponent> {
        let mut opponents = Vec::with_capacity(4);
        for level in spawn_levels {
            let pokedex_id = MINION_ROSTER[rng.random_range(0..MINION_ROSTER.len())];
            let record = species_or_fallback(self.catalog.as_ref(), pokedex_id).await;
            opponents.push(build_opponent(
                &record,
                level,
                moves::minion_moveset(level),
                false,
                rng,
            ));
        }

        let record = species_or_fallback(self.catalog.as_ref(), boss_pokedex_id).await;
        opponents.push(build_opponent(
            &record,
            boss_level,
            moves::boss_moveset(boss_pokedex_id),
            true,
            rng,
        ));
        opponents
    }
}

fn build_opponent<R: Rng>(
    record: &SpeciesRecord,
    level: u8,
    moveset: Vec<moves::MoveRecord>,
    is_boss: bool,
    rng: &mut R,
) -> Opponent {
    let max_hp = scaled_hp(record.base_stats.hp, level, 0);
    let prefix = if is_boss { "boss" } else { "enemy" };
    let combatant = Combatant {
        // A uuid component makes every generated opponent unique, so
        // identity never collapses to the species id.
        id: format!("{}_{}_{}_{}", prefix, record.pokedex_id, level, Uuid::new_v4()),
        pokedex_id: record.pokedex_id,
        name: record.name.clone(),
        level,
        current_hp: max_hp,
        max_hp,
        attack: scaled_stat(record.base_stats.attack, level, 0),
        defense: scaled_stat(record.base_stats.defense, level, 0),
        speed: scaled_speed(record.base_stats.speed, level),
        moves: moveset.into_iter().map(BattleMove::new).collect(),
        is_player: false,
    };

    let shiny_odds = if is_boss { 0.10 } else { 0.05 };
    Opponent {
        combatant,
        sprite: record.sprite.clone(),
        types: record.types.clone(),
        gender: if rng.random_bool(0.5) {
            Gender::Male
        } else {
            Gender::Female
        },
        shiny: rng.random_bool(shiny_odds),
        special_attack: scaled_stat(record.base_stats.sp_attack, level, 0),
        special_defense: scaled_stat(record.base_stats.sp_defense, level, 0),
        is_boss,
    }
}

/// Biased-low level roll over 1..=60. High bands survive only a thinning
/// acceptance roll: 1/200 above 40, 1/500 above 50, 1/4000 above 59.
fn random_level<R: Rng>(rng: &mut R) -> u8 {
    loop {
        let level = rng.random_range(1..=60u8);
        let keep = if level > 59 {
            rng.random_bool(1.0 / 4000.0)
        } else if level > 50 {
            rng.random_bool(1.0 / 500.0)
        } else if level > 40 {
            rng.random_bool(1.0 / 200.0)
        } else {
            true
        };
        if keep {
            return level;
        }
    }
}

/// Weighted gender roll; Unknown when the species has no ratio or both
/// weights are zero.
fn roll_gender<R: Rng>(ratio: Option<GenderRatio>, rng: &mut R) -> Gender {
    let Some(ratio) = ratio else {
        return Gender::Unknown;
    };
    let total = u16::from(ratio.male) + u16::from(ratio.female);
    if total == 0 {
        return Gender::Unknown;
    }
    if rng.random_range(0..total) < u16::from(ratio.male) {
        Gender::Male
    } else {
        Gender::Female
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::errors::CatalogError;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generator() -> EncounterGenerator {
        EncounterGenerator::new(Arc::new(StaticCatalog::bundled()))
    }

    #[tokio::test]
    async fn wild_encounters_stay_in_zone_and_range() {
        let generator = generator();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let wild = generator.generate_wild(1, &mut rng).await.unwrap();
            assert!((1..=60).contains(&wild.level));
            assert!(wild.catch_rate > 0);
            if wild.shiny {
                assert!(wild.level >= 10);
            }
        }
    }

    #[tokio::test]
    async fn level_distribution_is_biased_low() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut above_forty = 0;
        for _ in 0..2000 {
            if random_level(&mut rng) > 40 {
                above_forty += 1;
            }
        }
        // Acceptance above 40 is at most 1/200; seeing more than a couple
        // percent would mean the thinning loop is broken.
        assert!(above_forty < 40, "got {} levels above 40", above_forty);
    }

    #[tokio::test]
    async fn empty_zone_is_reported() {
        let generator = generator();
        let mut rng = StdRng::seed_from_u64(3);
        let err = generator.generate_wild(99, &mut rng).await.unwrap_err();
        assert_eq!(
            err,
            GameError::Encounter(EncounterError::EmptySpeciesPool(99))
        );
    }

    #[test]
    fn genderless_species_roll_unknown() {
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(roll_gender(None, &mut rng), Gender::Unknown);
        assert_eq!(
            roll_gender(Some(GenderRatio { male: 0, female: 0 }), &mut rng),
            Gender::Unknown
        );
        assert_eq!(
            roll_gender(Some(GenderRatio { male: 8, female: 0 }), &mut rng),
            Gender::Male
        );
    }

    #[tokio::test]
    async fn dungeon_roster_is_three_minions_then_boss() {
        let generator = generator();
        let mut rng = StdRng::seed_from_u64(9);
        let opponents = generator
            .generate_dungeon_opponents([15, 17, 20], 151, 25, &mut rng)
            .await;

        assert_eq!(opponents.len(), 4);
        assert_eq!(
            opponents.iter().map(|o| o.combatant.level).collect::<Vec<_>>(),
            vec![15, 17, 20, 25]
        );
        assert!(opponents[3].is_boss);
        assert_eq!(opponents[3].combatant.pokedex_id, 151);
        assert_eq!(opponents[3].combatant.moves.len(), 4);
        for minion in &opponents[..3] {
            assert!(!minion.is_boss);
            assert!(MINION_ROSTER.contains(&minion.combatant.pokedex_id));
            assert_eq!(
                minion.combatant.moves.len(),
                moves::moveset_size(minion.combatant.level)
            );
        }
    }

    #[tokio::test]
    async fn opponent_identity_is_unique_per_generation() {
        let generator = generator();
        let mut rng = StdRng::seed_from_u64(13);
        let first = generator
            .generate_dungeon_opponents([15, 17, 20], 151, 25, &mut rng)
            .await;
        let second = generator
            .generate_dungeon_opponents([15, 17, 20], 151, 25, &mut rng)
            .await;
        // Same boss species both times, but never the same identity.
        assert_ne!(first[3].combatant.id, second[3].combatant.id);
    }

    struct BrokenCatalog;

    #[async_trait]
    impl SpeciesCatalog for BrokenCatalog {
        async fn species(&self, pokedex_id: u16) -> Result<SpeciesRecord, CatalogError> {
            Err(CatalogError::SpeciesUnavailable(pokedex_id))
        }

        async fn zone_pool(&self, zone: u16) -> Result<Vec<SpeciesRecord>, CatalogError> {
            Err(CatalogError::PoolUnavailable(zone))
        }
    }

    #[tokio::test]
    async fn dungeon_generation_degrades_on_catalog_failure() {
        let generator = EncounterGenerator::new(Arc::new(BrokenCatalog));
        let mut rng = StdRng::seed_from_u64(17);
        let opponents = generator
            .generate_dungeon_opponents([15, 17, 20], 151, 25, &mut rng)
            .await;

        // Fallback records carry a generic name and default stats.
        assert_eq!(opponents.len(), 4);
        assert_eq!(opponents[3].combatant.name, "Pokemon 151");
        assert!(opponents[3].combatant.max_hp > 0);
    }

    #[tokio::test]
    async fn wild_generation_propagates_catalog_failure() {
        let generator = EncounterGenerator::new(Arc::new(BrokenCatalog));
        let mut rng = StdRng::seed_from_u64(19);
        let err = generator.generate_wild(1, &mut rng).await.unwrap_err();
        assert_eq!(err, GameError::Catalog(CatalogError::PoolUnavailable(1)));
    }
}
