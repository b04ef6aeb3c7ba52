//! Move definitions and the canned movesets used for generated opponents.

use schema::{DamageClass, ElementType};
use serde::{Deserialize, Serialize};

/// A move as it exists outside of battle: identity plus its full-PP
/// loadout. Battles wrap this in a `BattleMove` to track current PP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub id: u16,
    pub name: String,
    pub element: ElementType,
    /// None means the move deals no damage.
    pub power: Option<u16>,
    /// None means the move never misses.
    pub accuracy: Option<u8>,
    pub pp: u8,
    pub priority: i8,
    pub damage_class: DamageClass,
}

impl MoveRecord {
    fn new(
        id: u16,
        name: &str,
        element: ElementType,
        power: Option<u16>,
        accuracy: Option<u8>,
        pp: u8,
        priority: i8,
        damage_class: DamageClass,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            element,
            power,
            accuracy,
            pp,
            priority,
            damage_class,
        }
    }
}

pub fn tackle() -> MoveRecord {
    MoveRecord::new(33, "Tackle", ElementType::Normal, Some(40), Some(100), 35, 0, DamageClass::Physical)
}

pub fn growl() -> MoveRecord {
    MoveRecord::new(45, "Growl", ElementType::Normal, None, Some(100), 40, 0, DamageClass::Status)
}

pub fn quick_attack() -> MoveRecord {
    MoveRecord::new(98, "Quick Attack", ElementType::Normal, Some(40), Some(100), 30, 1, DamageClass::Physical)
}

pub fn scratch() -> MoveRecord {
    MoveRecord::new(10, "Scratch", ElementType::Normal, Some(35), Some(95), 30, 0, DamageClass::Physical)
}

/// The fallback action when every real move is out of PP. Costs nothing
/// and always lands.
pub fn struggle() -> MoveRecord {
    MoveRecord::new(165, "Struggle", ElementType::Normal, Some(20), Some(100), 1, 0, DamageClass::Physical)
}

/// Damaging move themed to a species' primary elemental tag, used when
/// assigning a moveset to a freshly caught or generated creature.
pub fn themed_move(element: ElementType) -> MoveRecord {
    match element {
        ElementType::Fire => MoveRecord::new(52, "Ember", ElementType::Fire, Some(40), Some(100), 25, 0, DamageClass::Special),
        ElementType::Water => MoveRecord::new(55, "Water Gun", ElementType::Water, Some(40), Some(100), 25, 0, DamageClass::Special),
        ElementType::Grass => MoveRecord::new(22, "Vine Whip", ElementType::Grass, Some(45), Some(100), 25, 0, DamageClass::Special),
        ElementType::Electric => MoveRecord::new(84, "Thunder Shock", ElementType::Electric, Some(40), Some(100), 30, 0, DamageClass::Special),
        ElementType::Psychic => MoveRecord::new(93, "Confusion", ElementType::Psychic, Some(50), Some(100), 25, 0, DamageClass::Special),
        ElementType::Ice => MoveRecord::new(181, "Powder Snow", ElementType::Ice, Some(40), Some(100), 25, 0, DamageClass::Special),
        ElementType::Ghost => MoveRecord::new(122, "Lick", ElementType::Ghost, Some(30), Some(100), 30, 0, DamageClass::Physical),
        ElementType::Fighting => MoveRecord::new(2, "Karate Chop", ElementType::Fighting, Some(50), Some(100), 25, 0, DamageClass::Physical),
        ElementType::Ground => MoveRecord::new(189, "Mud-Slap", ElementType::Ground, Some(20), Some(100), 10, 0, DamageClass::Special),
        ElementType::Rock => MoveRecord::new(88, "Rock Throw", ElementType::Rock, Some(50), Some(90), 15, 0, DamageClass::Physical),
        ElementType::Poison => MoveRecord::new(40, "Poison Sting", ElementType::Poison, Some(15), Some(100), 35, 0, DamageClass::Physical),
        ElementType::Bug => MoveRecord::new(141, "Leech Life", ElementType::Bug, Some(20), Some(100), 15, 0, DamageClass::Physical),
        ElementType::Flying => MoveRecord::new(16, "Gust", ElementType::Flying, Some(40), Some(100), 35, 0, DamageClass::Special),
        ElementType::Dragon => MoveRecord::new(82, "Dragon Rage", ElementType::Dragon, Some(40), Some(100), 10, 0, DamageClass::Special),
        ElementType::Normal => tackle(),
    }
}

/// Number of moves a creature of this level carries: `min(4, level/10 + 2)`.
pub fn moveset_size(level: u8) -> usize {
    usize::min(4, level as usize / 10 + 2)
}

/// Canned minion moveset, truncated by level.
pub fn minion_moveset(level: u8) -> Vec<MoveRecord> {
    let mut moves = vec![tackle(), growl(), quick_attack(), scratch()];
    moves.truncate(moveset_size(level));
    moves
}

/// Curated four-move boss sets, keyed by species. Unlisted bosses get the
/// default heavy-hitter set.
pub fn boss_moveset(pokedex_id: u16) -> Vec<MoveRecord> {
    match pokedex_id {
        // Mew: balanced coverage across four elements.
        151 => vec![
            MoveRecord::new(94, "Psychic", ElementType::Psychic, Some(70), Some(100), 20, 0, DamageClass::Special),
            MoveRecord::new(247, "Shadow Ball", ElementType::Ghost, Some(60), Some(100), 15, 0, DamageClass::Special),
            MoveRecord::new(53, "Flamethrower", ElementType::Fire, Some(65), Some(95), 15, 0, DamageClass::Special),
            MoveRecord::new(85, "Thunderbolt", ElementType::Electric, Some(65), Some(95), 15, 0, DamageClass::Special),
        ],
        // Mewtwo: raw special pressure.
        150 => vec![
            MoveRecord::new(94, "Psychic", ElementType::Psychic, Some(90), Some(100), 10, 0, DamageClass::Special),
            MoveRecord::new(60, "Psybeam", ElementType::Psychic, Some(65), Some(100), 20, 0, DamageClass::Special),
            MoveRecord::new(105, "Recover", ElementType::Psychic, None, None, 10, 0, DamageClass::Status),
            MoveRecord::new(63, "Hyper Beam", ElementType::Normal, Some(110), Some(90), 5, 0, DamageClass::Special),
        ],
        // Articuno: ice artillery.
        144 => vec![
            MoveRecord::new(58, "Ice Beam", ElementType::Ice, Some(90), Some(100), 10, 0, DamageClass::Special),
            MoveRecord::new(59, "Blizzard", ElementType::Ice, Some(110), Some(70), 5, 0, DamageClass::Special),
            MoveRecord::new(16, "Gust", ElementType::Flying, Some(40), Some(100), 35, 0, DamageClass::Special),
            MoveRecord::new(97, "Agility", ElementType::Psychic, None, None, 30, 0, DamageClass::Status),
        ],
        _ => vec![
            MoveRecord::new(34, "Body Slam", ElementType::Normal, Some(80), Some(100), 15, 0, DamageClass::Physical),
            MoveRecord::new(38, "Double-Edge", ElementType::Normal, Some(100), Some(85), 10, 0, DamageClass::Physical),
            MoveRecord::new(98, "Quick Attack", ElementType::Normal, Some(40), Some(100), 30, 1, DamageClass::Physical),
            MoveRecord::new(45, "Growl", ElementType::Normal, None, Some(100), 40, 0, DamageClass::Status),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 2)]
    #[case(9, 2)]
    #[case(10, 3)]
    #[case(19, 3)]
    #[case(20, 4)]
    #[case(60, 4)]
    fn moveset_size_scales_with_level(#[case] level: u8, #[case] expected: usize) {
        assert_eq!(moveset_size(level), expected);
        assert_eq!(minion_moveset(level).len(), expected);
    }

    #[test]
    fn every_boss_set_has_four_moves() {
        for id in [151, 150, 144, 9999] {
            assert_eq!(boss_moveset(id).len(), 4);
        }
    }

    #[test]
    fn struggle_always_lands() {
        let s = struggle();
        assert_eq!(s.power, Some(20));
        assert_eq!(s.accuracy, Some(100));
        assert_eq!(s.priority, 0);
    }

    #[test]
    fn themed_moves_all_deal_damage() {
        use ElementType::*;
        for element in [
            Normal, Fighting, Flying, Poison, Ground, Rock, Bug, Ghost, Fire, Water, Grass,
            Electric, Psychic, Ice, Dragon,
        ] {
            let m = themed_move(element);
            assert!(m.power.is_some(), "{} has no power", m.name);
        }
    }
}
