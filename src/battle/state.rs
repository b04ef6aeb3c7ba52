use crate::catalog::SpeciesRecord;
use crate::moves::MoveRecord;
use crate::stats::{scaled_hp, scaled_speed, scaled_stat};
use crate::store::OwnedCreature;
use schema::{ActorRef, CombatantView, MoveView};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A move carried into battle: the record plus its remaining PP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleMove {
    pub record: MoveRecord,
    pub pp: u8,
}

impl BattleMove {
    /// Create a battle move at full PP.
    pub fn new(record: MoveRecord) -> Self {
        let pp = record.pp;
        BattleMove { record, pp }
    }

    pub fn max_pp(&self) -> u8 {
        self.record.pp
    }

    pub fn is_usable(&self) -> bool {
        self.pp > 0
    }

    /// Consume one PP. Returns false when the move was already exhausted.
    pub fn use_move(&mut self) -> bool {
        if self.pp > 0 {
            self.pp -= 1;
            true
        } else {
            false
        }
    }

    pub fn to_view(&self) -> MoveView {
        MoveView {
            id: self.record.id,
            name: self.record.name.clone(),
            element: self.record.element,
            power: self.record.power,
            accuracy: self.record.accuracy,
            pp: self.pp,
            max_pp: self.max_pp(),
            priority: self.record.priority,
            damage_class: self.record.damage_class,
        }
    }
}

/// An ephemeral, battle-scoped stat snapshot. Created when a fight starts,
/// discarded when the fight (or run) ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: String,
    pub pokedex_id: u16,
    pub name: String,
    pub level: u8,
    pub current_hp: u16,
    pub max_hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub speed: u16,
    pub moves: Vec<BattleMove>,
    pub is_player: bool,
}

impl Combatant {
    /// Build the player-side combatant from an owned creature and its
    /// species record, at full HP. Speed takes no boost.
    pub fn from_owned(creature: &OwnedCreature, species: &SpeciesRecord) -> Self {
        let max_hp = scaled_hp(species.base_stats.hp, creature.level, creature.boosts.hp);
        Combatant {
            id: creature.id.clone(),
            pokedex_id: creature.pokedex_id,
            name: species.name.clone(),
            level: creature.level,
            current_hp: max_hp,
            max_hp,
            attack: scaled_stat(
                species.base_stats.attack,
                creature.level,
                creature.boosts.attack,
            ),
            defense: scaled_stat(
                species.base_stats.defense,
                creature.level,
                creature.boosts.defense,
            ),
            speed: scaled_speed(species.base_stats.speed, creature.level),
            moves: creature.moves.iter().cloned().map(BattleMove::new).collect(),
            is_player: true,
        }
    }

    pub fn is_knocked_out(&self) -> bool {
        self.current_hp == 0
    }

    /// Apply damage, clamping at zero. Returns the HP actually removed.
    pub fn take_damage(&mut self, amount: u16) -> u16 {
        let applied = amount.min(self.current_hp);
        self.current_hp -= applied;
        applied
    }

    pub fn actor_ref(&self) -> ActorRef {
        ActorRef {
            id: self.id.clone(),
            name: self.name.clone(),
            is_player: self.is_player,
        }
    }

    pub fn to_view(&self) -> CombatantView {
        CombatantView {
            id: self.id.clone(),
            pokedex_id: self.pokedex_id,
            name: self.name.clone(),
            level: self.level,
            hp: self.current_hp,
            max_hp: self.max_hp,
            attack: self.attack,
            defense: self.defense,
            speed: self.speed,
            moves: self.moves.iter().map(BattleMove::to_view).collect(),
            is_player: self.is_player,
        }
    }
}

/// Per-fight state machine. `Active` and `Processing` alternate while both
/// sides stand; the two defeat states are exits back to the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattlePhase {
    Selection,
    Active,
    Processing,
    EnemyDefeated,
    PlayerDefeated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleState {
    pub battle_id: String,
    pub player: Combatant,
    pub enemy: Combatant,
    pub turn_number: u32,
    pub phase: BattlePhase,
}

impl BattleState {
    /// A fresh battle sits in `Selection` until the first turn begins.
    pub fn new(player: Combatant, enemy: Combatant) -> Self {
        Self {
            battle_id: Uuid::new_v4().to_string(),
            player,
            enemy,
            turn_number: 1,
            phase: BattlePhase::Selection,
        }
    }

    /// True while the automatic loop may resolve another turn.
    pub fn accepts_turns(&self) -> bool {
        matches!(self.phase, BattlePhase::Selection | BattlePhase::Active)
    }
}

/// Random oracle for a battle turn: a pre-generated sequence of values in
/// 1..=100, consumed with a reason string so tests can script exact
/// outcomes.
#[derive(Debug, Clone)]
pub struct TurnRng {
    outcomes: Vec<u8>,
    index: usize,
}

impl TurnRng {
    pub fn new_for_test(outcomes: Vec<u8>) -> Self {
        Self { outcomes, index: 0 }
    }

    pub fn new_random() -> Self {
        use rand::Rng;
        let mut rng = rand::rng();
        // More than any single turn can consume.
        let outcomes: Vec<u8> = (0..100).map(|_| rng.random_range(1..=100)).collect();
        Self { outcomes, index: 0 }
    }

    pub fn next_outcome(&mut self, reason: &str) -> u8 {
        if self.index >= self.outcomes.len() {
            panic!(
                "TurnRng exhausted! Tried to get a value for: '{}'. Need more random values.",
                reason
            );
        }
        let outcome = self.outcomes[self.index];
        self.index += 1;
        outcome
    }

    /// Damage variance factor, uniform over [0.85, 1.00].
    pub fn damage_factor(&mut self, reason: &str) -> f64 {
        let roll = self.next_outcome(reason);
        0.85 + f64::from(roll - 1) * (0.15 / 99.0)
    }

    /// Uniform index into 0..len.
    pub fn pick_index(&mut self, len: usize, reason: &str) -> usize {
        let roll = self.next_outcome(reason);
        ((roll as usize - 1) * len / 100).min(len - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves;

    #[test]
    fn take_damage_clamps_at_zero() {
        let mut combatant = test_combatant(30);
        assert_eq!(combatant.take_damage(12), 12);
        assert_eq!(combatant.current_hp, 18);
        assert_eq!(combatant.take_damage(100), 18);
        assert_eq!(combatant.current_hp, 0);
        assert!(combatant.is_knocked_out());
    }

    #[test]
    fn battle_move_pp_floors_at_zero() {
        let mut battle_move = BattleMove::new(moves::struggle());
        assert!(battle_move.use_move());
        assert_eq!(battle_move.pp, 0);
        assert!(!battle_move.use_move());
        assert_eq!(battle_move.pp, 0);
        assert!(!battle_move.is_usable());
    }

    #[test]
    fn damage_factor_spans_the_variance_band() {
        let mut rng = TurnRng::new_for_test(vec![1, 100, 50]);
        assert!((rng.damage_factor("low") - 0.85).abs() < 1e-9);
        assert!((rng.damage_factor("high") - 1.0).abs() < 1e-9);
        let mid = rng.damage_factor("mid");
        assert!(mid > 0.85 && mid < 1.0);
    }

    #[test]
    fn pick_index_covers_all_slots() {
        let mut rng = TurnRng::new_for_test(vec![1, 34, 67, 100]);
        assert_eq!(rng.pick_index(3, "a"), 0);
        assert_eq!(rng.pick_index(3, "b"), 0);
        assert_eq!(rng.pick_index(3, "c"), 1);
        assert_eq!(rng.pick_index(3, "d"), 2);
    }

    fn test_combatant(hp: u16) -> Combatant {
        Combatant {
            id: "c-1".into(),
            pokedex_id: 25,
            name: "Pikachu".into(),
            level: 15,
            current_hp: hp,
            max_hp: hp,
            attack: 20,
            defense: 18,
            speed: 32,
            moves: vec![BattleMove::new(moves::tackle())],
            is_player: true,
        }
    }
}
