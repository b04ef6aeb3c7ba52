//! Turn resolution.
//!
//! `resolve_turn` is pure given the battle state and a [`TurnRng`]: it
//! orders the two chosen moves, rolls accuracy / variance / crits, applies
//! damage and PP, and reports what happened as an ordered outcome list,
//! the unit the protocol layer serializes into ATTACK_RESULT messages.

use crate::battle::state::{BattleMove, BattlePhase, BattleState, Combatant, TurnRng};
use crate::errors::BattleError;
use crate::moves;
use schema::{ActorRef, MoveView};

/// Which side of the 1v1 fight is acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorSide {
    Player,
    Enemy,
}

impl ActorSide {
    fn opponent(self) -> ActorSide {
        match self {
            ActorSide::Player => ActorSide::Enemy,
            ActorSide::Enemy => ActorSide::Player,
        }
    }
}

/// A side's chosen action for the turn. `Struggle` substitutes when every
/// real move is out of PP; it never consumes PP itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveChoice {
    Slot(usize),
    Struggle,
}

/// What one actor did with its move this turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub side: ActorSide,
    pub attacker: ActorRef,
    pub defender: ActorRef,
    pub move_used: MoveView,
    pub hit: bool,
    pub damage: u16,
    pub critical: bool,
    pub defender_remaining_hp: u16,
    pub defender_max_hp: u16,
    pub knocked_out_defender: bool,
}

/// Ordered outcomes of one resolved turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResult {
    pub turn: u32,
    pub outcomes: Vec<ActionOutcome>,
}

impl TurnResult {
    pub fn enemy_knocked_out(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.side == ActorSide::Player && o.knocked_out_defender)
    }

    pub fn player_knocked_out(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.side == ActorSide::Enemy && o.knocked_out_defender)
    }
}

/// Pick a move for a combatant: uniform among moves with PP left, Struggle
/// when none remain.
pub fn select_move(combatant: &Combatant, rng: &mut TurnRng) -> MoveChoice {
    let usable: Vec<usize> = combatant
        .moves
        .iter()
        .enumerate()
        .filter(|(_, m)| m.is_usable())
        .map(|(i, _)| i)
        .collect();

    if usable.is_empty() {
        MoveChoice::Struggle
    } else {
        MoveChoice::Slot(usable[rng.pick_index(usable.len(), "move selection")])
    }
}

/// Validate an explicitly chosen move against its owner. Rejections leave
/// the battle untouched; the turn does not advance.
pub fn validate_choice(combatant: &Combatant, choice: MoveChoice) -> Result<(), BattleError> {
    if let MoveChoice::Slot(slot) = choice {
        let battle_move = combatant
            .moves
            .get(slot)
            .ok_or(BattleError::InvalidMoveSlot(slot))?;
        if !battle_move.is_usable() {
            return Err(BattleError::MoveExhausted(slot));
        }
    }
    Ok(())
}

fn choice_priority(combatant: &Combatant, choice: MoveChoice) -> i8 {
    match choice {
        MoveChoice::Slot(slot) => combatant.moves[slot].record.priority,
        MoveChoice::Struggle => 0,
    }
}

/// Determine acting order: higher move priority first, speed breaks
/// priority ties, and the player acts first on a full tie. The tie rule is
/// an asymmetric convention the game balance depends on; do not replace it
/// with a coin flip.
fn determine_order(
    state: &BattleState,
    player_choice: MoveChoice,
    enemy_choice: MoveChoice,
) -> [ActorSide; 2] {
    let player_priority = choice_priority(&state.player, player_choice);
    let enemy_priority = choice_priority(&state.enemy, enemy_choice);

    if player_priority > enemy_priority {
        [ActorSide::Player, ActorSide::Enemy]
    } else if enemy_priority > player_priority {
        [ActorSide::Enemy, ActorSide::Player]
    } else if state.player.speed >= state.enemy.speed {
        [ActorSide::Player, ActorSide::Enemy]
    } else {
        [ActorSide::Enemy, ActorSide::Player]
    }
}

/// Linear damage formula with a fixed 1.0 type multiplier. Variance is
/// rolled in [0.85, 1.00]; a crit multiplies the floored result by 1.5 and
/// floors again, matching the original order of operations.
fn roll_damage(
    attacker: &Combatant,
    defender: &Combatant,
    power: u16,
    rng: &mut TurnRng,
) -> (u16, bool) {
    let level = f64::from(attacker.level);
    let attack = f64::from(attacker.attack);
    let defense = f64::from(defender.defense.max(1));
    let type_multiplier = 1.0;

    let base = ((2.0 * level + 10.0) / 250.0) * (attack / defense) * f64::from(power) + 2.0;
    let factor = rng.damage_factor("damage variance");
    let mut damage = (base * type_multiplier * factor).floor().max(1.0) as u16;

    let critical = rng.next_outcome("critical roll") <= 10;
    if critical {
        damage = (f64::from(damage) * 1.5).floor() as u16;
    }
    (damage, critical)
}

fn resolve_action(
    side: ActorSide,
    choice: MoveChoice,
    state: &mut BattleState,
    rng: &mut TurnRng,
) -> ActionOutcome {
    let (actor, defender) = match side {
        ActorSide::Player => (&mut state.player, &mut state.enemy),
        ActorSide::Enemy => (&mut state.enemy, &mut state.player),
    };

    // Resolve the move and pay its PP up front; a miss still costs PP.
    let move_view = match choice {
        MoveChoice::Slot(slot) => {
            actor.moves[slot].use_move();
            actor.moves[slot].to_view()
        }
        MoveChoice::Struggle => BattleMove::new(moves::struggle()).to_view(),
    };

    let accuracy = move_view.accuracy.unwrap_or(100);
    let hit = rng.next_outcome("accuracy check") <= accuracy;

    let (damage, critical) = match move_view.power {
        Some(power) if hit && power > 0 => roll_damage(actor, defender, power, rng),
        _ => (0, false),
    };
    defender.take_damage(damage);

    ActionOutcome {
        side,
        attacker: actor.actor_ref(),
        defender: defender.actor_ref(),
        move_used: move_view,
        hit,
        damage,
        critical,
        defender_remaining_hp: defender.current_hp,
        defender_max_hp: defender.max_hp,
        knocked_out_defender: defender.is_knocked_out(),
    }
}

/// Resolve one full turn. Both choices are validated before anything
/// mutates; an invalid player choice is reported and the turn does not
/// advance.
pub fn resolve_turn(
    state: &mut BattleState,
    player_choice: MoveChoice,
    enemy_choice: MoveChoice,
    rng: &mut TurnRng,
) -> Result<TurnResult, BattleError> {
    validate_choice(&state.player, player_choice)?;
    validate_choice(&state.enemy, enemy_choice)?;

    state.phase = BattlePhase::Processing;
    let turn = state.turn_number;
    let mut outcomes = Vec::with_capacity(2);

    for side in determine_order(state, player_choice, enemy_choice) {
        let (actor, defender) = match side {
            ActorSide::Player => (&state.player, &state.enemy),
            ActorSide::Enemy => (&state.enemy, &state.player),
        };
        // An actor knocked out earlier this turn does not act, and a
        // knocked-out defender cannot be targeted again.
        if actor.is_knocked_out() || defender.is_knocked_out() {
            continue;
        }

        let choice = match side {
            ActorSide::Player => player_choice,
            ActorSide::Enemy => enemy_choice,
        };
        let outcome = resolve_action(side, choice, state, rng);
        let knocked_out = outcome.knocked_out_defender;
        outcomes.push(outcome);
        if knocked_out {
            break;
        }
    }

    state.phase = if state.enemy.is_knocked_out() {
        BattlePhase::EnemyDefeated
    } else if state.player.is_knocked_out() {
        BattlePhase::PlayerDefeated
    } else {
        state.turn_number += 1;
        BattlePhase::Active
    };

    Ok(TurnResult { turn, outcomes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::{self, MoveRecord};
    use pretty_assertions::assert_eq;
    use schema::{DamageClass, ElementType};

    fn combatant(name: &str, is_player: bool, speed: u16, records: Vec<MoveRecord>) -> Combatant {
        Combatant {
            id: format!("{}-id", name),
            pokedex_id: 25,
            name: name.to_string(),
            level: 15,
            current_hp: 50,
            max_hp: 50,
            attack: 20,
            defense: 18,
            speed,
            moves: records.into_iter().map(BattleMove::new).collect(),
            is_player,
        }
    }

    fn priority_move(priority: i8) -> MoveRecord {
        MoveRecord {
            id: 900,
            name: "Test Jab".into(),
            element: ElementType::Normal,
            power: Some(40),
            accuracy: Some(100),
            pp: 10,
            priority,
            damage_class: DamageClass::Physical,
        }
    }

    fn battle(player: Combatant, enemy: Combatant) -> BattleState {
        BattleState::new(player, enemy)
    }

    // Rolls that always hit, roll maximum variance, and never crit.
    fn calm_rng() -> TurnRng {
        TurnRng::new_for_test(vec![1, 100, 100, 1, 100, 100])
    }

    #[test]
    fn higher_priority_acts_first_regardless_of_speed() {
        // Enemy is much faster but the player's move has priority 1.
        let player = combatant("player", true, 1, vec![priority_move(1)]);
        let enemy = combatant("enemy", false, 99, vec![priority_move(0)]);
        let mut state = battle(player, enemy);

        let result = resolve_turn(
            &mut state,
            MoveChoice::Slot(0),
            MoveChoice::Slot(0),
            &mut calm_rng(),
        )
        .unwrap();

        assert_eq!(result.outcomes[0].side, ActorSide::Player);
        assert_eq!(result.outcomes[1].side, ActorSide::Enemy);
    }

    #[test]
    fn speed_breaks_priority_ties() {
        let player = combatant("player", true, 10, vec![priority_move(0)]);
        let enemy = combatant("enemy", false, 40, vec![priority_move(0)]);
        let mut state = battle(player, enemy);

        let result = resolve_turn(
            &mut state,
            MoveChoice::Slot(0),
            MoveChoice::Slot(0),
            &mut calm_rng(),
        )
        .unwrap();

        assert_eq!(result.outcomes[0].side, ActorSide::Enemy);
    }

    #[test]
    fn player_wins_full_ties() {
        // Equal priority and equal speed: the player resolves first. This
        // is a documented convention, not a coin flip.
        let player = combatant("player", true, 25, vec![priority_move(0)]);
        let enemy = combatant("enemy", false, 25, vec![priority_move(0)]);
        let mut state = battle(player, enemy);

        let result = resolve_turn(
            &mut state,
            MoveChoice::Slot(0),
            MoveChoice::Slot(0),
            &mut calm_rng(),
        )
        .unwrap();

        assert_eq!(result.outcomes[0].side, ActorSide::Player);
    }

    #[test]
    fn damage_formula_reference_value() {
        // level 15, attack 20, defense 18, power 40, variance 1.0:
        // floor((40/250) * (20/18) * 40 + 2) = floor(9.111) = 9
        let player = combatant("player", true, 30, vec![priority_move(0)]);
        let enemy = combatant("enemy", false, 1, vec![priority_move(0)]);
        let mut state = battle(player, enemy);

        let result = resolve_turn(
            &mut state,
            MoveChoice::Slot(0),
            MoveChoice::Slot(0),
            &mut calm_rng(),
        )
        .unwrap();

        assert_eq!(result.outcomes[0].damage, 9);
        assert!(!result.outcomes[0].critical);
        assert_eq!(state.enemy.current_hp, 41);
    }

    #[test]
    fn critical_multiplies_floored_damage() {
        // Variance 1.0 gives 9; a crit turns that into floor(9 * 1.5) = 13.
        let player = combatant("player", true, 30, vec![priority_move(0)]);
        let enemy = combatant("enemy", false, 1, vec![priority_move(0)]);
        let mut state = battle(player, enemy);
        let mut rng = TurnRng::new_for_test(vec![1, 100, 10, 1, 100, 100]);

        let result =
            resolve_turn(&mut state, MoveChoice::Slot(0), MoveChoice::Slot(0), &mut rng).unwrap();

        assert!(result.outcomes[0].critical);
        assert_eq!(result.outcomes[0].damage, 13);
    }

    #[test]
    fn miss_consumes_pp_and_deals_nothing() {
        let mut weak = priority_move(0);
        weak.accuracy = Some(50);
        let player = combatant("player", true, 30, vec![weak]);
        let enemy = combatant("enemy", false, 1, vec![priority_move(0)]);
        let mut state = battle(player, enemy);
        // Player rolls 51 (miss at 50 accuracy); enemy hits calmly.
        let mut rng = TurnRng::new_for_test(vec![51, 1, 100, 100]);

        let result =
            resolve_turn(&mut state, MoveChoice::Slot(0), MoveChoice::Slot(0), &mut rng).unwrap();

        let player_outcome = &result.outcomes[0];
        assert!(!player_outcome.hit);
        assert_eq!(player_outcome.damage, 0);
        assert_eq!(state.player.moves[0].pp, 9);
        assert_eq!(state.enemy.current_hp, state.enemy.max_hp);
    }

    #[test]
    fn minimum_one_damage_for_power_bearing_moves() {
        let mut feeble = priority_move(0);
        feeble.power = Some(1);
        let mut player = combatant("player", true, 30, vec![feeble]);
        player.level = 1;
        player.attack = 1;
        let enemy = combatant("enemy", false, 1, vec![priority_move(0)]);
        let mut state = battle(player, enemy);
        // Lowest variance roll.
        let mut rng = TurnRng::new_for_test(vec![1, 1, 100, 1, 100, 100]);

        let result =
            resolve_turn(&mut state, MoveChoice::Slot(0), MoveChoice::Slot(0), &mut rng).unwrap();

        assert_eq!(result.outcomes[0].damage, 1);
    }

    #[test]
    fn status_moves_deal_no_damage() {
        let player = combatant("player", true, 30, vec![moves::growl()]);
        let enemy = combatant("enemy", false, 1, vec![priority_move(0)]);
        let mut state = battle(player, enemy);
        // Status move consumes only an accuracy roll.
        let mut rng = TurnRng::new_for_test(vec![1, 1, 100, 100]);

        let result =
            resolve_turn(&mut state, MoveChoice::Slot(0), MoveChoice::Slot(0), &mut rng).unwrap();

        assert!(result.outcomes[0].hit);
        assert_eq!(result.outcomes[0].damage, 0);
        assert_eq!(state.enemy.current_hp, state.enemy.max_hp);
    }

    #[test]
    fn knocked_out_actor_does_not_retaliate() {
        let player = combatant("player", true, 99, vec![priority_move(0)]);
        let mut enemy = combatant("enemy", false, 1, vec![priority_move(0)]);
        enemy.current_hp = 1;
        let mut state = battle(player, enemy);

        let result = resolve_turn(
            &mut state,
            MoveChoice::Slot(0),
            MoveChoice::Slot(0),
            &mut calm_rng(),
        )
        .unwrap();

        assert_eq!(result.outcomes.len(), 1);
        assert!(result.outcomes[0].knocked_out_defender);
        assert!(result.enemy_knocked_out());
        assert_eq!(state.phase, BattlePhase::EnemyDefeated);
        // The enemy's move was never used.
        assert_eq!(state.enemy.moves[0].pp, 10);
    }

    #[test]
    fn invalid_choice_leaves_state_untouched() {
        let player = combatant("player", true, 30, vec![priority_move(0)]);
        let enemy = combatant("enemy", false, 1, vec![priority_move(0)]);
        let mut state = battle(player, enemy);
        let before = state.clone();

        let err = resolve_turn(
            &mut state,
            MoveChoice::Slot(3),
            MoveChoice::Slot(0),
            &mut calm_rng(),
        )
        .unwrap_err();

        assert_eq!(err, BattleError::InvalidMoveSlot(3));
        assert_eq!(state.player, before.player);
        assert_eq!(state.enemy, before.enemy);
        assert_eq!(state.turn_number, before.turn_number);
    }

    #[test]
    fn exhausted_choice_is_rejected() {
        let mut drained = priority_move(0);
        drained.pp = 0;
        let player = combatant("player", true, 30, vec![drained]);
        let enemy = combatant("enemy", false, 1, vec![priority_move(0)]);
        let mut state = battle(player, enemy);

        let err = resolve_turn(
            &mut state,
            MoveChoice::Slot(0),
            MoveChoice::Slot(0),
            &mut calm_rng(),
        )
        .unwrap_err();

        assert_eq!(err, BattleError::MoveExhausted(0));
    }

    #[test]
    fn select_move_falls_back_to_struggle() {
        let mut drained = priority_move(0);
        drained.pp = 0;
        let combatant = combatant("player", true, 30, vec![drained]);
        let mut rng = TurnRng::new_for_test(vec![50]);

        assert_eq!(select_move(&combatant, &mut rng), MoveChoice::Struggle);
    }

    #[test]
    fn select_move_skips_exhausted_slots() {
        let mut drained = priority_move(0);
        drained.pp = 0;
        let combatant = combatant(
            "player",
            true,
            30,
            vec![drained, moves::tackle(), moves::growl()],
        );
        // Any roll lands on a usable slot (1 or 2), never slot 0.
        for roll in [1, 50, 100] {
            let mut rng = TurnRng::new_for_test(vec![roll]);
            match select_move(&combatant, &mut rng) {
                MoveChoice::Slot(slot) => assert!(slot == 1 || slot == 2),
                MoveChoice::Struggle => panic!("usable moves exist"),
            }
        }
    }

    #[test]
    fn turn_number_advances_only_while_both_stand() {
        let player = combatant("player", true, 99, vec![priority_move(0)]);
        let enemy = combatant("enemy", false, 1, vec![priority_move(0)]);
        let mut state = battle(player, enemy);

        resolve_turn(
            &mut state,
            MoveChoice::Slot(0),
            MoveChoice::Slot(0),
            &mut calm_rng(),
        )
        .unwrap();
        assert_eq!(state.turn_number, 2);
        assert_eq!(state.phase, BattlePhase::Active);
    }

    #[test]
    fn hp_and_pp_never_go_negative() {
        let player = combatant("player", true, 99, vec![priority_move(0)]);
        let mut enemy = combatant("enemy", false, 1, vec![priority_move(0)]);
        enemy.current_hp = 2;
        enemy.defense = 1;
        let mut state = battle(player, enemy);

        let result = resolve_turn(
            &mut state,
            MoveChoice::Slot(0),
            MoveChoice::Slot(0),
            &mut calm_rng(),
        )
        .unwrap();

        assert!(result.outcomes[0].damage >= 1);
        assert_eq!(state.enemy.current_hp, 0);
        for m in state.player.moves.iter().chain(state.enemy.moves.iter()) {
            assert!(m.pp <= m.max_pp());
        }
    }
}
