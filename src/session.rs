//! Dungeon-run lifecycle.
//!
//! The SessionManager exclusively owns every player's `DungeonSession`
//! and, through it, the current `BattleState`. The gateway never mutates
//! either directly. Per-player state sits behind its own mutex inside a
//! shared arena: one serialized path per player, no cross-player blocking,
//! and no lock held across a pacing delay. Delayed continuations re-enter
//! through `advance_turn`, which revalidates the battle id first.

use crate::battle::engine::{self, TurnResult};
use crate::battle::state::{BattleState, Combatant, TurnRng};
use crate::catalog::{species_or_fallback, SpeciesCatalog, SpeciesRecord};
use crate::dungeon::{dynamic_rewards, Dungeon, DungeonTable};
use crate::encounter::{EncounterGenerator, Opponent};
use crate::errors::{GameError, GameResult, SessionError};
use crate::stats::{scaled_hp, scaled_speed, scaled_stat};
use crate::store::{CreatureStore, OwnedCreature};
use rand::Rng;
use schema::{
    BoostsView, BossPreview, CombatantView, DungeonInfoView, EnemyPreview, RewardBundle,
    SessionView, StatBlockView, SwitchOption, TeamMemberView,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DungeonStatus {
    Ready,
    InProgress,
    Battle,
    Completed,
    Failed,
}

impl DungeonStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DungeonStatus::Ready => "READY",
            DungeonStatus::InProgress => "IN_PROGRESS",
            DungeonStatus::Battle => "BATTLE",
            DungeonStatus::Completed => "COMPLETED",
            DungeonStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DungeonStatus::Completed | DungeonStatus::Failed)
    }
}

/// One player's run: team, generated opponents, progress, and the live
/// battle if one is underway.
#[derive(Debug)]
pub struct DungeonSession {
    pub session_id: String,
    pub player_id: String,
    pub dungeon: Dungeon,
    pub team: Vec<OwnedCreature>,
    pub opponents: Vec<Opponent>,
    pub defeated: usize,
    pub dead: HashSet<String>,
    pub status: DungeonStatus,
    pub battle: Option<BattleState>,
}

impl DungeonSession {
    fn view(&self) -> SessionView {
        SessionView {
            id: self.session_id.clone(),
            status: self.status.as_str().to_string(),
            selected_pokemon: self.team.iter().map(|c| c.id.clone()).collect(),
            defeated_enemies: self.defeated,
        }
    }

    fn living_teammates(&self) -> Vec<&OwnedCreature> {
        self.team
            .iter()
            .filter(|c| !self.dead.contains(&c.id))
            .collect()
    }
}

/// Everything SELECT_TEAM needs answered: the new session plus the full
/// DUNGEON_READY payload.
#[derive(Debug, Clone)]
pub struct RunStart {
    pub session: SessionView,
    pub dungeon_info: DungeonInfoView,
    pub player_team: Vec<TeamMemberView>,
    pub enemies: Vec<EnemyPreview>,
    pub boss: BossPreview,
    pub rewards: RewardBundle,
}

/// Everything START_FIGHT / CHANGE_POKEMON need answered.
#[derive(Debug, Clone)]
pub struct FightStart {
    pub battle_id: String,
    pub player_pokemon: CombatantView,
    pub enemy_pokemon: CombatantView,
    pub enemy_number: usize,
    pub total_enemies: usize,
    pub is_boss: bool,
}

/// What the session layer decided after a resolved turn.
#[derive(Debug, Clone)]
pub enum TurnAftermath {
    /// Both sides stand; keep the automatic loop running.
    Continue,
    /// Enemy down, more opponents remain; re-chain with the same creature.
    NextOpponent { defeated: usize, total: usize },
    /// Enemy down and it was the last one.
    RunComplete {
        rewards: RewardBundle,
        defeated: usize,
        total: usize,
        dungeon_name: String,
    },
    /// Player's creature down; the run continues once a switch arrives.
    AwaitSwitch {
        options: Vec<SwitchOption>,
        battle_id: String,
    },
    /// Player's last creature down; the run is lost.
    Defeat,
}

#[derive(Debug, Clone)]
pub struct TurnReport {
    pub result: TurnResult,
    pub aftermath: TurnAftermath,
}

pub struct SessionManager {
    catalog: Arc<dyn SpeciesCatalog>,
    store: Arc<dyn CreatureStore>,
    generator: EncounterGenerator,
    dungeons: DungeonTable,
    sessions: RwLock<HashMap<String, Arc<Mutex<Option<DungeonSession>>>>>,
}

impl SessionManager {
    pub fn new(
        catalog: Arc<dyn SpeciesCatalog>,
        store: Arc<dyn CreatureStore>,
        dungeons: DungeonTable,
    ) -> Self {
        let generator = EncounterGenerator::new(catalog.clone());
        Self {
            catalog,
            store,
            generator,
            dungeons,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    async fn slot(&self, player_id: &str) -> Arc<Mutex<Option<DungeonSession>>> {
        if let Some(slot) = self.sessions.read().await.get(player_id) {
            return slot.clone();
        }
        self.sessions
            .write()
            .await
            .entry(player_id.to_string())
            .or_default()
            .clone()
    }

    /// Start (or restart) a dungeon run. Any prior session for the player
    /// is discarded unconditionally, mid-battle included; its timers die
    /// on their next battle-id check.
    pub async fn start_run<R: Rng + Send>(
        &self,
        player_id: &str,
        dungeon_id: u32,
        team_ids: &[String],
        rng: &mut R,
    ) -> GameResult<RunStart> {
        if team_ids.len() != 4 {
            return Err(SessionError::InvalidTeamSize(team_ids.len()).into());
        }
        let dungeon = self
            .dungeons
            .get(dungeon_id)
            .cloned()
            .ok_or(SessionError::DungeonNotFound(dungeon_id))?;

        // Ownership check goes through the store before any state changes.
        let owned = self.store.list_by_player(player_id).await?;
        let mut team = Vec::with_capacity(4);
        for id in team_ids {
            let creature = owned
                .iter()
                .find(|c| &c.id == id)
                .cloned()
                .ok_or_else(|| SessionError::UnownedCreature(id.clone()))?;
            team.push(creature);
        }

        let opponents = self
            .generator
            .generate_dungeon_opponents(
                dungeon.spawn_levels,
                dungeon.boss_pokedex_id,
                dungeon.boss_level,
                rng,
            )
            .await;

        let mut player_team = Vec::with_capacity(4);
        for creature in &team {
            let species = species_or_fallback(self.catalog.as_ref(), creature.pokedex_id).await;
            player_team.push(team_member_view(creature, &species));
        }

        let rewards = dynamic_rewards(&dungeon, rng);
        let session = DungeonSession {
            session_id: Uuid::new_v4().to_string(),
            player_id: player_id.to_string(),
            dungeon: dungeon.clone(),
            team,
            opponents,
            defeated: 0,
            dead: HashSet::new(),
            status: DungeonStatus::Ready,
            battle: None,
        };

        let enemies = session.opponents[..session.opponents.len() - 1]
            .iter()
            .map(Opponent::preview)
            .collect();
        let boss = session
            .opponents
            .last()
            .expect("roster always ends with the boss")
            .boss_preview();
        let run = RunStart {
            session: session.view(),
            dungeon_info: DungeonInfoView {
                id: dungeon.id,
                name: dungeon.name.clone(),
                description: dungeon.description.clone(),
                boss_level: dungeon.boss_level,
                spawn_levels: dungeon.spawn_levels,
            },
            player_team,
            enemies,
            boss,
            rewards,
        };

        let slot = self.slot(player_id).await;
        let mut guard = slot.lock().await;
        if guard.is_some() {
            tracing::info!(player = player_id, "discarding previous dungeon session");
        }
        *guard = Some(session);
        Ok(run)
    }

    /// Put a team member into the arena against the current opponent.
    /// Serves the first fight, voluntary switches, and forced post-KO
    /// switches alike.
    pub async fn begin_fight(&self, player_id: &str, creature_id: &str) -> GameResult<FightStart> {
        let slot = self.slot(player_id).await;
        let mut guard = slot.lock().await;
        let session = guard
            .as_mut()
            .ok_or(GameError::Session(SessionError::NoActiveSession))?;

        if session.status == DungeonStatus::Completed {
            return Err(SessionError::AllOpponentsDefeated.into());
        }
        if session.status == DungeonStatus::Failed {
            return Err(SessionError::NoActiveSession.into());
        }
        let creature = session
            .team
            .iter()
            .find(|c| c.id == creature_id)
            .cloned()
            .ok_or_else(|| SessionError::NotInTeam(creature_id.to_string()))?;
        if session.dead.contains(creature_id) {
            return Err(SessionError::KnockedOutSelection(creature_id.to_string()).into());
        }
        if session.defeated >= session.opponents.len() {
            return Err(SessionError::AllOpponentsDefeated.into());
        }

        let species = species_or_fallback(self.catalog.as_ref(), creature.pokedex_id).await;
        let player_combatant = Combatant::from_owned(&creature, &species);

        let opponent = &session.opponents[session.defeated];
        let mut enemy = opponent.combatant.clone();
        // Switching mid-fight never heals the opponent: carry its HP over
        // from the battle being replaced.
        if let Some(prev) = &session.battle {
            if prev.enemy.id == enemy.id {
                enemy.current_hp = prev.enemy.current_hp;
            }
        }

        let battle = BattleState::new(player_combatant, enemy);
        let start = FightStart {
            battle_id: battle.battle_id.clone(),
            player_pokemon: battle.player.to_view(),
            enemy_pokemon: battle.enemy.to_view(),
            enemy_number: session.defeated + 1,
            total_enemies: session.opponents.len(),
            is_boss: session.defeated == session.opponents.len() - 1,
        };
        session.battle = Some(battle);
        session.status = DungeonStatus::Battle;
        Ok(start)
    }

    /// Resolve one automatic turn. Returns `Ok(None)` when the targeted
    /// battle no longer exists (superseded, suspended, or torn down) so a
    /// stale continuation dies silently.
    pub async fn advance_turn<R: Rng + Send>(
        &self,
        player_id: &str,
        battle_id: &str,
        mut turn_rng: TurnRng,
        reward_rng: &mut R,
    ) -> GameResult<Option<TurnReport>> {
        let slot = self.slot(player_id).await;
        let mut guard = slot.lock().await;
        let Some(session) = guard.as_mut() else {
            return Ok(None);
        };
        let Some(battle) = session.battle.as_mut() else {
            return Ok(None);
        };
        if battle.battle_id != battle_id || !battle.accepts_turns() {
            return Ok(None);
        }

        let player_choice = engine::select_move(&battle.player, &mut turn_rng);
        let enemy_choice = engine::select_move(&battle.enemy, &mut turn_rng);
        let result = engine::resolve_turn(battle, player_choice, enemy_choice, &mut turn_rng)?;

        let total = session.opponents.len();
        let aftermath = if result.enemy_knocked_out() {
            session.battle = None;
            session.defeated += 1;
            if session.defeated == total {
                session.status = DungeonStatus::Completed;
                tracing::info!(player = player_id, "dungeon completed, all enemies defeated");
                TurnAftermath::RunComplete {
                    rewards: dynamic_rewards(&session.dungeon, reward_rng),
                    defeated: session.defeated,
                    total,
                    dungeon_name: session.dungeon.name.clone(),
                }
            } else {
                session.status = DungeonStatus::InProgress;
                tracing::debug!(
                    player = player_id,
                    defeated = session.defeated,
                    total,
                    "enemy defeated"
                );
                TurnAftermath::NextOpponent {
                    defeated: session.defeated,
                    total,
                }
            }
        } else if result.player_knocked_out() {
            let fallen = battle.player.id.clone();
            let suspended_battle_id = battle.battle_id.clone();
            session.dead.insert(fallen);
            if session.dead.len() == session.team.len() {
                session.status = DungeonStatus::Failed;
                session.battle = None;
                tracing::info!(player = player_id, "run failed, whole team knocked out");
                TurnAftermath::Defeat
            } else {
                // Battle stays suspended (phase PlayerDefeated) until a
                // CHANGE_POKEMON supplies the replacement.
                let mut options = Vec::new();
                for creature in session.living_teammates() {
                    let species =
                        species_or_fallback(self.catalog.as_ref(), creature.pokedex_id).await;
                    options.push(SwitchOption {
                        id: creature.id.clone(),
                        pokedex_id: creature.pokedex_id,
                        name: species.name,
                        level: creature.level,
                    });
                }
                TurnAftermath::AwaitSwitch {
                    options,
                    battle_id: suspended_battle_id,
                }
            }
        } else {
            TurnAftermath::Continue
        };

        Ok(Some(TurnReport { result, aftermath }))
    }

    /// Unconditional teardown, used on disconnect and explicit abandon.
    pub async fn reset(&self, player_id: &str) -> bool {
        let slot = self.slot(player_id).await;
        let mut guard = slot.lock().await;
        let had_session = guard.is_some();
        if had_session {
            tracing::info!(player = player_id, "session reset");
        }
        *guard = None;
        had_session
    }

    /// Current status, for callers that only need the lifecycle state.
    pub async fn status(&self, player_id: &str) -> Option<DungeonStatus> {
        let slot = self.slot(player_id).await;
        let guard = slot.lock().await;
        guard.as_ref().map(|s| s.status)
    }

    /// Progress counters (defeated, total), when a session exists.
    pub async fn progress(&self, player_id: &str) -> Option<(usize, usize)> {
        let slot = self.slot(player_id).await;
        let guard = slot.lock().await;
        guard.as_ref().map(|s| (s.defeated, s.opponents.len()))
    }
}

fn team_member_view(creature: &OwnedCreature, species: &SpeciesRecord) -> TeamMemberView {
    let max_hp = scaled_hp(species.base_stats.hp, creature.level, creature.boosts.hp);
    TeamMemberView {
        id: creature.id.clone(),
        pokedex_id: creature.pokedex_id,
        name: species.name.clone(),
        level: creature.level,
        gender: creature.gender,
        sprite: species.sprite.clone(),
        types: species.types.clone(),
        stats: StatBlockView {
            hp: max_hp,
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
        },
        boosts: BoostsView {
            atk: creature.boosts.attack,
            def: creature.boosts.defense,
            res: creature.boosts.resistance,
            pv: creature.boosts.hp,
        },
    }
}
