//! Per-connection message routing.
//!
//! The gateway is transport-free: the server binary (or a test) feeds it
//! [`ClientMessage`]s and forwards whatever lands on the connection's
//! outbound channel. Direct replies come back from `handle`; the automatic
//! battle loop pushes asynchronously through the same channel.
//!
//! Pacing delays exist purely for presentation. Correctness never depends
//! on them: every delayed continuation re-enters through
//! `SessionManager::advance_turn`, which checks that the battle it targets
//! still exists before touching anything.

use crate::auth::AuthVerifier;
use crate::battle::state::TurnRng;
use crate::errors::{AuthError, GameError, SessionError};
use crate::session::{SessionManager, TurnAftermath, TurnReport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use schema::{ClientMessage, ServerMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Inter-event delays for the automatic combat loop. Zero them out in
/// tests.
#[derive(Debug, Clone)]
pub struct PacingConfig {
    /// Before the first automatic turn of a fight.
    pub first_turn_delay: Duration,
    /// Between automatic turns.
    pub turn_delay: Duration,
    /// Between the last attack and the POKEMON_KO announcement.
    pub ko_delay: Duration,
    /// Between POKEMON_KO and the forced-switch prompt.
    pub switch_prompt_delay: Duration,
    /// Between ENEMY_DEFEATED and the auto-chained next fight.
    pub next_fight_delay: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            first_turn_delay: Duration::from_millis(2000),
            turn_delay: Duration::from_millis(1000),
            ko_delay: Duration::from_millis(1000),
            switch_prompt_delay: Duration::from_millis(1500),
            next_fight_delay: Duration::from_millis(4000),
        }
    }
}

impl PacingConfig {
    /// No delays at all; tests drive the loop as fast as it will go.
    pub fn immediate() -> Self {
        Self {
            first_turn_delay: Duration::ZERO,
            turn_delay: Duration::ZERO,
            ko_delay: Duration::ZERO,
            switch_prompt_delay: Duration::ZERO,
            next_fight_delay: Duration::ZERO,
        }
    }
}

/// Per-connection state: identity once authenticated, plus the outbound
/// channel the battle loop pushes into.
pub struct ConnectionCtx {
    pub connection_id: String,
    pub player_id: Option<String>,
    outbound: mpsc::UnboundedSender<ServerMessage>,
}

impl ConnectionCtx {
    pub fn new(outbound: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self {
            connection_id: Uuid::new_v4().to_string(),
            player_id: None,
            outbound,
        }
    }
}

pub struct ProtocolGateway {
    sessions: Arc<SessionManager>,
    auth: Arc<dyn AuthVerifier>,
    pacing: PacingConfig,
}

fn error_message(err: &GameError) -> ServerMessage {
    ServerMessage::Error {
        code: err.code().to_string(),
        message: err.to_string(),
    }
}

impl ProtocolGateway {
    pub fn new(
        sessions: Arc<SessionManager>,
        auth: Arc<dyn AuthVerifier>,
        pacing: PacingConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions,
            auth,
            pacing,
        })
    }

    /// Route one inbound message. Immediate replies are returned; battle
    /// events arrive later on the connection's channel.
    pub async fn handle(
        &self,
        ctx: &mut ConnectionCtx,
        message: ClientMessage,
    ) -> Vec<ServerMessage> {
        match self.dispatch(ctx, message).await {
            Ok(replies) => replies,
            Err(err) => {
                tracing::debug!(connection = %ctx.connection_id, %err, "message rejected");
                vec![error_message(&err)]
            }
        }
    }

    async fn dispatch(
        &self,
        ctx: &mut ConnectionCtx,
        message: ClientMessage,
    ) -> Result<Vec<ServerMessage>, GameError> {
        if let ClientMessage::Authenticate { token } = &message {
            let player_id = self.auth.verify(token).await?;
            tracing::info!(connection = %ctx.connection_id, player = %player_id, "authenticated");
            ctx.player_id = Some(player_id.clone());
            return Ok(vec![ServerMessage::Authenticated {
                trainer_id: player_id,
            }]);
        }

        let player_id = ctx
            .player_id
            .clone()
            .ok_or(GameError::Auth(AuthError::NotAuthenticated))?;

        match message {
            ClientMessage::Authenticate { .. } => unreachable!("handled above"),
            ClientMessage::SelectTeam {
                dungeon_id,
                pokemon_ids,
            } => {
                let mut rng = StdRng::from_os_rng();
                let run = self
                    .sessions
                    .start_run(&player_id, dungeon_id, &pokemon_ids, &mut rng)
                    .await?;
                Ok(vec![ServerMessage::DungeonReady {
                    session: run.session,
                    dungeon_info: run.dungeon_info,
                    player_team: run.player_team,
                    enemies: run.enemies,
                    boss: run.boss,
                    rewards: run.rewards,
                }])
            }
            ClientMessage::StartFight {
                selected_pokemon_id,
            } => self.open_fight(ctx, &player_id, &selected_pokemon_id).await,
            ClientMessage::ChangePokemon { new_pokemon_id } => {
                self.open_fight(ctx, &player_id, &new_pokemon_id).await
            }
        }
    }

    async fn open_fight(
        &self,
        ctx: &ConnectionCtx,
        player_id: &str,
        creature_id: &str,
    ) -> Result<Vec<ServerMessage>, GameError> {
        let fight = self.sessions.begin_fight(player_id, creature_id).await?;
        tracing::info!(
            player = player_id,
            battle = %fight.battle_id,
            enemy = fight.enemy_number,
            "fight started"
        );

        tokio::spawn(run_battle_loop(
            self.sessions.clone(),
            self.pacing.clone(),
            player_id.to_string(),
            fight.battle_id.clone(),
            creature_id.to_string(),
            ctx.outbound.clone(),
        ));

        Ok(vec![ServerMessage::BattleStarted {
            battle_id: fight.battle_id,
            player_pokemon: fight.player_pokemon,
            enemy_pokemon: fight.enemy_pokemon,
            enemy_number: fight.enemy_number,
            total_enemies: fight.total_enemies,
            is_boss: fight.is_boss,
        }])
    }

    /// Connection closed: tear down the player's run. Any in-flight loop
    /// dies on its next battle-id check.
    pub async fn disconnect(&self, ctx: &ConnectionCtx) {
        if let Some(player_id) = &ctx.player_id {
            tracing::info!(connection = %ctx.connection_id, player = %player_id, "disconnected");
            self.sessions.reset(player_id).await;
        }
    }
}

/// The automatic combat loop for one fight (and, on victory, the fights it
/// chains into). Runs as its own task; every tick revalidates the battle
/// id through the session layer, so a superseded or torn-down battle ends
/// the loop silently.
async fn run_battle_loop(
    sessions: Arc<SessionManager>,
    pacing: PacingConfig,
    player_id: String,
    mut battle_id: String,
    creature_id: String,
    tx: mpsc::UnboundedSender<ServerMessage>,
) {
    let mut delay = pacing.first_turn_delay;
    loop {
        tokio::time::sleep(delay).await;
        if tx.is_closed() {
            return;
        }

        let mut reward_rng = StdRng::from_os_rng();
        let report = match sessions
            .advance_turn(&player_id, &battle_id, TurnRng::new_random(), &mut reward_rng)
            .await
        {
            Ok(Some(report)) => report,
            // The battle this loop was scheduled for no longer exists.
            Ok(None) => return,
            Err(err) => {
                let _ = tx.send(error_message(&err));
                return;
            }
        };

        if emit_attack_results(&report, &tx).is_err() {
            return;
        }

        if let Some(ko) = report
            .result
            .outcomes
            .iter()
            .find(|o| o.knocked_out_defender)
        {
            tokio::time::sleep(pacing.ko_delay).await;
            let sent = tx.send(ServerMessage::PokemonKo {
                koed_pokemon: ko.defender.clone(),
                winner: ko.attacker.clone(),
            });
            if sent.is_err() {
                return;
            }
        }

        match report.aftermath {
            TurnAftermath::Continue => {
                delay = pacing.turn_delay;
            }
            TurnAftermath::NextOpponent { defeated, total } => {
                let sent = tx.send(ServerMessage::EnemyDefeated {
                    defeated_enemies: defeated,
                    total_enemies: total,
                    next_battle_delay_ms: pacing.next_fight_delay.as_millis() as u64,
                });
                if sent.is_err() {
                    return;
                }
                tokio::time::sleep(pacing.next_fight_delay).await;

                // Auto-chain the next fight with the same creature.
                match sessions.begin_fight(&player_id, &creature_id).await {
                    Ok(fight) => {
                        battle_id = fight.battle_id.clone();
                        let sent = tx.send(ServerMessage::BattleStarted {
                            battle_id: fight.battle_id,
                            player_pokemon: fight.player_pokemon,
                            enemy_pokemon: fight.enemy_pokemon,
                            enemy_number: fight.enemy_number,
                            total_enemies: fight.total_enemies,
                            is_boss: fight.is_boss,
                        });
                        if sent.is_err() {
                            return;
                        }
                        delay = pacing.first_turn_delay;
                    }
                    // The session vanished while we slept (reset or
                    // replaced): stop quietly.
                    Err(GameError::Session(SessionError::NoActiveSession)) => return,
                    Err(err) => {
                        let _ = tx.send(error_message(&err));
                        return;
                    }
                }
            }
            TurnAftermath::RunComplete {
                rewards,
                defeated,
                total,
                dungeon_name,
            } => {
                let _ = tx.send(ServerMessage::DungeonCompletedWin {
                    rewards,
                    defeated_enemies: defeated,
                    total_enemies: total,
                    dungeon_name,
                });
                return;
            }
            TurnAftermath::AwaitSwitch { options, battle_id } => {
                tokio::time::sleep(pacing.switch_prompt_delay).await;
                let _ = tx.send(ServerMessage::ForcePokemonSwitch {
                    available_pokemons: options,
                    battle_id,
                });
                // The loop ends here; CHANGE_POKEMON starts a new one.
                return;
            }
            TurnAftermath::Defeat => {
                let _ = tx.send(ServerMessage::DungeonCompletedLoose { can_retry: true });
                return;
            }
        }
    }
}

/// Emit the per-action results of a turn. An error means the connection
/// is gone.
fn emit_attack_results(
    report: &TurnReport,
    tx: &mpsc::UnboundedSender<ServerMessage>,
) -> Result<(), ()> {
    for outcome in &report.result.outcomes {
        tx.send(ServerMessage::AttackResult {
            turn: report.result.turn,
            attacker: outcome.attacker.clone(),
            defender: outcome.defender.clone(),
            move_used: outcome.move_used.clone(),
            damage: outcome.damage,
            is_critical: outcome.critical,
            missed: !outcome.hit,
            remaining_hp: outcome.defender_remaining_hp,
            max_hp: outcome.defender_max_hp,
        })
        .map_err(|_| ())?;
    }
    Ok(())
}
