use crate::views::{
    ActorRef, BossPreview, CombatantView, DungeonInfoView, EnemyPreview, MoveView,
    RewardBundle, SessionView, SwitchOption, TeamMemberView,
};
use serde::{Deserialize, Serialize};

/// Messages a client may send over the dungeon connection. On the wire each
/// message is a JSON object `{"type": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    #[serde(rename = "AUTHENTICATE")]
    Authenticate { token: String },

    #[serde(rename = "SELECT_TEAM", rename_all = "camelCase")]
    SelectTeam {
        dungeon_id: u32,
        pokemon_ids: Vec<String>,
    },

    #[serde(rename = "START_FIGHT", rename_all = "camelCase")]
    StartFight { selected_pokemon_id: String },

    /// Used both for a voluntary switch mid-fight and the forced switch
    /// after a knockout.
    #[serde(rename = "CHANGE_POKEMON", rename_all = "camelCase")]
    ChangePokemon { new_pokemon_id: String },
}

/// Messages the server pushes back on the same connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    #[serde(rename = "AUTHENTICATED", rename_all = "camelCase")]
    Authenticated { trainer_id: String },

    #[serde(rename = "DUNGEON_READY", rename_all = "camelCase")]
    DungeonReady {
        session: SessionView,
        dungeon_info: DungeonInfoView,
        player_team: Vec<TeamMemberView>,
        enemies: Vec<EnemyPreview>,
        boss: BossPreview,
        rewards: RewardBundle,
    },

    #[serde(rename = "BATTLE_STARTED", rename_all = "camelCase")]
    BattleStarted {
        battle_id: String,
        player_pokemon: CombatantView,
        enemy_pokemon: CombatantView,
        enemy_number: usize,
        total_enemies: usize,
        is_boss: bool,
    },

    #[serde(rename = "ATTACK_RESULT", rename_all = "camelCase")]
    AttackResult {
        turn: u32,
        attacker: ActorRef,
        defender: ActorRef,
        #[serde(rename = "move")]
        move_used: MoveView,
        damage: u16,
        is_critical: bool,
        missed: bool,
        remaining_hp: u16,
        max_hp: u16,
    },

    #[serde(rename = "POKEMON_KO", rename_all = "camelCase")]
    PokemonKo {
        koed_pokemon: ActorRef,
        winner: ActorRef,
    },

    #[serde(rename = "ENEMY_DEFEATED", rename_all = "camelCase")]
    EnemyDefeated {
        defeated_enemies: usize,
        total_enemies: usize,
        next_battle_delay_ms: u64,
    },

    #[serde(rename = "FORCE_POKEMON_SWITCH", rename_all = "camelCase")]
    ForcePokemonSwitch {
        available_pokemons: Vec<SwitchOption>,
        battle_id: String,
    },

    #[serde(rename = "DUNGEON_COMPLETED_WIN", rename_all = "camelCase")]
    DungeonCompletedWin {
        rewards: RewardBundle,
        defeated_enemies: usize,
        total_enemies: usize,
        dungeon_name: String,
    },

    #[serde(rename = "DUNGEON_COMPLETED_LOOSE", rename_all = "camelCase")]
    DungeonCompletedLoose { can_retry: bool },

    #[serde(rename = "ERROR")]
    Error { code: String, message: String },
}

impl ServerMessage {
    /// The wire tag, handy for logging and test assertions.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Authenticated { .. } => "AUTHENTICATED",
            ServerMessage::DungeonReady { .. } => "DUNGEON_READY",
            ServerMessage::BattleStarted { .. } => "BATTLE_STARTED",
            ServerMessage::AttackResult { .. } => "ATTACK_RESULT",
            ServerMessage::PokemonKo { .. } => "POKEMON_KO",
            ServerMessage::EnemyDefeated { .. } => "ENEMY_DEFEATED",
            ServerMessage::ForcePokemonSwitch { .. } => "FORCE_POKEMON_SWITCH",
            ServerMessage::DungeonCompletedWin { .. } => "DUNGEON_COMPLETED_WIN",
            ServerMessage::DungeonCompletedLoose { .. } => "DUNGEON_COMPLETED_LOOSE",
            ServerMessage::Error { .. } => "ERROR",
        }
    }
}
