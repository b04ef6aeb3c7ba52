use serde::{Deserialize, Serialize};

/// Elemental tag carried by moves and species. The server implements no
/// type chart; the tag is display data for clients.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ElementType {
    Normal,
    Fighting,
    Flying,
    Poison,
    Ground,
    Rock,
    Bug,
    Ghost,
    Fire,
    Water,
    Grass,
    Electric,
    Psychic,
    Ice,
    Dragon,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DamageClass {
    Physical,
    Special,
    Status,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

/// Full move description as seen inside a battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveView {
    pub id: u16,
    pub name: String,
    pub element: ElementType,
    pub power: Option<u16>,
    pub accuracy: Option<u8>,
    pub pp: u8,
    pub max_pp: u8,
    pub priority: i8,
    pub damage_class: DamageClass,
}

/// Abbreviated move info shown in the dungeon preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovePreview {
    pub id: u16,
    pub name: String,
    pub power: Option<u16>,
    pub element: ElementType,
}

/// A combatant as sent in BATTLE_STARTED.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatantView {
    pub id: String,
    pub pokedex_id: u16,
    pub name: String,
    pub level: u8,
    pub hp: u16,
    pub max_hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub speed: u16,
    pub moves: Vec<MoveView>,
    pub is_player: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatBlockView {
    pub hp: u16,
    pub max_hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub speed: u16,
}

/// Six-stat block exposed for generated opponents and bosses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentStats {
    pub hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub speed: u16,
    pub special_attack: u16,
    pub special_defense: u16,
}

/// Owned-creature stat boosts, using the store's field names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostsView {
    pub atk: u16,
    pub def: u16,
    pub res: u16,
    pub pv: u16,
}

/// One of the player's selected creatures, as sent in DUNGEON_READY.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberView {
    pub id: String,
    pub pokedex_id: u16,
    pub name: String,
    pub level: u8,
    pub gender: Gender,
    pub sprite: String,
    pub types: Vec<ElementType>,
    pub stats: StatBlockView,
    pub boosts: BoostsView,
}

/// A dungeon minion, as previewed in DUNGEON_READY.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyPreview {
    pub id: String,
    pub pokedex_id: u16,
    pub name: String,
    pub level: u8,
    pub hp: u16,
    pub max_hp: u16,
    pub sprite: String,
    pub types: Vec<ElementType>,
    pub moves: Vec<MovePreview>,
}

/// The boss, as previewed in DUNGEON_READY. Move info is withheld.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BossPreview {
    pub pokedex_id: u16,
    pub name: String,
    pub level: u8,
    pub sprite: String,
    pub types: Vec<ElementType>,
    pub stats: OpponentStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardItem {
    pub name: String,
    pub quantity: u32,
    pub rarity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardBundle {
    pub money: u32,
    pub experience: u32,
    pub items: Vec<RewardItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub status: String,
    pub selected_pokemon: Vec<String>,
    pub defeated_enemies: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DungeonInfoView {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub boss_level: u8,
    pub spawn_levels: [u8; 3],
}

/// Minimal actor identity used in per-action battle messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRef {
    pub id: String,
    pub name: String,
    pub is_player: bool,
}

/// A living team member offered for a forced or voluntary switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchOption {
    pub id: String,
    pub pokedex_id: u16,
    pub name: String,
    pub level: u8,
}
