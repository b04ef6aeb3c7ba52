//! Collaborator contracts for persistence: the owned-creature store and
//! the move-set assignment service, plus the in-memory implementations the
//! server binary and tests run against.

use crate::catalog::SpeciesCatalog;
use crate::errors::{CatalogResult, StoreError, StoreResult};
use crate::moves::{self, MoveRecord};
use async_trait::async_trait;
use schema::Gender;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Per-stat boosts attached to an owned creature. `resistance` is stored
/// and reported but never consumed by the stat scaler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBoosts {
    pub hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub resistance: u16,
}

/// A creature a player owns. Persisted across sessions, unlike the
/// ephemeral battle combatants derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedCreature {
    pub id: String,
    pub pokedex_id: u16,
    pub level: u8,
    pub gender: Gender,
    pub shiny: bool,
    pub boosts: StatBoosts,
    pub moves: Vec<MoveRecord>,
}

/// Fields for a creature about to be persisted (the store assigns the id;
/// boosts start at zero).
#[derive(Debug, Clone)]
pub struct NewCreature {
    pub pokedex_id: u16,
    pub level: u8,
    pub gender: Gender,
    pub shiny: bool,
    pub moves: Vec<MoveRecord>,
}

#[async_trait]
pub trait CreatureStore: Send + Sync {
    async fn list_by_player(&self, player_id: &str) -> StoreResult<Vec<OwnedCreature>>;

    async fn get(&self, player_id: &str, creature_id: &str) -> StoreResult<OwnedCreature>;

    async fn create(&self, player_id: &str, seed: NewCreature) -> StoreResult<OwnedCreature>;
}

/// Assigns up to 4 moves for a species at a level, caching the result.
#[async_trait]
pub trait MoveProvider: Send + Sync {
    async fn moves_for(&self, pokedex_id: u16, level: u8) -> CatalogResult<Vec<MoveRecord>>;
}

/// Creature store backed by a per-player map. Mutation goes through one
/// lock, so store access is serialized the same way session state is.
#[derive(Default)]
pub struct InMemoryStore {
    creatures: RwLock<HashMap<String, Vec<OwnedCreature>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed creature, for seeding demo accounts and tests.
    pub async fn seed(&self, player_id: &str, creature: OwnedCreature) {
        self.creatures
            .write()
            .await
            .entry(player_id.to_string())
            .or_default()
            .push(creature);
    }
}

#[async_trait]
impl CreatureStore for InMemoryStore {
    async fn list_by_player(&self, player_id: &str) -> StoreResult<Vec<OwnedCreature>> {
        Ok(self
            .creatures
            .read()
            .await
            .get(player_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get(&self, player_id: &str, creature_id: &str) -> StoreResult<OwnedCreature> {
        self.creatures
            .read()
            .await
            .get(player_id)
            .and_then(|list| list.iter().find(|c| c.id == creature_id))
            .cloned()
            .ok_or_else(|| StoreError::CreatureNotFound(creature_id.to_string()))
    }

    async fn create(&self, player_id: &str, seed: NewCreature) -> StoreResult<OwnedCreature> {
        let creature = OwnedCreature {
            id: Uuid::new_v4().to_string(),
            pokedex_id: seed.pokedex_id,
            level: seed.level,
            gender: seed.gender,
            shiny: seed.shiny,
            boosts: StatBoosts::default(),
            moves: seed.moves,
        };
        self.creatures
            .write()
            .await
            .entry(player_id.to_string())
            .or_default()
            .push(creature.clone());
        Ok(creature)
    }
}

/// Move assignment backed by the species catalog: the themed damaging move
/// for the species' primary type plus the canned basics, sized by level.
/// Results are cached per (species, level), so the catalog is consulted at
/// most once per combination.
pub struct CatalogMoveProvider {
    catalog: Arc<dyn SpeciesCatalog>,
    cache: Mutex<HashMap<(u16, u8), Vec<MoveRecord>>>,
}

impl CatalogMoveProvider {
    pub fn new(catalog: Arc<dyn SpeciesCatalog>) -> Self {
        Self {
            catalog,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl MoveProvider for CatalogMoveProvider {
    async fn moves_for(&self, pokedex_id: u16, level: u8) -> CatalogResult<Vec<MoveRecord>> {
        if let Some(cached) = self.cache.lock().await.get(&(pokedex_id, level)) {
            return Ok(cached.clone());
        }

        // Not cached: the catalog must answer. Capture correctness depends
        // on this, so failures propagate instead of degrading.
        let record = self.catalog.species(pokedex_id).await?;
        let primary = record
            .types
            .first()
            .copied()
            .unwrap_or(schema::ElementType::Normal);

        let mut assigned = vec![
            moves::themed_move(primary),
            moves::tackle(),
            moves::growl(),
            moves::quick_attack(),
        ];
        assigned.dedup_by(|a, b| a.id == b.id);
        assigned.truncate(moves::moveset_size(level));

        self.cache
            .lock()
            .await
            .insert((pokedex_id, level), assigned.clone());
        Ok(assigned)
    }
}
