//! Wild-creature capture.
//!
//! Each player has at most one pending [`WildEncounter`]. A successful
//! capture persists the creature, assigns its move set, and immediately
//! rolls a fresh encounter for the same zone, so capturing never leaves
//! the player without a pending target. A failed attempt leaves the
//! existing encounter in place. The asymmetry is deliberate.

use crate::encounter::{EncounterGenerator, WildEncounter};
use crate::errors::{EncounterError, GameError, GameResult};
use crate::store::{CreatureStore, MoveProvider, NewCreature, OwnedCreature};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Result of one capture attempt.
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub caught: bool,
    /// The persisted creature, on success.
    pub creature: Option<OwnedCreature>,
    /// The replacement encounter rolled after a success.
    pub next_encounter: Option<WildEncounter>,
}

/// Capture probability for a base catch rate: `min(rate/255 * 1.5, 0.95)`.
pub fn capture_rate(base_catch_rate: u8) -> f64 {
    (f64::from(base_catch_rate) / 255.0 * 1.5).min(0.95)
}

fn roll_success<R: Rng>(rate: f64, rng: &mut R) -> bool {
    rng.random::<f64>() < rate
}

pub struct CaptureResolver {
    generator: EncounterGenerator,
    store: Arc<dyn CreatureStore>,
    moves: Arc<dyn MoveProvider>,
    // One slot per player; the slot mutex serializes that player's
    // search/attempt traffic without blocking anyone else.
    pending: RwLock<HashMap<String, Arc<Mutex<Option<WildEncounter>>>>>,
}

impl CaptureResolver {
    pub fn new(
        generator: EncounterGenerator,
        store: Arc<dyn CreatureStore>,
        moves: Arc<dyn MoveProvider>,
    ) -> Self {
        Self {
            generator,
            store,
            moves,
            pending: RwLock::new(HashMap::new()),
        }
    }

    async fn slot(&self, player_id: &str) -> Arc<Mutex<Option<WildEncounter>>> {
        if let Some(slot) = self.pending.read().await.get(player_id) {
            return slot.clone();
        }
        self.pending
            .write()
            .await
            .entry(player_id.to_string())
            .or_default()
            .clone()
    }

    /// Roll a new pending encounter for the zone, replacing whatever was
    /// there.
    pub async fn search<R: Rng>(
        &self,
        player_id: &str,
        zone: u16,
        rng: &mut R,
    ) -> GameResult<WildEncounter> {
        let slot = self.slot(player_id).await;
        let mut guard = slot.lock().await;
        let encounter = self.generator.generate_wild(zone, rng).await?;
        *guard = Some(encounter.clone());
        Ok(encounter)
    }

    /// The player's current pending encounter.
    pub async fn current(&self, player_id: &str) -> GameResult<WildEncounter> {
        let slot = self.slot(player_id).await;
        let guard = slot.lock().await;
        guard
            .clone()
            .ok_or(GameError::Encounter(EncounterError::NoPendingEncounter))
    }

    /// Discard the pending encounter and roll a fresh one for the zone.
    pub async fn release<R: Rng>(
        &self,
        player_id: &str,
        zone: u16,
        rng: &mut R,
    ) -> GameResult<WildEncounter> {
        self.search(player_id, zone, rng).await
    }

    /// Attempt to capture the pending encounter.
    pub async fn attempt<R: Rng>(
        &self,
        player_id: &str,
        rng: &mut R,
    ) -> GameResult<CaptureOutcome> {
        let slot = self.slot(player_id).await;
        let mut guard = slot.lock().await;
        let encounter = guard
            .clone()
            .ok_or(GameError::Encounter(EncounterError::NoPendingEncounter))?;

        let rate = capture_rate(encounter.catch_rate);
        if !roll_success(rate, rng) {
            // The encounter stays put; the caller may retry.
            return Ok(CaptureOutcome {
                caught: false,
                creature: None,
                next_encounter: None,
            });
        }

        // Persistence must succeed before the in-memory record changes.
        let assigned = self
            .moves
            .moves_for(encounter.pokedex_id, encounter.level)
            .await?;
        let creature = self
            .store
            .create(
                player_id,
                NewCreature {
                    pokedex_id: encounter.pokedex_id,
                    level: encounter.level,
                    gender: encounter.gender,
                    shiny: encounter.shiny,
                    moves: assigned,
                },
            )
            .await?;

        *guard = None;
        let next = self.generator.generate_wild(encounter.zone, rng).await?;
        *guard = Some(next.clone());

        tracing::info!(
            player = player_id,
            pokedex_id = encounter.pokedex_id,
            level = encounter.level,
            "wild creature captured"
        );
        Ok(CaptureOutcome {
            caught: true,
            creature: Some(creature),
            next_encounter: Some(next),
        })
    }
}
