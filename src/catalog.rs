//! Species reference data.
//!
//! The battle core never talks to the upstream catalog directly; it goes
//! through the [`SpeciesCatalog`] trait. Display paths degrade to
//! [`fallback_record`] when the provider fails, so a catalog outage never
//! reaches battle logic. Capture and move-assignment paths propagate the
//! error instead, because their correctness depends on real data.

use crate::errors::{CatalogError, CatalogResult};
use async_trait::async_trait;
use schema::ElementType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub sp_attack: u16,
    pub sp_defense: u16,
    pub speed: u16,
}

/// Male/female spawn weights. Both zero (or the pair missing entirely)
/// means the species has no gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenderRatio {
    pub male: u8,
    pub female: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRecord {
    pub pokedex_id: u16,
    pub name: String,
    /// Zone key: wild searches in zone N draw from generation N.
    pub generation: u16,
    pub types: Vec<ElementType>,
    pub base_stats: BaseStats,
    pub catch_rate: Option<u8>,
    pub gender_ratio: Option<GenderRatio>,
    pub sprite: String,
}

/// The documented degraded record used on provider failure for display
/// paths: generic name, middle-of-the-road stats, Normal type.
pub fn fallback_record(pokedex_id: u16) -> SpeciesRecord {
    SpeciesRecord {
        pokedex_id,
        name: format!("Pokemon {}", pokedex_id),
        generation: 0,
        types: vec![ElementType::Normal],
        base_stats: BaseStats {
            hp: 45,
            attack: 49,
            defense: 49,
            sp_attack: 65,
            sp_defense: 65,
            speed: 45,
        },
        catch_rate: None,
        gender_ratio: None,
        sprite: String::new(),
    }
}

#[async_trait]
pub trait SpeciesCatalog: Send + Sync {
    async fn species(&self, pokedex_id: u16) -> CatalogResult<SpeciesRecord>;

    /// All species available to wild searches in a zone. An empty pool is
    /// a valid answer; an `Err` means the provider itself failed.
    async fn zone_pool(&self, zone: u16) -> CatalogResult<Vec<SpeciesRecord>>;
}

/// Fetch a species record, degrading to the fallback on failure. For
/// display-only callers.
pub async fn species_or_fallback(catalog: &dyn SpeciesCatalog, pokedex_id: u16) -> SpeciesRecord {
    match catalog.species(pokedex_id).await {
        Ok(record) => record,
        Err(err) => {
            tracing::warn!(pokedex_id, %err, "catalog failed, using fallback record");
            fallback_record(pokedex_id)
        }
    }
}

/// In-process catalog backed by a RON species table.
pub struct StaticCatalog {
    by_id: HashMap<u16, SpeciesRecord>,
}

impl StaticCatalog {
    /// Parse a catalog from RON text (a `Vec<SpeciesRecord>`).
    pub fn from_ron_str(content: &str) -> CatalogResult<Self> {
        let records: Vec<SpeciesRecord> =
            ron::from_str(content).map_err(|e| CatalogError::Malformed(e.to_string()))?;
        Ok(Self {
            by_id: records.into_iter().map(|r| (r.pokedex_id, r)).collect(),
        })
    }

    /// Load a catalog from a RON file on disk.
    pub fn from_path(path: &Path) -> CatalogResult<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| CatalogError::Malformed(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// The species table compiled into the binary.
    pub fn bundled() -> Self {
        Self::from_ron_str(include_str!("../data/species.ron"))
            .expect("bundled species data must parse")
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[async_trait]
impl SpeciesCatalog for StaticCatalog {
    async fn species(&self, pokedex_id: u16) -> CatalogResult<SpeciesRecord> {
        self.by_id
            .get(&pokedex_id)
            .cloned()
            .ok_or(CatalogError::SpeciesUnavailable(pokedex_id))
    }

    async fn zone_pool(&self, zone: u16) -> CatalogResult<Vec<SpeciesRecord>> {
        Ok(self
            .by_id
            .values()
            .filter(|r| r.generation == zone)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalog_parses() {
        let catalog = StaticCatalog::bundled();
        assert!(!catalog.is_empty());
        // The default dungeon's boss must be present.
        assert!(catalog.by_id.contains_key(&151));
    }

    #[tokio::test]
    async fn unknown_species_is_an_error() {
        let catalog = StaticCatalog::bundled();
        assert_eq!(
            catalog.species(9999).await,
            Err(CatalogError::SpeciesUnavailable(9999))
        );
    }

    #[tokio::test]
    async fn fallback_kicks_in_for_display() {
        let catalog = StaticCatalog::bundled();
        let record = species_or_fallback(&catalog, 9999).await;
        assert_eq!(record.name, "Pokemon 9999");
        assert_eq!(record.types, vec![ElementType::Normal]);
    }

    #[tokio::test]
    async fn zone_pools_are_disjoint_by_generation() {
        let catalog = StaticCatalog::bundled();
        let gen1 = catalog.zone_pool(1).await.unwrap();
        let gen2 = catalog.zone_pool(2).await.unwrap();
        assert!(!gen1.is_empty());
        assert!(gen1.iter().all(|r| r.generation == 1));
        assert!(gen2.iter().all(|r| r.generation == 2));
    }
}
