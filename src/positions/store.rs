//! In-memory position table with optional JSON persistence
//!
//! The store is owned by the agent and only ever touched from its single
//! dispatch task, so it needs no interior locking.

use super::Position;
use crate::{Error, Result};
use alloy::primitives::Address;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Default, Clone)]
pub struct PositionStore {
    positions: HashMap<String, Position>,
}

impl PositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a position, replacing any open position with the same symbol
    ///
    /// Returns the replaced position, if there was one.
    pub fn insert(&mut self, position: Position) -> Option<Position> {
        let symbol = position.symbol.clone();
        let previous = self.positions.insert(symbol.clone(), position);
        if let Some(prev) = &previous {
            warn!(
                symbol = %symbol,
                previous_asset = %prev.asset,
                "Re-entry replaced an open position with the same symbol"
            );
        }
        previous
    }

    pub fn remove(&mut self, symbol: &str) -> Option<Position> {
        self.positions.remove(symbol)
    }

    pub fn get(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Snapshot of `(symbol, pool)` pairs, in a stable order for one pass
    pub fn pools(&self) -> Vec<(String, Address)> {
        self.positions
            .values()
            .map(|p| (p.symbol.clone(), p.pool))
            .collect()
    }

    /// Load positions from disk, or start empty if the file doesn't exist
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::new());
        }

        let data = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;
        let positions: HashMap<String, Position> =
            serde_json::from_str(&data).map_err(|e| Error::Persistence(e.to_string()))?;

        info!("Loaded {} positions from {}", positions.len(), path);
        Ok(Self { positions })
    }

    /// Save positions to disk
    pub async fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(&self.positions)
            .map_err(|e| Error::Persistence(e.to_string()))?;

        tokio::fs::write(path, data)
            .await
            .map_err(|e| Error::Persistence(e.to_string()))?;

        debug!("Saved {} positions to {}", self.positions.len(), path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;
    use chrono::Utc;

    fn position(symbol: &str, asset: u8) -> Position {
        Position {
            symbol: symbol.to_string(),
            entry_price: 0.002,
            amount: U256::from(1_000u64),
            decimals: 18,
            opened_at: Utc::now(),
            asset: Address::with_last_byte(asset),
            pool: Address::with_last_byte(asset + 100),
        }
    }

    #[test]
    fn test_insert_and_remove() {
        let mut store = PositionStore::new();
        assert!(store.is_empty());

        assert!(store.insert(position("PEPE", 1)).is_none());
        assert!(store.contains("PEPE"));
        assert_eq!(store.len(), 1);

        let removed = store.remove("PEPE").unwrap();
        assert_eq!(removed.asset, Address::with_last_byte(1));
        assert!(store.remove("PEPE").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_reentry_is_last_write_wins() {
        let mut store = PositionStore::new();
        store.insert(position("DOGE", 1));
        let replaced = store.insert(position("DOGE", 2)).unwrap();

        assert_eq!(replaced.asset, Address::with_last_byte(1));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("DOGE").unwrap().asset, Address::with_last_byte(2));
    }

    #[test]
    fn test_pools_snapshot() {
        let mut store = PositionStore::new();
        store.insert(position("A", 1));
        store.insert(position("B", 2));

        let mut pools = store.pools();
        pools.sort();
        assert_eq!(
            pools,
            vec![
                ("A".to_string(), Address::with_last_byte(101)),
                ("B".to_string(), Address::with_last_byte(102)),
            ]
        );
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("positions.json");
        let path = path.to_str().unwrap();

        let empty = PositionStore::load_or_default(path).await.unwrap();
        assert!(empty.is_empty());

        let mut store = PositionStore::new();
        store.insert(position("WOJAK", 7));
        store.save(path).await.unwrap();

        let loaded = PositionStore::load_or_default(path).await.unwrap();
        assert_eq!(loaded.get("WOJAK"), store.get("WOJAK"));
    }
}
