//! Open positions
//!
//! A position is recorded when an entry succeeds (or is simulated in
//! monitoring mode) and leaves the store when it is sold, abandoned as a rug,
//! or never at all if the process exits first. Entry price is fixed at
//! creation; PnL is always derived from a fresh price.

mod store;

pub use store::PositionStore;

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single open position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Token symbol, unique key in the store
    pub symbol: String,
    /// Price recorded at entry
    pub entry_price: f64,
    /// Amount of the token held, in its smallest unit
    pub amount: U256,
    /// Token decimals (for display)
    pub decimals: u8,
    /// When the position was opened
    pub opened_at: DateTime<Utc>,
    /// Token contract
    pub asset: Address,
    /// Uniswap V2 pair used for pricing and exit
    pub pool: Address,
}

impl Position {
    /// PnL ratio against `current_price`: `(current - entry) / entry`
    ///
    /// Returns `None` when the entry price cannot be divided by.
    pub fn pnl(&self, current_price: f64) -> Option<f64> {
        if !self.entry_price.is_finite() || self.entry_price == 0.0 {
            return None;
        }
        Some((current_price - self.entry_price) / self.entry_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(entry_price: f64) -> Position {
        Position {
            symbol: "MEME".to_string(),
            entry_price,
            amount: U256::from(1u64),
            decimals: 18,
            opened_at: Utc::now(),
            asset: Address::ZERO,
            pool: Address::ZERO,
        }
    }

    #[test]
    fn test_pnl_ratio() {
        let pos = position(0.002);
        let pnl = pos.pnl(2.2).unwrap();
        assert!((pnl - 1099.0).abs() < 1e-9);

        let pnl = pos.pnl(0.00001).unwrap();
        assert!((pnl + 0.995).abs() < 1e-9);
    }

    #[test]
    fn test_pnl_undefined_for_zero_entry() {
        assert!(position(0.0).pnl(1.0).is_none());
        assert!(position(f64::NAN).pnl(1.0).is_none());
    }
}
