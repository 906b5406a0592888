//! Position
//!
//! An open holding created on successful entry. Owned exclusively by the
//! PositionStore; the peak price is refreshed on every price observation and
//! never decreases.

use serde::{Deserialize, Serialize};

use super::scorer::Tier;

/// One open position, prices in quote-asset terms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Chain address of the token (unique key, one open position per id)
    pub candidate_id: String,
    /// Token symbol for display
    pub symbol: String,
    /// Entry price
    pub entry_price: f64,
    /// Highest price observed since entry, never below entry_price
    pub peak_price: f64,
    /// Tier at entry time, retained for audit
    pub tier: Tier,
    /// Entry timestamp (Unix seconds)
    pub opened_at: u64,
}

impl Position {
    pub fn new(candidate_id: String, symbol: String, entry_price: f64, tier: Tier, opened_at: u64) -> Self {
        Self {
            candidate_id,
            symbol,
            entry_price,
            peak_price: entry_price,
            tier,
            opened_at,
        }
    }

    /// Fractional gain vs entry (0.10 = +10%)
    pub fn gain_from_entry(&self, current: f64) -> f64 {
        (current - self.entry_price) / self.entry_price
    }

    /// Fractional loss vs entry (0.10 = -10%)
    pub fn loss_from_entry(&self, current: f64) -> f64 {
        (self.entry_price - current) / self.entry_price
    }

    /// Fractional retreat from the peak (0.20 = -20% off the high)
    pub fn drop_from_peak(&self, current: f64) -> f64 {
        (self.peak_price - current) / self.peak_price
    }

    /// Refresh the peak with a new observation. Returns true if it moved.
    pub fn observe_peak(&mut self, price: f64) -> bool {
        if price.is_finite() && price > self.peak_price {
            self.peak_price = price;
            true
        } else {
            false
        }
    }

    pub fn age_seconds(&self, now: u64) -> u64 {
        now.saturating_sub(self.opened_at)
    }
}
