//! Position Sizer
//!
//! Converts a tier and the available quote-asset balance into an order
//! notional. Returns 0.0 to mean "do not enter".

use serde::{Deserialize, Serialize};

use super::scorer::Tier;

/// Never commit the full balance - headroom for network fees and rounding
pub const MAX_BALANCE_FRACTION: f64 = 0.99;

/// Sizing configuration, fractions of available capital per tier
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SizingConfig {
    /// Fraction of available capital for A_PLUS entries
    pub a_plus_pct: f64,
    /// Fraction for A entries; absent disables A-tier trades entirely
    #[serde(default)]
    pub a_pct: Option<f64>,
    /// Floor on the order notional, in quote-asset terms
    pub min_notional: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            a_plus_pct: 0.25,
            a_pct: Some(0.10),
            min_notional: 0.05,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sizer {
    config: SizingConfig,
}

impl Sizer {
    pub fn new(config: SizingConfig) -> Self {
        Self { config }
    }

    /// Order notional for a tier given the available quote-asset balance.
    /// `max(available * tier_pct, min_notional)` capped at 99% of balance.
    pub fn order_size(&self, tier: Tier, available_capital: f64) -> f64 {
        if available_capital <= 0.0 || !available_capital.is_finite() {
            return 0.0;
        }

        let pct = match tier {
            Tier::APlus => Some(self.config.a_plus_pct),
            Tier::A => self.config.a_pct,
            Tier::Rejected => None,
        };

        let Some(pct) = pct else {
            return 0.0;
        };

        (available_capital * pct)
            .max(self.config.min_notional)
            .min(available_capital * MAX_BALANCE_FRACTION)
    }
}
