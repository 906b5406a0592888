//! Candidate Scorer
//!
//! Classifies a Candidate into a discrete quality tier from momentum,
//! liquidity, volume and pool age. Classification is a pure function of the
//! candidate and the configured thresholds - no hidden state, so identical
//! input always yields the identical tier.

use serde::{Deserialize, Serialize};

use super::candidate::Candidate;

/// A-tier accepts pools with 90% of the hard liquidity floor
pub const A_TIER_LIQUIDITY_FACTOR: f64 = 0.9;

/// A-tier accepts pools half as old as the hard age floor
pub const A_TIER_AGE_FACTOR: f64 = 0.5;

/// Discrete candidate quality classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    APlus,
    A,
    Rejected,
}

impl Tier {
    /// Whether this tier qualifies for an entry attempt
    pub fn is_accepted(&self) -> bool {
        matches!(self, Tier::APlus | Tier::A)
    }
}

/// Hard thresholds for tier classification
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoreThresholds {
    /// Minimum price change over the window, in percent (momentum gate)
    pub entry_threshold_pct: f64,
    /// Minimum pool liquidity in USD
    pub min_liquidity_usd: f64,
    /// Minimum 24h volume in USD
    pub min_volume_usd: f64,
    /// Minimum pool age in seconds
    pub min_pool_age_sec: u64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            entry_threshold_pct: 20.0,
            min_liquidity_usd: 20_000.0,
            min_volume_usd: 10_000.0,
            min_pool_age_sec: 7_200,
        }
    }
}

/// Tier classifier
#[derive(Debug, Clone)]
pub struct Scorer {
    thresholds: ScoreThresholds,
}

impl Scorer {
    pub fn new(thresholds: ScoreThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ScoreThresholds {
        &self.thresholds
    }

    /// Classify a candidate. The momentum gate is mandatory and evaluated
    /// first; it is the cheapest check and short-circuits the rest.
    pub fn classify(&self, candidate: &Candidate) -> Tier {
        let t = &self.thresholds;

        if candidate.price_change_pct < t.entry_threshold_pct {
            return Tier::Rejected;
        }

        let age = candidate.pool_age_sec as f64;
        if candidate.liquidity_usd >= t.min_liquidity_usd
            && candidate.volume_24h_usd >= t.min_volume_usd
            && age >= t.min_pool_age_sec as f64
        {
            return Tier::APlus;
        }

        if candidate.liquidity_usd >= t.min_liquidity_usd * A_TIER_LIQUIDITY_FACTOR
            && candidate.volume_24h_usd >= t.min_volume_usd
            && age >= t.min_pool_age_sec as f64 * A_TIER_AGE_FACTOR
        {
            return Tier::A;
        }

        Tier::Rejected
    }
}
