//! Candidate
//!
//! Normalized view of one tradable pair at a point in time, as delivered by
//! the market-data feed. Candidates are rebuilt every tick and never mutated
//! after creation.

use serde::{Deserialize, Serialize};

/// One tradable pair observed in a market snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Chain address of the pair's base token (unique key)
    pub id: String,
    /// Token symbol, display only
    pub symbol: String,
    /// Signed price change over the configured window, in percent (35.0 = +35%)
    pub price_change_pct: f64,
    /// Pool liquidity in USD
    pub liquidity_usd: f64,
    /// 24h trading volume in USD
    pub volume_24h_usd: f64,
    /// Pool age in seconds since listing
    pub pool_age_sec: u64,
    /// The paired asset (e.g. "SOL" or "USDC")
    pub quote_symbol: String,
}

impl Candidate {
    /// Basic sanity check on feed data before scoring
    pub fn is_well_formed(&self) -> bool {
        !self.id.is_empty()
            && self.price_change_pct.is_finite()
            && self.liquidity_usd.is_finite()
            && self.liquidity_usd >= 0.0
            && self.volume_24h_usd.is_finite()
            && self.volume_24h_usd >= 0.0
    }
}

/// Order candidates for entry evaluation: strongest momentum first, ties
/// broken by ascending id so a tick is deterministic for identical input.
pub fn rank_for_entry(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.price_change_pct
            .total_cmp(&a.price_change_pct)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, pct: f64) -> Candidate {
        Candidate {
            id: id.to_string(),
            symbol: id.to_uppercase(),
            price_change_pct: pct,
            liquidity_usd: 50_000.0,
            volume_24h_usd: 20_000.0,
            pool_age_sec: 10_000,
            quote_symbol: "SOL".to_string(),
        }
    }

    #[test]
    fn test_well_formed() {
        assert!(candidate("a", 5.0).is_well_formed());

        let mut c = candidate("a", 5.0);
        c.id = String::new();
        assert!(!c.is_well_formed());

        let mut c = candidate("a", 5.0);
        c.price_change_pct = f64::NAN;
        assert!(!c.is_well_formed());

        let mut c = candidate("a", 5.0);
        c.liquidity_usd = -1.0;
        assert!(!c.is_well_formed());
    }

    #[test]
    fn test_rank_descending_momentum() {
        let mut list = vec![candidate("a", 10.0), candidate("b", 30.0), candidate("c", 20.0)];
        rank_for_entry(&mut list);
        let ids: Vec<&str> = list.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_rank_ties_break_by_id() {
        let mut list = vec![candidate("zeta", 25.0), candidate("alpha", 25.0), candidate("mid", 25.0)];
        rank_for_entry(&mut list);
        let ids: Vec<&str> = list.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_rank_is_deterministic() {
        let build = || vec![candidate("x", 12.0), candidate("y", 12.0), candidate("w", 40.0)];
        let mut first = build();
        let mut second = build();
        rank_for_entry(&mut first);
        rank_for_entry(&mut second);
        let ids = |l: &[Candidate]| l.iter().map(|c| c.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
    }
}
