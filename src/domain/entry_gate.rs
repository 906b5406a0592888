//! Entry Gate
//!
//! The single authority deciding whether an accepted-tier candidate may
//! proceed to execution. Checks run in cost order: duplicate position,
//! blacklist, whitelist, then the honeypot probe - a minimal buy-then-sell
//! quote round-trip at a fixed small notional. Probing before committing the
//! full order bounds worst-case exposure on a malicious token to the probe
//! notional, not the position size.

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use crate::ports::execution::{ExecutionPort, Quote};

use super::blacklist::{Blacklist, PROBE_FAILURE_COOLDOWN_SECS};
use super::candidate::Candidate;
use super::store::PositionStore;

/// Route whitelisting behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    /// Every venue label on every leg must be allow-listed
    Strict,
    /// Venue enforcement is skipped (logged only)
    Permissive,
}

/// A route leg through a venue outside the allow-list
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Route uses disallowed venue: {venue}")]
pub struct RouteViolation {
    pub venue: String,
}

/// Venue allow-list predicate shared by the entry probe and exit quotes
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    mode: RouteMode,
    allowed_venues: HashSet<String>,
}

impl RoutePolicy {
    pub fn new(mode: RouteMode, allowed_venues: impl IntoIterator<Item = String>) -> Self {
        Self {
            mode,
            allowed_venues: allowed_venues.into_iter().collect(),
        }
    }

    /// A quote using any non-allow-listed venue fails the check, even if the
    /// quote itself succeeded.
    pub fn check(&self, quote: &Quote) -> Result<(), RouteViolation> {
        for venue in &quote.venues {
            if !self.allowed_venues.contains(venue) {
                match self.mode {
                    RouteMode::Strict => {
                        return Err(RouteViolation { venue: venue.clone() });
                    }
                    RouteMode::Permissive => {
                        tracing::warn!(
                            "permissive route mode: allowing unlisted venue {} for {} -> {}",
                            venue,
                            quote.input_asset,
                            quote.output_asset
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

/// Why a candidate was denied entry
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DenyReason {
    #[error("position already open")]
    PositionOpen,

    #[error("blacklisted until {until}")]
    Blacklisted { until: u64 },

    #[error("not on the whitelist")]
    NotWhitelisted,

    #[error("honeypot probe failed: {0}")]
    ProbeFailed(String),
}

/// Gate verdict
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Allow,
    Deny(DenyReason),
}

/// Entry gate configuration
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Quote-asset symbol used for the probe's buy leg
    pub quote_asset: String,
    /// Fixed probe size in quote-asset terms, independent of the trade size
    pub probe_notional: f64,
    /// Optional whitelist; when configured, only listed ids may enter
    pub whitelist: Option<HashSet<String>>,
    /// Blacklist cooldown after a failed probe
    pub probe_cooldown_secs: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            quote_asset: "SOL".to_string(),
            probe_notional: 0.01,
            whitelist: None,
            probe_cooldown_secs: PROBE_FAILURE_COOLDOWN_SECS,
        }
    }
}

pub struct EntryGate {
    config: GateConfig,
    route_policy: RoutePolicy,
}

impl EntryGate {
    pub fn new(config: GateConfig, route_policy: RoutePolicy) -> Self {
        Self { config, route_policy }
    }

    /// Screen a candidate before any capital is committed. A probe failure
    /// blacklists the id for the probe cooldown in addition to denying.
    pub async fn admit(
        &self,
        candidate: &Candidate,
        store: &PositionStore,
        blacklist: &mut Blacklist,
        executor: &dyn ExecutionPort,
        now: u64,
    ) -> Admission {
        if store.contains(&candidate.id) {
            return Admission::Deny(DenyReason::PositionOpen);
        }

        if blacklist.is_blacklisted(&candidate.id, now) {
            let until = blacklist.expiry_of(&candidate.id).unwrap_or(now);
            return Admission::Deny(DenyReason::Blacklisted { until });
        }

        if let Some(whitelist) = &self.config.whitelist {
            if !whitelist.contains(&candidate.id) {
                return Admission::Deny(DenyReason::NotWhitelisted);
            }
        }

        match self.probe(candidate, executor).await {
            Ok(()) => Admission::Allow,
            Err(reason) => {
                tracing::warn!("probe failed for {} ({}): {}", candidate.symbol, candidate.id, reason);
                blacklist.insert(&candidate.id, now + self.config.probe_cooldown_secs);
                Admission::Deny(DenyReason::ProbeFailed(reason))
            }
        }
    }

    /// Buy-then-sell quote round-trip at the probe notional. Both directions
    /// must quote and both routes must pass the venue check - a token whose
    /// sell side cannot route is a honeypot regardless of how well it buys.
    async fn probe(&self, candidate: &Candidate, executor: &dyn ExecutionPort) -> Result<(), String> {
        let buy = executor
            .quote(&self.config.quote_asset, &candidate.id, self.config.probe_notional)
            .await
            .map_err(|e| format!("buy quote: {e}"))?;
        self.route_policy
            .check(&buy)
            .map_err(|v| format!("buy route: {v}"))?;

        if buy.out_amount <= 0.0 {
            return Err("buy quote returned zero output".to_string());
        }

        let sell = executor
            .quote(&candidate.id, &self.config.quote_asset, buy.out_amount)
            .await
            .map_err(|e| format!("sell quote: {e}"))?;
        self.route_policy
            .check(&sell)
            .map_err(|v| format!("sell route: {v}"))?;

        if sell.out_amount <= 0.0 {
            return Err("sell quote returned zero output".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::paper::PaperExecutor;
    use crate::domain::scorer::Tier;

    fn candidate(id: &str) -> Candidate {
        Candidate {
            id: id.to_string(),
            symbol: id.to_uppercase(),
            price_change_pct: 35.0,
            liquidity_usd: 50_000.0,
            volume_24h_usd: 20_000.0,
            pool_age_sec: 10_000,
            quote_symbol: "SOL".to_string(),
        }
    }

    fn gate() -> EntryGate {
        EntryGate::new(
            GateConfig::default(),
            RoutePolicy::new(RouteMode::Strict, ["Raydium".to_string(), "Orca".to_string()]),
        )
    }

    fn executor() -> PaperExecutor {
        let exec = PaperExecutor::new("SOL", 10.0);
        exec.set_price("mintx", 0.001);
        exec.set_venues("mintx", vec!["Raydium".to_string()]);
        exec
    }

    #[tokio::test]
    async fn test_allows_clean_candidate() {
        let store = PositionStore::new(4);
        let mut blacklist = Blacklist::new();
        let exec = executor();

        let verdict = gate().admit(&candidate("mintx"), &store, &mut blacklist, &exec, 1_000).await;
        assert_eq!(verdict, Admission::Allow);
    }

    #[tokio::test]
    async fn test_denies_duplicate_position() {
        let mut store = PositionStore::new(4);
        store.open("mintx", "MINTX", 1.0, Tier::APlus, 0);
        let mut blacklist = Blacklist::new();
        let exec = executor();

        let verdict = gate().admit(&candidate("mintx"), &store, &mut blacklist, &exec, 1_000).await;
        assert_eq!(verdict, Admission::Deny(DenyReason::PositionOpen));
    }

    #[tokio::test]
    async fn test_denies_blacklisted() {
        let store = PositionStore::new(4);
        let mut blacklist = Blacklist::new();
        blacklist.insert("mintx", 2_000);
        let exec = executor();

        let verdict = gate().admit(&candidate("mintx"), &store, &mut blacklist, &exec, 1_000).await;
        assert_eq!(verdict, Admission::Deny(DenyReason::Blacklisted { until: 2_000 }));
    }

    #[tokio::test]
    async fn test_expired_blacklist_does_not_block() {
        let store = PositionStore::new(4);
        let mut blacklist = Blacklist::new();
        blacklist.insert("mintx", 500);
        let exec = executor();

        let verdict = gate().admit(&candidate("mintx"), &store, &mut blacklist, &exec, 1_000).await;
        assert_eq!(verdict, Admission::Allow);
    }

    #[tokio::test]
    async fn test_whitelist_blocks_unlisted() {
        let store = PositionStore::new(4);
        let mut blacklist = Blacklist::new();
        let exec = executor();

        let config = GateConfig {
            whitelist: Some(["other".to_string()].into_iter().collect()),
            ..GateConfig::default()
        };
        let gate = EntryGate::new(
            config,
            RoutePolicy::new(RouteMode::Strict, ["Raydium".to_string()]),
        );

        let verdict = gate.admit(&candidate("mintx"), &store, &mut blacklist, &exec, 1_000).await;
        assert_eq!(verdict, Admission::Deny(DenyReason::NotWhitelisted));
    }

    #[tokio::test]
    async fn test_probe_failure_blacklists_for_cooldown() {
        let store = PositionStore::new(4);
        let mut blacklist = Blacklist::new();
        let exec = executor();
        exec.fail_sell_quote("mintx");

        let now = 1_000;
        let verdict = gate().admit(&candidate("mintx"), &store, &mut blacklist, &exec, now).await;
        assert!(matches!(verdict, Admission::Deny(DenyReason::ProbeFailed(_))));
        assert!(blacklist.is_blacklisted("mintx", now));
        assert_eq!(blacklist.expiry_of("mintx"), Some(now + PROBE_FAILURE_COOLDOWN_SECS));
    }

    #[tokio::test]
    async fn test_disallowed_sell_venue_fails_probe() {
        // Buy leg routes cleanly, sell leg through an unlisted venue: the
        // quote succeeds but the probe must still fail
        let store = PositionStore::new(4);
        let mut blacklist = Blacklist::new();
        let exec = executor();
        exec.set_sell_venues("mintx", vec!["ShadyDex".to_string()]);

        let now = 1_000;
        let verdict = gate().admit(&candidate("mintx"), &store, &mut blacklist, &exec, now).await;
        match verdict {
            Admission::Deny(DenyReason::ProbeFailed(reason)) => {
                assert!(reason.contains("sell route"), "unexpected reason: {reason}");
                assert!(reason.contains("ShadyDex"), "unexpected reason: {reason}");
            }
            other => panic!("expected probe failure, got {other:?}"),
        }
        assert!(blacklist.is_blacklisted("mintx", now));
    }

    #[tokio::test]
    async fn test_disallowed_buy_venue_fails_probe() {
        let store = PositionStore::new(4);
        let mut blacklist = Blacklist::new();
        let exec = executor();
        exec.set_venues("mintx", vec!["ShadyDex".to_string()]);

        let verdict = gate().admit(&candidate("mintx"), &store, &mut blacklist, &exec, 1_000).await;
        match verdict {
            Admission::Deny(DenyReason::ProbeFailed(reason)) => {
                assert!(reason.contains("buy route"), "unexpected reason: {reason}");
            }
            other => panic!("expected probe failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_permissive_mode_tolerates_unlisted_venue() {
        let store = PositionStore::new(4);
        let mut blacklist = Blacklist::new();
        let exec = executor();
        exec.set_venues("mintx", vec!["ShadyDex".to_string()]);

        let gate = EntryGate::new(
            GateConfig::default(),
            RoutePolicy::new(RouteMode::Permissive, ["Raydium".to_string()]),
        );
        let verdict = gate.admit(&candidate("mintx"), &store, &mut blacklist, &exec, 1_000).await;
        assert_eq!(verdict, Admission::Allow);
    }

    #[test]
    fn test_route_policy_strict() {
        let policy = RoutePolicy::new(RouteMode::Strict, ["Raydium".to_string()]);
        let quote = Quote {
            input_asset: "SOL".to_string(),
            output_asset: "mintx".to_string(),
            in_amount: 0.01,
            out_amount: 10.0,
            price_impact_pct: 0.1,
            venues: vec!["Raydium".to_string(), "ShadyDex".to_string()],
        };
        let violation = policy.check(&quote).unwrap_err();
        assert_eq!(violation.venue, "ShadyDex");
    }
}
