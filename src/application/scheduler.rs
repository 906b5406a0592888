//! Scheduler
//!
//! The tick loop tying the decision core together. One tick runs to
//! completion before the next begins: fetch candidates, score, gate, enter,
//! re-evaluate open positions, persist. All state mutation happens on this
//! single task, so PositionStore, Blacklist and the failure counters need no
//! locks. A halt flag (settable from the command surface) turns ticks into
//! persist-only no-ops; there is no mid-tick cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::Result;

use crate::config::Config;
use crate::domain::blacklist::{Blacklist, FailureTracker};
use crate::domain::candidate::{rank_for_entry, Candidate};
use crate::domain::entry_gate::{Admission, DenyReason, EntryGate, GateConfig, RoutePolicy};
use crate::domain::exit_engine::{CloseReason, ExitDecision, ExitEngine};
use crate::domain::persistence::{PersistError, StateFiles};
use crate::domain::scorer::{Scorer, Tier};
use crate::domain::sizer::Sizer;
use crate::domain::store::PositionStore;
use crate::domain::unix_now;
use crate::ports::execution::ExecutionPort;
use crate::ports::market_data::MarketDataPort;

/// Process-wide trading state, owned exclusively by the scheduler task.
/// Components mutate it only through the contracts on its fields.
#[derive(Debug)]
pub struct TradingState {
    pub store: PositionStore,
    pub blacklist: Blacklist,
    pub failures: FailureTracker,
}

/// Point-in-time status for the command surface
#[derive(Debug, Clone, Default)]
pub struct StatusSnapshot {
    pub open_positions: usize,
    pub blacklist_size: usize,
    pub halted: bool,
    /// Symbols of open positions, for display
    pub symbols: Vec<String>,
}

/// Clone-able control surface for the command channel: halt/resume and a
/// status snapshot refreshed at the end of every tick.
#[derive(Clone, Default)]
pub struct ControlHandle {
    halted: Arc<AtomicBool>,
    status: Arc<RwLock<StatusSnapshot>>,
}

impl ControlHandle {
    pub fn set_halted(&self, halted: bool) {
        self.halted.store(halted, Ordering::SeqCst);
        tracing::info!("trading {}", if halted { "halted" } else { "resumed" });
    }

    pub fn resume(&self) {
        self.set_halted(false);
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> StatusSnapshot {
        self.status.read().unwrap().clone()
    }
}

/// The tick loop orchestrator
pub struct Scheduler {
    tick_interval: Duration,
    quote_asset: String,
    max_price_impact_pct: f64,
    exec_failure_cooldown_secs: u64,
    scorer: Scorer,
    sizer: Sizer,
    gate: EntryGate,
    exit_engine: ExitEngine,
    route_policy: RoutePolicy,
    state: TradingState,
    files: StateFiles,
    market: Arc<dyn MarketDataPort>,
    executor: Arc<dyn ExecutionPort>,
    handle: ControlHandle,
    shutdown: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(
        config: &Config,
        market: Arc<dyn MarketDataPort>,
        executor: Arc<dyn ExecutionPort>,
    ) -> Self {
        let route_policy = RoutePolicy::new(
            config.gate.route_mode,
            config.gate.allowed_venues.iter().cloned(),
        );
        let gate = EntryGate::new(
            GateConfig {
                quote_asset: config.scheduler.quote_asset.clone(),
                probe_notional: config.gate.probe_notional,
                whitelist: config
                    .gate
                    .whitelist
                    .as_ref()
                    .map(|list| list.iter().cloned().collect()),
                probe_cooldown_secs: config.gate.probe_cooldown_secs,
            },
            route_policy.clone(),
        );

        Self {
            tick_interval: Duration::from_secs(config.scheduler.tick_interval_secs),
            quote_asset: config.scheduler.quote_asset.clone(),
            max_price_impact_pct: config.scheduler.max_price_impact_pct,
            exec_failure_cooldown_secs: config.gate.exec_failure_cooldown_secs,
            scorer: Scorer::new(config.scoring.clone()),
            sizer: Sizer::new(config.sizing.clone()),
            gate,
            exit_engine: ExitEngine::new(config.exit.clone()),
            route_policy,
            state: TradingState {
                store: PositionStore::new(config.scheduler.max_open_positions),
                blacklist: Blacklist::new(),
                failures: FailureTracker::new(config.gate.max_consecutive_failures),
            },
            files: StateFiles::new(config.scheduler.get_data_dir()),
            market,
            executor,
            handle: ControlHandle::default(),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Control surface for the command channel
    pub fn handle(&self) -> ControlHandle {
        self.handle.clone()
    }

    /// Flag that stops the run loop after the in-flight tick completes
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    pub fn state(&self) -> &TradingState {
        &self.state
    }

    /// Reload persisted positions and blacklist on startup (crash recovery)
    pub fn recover(&mut self) -> Result<(), PersistError> {
        if let Some(snapshot) = self.files.load_positions()? {
            self.state.store.restore(&snapshot);
            if !self.state.store.is_empty() {
                tracing::info!(
                    "recovered {} open position(s): {}",
                    self.state.store.len(),
                    self.state.store.symbols().join(", ")
                );
            }
        }
        if let Some(snapshot) = self.files.load_blacklist()? {
            self.state.blacklist.restore(&snapshot);
        }
        self.refresh_status();
        Ok(())
    }

    pub async fn run(mut self) -> Result<()> {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!("scheduler started, tick interval {:?}", self.tick_interval);

        loop {
            interval.tick().await;
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }
            self.tick().await;
        }

        self.persist_all(unix_now());
        tracing::info!("scheduler stopped");
        Ok(())
    }

    /// One complete pass: fetch, score, gate, enter, re-evaluate exits,
    /// persist. Public so tests can drive ticks without the timer.
    pub async fn tick(&mut self) {
        let now = unix_now();

        if self.handle.is_halted() {
            tracing::debug!("halted: skipping entries and exits");
            self.persist_all(now);
            self.refresh_status();
            return;
        }

        match self.market.fetch_candidates().await {
            Ok(batch) => {
                let mut candidates: Vec<Candidate> =
                    batch.into_iter().filter(Candidate::is_well_formed).collect();
                rank_for_entry(&mut candidates);
                self.process_entries(&candidates, now).await;
            }
            Err(e) => tracing::warn!("candidate fetch failed, no entries this tick: {e}"),
        }

        self.process_exits(now).await;
        self.persist_all(now);
        self.refresh_status();
    }

    /// Evaluate candidates for entry, strongest momentum first, so the best
    /// candidates win when the open-position cap is the limiting factor.
    async fn process_entries(&mut self, candidates: &[Candidate], now: u64) {
        let mut available = match self.executor.balance_of(&self.quote_asset).await {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!("balance lookup failed, no entries this tick: {e}");
                return;
            }
        };

        for candidate in candidates {
            let tier = self.scorer.classify(candidate);
            if !tier.is_accepted() {
                continue;
            }

            if !self.state.store.can_open_more() {
                tracing::debug!("position cap reached, skipping {}", candidate.symbol);
                continue;
            }

            let notional = self.sizer.order_size(tier, available);
            if notional <= 0.0 {
                tracing::debug!("zero size for {} ({:?}), skipping", candidate.symbol, tier);
                continue;
            }

            let verdict = self
                .gate
                .admit(
                    candidate,
                    &self.state.store,
                    &mut self.state.blacklist,
                    self.executor.as_ref(),
                    now,
                )
                .await;

            match verdict {
                Admission::Deny(reason) => {
                    tracing::debug!("entry denied for {}: {}", candidate.symbol, reason);
                    if matches!(reason, DenyReason::ProbeFailed(_)) {
                        self.persist_blacklist(now);
                    }
                }
                Admission::Allow => {
                    if let Some(spent) = self.try_enter(candidate, tier, notional, now).await {
                        available -= spent;
                    }
                }
            }
        }
    }

    /// Quote, route-check and execute an entry. Returns the spent notional
    /// on success so the per-tick available balance stays honest.
    async fn try_enter(
        &mut self,
        candidate: &Candidate,
        tier: Tier,
        notional: f64,
        now: u64,
    ) -> Option<f64> {
        let quote = match self
            .executor
            .quote(&self.quote_asset, &candidate.id, notional)
            .await
        {
            Ok(quote) => quote,
            Err(e) => {
                tracing::debug!("entry quote failed for {}: {e}", candidate.symbol);
                return None;
            }
        };

        if let Err(violation) = self.route_policy.check(&quote) {
            tracing::debug!("entry route rejected for {}: {violation}", candidate.symbol);
            return None;
        }
        if quote.price_impact_pct > self.max_price_impact_pct {
            tracing::debug!(
                "entry price impact too high for {}: {:.2}%",
                candidate.symbol,
                quote.price_impact_pct
            );
            return None;
        }
        if quote.out_amount <= 0.0 {
            tracing::debug!("entry quote returned zero output for {}", candidate.symbol);
            return None;
        }

        match self.executor.execute(&quote).await {
            Ok(tx) => {
                self.state.failures.record_success(&candidate.id);
                let entry_price = quote.in_amount / quote.out_amount;
                if self
                    .state
                    .store
                    .open(&candidate.id, &candidate.symbol, entry_price, tier, now)
                {
                    tracing::info!(
                        "BUY {} {:?} notional {:.4} {} @ {:.8} ({})",
                        candidate.symbol,
                        tier,
                        quote.in_amount,
                        self.quote_asset,
                        entry_price,
                        tx.signature
                    );
                    self.persist_positions(now);
                    Some(quote.in_amount)
                } else {
                    None
                }
            }
            Err(e) => {
                tracing::warn!("entry execution failed for {}: {e}", candidate.symbol);
                self.record_execution_failure(&candidate.id, now);
                None
            }
        }
    }

    /// Re-evaluate every open position against its latest price
    async fn process_exits(&mut self, now: u64) {
        for id in self.state.store.ids() {
            let price = match self.market.fetch_price(&id).await {
                Ok(price) => price,
                Err(e) => {
                    tracing::debug!("price fetch failed for {id}, skipping this tick: {e}");
                    continue;
                }
            };

            // Peak refresh comes first and happens even on ticks that close
            // the position, using the pre-close price.
            if self.state.store.update_peak(&id, price) {
                self.persist_positions(now);
            }

            let decision = {
                let Some(position) = self.state.store.get(&id) else {
                    continue;
                };
                match self.exit_engine.evaluate(position, price) {
                    Ok(decision) => decision,
                    Err(e) => {
                        tracing::debug!("skipping exit evaluation for {id}: {e}");
                        continue;
                    }
                }
            };

            if let ExitDecision::Close(reason) = decision {
                self.close_position(&id, reason, now).await;
            }
        }
    }

    /// Attempt to liquidate a position. Failure leaves the position in its
    /// prior state for the next tick; success (or an "already empty"
    /// confirmation) removes it from the store.
    async fn close_position(&mut self, candidate_id: &str, reason: CloseReason, now: u64) {
        let holding = match self.executor.balance_of(candidate_id).await {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!("holding lookup failed for {candidate_id}, retrying next tick: {e}");
                return;
            }
        };

        if holding <= 0.0 {
            tracing::warn!(
                "{} already empty, removing position ({})",
                candidate_id,
                reason.as_str()
            );
            self.state.store.close(candidate_id);
            self.state.failures.record_success(candidate_id);
            self.persist_positions(now);
            return;
        }

        let quote = match self
            .executor
            .quote(candidate_id, &self.quote_asset, holding)
            .await
        {
            Ok(quote) => quote,
            Err(e) => {
                tracing::debug!("exit quote failed for {candidate_id}, retrying next tick: {e}");
                return;
            }
        };

        if let Err(violation) = self.route_policy.check(&quote) {
            tracing::debug!("exit route rejected for {candidate_id}: {violation}");
            return;
        }
        if quote.price_impact_pct > self.max_price_impact_pct {
            tracing::debug!(
                "exit price impact too high for {candidate_id}: {:.2}%",
                quote.price_impact_pct
            );
            return;
        }

        match self.executor.execute(&quote).await {
            Ok(tx) => {
                tracing::info!(
                    "SELL {candidate_id} ({}) for {:.4} {} ({})",
                    reason.as_str(),
                    quote.out_amount,
                    self.quote_asset,
                    tx.signature
                );
                self.state.store.close(candidate_id);
                self.state.failures.record_success(candidate_id);
                self.persist_positions(now);
            }
            Err(e) => {
                tracing::warn!("exit execution failed for {candidate_id}: {e}");
                self.record_execution_failure(candidate_id, now);
            }
        }
    }

    fn record_execution_failure(&mut self, candidate_id: &str, now: u64) {
        if self.state.failures.record_failure(candidate_id) {
            self.state
                .blacklist
                .insert(candidate_id, now + self.exec_failure_cooldown_secs);
            self.persist_blacklist(now);
        }
    }

    fn persist_positions(&self, now: u64) {
        if let Err(e) = self.files.save_positions(&self.state.store.snapshot(now)) {
            tracing::error!("position snapshot write failed: {e}");
        }
    }

    fn persist_blacklist(&self, now: u64) {
        if let Err(e) = self.files.save_blacklist(&self.state.blacklist.snapshot(now)) {
            tracing::error!("blacklist snapshot write failed: {e}");
        }
    }

    fn persist_all(&self, now: u64) {
        self.persist_positions(now);
        self.persist_blacklist(now);
    }

    fn refresh_status(&self) {
        let snapshot = StatusSnapshot {
            open_positions: self.state.store.len(),
            blacklist_size: self.state.blacklist.len_active(unix_now()),
            halted: self.handle.is_halted(),
            symbols: self.state.store.symbols(),
        };
        *self.handle.status.write().unwrap() = snapshot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::paper::{PaperExecutor, PaperMarket};
    use tempfile::tempdir;

    fn test_config(data_dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.scheduler.data_dir = data_dir.to_path_buf();
        config
    }

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
    fn test_control_handle_halt_and_resume() {
        let handle = ControlHandle::default();
        assert!(!handle.is_halted());
        handle.set_halted(true);
        assert!(handle.is_halted());
        handle.resume();
        assert!(!handle.is_halted());
    }

    #[tokio::test]
    async fn test_halted_tick_makes_no_entries() {
        let dir = tempdir().unwrap();
        let market = Arc::new(PaperMarket::new());
        market.queue_candidates(vec![candidate("mintx", 35.0)]);
        let executor = Arc::new(PaperExecutor::new("SOL", 10.0));
        executor.set_price("mintx", 0.001);

        let exec = executor.clone();
        let mut scheduler = Scheduler::new(&test_config(dir.path()), market, executor);
        scheduler.handle().set_halted(true);
        scheduler.tick().await;

        assert!(scheduler.state().store.is_empty());
        assert!(exec.quote_calls().is_empty());
        // Persistence still runs on a halted tick
        assert!(dir.path().join("positions.json").exists());
        assert!(scheduler.handle().status().halted);
    }

    #[tokio::test]
    async fn test_tick_opens_position_for_qualifying_candidate() {
        let dir = tempdir().unwrap();
        let market = Arc::new(PaperMarket::new());
        market.queue_candidates(vec![candidate("mintx", 35.0)]);
        let executor = Arc::new(PaperExecutor::new("SOL", 10.0));
        executor.set_price("mintx", 0.001);

        let mut scheduler = Scheduler::new(&test_config(dir.path()), market, executor);
        scheduler.tick().await;

        assert_eq!(scheduler.state().store.len(), 1);
        let position = scheduler.state().store.get("mintx").unwrap();
        assert_eq!(position.tier, Tier::APlus);
        assert!(dir.path().join("positions.json").exists());

        let status = scheduler.handle().status();
        assert_eq!(status.open_positions, 1);
        assert_eq!(status.symbols, vec!["MINTX".to_string()]);
    }
}
