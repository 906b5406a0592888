//! Paper Trading Adapters
//!
//! In-memory implementations of the market-data and execution ports: a
//! scriptable market (queued candidate batches and price series for tests,
//! or a seeded random walk for demo runs) and an executor that fills quotes
//! against a simulated balance sheet with configurable failures and route
//! venues. No network calls anywhere.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::candidate::Candidate;
use crate::ports::execution::{ExecutionError, ExecutionPort, Quote, TxResult};
use crate::ports::market_data::{MarketDataError, MarketDataPort};

/// Venue label used when none is configured for a token
const DEFAULT_VENUE: &str = "Raydium";

#[derive(Debug, Default)]
struct MarketInner {
    /// Scripted candidate batches, one per tick; the last batch repeats
    ticks: VecDeque<Vec<Candidate>>,
    last_batch: Vec<Candidate>,
    /// Scripted price series per token; the final price repeats
    price_queues: HashMap<String, VecDeque<f64>>,
    current_prices: HashMap<String, f64>,
    /// Present in demo mode: drives a random walk when scripts run dry
    rng: Option<StdRng>,
}

/// Simulated market data feed
#[derive(Debug, Default)]
pub struct PaperMarket {
    inner: Mutex<MarketInner>,
}

impl PaperMarket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeded demo market: a handful of synthetic pairs whose momentum and
    /// prices drift on every fetch. Deterministic for a given seed.
    pub fn demo(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let pairs = [
            ("WoofMint1111111111111111111111111111111111", "WOOF", 0.0042),
            ("MoonMint2222222222222222222222222222222222", "MOON", 0.0007),
            ("FrogMint3333333333333333333333333333333333", "FROG", 0.0019),
            ("GigaMint4444444444444444444444444444444444", "GIGA", 0.0108),
        ];

        let mut inner = MarketInner::default();
        let mut batch = Vec::new();
        for (id, symbol, price) in pairs {
            batch.push(Candidate {
                id: id.to_string(),
                symbol: symbol.to_string(),
                price_change_pct: rng.gen_range(5.0..45.0),
                liquidity_usd: rng.gen_range(15_000.0..80_000.0),
                volume_24h_usd: rng.gen_range(8_000.0..40_000.0),
                pool_age_sec: rng.gen_range(3_600..86_400),
                quote_symbol: "SOL".to_string(),
            });
            inner.current_prices.insert(id.to_string(), price);
        }
        inner.last_batch = batch;
        inner.rng = Some(rng);

        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Queue one tick's candidate batch
    pub fn queue_candidates(&self, batch: Vec<Candidate>) {
        self.inner.lock().unwrap().ticks.push_back(batch);
    }

    /// Queue a price series for a token; the last value repeats once drained
    pub fn queue_prices(&self, candidate_id: &str, prices: &[f64]) {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        let queue = inner
            .price_queues
            .entry(candidate_id.to_string())
            .or_default();
        queue.extend(prices.iter().copied());
        if let Some(first) = prices.first() {
            inner
                .current_prices
                .entry(candidate_id.to_string())
                .or_insert(*first);
        }
    }

    /// Most recently observed price, used by a linked PaperExecutor to fill
    pub fn last_price(&self, candidate_id: &str) -> Option<f64> {
        self.inner.lock().unwrap().current_prices.get(candidate_id).copied()
    }
}

#[async_trait]
impl MarketDataPort for PaperMarket {
    async fn fetch_candidates(&self) -> Result<Vec<Candidate>, MarketDataError> {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        if let Some(batch) = inner.ticks.pop_front() {
            inner.last_batch = batch.clone();
            return Ok(batch);
        }

        if let Some(rng) = inner.rng.as_mut() {
            let mut drifted = inner.last_batch.clone();
            for candidate in &mut drifted {
                candidate.price_change_pct += rng.gen_range(-12.0..12.0);
            }
            inner.last_batch = drifted.clone();
            return Ok(drifted);
        }

        Ok(inner.last_batch.clone())
    }

    async fn fetch_price(&self, candidate_id: &str) -> Result<f64, MarketDataError> {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;

        if let Some(queue) = inner.price_queues.get_mut(candidate_id) {
            let price = if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else if let Some(last) = queue.front() {
                *last
            } else {
                return Err(MarketDataError::PriceUnavailable(candidate_id.to_string()));
            };
            inner.current_prices.insert(candidate_id.to_string(), price);
            return Ok(price);
        }

        if inner.rng.is_some() {
            if let Some(current) = inner.current_prices.get(candidate_id).copied() {
                let step = inner.rng.as_mut().unwrap().gen_range(-0.08..0.10);
                let next = current * (1.0 + step);
                inner.current_prices.insert(candidate_id.to_string(), next);
                return Ok(next);
            }
        }

        Err(MarketDataError::PriceUnavailable(candidate_id.to_string()))
    }
}

#[derive(Debug, Default)]
struct ExecInner {
    balances: HashMap<String, f64>,
    prices: HashMap<String, f64>,
    venues: HashMap<String, Vec<String>>,
    sell_venues: HashMap<String, Vec<String>>,
    fail_buy_quotes: HashSet<String>,
    fail_sell_quotes: HashSet<String>,
    fail_execute: HashSet<String>,
    executed: Vec<Quote>,
    quote_calls: Vec<(String, String, f64)>,
    price_impact_pct: f64,
    seq: u64,
}

/// Simulated executor: fills against its own balance sheet at configured
/// prices, records every call for assertions, and injects failures on demand.
pub struct PaperExecutor {
    quote_asset: String,
    market: Option<Arc<PaperMarket>>,
    inner: Mutex<ExecInner>,
}

impl PaperExecutor {
    pub fn new(quote_asset: &str, initial_balance: f64) -> Self {
        let mut inner = ExecInner {
            price_impact_pct: 0.1,
            ..ExecInner::default()
        };
        inner.balances.insert(quote_asset.to_string(), initial_balance);
        Self {
            quote_asset: quote_asset.to_string(),
            market: None,
            inner: Mutex::new(inner),
        }
    }

    /// Fill quotes at the linked market's latest observed prices
    pub fn with_market(mut self, market: Arc<PaperMarket>) -> Self {
        self.market = Some(market);
        self
    }

    pub fn set_price(&self, token: &str, price: f64) {
        self.inner.lock().unwrap().prices.insert(token.to_string(), price);
    }

    pub fn set_venues(&self, token: &str, venues: Vec<String>) {
        self.inner.lock().unwrap().venues.insert(token.to_string(), venues);
    }

    /// Override the route venues for the sell direction only, so a token can
    /// buy through a clean route but sell through a flagged one
    pub fn set_sell_venues(&self, token: &str, venues: Vec<String>) {
        self.inner.lock().unwrap().sell_venues.insert(token.to_string(), venues);
    }

    pub fn set_balance(&self, asset: &str, amount: f64) {
        self.inner.lock().unwrap().balances.insert(asset.to_string(), amount);
    }

    pub fn set_price_impact(&self, pct: f64) {
        self.inner.lock().unwrap().price_impact_pct = pct;
    }

    pub fn fail_buy_quote(&self, token: &str) {
        self.inner.lock().unwrap().fail_buy_quotes.insert(token.to_string());
    }

    pub fn fail_sell_quote(&self, token: &str) {
        self.inner.lock().unwrap().fail_sell_quotes.insert(token.to_string());
    }

    pub fn fail_execute(&self, token: &str) {
        self.inner.lock().unwrap().fail_execute.insert(token.to_string());
    }

    pub fn clear_fail_execute(&self, token: &str) {
        self.inner.lock().unwrap().fail_execute.remove(token);
    }

    /// All executed swaps, in order
    pub fn executed(&self) -> Vec<Quote> {
        self.inner.lock().unwrap().executed.clone()
    }

    /// All quote requests, in order: (input, output, amount)
    pub fn quote_calls(&self) -> Vec<(String, String, f64)> {
        self.inner.lock().unwrap().quote_calls.clone()
    }

    fn price_of(&self, inner: &ExecInner, token: &str) -> Option<f64> {
        inner
            .prices
            .get(token)
            .copied()
            .or_else(|| self.market.as_ref().and_then(|m| m.last_price(token)))
    }
}

#[async_trait]
impl ExecutionPort for PaperExecutor {
    async fn balance_of(&self, asset: &str) -> Result<f64, ExecutionError> {
        Ok(self.inner.lock().unwrap().balances.get(asset).copied().unwrap_or(0.0))
    }

    async fn quote(
        &self,
        input_asset: &str,
        output_asset: &str,
        amount: f64,
    ) -> Result<Quote, ExecutionError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .quote_calls
            .push((input_asset.to_string(), output_asset.to_string(), amount));

        if amount <= 0.0 || !amount.is_finite() {
            return Err(ExecutionError::QuoteFailed(format!("invalid amount {amount}")));
        }

        let (token, out_amount, selling) = if input_asset == self.quote_asset {
            if inner.fail_buy_quotes.contains(output_asset) {
                return Err(ExecutionError::QuoteFailed(format!("no route to {output_asset}")));
            }
            let price = self
                .price_of(&inner, output_asset)
                .ok_or_else(|| ExecutionError::QuoteFailed(format!("no pool for {output_asset}")))?;
            (output_asset, amount / price, false)
        } else if output_asset == self.quote_asset {
            if inner.fail_sell_quotes.contains(input_asset) {
                return Err(ExecutionError::QuoteFailed(format!("no route from {input_asset}")));
            }
            let price = self
                .price_of(&inner, input_asset)
                .ok_or_else(|| ExecutionError::QuoteFailed(format!("no pool for {input_asset}")))?;
            (input_asset, amount * price, true)
        } else {
            return Err(ExecutionError::QuoteFailed(format!(
                "unsupported pair {input_asset}/{output_asset}"
            )));
        };

        let venues = if selling {
            inner.sell_venues.get(token).cloned()
        } else {
            None
        }
        .or_else(|| inner.venues.get(token).cloned())
        .unwrap_or_else(|| vec![DEFAULT_VENUE.to_string()]);

        Ok(Quote {
            input_asset: input_asset.to_string(),
            output_asset: output_asset.to_string(),
            in_amount: amount,
            out_amount,
            price_impact_pct: inner.price_impact_pct,
            venues,
        })
    }

    async fn execute(&self, quote: &Quote) -> Result<TxResult, ExecutionError> {
        let mut inner = self.inner.lock().unwrap();

        let token = if quote.input_asset == self.quote_asset {
            &quote.output_asset
        } else {
            &quote.input_asset
        };
        if inner.fail_execute.contains(token) {
            return Err(ExecutionError::ExecutionFailed(format!(
                "transaction rejected for {token}"
            )));
        }

        let input_balance = inner.balances.get(&quote.input_asset).copied().unwrap_or(0.0);
        if input_balance < quote.in_amount {
            return Err(ExecutionError::ExecutionFailed(format!(
                "insufficient {} balance: have {input_balance}, need {}",
                quote.input_asset, quote.in_amount
            )));
        }

        *inner.balances.entry(quote.input_asset.clone()).or_insert(0.0) -= quote.in_amount;
        *inner.balances.entry(quote.output_asset.clone()).or_insert(0.0) += quote.out_amount;

        inner.seq += 1;
        let signature = format!("paper-tx-{}", inner.seq);
        inner.executed.push(quote.clone());
        tracing::debug!(
            "paper fill: {} {} -> {} {} ({})",
            quote.in_amount,
            quote.input_asset,
            quote.out_amount,
            quote.output_asset,
            signature
        );

        Ok(TxResult { signature })
    }
}
