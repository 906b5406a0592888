//! Execution port

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Quote failed: {0}")]
    QuoteFailed(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Balance lookup failed: {0}")]
    BalanceUnavailable(String),
}

/// A swap quote, amounts in the assets' own terms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub input_asset: String,
    pub output_asset: String,
    pub in_amount: f64,
    /// Estimated output amount
    pub out_amount: f64,
    /// Estimated price impact in percent
    pub price_impact_pct: f64,
    /// Venue labels used by the route, checked against the allow-list
    pub venues: Vec<String>,
}

/// Result of an executed swap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxResult {
    pub signature: String,
}

/// Execution port trait
///
/// Transaction construction, signing and submission live behind this trait;
/// the core never sees raw transactions. `balance_of` answers both sides:
/// the quote-asset balance for sizing and a token balance for exits (a zero
/// token balance is the "already empty, nothing to sell" confirmation).
#[async_trait]
pub trait ExecutionPort: Send + Sync {
    async fn balance_of(&self, asset: &str) -> Result<f64, ExecutionError>;

    async fn quote(
        &self,
        input_asset: &str,
        output_asset: &str,
        amount: f64,
    ) -> Result<Quote, ExecutionError>;

    async fn execute(&self, quote: &Quote) -> Result<TxResult, ExecutionError>;
}
