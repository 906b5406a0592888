//! Market data port

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::candidate::Candidate;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Snapshot fetch failed: {0}")]
    FetchFailed(String),

    #[error("No price available for {0}")]
    PriceUnavailable(String),

    #[error("Data parsing error: {0}")]
    ParseError(String),
}

/// Market data port trait
///
/// `fetch_candidates` delivers the per-tick snapshot; no ordering guarantee
/// is assumed from the source. `fetch_price` returns the current price of a
/// token in quote-asset terms, for exit evaluation of open positions.
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    async fn fetch_candidates(&self) -> Result<Vec<Candidate>, MarketDataError>;

    async fn fetch_price(&self, candidate_id: &str) -> Result<f64, MarketDataError>;
}
