//! Exit Engine
//!
//! Per-position stop-loss / trailing take-profit state machine, evaluated on
//! every tick against the latest observed price.
//!
//! States per position:
//! - unarmed: stop-loss live, trailing not yet triggered
//! - armed: unrealized gain (measured at the peak) has crossed the trailing
//!   trigger; stop-loss stays live, retreat from the peak closes the position
//!
//! "Armed" is derived from the peak each tick rather than stored as a flag;
//! since the peak never decreases the derivation behaves as a one-way latch.
//! All percentages here are fractions (0.10 = 10%).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::position::Position;

#[derive(Error, Debug)]
pub enum ExitError {
    #[error("Invalid price {0}: must be positive and finite")]
    InvalidPrice(f64),
}

/// Why a position is being closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseReason {
    StopLoss,
    TrailingTp,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::StopLoss => "stop-loss",
            CloseReason::TrailingTp => "trailing-take-profit",
        }
    }
}

/// Outcome of one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    /// Keep holding; `armed` reports whether the trailing stop is live
    Hold { armed: bool },
    /// Close the position for the given reason
    Close(CloseReason),
}

/// Exit thresholds, all fractions
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExitConfig {
    /// Loss from entry that triggers a stop-loss close (0.10 = -10%)
    pub stop_loss_pct: f64,
    /// Gain from entry that arms the trailing stop (0.30 = +30%)
    pub trailing_trigger_pct: f64,
    /// Retreat from the peak that closes an armed position (0.20 = -20%)
    pub trailing_throwback_pct: f64,
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            stop_loss_pct: 0.10,
            trailing_trigger_pct: 0.30,
            trailing_throwback_pct: 0.20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExitEngine {
    config: ExitConfig,
}

impl ExitEngine {
    pub fn new(config: ExitConfig) -> Self {
        Self { config }
    }

    /// Evaluate one position against the current price.
    ///
    /// The caller refreshes the store's peak with `current` before calling;
    /// the effective peak used here is `max(peak, current)` either way, so
    /// an arming observation counts on the same tick it arrives.
    ///
    /// Stop-loss takes priority over trailing and fires regardless of armed
    /// state. Non-positive or non-finite prices are rejected so a broken
    /// feed can never read as a 100% loss.
    pub fn evaluate(&self, position: &Position, current: f64) -> Result<ExitDecision, ExitError> {
        if !current.is_finite() || current <= 0.0 {
            return Err(ExitError::InvalidPrice(current));
        }

        if position.loss_from_entry(current) >= self.config.stop_loss_pct {
            return Ok(ExitDecision::Close(CloseReason::StopLoss));
        }

        let peak = position.peak_price.max(current);
        let peak_gain = (peak - position.entry_price) / position.entry_price;
        let armed = peak_gain >= self.config.trailing_trigger_pct;

        if armed {
            let drop_from_peak = (peak - current) / peak;
            if drop_from_peak >= self.config.trailing_throwback_pct {
                return Ok(ExitDecision::Close(CloseReason::TrailingTp));
            }
        }

        Ok(ExitDecision::Hold { armed })
    }
}
