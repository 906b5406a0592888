//! Domain Layer - Core decision logic
//!
//! Candidate scoring, position sizing, the entry gate, the stop-loss /
//! trailing take-profit exit engine, the position store and the time-boxed
//! blacklist. Pure decision code; all I/O happens behind the ports.

pub mod blacklist;
pub mod candidate;
pub mod entry_gate;
pub mod exit_engine;
pub mod persistence;
pub mod position;
pub mod scorer;
pub mod sizer;
pub mod store;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall clock as Unix seconds
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
