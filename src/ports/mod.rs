//! Ports Layer - Trait definitions for external collaborators
//!
//! Following hexagonal architecture, these traits abstract:
//! - Market data feeds (candidate snapshots, per-token prices)
//! - Trade execution (quotes, swaps, balance lookups)
//!
//! The collaborators own retry/backoff for transient network failures; the
//! core only sees definitive results.

pub mod execution;
pub mod market_data;
