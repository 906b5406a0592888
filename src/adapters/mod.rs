//! Adapters Layer - Concrete implementations
//!
//! Paper trading adapters for the market-data and execution ports, plus the
//! CLI definition. Live adapters (HTTP market feeds, on-chain execution) are
//! external collaborators and plug in behind the same ports.

pub mod cli;
pub mod paper;
