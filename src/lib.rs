//! Surge - Momentum Sniper Trading Bot Library
//!
//! A momentum-chasing entry strategy with stop-loss / trailing take-profit
//! exits for memecoin pairs, plus honeypot screening and a time-boxed
//! blacklist for tokens that fail screening or execution.
//!
//! # Modules
//!
//! - `domain`: Core decision logic (Scorer, Sizer, EntryGate, ExitEngine, PositionStore)
//! - `ports`: Trait abstractions (MarketDataPort, ExecutionPort)
//! - `adapters`: Implementations (paper trading market/executor, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Scheduler tick loop and control surface

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
