//! Application Layer - Scheduler and control surface

pub mod scheduler;

pub use scheduler::{ControlHandle, Scheduler, StatusSnapshot, TradingState};
