//! Configuration Module

pub mod loader;

pub use loader::{load_config, Config, ConfigError};
