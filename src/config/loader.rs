//! Configuration Loader
//!
//! One immutable configuration struct constructed at startup and handed to
//! every component. Loaded from a TOML file and validated; every recognized
//! option is enumerated here rather than read ad hoc from the environment.
//!
//! Unit conventions: momentum thresholds (`[scoring]`) are provider-units
//! percents (35.0 = +35% over the window); exit thresholds (`[exit]`) are
//! fractions (0.10 = 10%).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::blacklist::{
    DEFAULT_MAX_CONSECUTIVE_FAILURES, EXEC_FAILURE_COOLDOWN_SECS, PROBE_FAILURE_COOLDOWN_SECS,
};
use crate::domain::entry_gate::RouteMode;
use crate::domain::exit_engine::ExitConfig;
use crate::domain::scorer::ScoreThresholds;
use crate::domain::sizer::SizingConfig;

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub scoring: ScoreThresholds,
    #[serde(default)]
    pub sizing: SizingConfig,
    #[serde(default)]
    pub exit: ExitConfig,
    #[serde(default)]
    pub gate: GateSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Scheduler configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    /// Seconds between ticks
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// Hard cap on concurrently open positions
    #[serde(default = "default_max_open_positions")]
    pub max_open_positions: usize,
    /// Quote asset all sizing and prices are expressed in
    #[serde(default = "default_quote_asset")]
    pub quote_asset: String,
    /// Abort entry/exit if the quote shows higher impact (percent)
    #[serde(default = "default_max_price_impact_pct")]
    pub max_price_impact_pct: f64,
    /// Directory for position/blacklist snapshots
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl SchedulerSection {
    /// Data directory with environment variable override
    /// Checks SURGE_DATA_DIR env var first, falls back to config value
    pub fn get_data_dir(&self) -> PathBuf {
        std::env::var("SURGE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| self.data_dir.clone())
    }
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            max_open_positions: default_max_open_positions(),
            quote_asset: default_quote_asset(),
            max_price_impact_pct: default_max_price_impact_pct(),
            data_dir: default_data_dir(),
        }
    }
}

/// Entry gate configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct GateSection {
    /// Probe size in quote-asset terms, independent of the trade size
    #[serde(default = "default_probe_notional")]
    pub probe_notional: f64,
    /// "strict" rejects any route leg outside the allow-list;
    /// "permissive" only logs unlisted venues
    #[serde(default = "default_route_mode")]
    pub route_mode: RouteMode,
    /// Execution venues routes may use
    #[serde(default = "default_allowed_venues")]
    pub allowed_venues: Vec<String>,
    /// Optional whitelist of candidate ids; absent means all ids allowed
    #[serde(default)]
    pub whitelist: Option<Vec<String>>,
    /// Blacklist cooldown after a failed probe, in seconds
    #[serde(default = "default_probe_cooldown_secs")]
    pub probe_cooldown_secs: u64,
    /// Blacklist cooldown after repeated execution failures, in seconds
    #[serde(default = "default_exec_failure_cooldown_secs")]
    pub exec_failure_cooldown_secs: u64,
    /// Consecutive execution failures before blacklisting
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
}

impl Default for GateSection {
    fn default() -> Self {
        Self {
            probe_notional: default_probe_notional(),
            route_mode: default_route_mode(),
            allowed_venues: default_allowed_venues(),
            whitelist: None,
            probe_cooldown_secs: default_probe_cooldown_secs(),
            exec_failure_cooldown_secs: default_exec_failure_cooldown_secs(),
            max_consecutive_failures: default_max_consecutive_failures(),
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default value functions
fn default_tick_interval_secs() -> u64 {
    30
}
fn default_max_open_positions() -> usize {
    4
}
fn default_quote_asset() -> String {
    "SOL".to_string()
}
fn default_max_price_impact_pct() -> f64 {
    2.0
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_probe_notional() -> f64 {
    0.01
}
fn default_route_mode() -> RouteMode {
    RouteMode::Strict
}
fn default_allowed_venues() -> Vec<String> {
    vec!["Raydium".to_string(), "Orca".to_string(), "Meteora".to_string()]
}
fn default_probe_cooldown_secs() -> u64 {
    PROBE_FAILURE_COOLDOWN_SECS
}
fn default_exec_failure_cooldown_secs() -> u64 {
    EXEC_FAILURE_COOLDOWN_SECS
}
fn default_max_consecutive_failures() -> u32 {
    DEFAULT_MAX_CONSECUTIVE_FAILURES
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.tick_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "tick_interval_secs must be > 0".to_string(),
            ));
        }
        if self.scheduler.max_open_positions == 0 {
            return Err(ConfigError::ValidationError(
                "max_open_positions must be > 0".to_string(),
            ));
        }
        if self.scheduler.max_price_impact_pct <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "max_price_impact_pct must be > 0, got {}",
                self.scheduler.max_price_impact_pct
            )));
        }

        if !self.scoring.entry_threshold_pct.is_finite() {
            return Err(ConfigError::ValidationError(
                "entry_threshold_pct must be finite".to_string(),
            ));
        }
        if self.scoring.min_liquidity_usd < 0.0 || self.scoring.min_volume_usd < 0.0 {
            return Err(ConfigError::ValidationError(
                "scoring thresholds must be >= 0".to_string(),
            ));
        }

        if self.sizing.a_plus_pct <= 0.0 || self.sizing.a_plus_pct > 1.0 {
            return Err(ConfigError::ValidationError(format!(
                "a_plus_pct must be in (0, 1], got {}",
                self.sizing.a_plus_pct
            )));
        }
        if let Some(a_pct) = self.sizing.a_pct {
            if a_pct <= 0.0 || a_pct > 1.0 {
                return Err(ConfigError::ValidationError(format!(
                    "a_pct must be in (0, 1], got {a_pct}"
                )));
            }
        }
        if self.sizing.min_notional < 0.0 {
            return Err(ConfigError::ValidationError(
                "min_notional must be >= 0".to_string(),
            ));
        }

        for (name, value) in [
            ("stop_loss_pct", self.exit.stop_loss_pct),
            ("trailing_trigger_pct", self.exit.trailing_trigger_pct),
            ("trailing_throwback_pct", self.exit.trailing_throwback_pct),
        ] {
            if value <= 0.0 || value > 1.0 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be a fraction in (0, 1], got {value}"
                )));
            }
        }

        if self.gate.probe_notional <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "probe_notional must be > 0, got {}",
                self.gate.probe_notional
            )));
        }
        if self.gate.route_mode == RouteMode::Strict && self.gate.allowed_venues.is_empty() {
            return Err(ConfigError::ValidationError(
                "strict route mode requires a non-empty allowed_venues list".to_string(),
            ));
        }
        if self.gate.max_consecutive_failures == 0 {
            return Err(ConfigError::ValidationError(
                "max_consecutive_failures must be >= 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.scheduler.tick_interval_secs, 30);
        assert_eq!(config.scheduler.max_open_positions, 4);
        assert_eq!(config.gate.route_mode, RouteMode::Strict);
        assert!(config.gate.whitelist.is_none());
    }

    #[test]
    fn test_parse_full_sections() {
        let toml_str = r#"
            [scheduler]
            tick_interval_secs = 15
            max_open_positions = 2
            quote_asset = "USDC"

            [scoring]
            entry_threshold_pct = 20.0
            min_liquidity_usd = 20000.0
            min_volume_usd = 10000.0
            min_pool_age_sec = 7200

            [sizing]
            a_plus_pct = 0.25
            min_notional = 0.05

            [exit]
            stop_loss_pct = 0.10
            trailing_trigger_pct = 0.30
            trailing_throwback_pct = 0.20

            [gate]
            probe_notional = 0.01
            route_mode = "permissive"
            allowed_venues = ["Raydium"]
            whitelist = ["MintA", "MintB"]
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        config.validate().unwrap();
        assert_eq!(config.scheduler.tick_interval_secs, 15);
        assert_eq!(config.scheduler.quote_asset, "USDC");
        assert_eq!(config.gate.route_mode, RouteMode::Permissive);
        assert_eq!(config.gate.whitelist.as_ref().unwrap().len(), 2);
        // a_pct omitted disables A-tier trades
        assert!(config.sizing.a_pct.is_none());
    }

    #[test]
    fn test_rejects_zero_tick_interval() {
        let mut config = Config::default();
        config.scheduler.tick_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_exit_fraction_above_one() {
        let mut config = Config::default();
        // Catches percent-vs-fraction confusion (10 instead of 0.10)
        config.exit.stop_loss_pct = 10.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_strict_mode_without_venues() {
        let mut config = Config::default();
        config.gate.allowed_venues.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_sizing() {
        let mut config = Config::default();
        config.sizing.a_pct = Some(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(matches!(
            load_config("/nonexistent/config.toml"),
            Err(ConfigError::IoError(_))
        ));
    }
}
