//! State Persistence
//!
//! Snapshot formats for open positions and the blacklist, written after every
//! state mutation so a crash never loses more than the in-flight tick.
//! Writes go to a temp file first and are renamed into place - a failed write
//! leaves the previous snapshot intact, never a partially written file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::position::Position;
use super::scorer::Tier;

/// Position snapshot file name
pub const POSITIONS_FILE: &str = "positions.json";

/// Blacklist snapshot file name
pub const BLACKLIST_FILE: &str = "blacklist.json";

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Failed to serialize snapshot: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Failed to write snapshot: {0}")]
    WriteError(std::io::Error),

    #[error("Failed to read snapshot: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to create data directory: {0}")]
    DirectoryError(std::io::Error),
}

/// Persisted form of one open position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedPosition {
    pub symbol: String,
    pub entry_price: f64,
    pub peak_price: f64,
    pub tier: Tier,
    pub opened_at: u64,
}

impl From<&Position> for PersistedPosition {
    fn from(position: &Position) -> Self {
        Self {
            symbol: position.symbol.clone(),
            entry_price: position.entry_price,
            peak_price: position.peak_price,
            tier: position.tier,
            opened_at: position.opened_at,
        }
    }
}

impl PersistedPosition {
    pub fn to_position(&self, candidate_id: &str) -> Position {
        let mut position = Position::new(
            candidate_id.to_string(),
            self.symbol.clone(),
            self.entry_price,
            self.tier,
            self.opened_at,
        );
        position.observe_peak(self.peak_price);
        position
    }
}

/// Full position-set snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionsSnapshot {
    pub updated_at: u64,
    pub positions: BTreeMap<String, PersistedPosition>,
}

/// Full blacklist snapshot, candidate_id -> expiry (Unix seconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlacklistSnapshot {
    pub updated_at: u64,
    pub blacklist: BTreeMap<String, u64>,
}

/// Write a snapshot atomically: temp file in the same directory, then rename.
fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(PersistError::DirectoryError)?;
    }

    let content = serde_json::to_string_pretty(value)?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, content).map_err(PersistError::WriteError)?;
    fs::rename(&tmp_path, path).map_err(PersistError::WriteError)?;
    Ok(())
}

fn read_snapshot<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, PersistError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(PersistError::ReadError)?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&content)?))
}

/// Locations of the persisted state files under one data directory
#[derive(Debug, Clone)]
pub struct StateFiles {
    data_dir: PathBuf,
}

impl StateFiles {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn positions_path(&self) -> PathBuf {
        self.data_dir.join(POSITIONS_FILE)
    }

    pub fn blacklist_path(&self) -> PathBuf {
        self.data_dir.join(BLACKLIST_FILE)
    }

    pub fn save_positions(&self, snapshot: &PositionsSnapshot) -> Result<(), PersistError> {
        write_atomic(&self.positions_path(), snapshot)
    }

    pub fn load_positions(&self) -> Result<Option<PositionsSnapshot>, PersistError> {
        read_snapshot(&self.positions_path())
    }

    pub fn save_blacklist(&self, snapshot: &BlacklistSnapshot) -> Result<(), PersistError> {
        write_atomic(&self.blacklist_path(), snapshot)
    }

    pub fn load_blacklist(&self) -> Result<Option<BlacklistSnapshot>, PersistError> {
        read_snapshot(&self.blacklist_path())
    }
}
