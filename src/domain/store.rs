//! Position Store
//!
//! Single source of truth for open positions. Enforces the concurrency cap
//! and the one-position-per-id rule. Invariant violations (opening a
//! duplicate, closing a missing id) are logged and treated as no-ops - they
//! indicate a program bug, not a user-facing error, and must never halt the
//! tick.

use std::collections::HashMap;

use super::persistence::{PersistedPosition, PositionsSnapshot};
use super::position::Position;
use super::scorer::Tier;

/// Open-position set with a hard cap
#[derive(Debug)]
pub struct PositionStore {
    positions: HashMap<String, Position>,
    max_open: usize,
}

impl PositionStore {
    pub fn new(max_open: usize) -> Self {
        Self {
            positions: HashMap::new(),
            max_open,
        }
    }

    /// Whether a new position may be opened without breaching the cap
    pub fn can_open_more(&self) -> bool {
        self.positions.len() < self.max_open
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, candidate_id: &str) -> bool {
        self.positions.contains_key(candidate_id)
    }

    pub fn get(&self, candidate_id: &str) -> Option<&Position> {
        self.positions.get(candidate_id)
    }

    /// Ids of all open positions, sorted for deterministic iteration
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.positions.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Symbols of all open positions, for status display
    pub fn symbols(&self) -> Vec<String> {
        self.ids()
            .iter()
            .filter_map(|id| self.positions.get(id).map(|p| p.symbol.clone()))
            .collect()
    }

    /// Record a successful entry. Returns false (logged, no-op) on a
    /// duplicate id, an invalid entry price, or a breached cap.
    pub fn open(
        &mut self,
        candidate_id: &str,
        symbol: &str,
        entry_price: f64,
        tier: Tier,
        opened_at: u64,
    ) -> bool {
        if self.positions.contains_key(candidate_id) {
            tracing::warn!("open ignored: position already exists for {}", candidate_id);
            return false;
        }
        if !(entry_price.is_finite() && entry_price > 0.0) {
            tracing::warn!("open ignored: invalid entry price {} for {}", entry_price, candidate_id);
            return false;
        }
        if !self.can_open_more() {
            tracing::warn!(
                "open ignored: cap of {} open positions reached ({})",
                self.max_open,
                candidate_id
            );
            return false;
        }

        let position = Position::new(
            candidate_id.to_string(),
            symbol.to_string(),
            entry_price,
            tier,
            opened_at,
        );
        self.positions.insert(candidate_id.to_string(), position);
        true
    }

    /// Refresh the peak with an observed price. Returns true if the peak
    /// moved; no-op when the position no longer exists (closed concurrently
    /// with an in-flight evaluation).
    pub fn update_peak(&mut self, candidate_id: &str, observed_price: f64) -> bool {
        match self.positions.get_mut(candidate_id) {
            Some(position) => position.observe_peak(observed_price),
            None => false,
        }
    }

    /// Remove a position after a successful exit execution (or an explicit
    /// "already empty" confirmation). Logged no-op if the id is unknown.
    pub fn close(&mut self, candidate_id: &str) -> Option<Position> {
        let removed = self.positions.remove(candidate_id);
        if removed.is_none() {
            tracing::warn!("close ignored: no open position for {}", candidate_id);
        }
        removed
    }

    /// Snapshot of the full position set for persistence
    pub fn snapshot(&self, updated_at: u64) -> PositionsSnapshot {
        let positions = self
            .positions
            .values()
            .map(|p| (p.candidate_id.clone(), PersistedPosition::from(p)))
            .collect();
        PositionsSnapshot { updated_at, positions }
    }

    /// Rebuild the store from a persisted snapshot (crash recovery)
    pub fn restore(&mut self, snapshot: &PositionsSnapshot) {
        for (id, persisted) in &snapshot.positions {
            if self.positions.len() >= self.max_open {
                tracing::warn!("restore truncated at cap of {} positions", self.max_open);
                break;
            }
            self.positions.insert(id.clone(), persisted.to_position(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PositionStore {
        PositionStore::new(4)
    }

    #[test]
    fn test_open_and_get() {
        let mut s = store();
        assert!(s.open("X", "TEST", 1.5, Tier::APlus, 1_700_000_000));
        assert_eq!(s.len(), 1);
        let pos = s.get("X").unwrap();
        assert_eq!(pos.entry_price, 1.5);
        assert_eq!(pos.peak_price, 1.5);
        assert_eq!(pos.tier, Tier::APlus);
    }

    #[test]
    fn test_duplicate_open_is_noop() {
        let mut s = store();
        assert!(s.open("X", "TEST", 1.5, Tier::APlus, 0));
        assert!(!s.open("X", "TEST", 2.0, Tier::A, 0));
        assert_eq!(s.get("X").unwrap().entry_price, 1.5);
    }

    #[test]
    fn test_invalid_entry_price_is_noop() {
        let mut s = store();
        assert!(!s.open("X", "TEST", 0.0, Tier::APlus, 0));
        assert!(!s.open("X", "TEST", f64::NAN, Tier::APlus, 0));
        assert!(s.is_empty());
    }

    #[test]
    fn test_cap_enforced() {
        let mut s = PositionStore::new(2);
        assert!(s.open("A", "A", 1.0, Tier::APlus, 0));
        assert!(s.can_open_more());
        assert!(s.open("B", "B", 1.0, Tier::APlus, 0));
        assert!(!s.can_open_more());
        assert!(!s.open("C", "C", 1.0, Tier::APlus, 0));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_update_peak() {
        let mut s = store();
        s.open("X", "TEST", 1.0, Tier::APlus, 0);
        assert!(s.update_peak("X", 1.2));
        assert!(!s.update_peak("X", 1.1));
        assert_eq!(s.get("X").unwrap().peak_price, 1.2);
    }

    #[test]
    fn test_update_peak_missing_is_noop() {
        let mut s = store();
        assert!(!s.update_peak("ghost", 1.2));
    }

    #[test]
    fn test_close() {
        let mut s = store();
        s.open("X", "TEST", 1.0, Tier::APlus, 0);
        let closed = s.close("X").unwrap();
        assert_eq!(closed.candidate_id, "X");
        assert!(s.is_empty());
    }

    #[test]
    fn test_close_missing_is_noop() {
        let mut s = store();
        assert!(s.close("ghost").is_none());
    }

    #[test]
    fn test_ids_sorted() {
        let mut s = store();
        s.open("zeta", "Z", 1.0, Tier::A, 0);
        s.open("alpha", "A", 1.0, Tier::A, 0);
        assert_eq!(s.ids(), vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut s = store();
        s.open("X", "TEST", 1.5, Tier::APlus, 1_700_000_000);
        s.update_peak("X", 2.0);

        let snapshot = s.snapshot(1_700_000_100);
        assert_eq!(snapshot.updated_at, 1_700_000_100);

        let mut restored = PositionStore::new(4);
        restored.restore(&snapshot);
        let pos = restored.get("X").unwrap();
        assert_eq!(pos.entry_price, 1.5);
        assert_eq!(pos.peak_price, 2.0);
        assert_eq!(pos.tier, Tier::APlus);
        assert_eq!(pos.opened_at, 1_700_000_000);
    }
}
