//! Blacklist & Failure Tracking
//!
//! Time-boxed blacklist for tokens that fail the honeypot probe or fail
//! execution repeatedly. Entries expire lazily - expiry is checked at lookup
//! time, no background eviction. The failure tracker counts consecutive
//! execution failures per token and signals when the threshold is crossed so
//! the caller can convert the streak into a blacklist entry.

use std::collections::HashMap;

use super::persistence::BlacklistSnapshot;

/// Cooldown after a failed honeypot probe
pub const PROBE_FAILURE_COOLDOWN_SECS: u64 = 24 * 3600;

/// Cooldown after repeated execution failures
pub const EXEC_FAILURE_COOLDOWN_SECS: u64 = 6 * 3600;

/// Consecutive execution failures before blacklisting
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// candidate_id -> expiry timestamp (Unix seconds)
#[derive(Debug, Default)]
pub struct Blacklist {
    entries: HashMap<String, u64>,
}

impl Blacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// A candidate is blacklisted iff now < expiry
    pub fn is_blacklisted(&self, candidate_id: &str, now: u64) -> bool {
        self.entries
            .get(candidate_id)
            .is_some_and(|expiry| now < *expiry)
    }

    /// Expiry timestamp for an id, if an entry exists (possibly stale)
    pub fn expiry_of(&self, candidate_id: &str) -> Option<u64> {
        self.entries.get(candidate_id).copied()
    }

    /// Insert or extend an entry. A later expiry always wins so a fresh
    /// probe failure cannot be shortened by an older execution-failure entry.
    pub fn insert(&mut self, candidate_id: &str, expiry: u64) {
        let slot = self.entries.entry(candidate_id.to_string()).or_insert(0);
        if expiry > *slot {
            *slot = expiry;
        }
        tracing::info!("blacklisted {} until {}", candidate_id, expiry);
    }

    /// Number of entries still in cooldown
    pub fn len_active(&self, now: u64) -> usize {
        self.entries.values().filter(|expiry| now < **expiry).count()
    }

    pub fn snapshot(&self, updated_at: u64) -> BlacklistSnapshot {
        BlacklistSnapshot {
            updated_at,
            blacklist: self.entries.iter().map(|(k, v)| (k.clone(), *v)).collect(),
        }
    }

    pub fn restore(&mut self, snapshot: &BlacklistSnapshot) {
        for (id, expiry) in &snapshot.blacklist {
            self.entries.insert(id.clone(), *expiry);
        }
    }
}

/// candidate_id -> consecutive execution failures
#[derive(Debug)]
pub struct FailureTracker {
    counts: HashMap<String, u32>,
    threshold: u32,
}

impl FailureTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            counts: HashMap::new(),
            threshold: threshold.max(1),
        }
    }

    /// Record one execution failure. Returns true when the streak reaches
    /// the threshold; the streak is reset so the next failure starts a new
    /// count after the blacklist cooldown lapses.
    pub fn record_failure(&mut self, candidate_id: &str) -> bool {
        let count = self.counts.entry(candidate_id.to_string()).or_insert(0);
        *count += 1;
        tracing::debug!("execution failure {}/{} for {}", count, self.threshold, candidate_id);
        if *count >= self.threshold {
            self.counts.remove(candidate_id);
            true
        } else {
            false
        }
    }

    /// Any successful execution resets the streak
    pub fn record_success(&mut self, candidate_id: &str) {
        self.counts.remove(candidate_id);
    }

    pub fn count(&self, candidate_id: &str) -> u32 {
        self.counts.get(candidate_id).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blacklist_active_until_expiry() {
        let mut bl = Blacklist::new();
        bl.insert("X", 1_000);
        assert!(bl.is_blacklisted("X", 999));
        assert!(!bl.is_blacklisted("X", 1_000));
        assert!(!bl.is_blacklisted("X", 1_001));
    }

    #[test]
    fn test_unknown_id_not_blacklisted() {
        let bl = Blacklist::new();
        assert!(!bl.is_blacklisted("ghost", 0));
    }

    #[test]
    fn test_later_expiry_wins() {
        let mut bl = Blacklist::new();
        bl.insert("X", 2_000);
        bl.insert("X", 1_000);
        assert_eq!(bl.expiry_of("X"), Some(2_000));
    }

    #[test]
    fn test_len_active_ignores_expired() {
        let mut bl = Blacklist::new();
        bl.insert("X", 1_000);
        bl.insert("Y", 5_000);
        assert_eq!(bl.len_active(2_000), 1);
        assert_eq!(bl.len_active(6_000), 0);
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut bl = Blacklist::new();
        bl.insert("X", 1_000);
        bl.insert("Y", 5_000);

        let snapshot = bl.snapshot(500);
        let mut restored = Blacklist::new();
        restored.restore(&snapshot);
        assert_eq!(restored.expiry_of("X"), Some(1_000));
        assert_eq!(restored.expiry_of("Y"), Some(5_000));
    }

    #[test]
    fn test_failure_threshold_crossing() {
        let mut tracker = FailureTracker::new(3);
        assert!(!tracker.record_failure("X"));
        assert!(!tracker.record_failure("X"));
        assert!(tracker.record_failure("X"));
        // Streak resets after crossing
        assert_eq!(tracker.count("X"), 0);
    }

    #[test]
    fn test_success_resets_streak() {
        let mut tracker = FailureTracker::new(3);
        tracker.record_failure("X");
        tracker.record_failure("X");
        tracker.record_success("X");
        assert_eq!(tracker.count("X"), 0);
        assert!(!tracker.record_failure("X"));
    }

    #[test]
    fn test_streaks_are_per_id() {
        let mut tracker = FailureTracker::new(2);
        assert!(!tracker.record_failure("X"));
        assert!(!tracker.record_failure("Y"));
        assert!(tracker.record_failure("X"));
        assert_eq!(tracker.count("Y"), 1);
    }
}
