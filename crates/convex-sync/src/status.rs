//! Monotonic per-cell lifecycle status.

use std::collections::HashMap;
use std::sync::RwLock;

use convex_types::Hash;

/// Lifecycle status of a cell, monotonically non-decreasing.
///
/// Embedded cells have no standalone identity for storage or broadcast, so
/// only non-embedded cells appear in a [`StatusTable`]; a resident cell not
/// yet tracked is `Direct`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CellStatus {
    /// Always inlined in its parent; never tracked independently.
    Embedded,
    /// Resident in memory, not yet written anywhere.
    Direct,
    /// Written to a store cache, durability not yet confirmed.
    Stored,
    /// Durably written to a store, children first.
    Persisted,
    /// Transmitted to the peer; needs no re-send in future deltas.
    Announced,
}

/// Side table mapping cell hashes to their status for one peer.
///
/// Statuses only ever advance. Racing writers may both attempt the same
/// advance; the loser simply observes that the work was already done.
pub struct StatusTable {
    inner: RwLock<HashMap<Hash, CellStatus>>,
}

impl StatusTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// The status recorded for a hash; `Direct` if untracked.
    pub fn status(&self, hash: &Hash) -> CellStatus {
        self.inner
            .read()
            .expect("lock poisoned")
            .get(hash)
            .copied()
            .unwrap_or(CellStatus::Direct)
    }

    /// Advance a hash to `status`. Returns `true` if the status changed;
    /// `false` means it was already at or past the target.
    pub fn advance(&self, hash: Hash, status: CellStatus) -> bool {
        let mut map = self.inner.write().expect("lock poisoned");
        let current = map.entry(hash).or_insert(CellStatus::Direct);
        if *current < status {
            *current = status;
            true
        } else {
            false
        }
    }

    /// Number of tracked hashes.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no hash is tracked.
    pub fn is_empty(&self) -> bool {
        self.inner.read().expect("lock poisoned").is_empty()
    }
}

impl Default for StatusTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untracked_hashes_are_direct() {
        let table = StatusTable::new();
        assert_eq!(table.status(&Hash::compute(b"x")), CellStatus::Direct);
        assert!(table.is_empty());
    }

    #[test]
    fn advance_is_monotonic() {
        let table = StatusTable::new();
        let hash = Hash::compute(b"cell");
        assert!(table.advance(hash, CellStatus::Persisted));
        assert_eq!(table.status(&hash), CellStatus::Persisted);

        // cannot go backwards
        assert!(!table.advance(hash, CellStatus::Stored));
        assert_eq!(table.status(&hash), CellStatus::Persisted);

        // can go forwards
        assert!(table.advance(hash, CellStatus::Announced));
        assert_eq!(table.status(&hash), CellStatus::Announced);
    }

    #[test]
    fn repeated_advance_reports_no_change() {
        let table = StatusTable::new();
        let hash = Hash::compute(b"cell");
        assert!(table.advance(hash, CellStatus::Announced));
        assert!(!table.advance(hash, CellStatus::Announced));
    }

    #[test]
    fn status_ordering() {
        assert!(CellStatus::Embedded < CellStatus::Direct);
        assert!(CellStatus::Direct < CellStatus::Stored);
        assert!(CellStatus::Stored < CellStatus::Persisted);
        assert!(CellStatus::Persisted < CellStatus::Announced);
    }

    #[test]
    fn concurrent_advances_settle_at_maximum() {
        use std::sync::Arc;
        use std::thread;

        let table = Arc::new(StatusTable::new());
        let hash = Hash::compute(b"racy");
        let handles: Vec<_> = [
            CellStatus::Stored,
            CellStatus::Persisted,
            CellStatus::Announced,
            CellStatus::Stored,
        ]
        .into_iter()
        .map(|status| {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                table.advance(hash, status);
            })
        })
        .collect();
        for handle in handles {
            handle.join().expect("thread should not panic");
        }
        assert_eq!(table.status(&hash), CellStatus::Announced);
    }
}
