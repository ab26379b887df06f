use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use convex_types::Hash;

use crate::error::{StoreError, StoreResult};
use crate::traits::CellStore;

/// In-memory, HashMap-based cell store.
///
/// Intended for tests and embedding. All encodings are held in memory behind
/// a `RwLock`; reads clone cheap `Bytes` handles rather than the data.
pub struct InMemoryCellStore {
    cells: RwLock<HashMap<Hash, Bytes>>,
    root: RwLock<Option<Hash>>,
}

impl InMemoryCellStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            cells: RwLock::new(HashMap::new()),
            root: RwLock::new(None),
        }
    }

    /// Number of encodings currently stored.
    pub fn len(&self) -> usize {
        self.cells.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.cells.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored encodings.
    pub fn total_bytes(&self) -> u64 {
        self.cells
            .read()
            .expect("lock poisoned")
            .values()
            .map(|encoding| encoding.len() as u64)
            .sum()
    }

    /// Remove all encodings and clear the root hash.
    pub fn clear(&self) {
        self.cells.write().expect("lock poisoned").clear();
        *self.root.write().expect("lock poisoned") = None;
    }

    /// Return a sorted list of all stored hashes.
    pub fn all_hashes(&self) -> Vec<Hash> {
        let map = self.cells.read().expect("lock poisoned");
        let mut hashes: Vec<Hash> = map.keys().copied().collect();
        hashes.sort();
        hashes
    }
}

impl Default for InMemoryCellStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CellStore for InMemoryCellStore {
    fn get(&self, hash: &Hash) -> StoreResult<Option<Bytes>> {
        let map = self.cells.read().expect("lock poisoned");
        Ok(map.get(hash).cloned())
    }

    fn put(&self, hash: &Hash, encoding: Bytes) -> StoreResult<()> {
        if hash.is_null() {
            return Err(StoreError::NullHash);
        }
        let computed = Hash::compute(&encoding);
        if computed != *hash {
            return Err(StoreError::HashMismatch {
                key: *hash,
                computed,
            });
        }
        let mut map = self.cells.write().expect("lock poisoned");
        // Idempotent: content addressing guarantees an existing entry holds
        // the same bytes.
        map.entry(*hash).or_insert(encoding);
        Ok(())
    }

    fn contains(&self, hash: &Hash) -> StoreResult<bool> {
        let map = self.cells.read().expect("lock poisoned");
        Ok(map.contains_key(hash))
    }

    fn root_hash(&self) -> StoreResult<Option<Hash>> {
        Ok(*self.root.read().expect("lock poisoned"))
    }

    fn set_root_hash(&self, hash: Hash) -> StoreResult<()> {
        *self.root.write().expect("lock poisoned") = Some(hash);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryCellStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCellStore")
            .field("cell_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoding(data: &[u8]) -> (Hash, Bytes) {
        (Hash::compute(data), Bytes::copy_from_slice(data))
    }

    // -----------------------------------------------------------------------
    // Core operations
    // -----------------------------------------------------------------------

    #[test]
    fn put_and_get() {
        let store = InMemoryCellStore::new();
        let (hash, bytes) = encoding(b"hello world");
        store.put(&hash, bytes.clone()).unwrap();
        assert_eq!(store.get(&hash).unwrap(), Some(bytes));
    }

    #[test]
    fn get_missing_returns_none() {
        let store = InMemoryCellStore::new();
        assert_eq!(store.get(&Hash::compute(b"missing")).unwrap(), None);
    }

    #[test]
    fn contains_tracks_puts() {
        let store = InMemoryCellStore::new();
        let (hash, bytes) = encoding(b"present");
        assert!(!store.contains(&hash).unwrap());
        store.put(&hash, bytes).unwrap();
        assert!(store.contains(&hash).unwrap());
    }

    #[test]
    fn put_is_idempotent() {
        let store = InMemoryCellStore::new();
        let (hash, bytes) = encoding(b"idempotent");
        store.put(&hash, bytes.clone()).unwrap();
        store.put(&hash, bytes).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn put_verifies_the_hash() {
        let store = InMemoryCellStore::new();
        let wrong = Hash::compute(b"other content");
        let err = store.put(&wrong, Bytes::from_static(b"content")).unwrap_err();
        assert!(matches!(err, StoreError::HashMismatch { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn null_hash_is_rejected() {
        let store = InMemoryCellStore::new();
        let err = store.put(&Hash::null(), Bytes::new()).unwrap_err();
        assert!(matches!(err, StoreError::NullHash));
    }

    // -----------------------------------------------------------------------
    // Root hash
    // -----------------------------------------------------------------------

    #[test]
    fn root_hash_roundtrip() {
        let store = InMemoryCellStore::new();
        assert_eq!(store.root_hash().unwrap(), None);
        let hash = Hash::compute(b"root");
        store.set_root_hash(hash).unwrap();
        assert_eq!(store.root_hash().unwrap(), Some(hash));
    }

    // -----------------------------------------------------------------------
    // Batch and utility methods
    // -----------------------------------------------------------------------

    #[test]
    fn get_batch_mixes_hits_and_misses() {
        let store = InMemoryCellStore::new();
        let (hash, bytes) = encoding(b"exists");
        store.put(&hash, bytes).unwrap();
        let missing = Hash::compute(b"missing");

        let results = store.get_batch(&[hash, missing]).unwrap();
        assert!(results[0].is_some());
        assert!(results[1].is_none());
    }

    #[test]
    fn len_total_bytes_and_clear() {
        let store = InMemoryCellStore::new();
        let (h1, b1) = encoding(b"12345");
        let (h2, b2) = encoding(b"123456789");
        store.put(&h1, b1).unwrap();
        store.put(&h2, b2).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.total_bytes(), 14);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.root_hash().unwrap(), None);
    }

    #[test]
    fn all_hashes_is_sorted() {
        let store = InMemoryCellStore::new();
        for data in [b"aaa".as_slice(), b"bbb", b"ccc"] {
            let (hash, bytes) = encoding(data);
            store.put(&hash, bytes).unwrap();
        }
        let hashes = store.all_hashes();
        assert_eq!(hashes.len(), 3);
        for pair in hashes.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryCellStore::new());
        let (hash, bytes) = encoding(b"shared data");
        store.put(&hash, bytes).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let encoding = store.get(&hash).unwrap().expect("present");
                    assert_eq!(Hash::compute(&encoding), hash);
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let store = InMemoryCellStore::new();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryCellStore"));
        assert!(debug.contains("cell_count"));
    }
}
