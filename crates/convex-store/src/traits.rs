use bytes::Bytes;
use convex_types::Hash;

use crate::error::StoreResult;

/// Content-addressed store: hash → canonical cell encoding.
///
/// All implementations must satisfy these invariants:
/// - Encodings are immutable once written; a key always maps to the same
///   bytes.
/// - `put` is idempotent.
/// - Concurrent reads are always safe.
/// - The store never interprets encodings — it is a pure key-value store.
pub trait CellStore: Send + Sync {
    /// Read the encoding stored under a hash.
    ///
    /// Returns `Ok(None)` if the hash is not present.
    fn get(&self, hash: &Hash) -> StoreResult<Option<Bytes>>;

    /// Write an encoding under its hash key. A no-op if already present.
    fn put(&self, hash: &Hash, encoding: Bytes) -> StoreResult<()>;

    /// Check whether a hash is present.
    fn contains(&self, hash: &Hash) -> StoreResult<bool>;

    /// The current root hash, if one has been set.
    fn root_hash(&self) -> StoreResult<Option<Hash>>;

    /// Update the root hash.
    fn set_root_hash(&self, hash: Hash) -> StoreResult<()>;

    /// Read multiple encodings in a batch.
    ///
    /// Default implementation calls `get` for each hash. Backends may
    /// override for fewer I/O round trips.
    fn get_batch(&self, hashes: &[Hash]) -> StoreResult<Vec<Option<Bytes>>> {
        hashes.iter().map(|hash| self.get(hash)).collect()
    }
}
