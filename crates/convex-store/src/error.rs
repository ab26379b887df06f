use convex_types::Hash;

/// Errors from cell store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Stored bytes do not hash to their key (data corruption).
    #[error("hash mismatch for {key}: stored bytes hash to {computed}")]
    HashMismatch { key: Hash, computed: Hash },

    /// Attempted to store under the null hash.
    #[error("cannot store a cell under the null hash")]
    NullHash,

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage backend is read-only or otherwise unavailable.
    #[error("store is read-only")]
    ReadOnly,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
