//! Content-addressed cell storage.
//!
//! A store maps cell hashes to canonical encodings and answers existence
//! queries; it never interprets the encodings it holds. The codec core
//! treats any [`CellStore`] implementation as the durable side of the
//! lattice: `persist` walks a cell graph bottom-up and writes each
//! non-embedded encoding under its hash key.
//!
//! # Design Rules
//!
//! 1. Encodings are immutable once written; content addressing guarantees
//!    that a key always maps to the same bytes.
//! 2. Writes are idempotent: re-putting an existing hash is a no-op.
//! 3. Children are written before parents, so a reader following a hash
//!    never sees a dangling child reference.
//! 4. Concurrent reads are always safe.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryCellStore;
pub use traits::CellStore;
