//! Canonical binary encoding for Convex lattice cells.
//!
//! Every value on the lattice is a [`Cell`]: an immutable, content-addressed
//! unit with exactly one byte encoding and a 32-byte SHA3-256 hash. This
//! crate implements the codec that makes that identity exact:
//!
//! - [`vlq`] — minimum-length variable-length integers (signed and unsigned)
//! - [`tag`] — the closed tag registry and embeddability rules
//! - the cell model ([`Vector`], [`Map`], [`Index`], [`Blob`], [`Text`],
//!   records and [`Signed`] values) with 16-way tree shapes that bound every
//!   node's encoding
//! - [`format`] — top-level read/write, multi-cell message framing, delta
//!   payloads, and stream-frame length peeking
//!
//! # Canonicality
//!
//! The decoder accepts exactly the encoder's output: minimal VLQs, minimal
//! long payloads, one NaN bit pattern, valid UTF-8, and the embedded-child
//! discipline (a child small enough to embed must be inline; anything else
//! must be a 33-byte hash ref). Anything non-canonical is a
//! [`FormatError`]; a dereference of a non-resident ref is [`MissingData`],
//! which is not a format error.

pub mod bigint;
pub mod blob;
pub mod cell;
pub mod decode;
pub mod encode;
pub mod error;
pub mod format;
pub mod index;
pub mod map;
pub mod records;
pub mod refs;
pub mod signed;
pub mod symbolic;
pub mod tag;
pub mod text;
pub mod value;
pub mod vector;
pub mod vlq;

pub use bigint::BigInt;
pub use blob::Blob;
pub use cell::Cell;
pub use error::{AccessError, FormatError, FormatResult, MissingData};
pub use index::Index;
pub use map::Map;
pub use records::{Belief, Block, Order};
pub use refs::{ref_tree_stats, total_ref_count, RefTreeStats};
pub use signed::Signed;
pub use symbolic::Symbolic;
pub use tag::CellKind;
pub use text::Text;
pub use value::{Value, ValueRef};
pub use vector::Vector;
