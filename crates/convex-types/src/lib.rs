//! Foundation types for the Convex lattice data model.
//!
//! This crate provides the identity types shared by every other convex crate:
//!
//! - [`Hash`] — 32-byte SHA3-256 content identifier of a canonical encoding
//! - [`Address`] — account number on the lattice
//!
//! Cells are content-addressed: two cells are equal exactly when the hashes of
//! their canonical encodings are equal, so a [`Hash`] is both an identity and
//! a lookup key for stores and peers.

pub mod address;
pub mod error;
pub mod hash;

pub use address::Address;
pub use error::TypeError;
pub use hash::Hash;
