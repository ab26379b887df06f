//! Cryptographic primitives for the Convex data layer.
//!
//! Provides Ed25519 key pairs, account keys, and signatures as used by signed
//! cells. All crypto operations wrap established libraries — no custom
//! cryptography. Content hashing (SHA3-256) lives on
//! [`convex_types::Hash`] because hashes are identity, not signing material.

pub mod signer;

pub use signer::{AccountKey, KeyPair, Signature, SignatureError};
