//! Runtime handles for cells.
//!
//! A [`Value`] wraps an immutable [`Cell`] together with write-once caches
//! for its canonical encoding and content hash. Caches are idempotent and
//! lock-free: double computation is permitted, torn reads are not, so both
//! are published through [`OnceLock`].
//!
//! Children appear inside cells as [`ValueRef`]s, which mirror the wire-level
//! discipline: either the child is embedded (held directly) or it is an
//! indirect ref carrying the child's hash and, when resident, the resolved
//! value.

use std::fmt;
use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use convex_types::Hash;

use crate::cell::Cell;
use crate::encode;
use crate::error::MissingData;
use crate::format::MAX_EMBEDDED_LENGTH;
use crate::tag::CellKind;

struct Node {
    cell: Cell,
    encoding: OnceLock<Bytes>,
    hash: OnceLock<Hash>,
}

/// An immutable cell with cached encoding and hash.
#[derive(Clone)]
pub struct Value(Arc<Node>);

impl Value {
    /// Wrap a cell. The encoding and hash are computed lazily on demand.
    pub fn new(cell: Cell) -> Self {
        Self(Arc::new(Node {
            cell,
            encoding: OnceLock::new(),
            hash: OnceLock::new(),
        }))
    }

    /// The underlying cell.
    pub fn cell(&self) -> &Cell {
        &self.0.cell
    }

    /// The kind of the underlying cell.
    pub fn kind(&self) -> CellKind {
        self.0.cell.kind()
    }

    /// The canonical encoding, computed once and cached.
    pub fn encoding(&self) -> &Bytes {
        self.0
            .encoding
            .get_or_init(|| encode::encode_cell(&self.0.cell))
    }

    /// Length of the canonical encoding in bytes.
    pub fn encoding_length(&self) -> usize {
        self.encoding().len()
    }

    /// Install a pre-computed encoding (from a decoder slice). A no-op if an
    /// encoding is already cached; callers guarantee the bytes are canonical.
    pub(crate) fn set_encoding(&self, encoding: Bytes) {
        let _ = self.0.encoding.set(encoding);
    }

    /// The content hash: SHA3-256 of the canonical encoding, cached.
    pub fn hash(&self) -> Hash {
        *self
            .0
            .hash
            .get_or_init(|| Hash::compute(self.encoding()))
    }

    /// Whether this cell is embedded wherever it is referenced: its kind is
    /// embeddable and its encoding fits in [`MAX_EMBEDDED_LENGTH`].
    pub fn is_embedded(&self) -> bool {
        self.kind().is_embeddable() && self.encoding_length() <= MAX_EMBEDDED_LENGTH
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        // Content addressing: equal exactly when the hashes are equal.
        Arc::ptr_eq(&self.0, &other.0) || self.hash() == other.hash()
    }
}

impl Eq for Value {}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0.cell, f)
    }
}

/// A child slot inside a cell.
///
/// The encoder embeds the child's full encoding when [`Value::is_embedded`]
/// holds, and writes a 33-byte hash ref otherwise. The decoder reverses this
/// and leaves non-resident children as partial refs.
#[derive(Clone, Debug)]
pub enum ValueRef {
    /// Child held directly; always spliced inline in the parent encoding.
    Embedded(Value),
    /// Child identified by hash; value attached once resolved.
    Indirect(IndirectRef),
}

/// A hash ref with a write-once slot for the resolved value.
#[derive(Clone)]
pub struct IndirectRef {
    hash: Hash,
    resolved: OnceLock<Value>,
}

impl IndirectRef {
    fn new(hash: Hash) -> Self {
        Self {
            hash,
            resolved: OnceLock::new(),
        }
    }

    fn with_value(value: Value) -> Self {
        let this = Self::new(value.hash());
        let _ = this.resolved.set(value);
        this
    }
}

impl fmt::Debug for IndirectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolved.get() {
            Some(value) => write!(f, "Ref({:?})", value),
            None => write!(f, "Ref({})", self.hash.short_hex()),
        }
    }
}

impl ValueRef {
    /// Reference a resident value, choosing embedded or indirect form by the
    /// embedding rule.
    pub fn of(value: Value) -> Self {
        if value.is_embedded() {
            ValueRef::Embedded(value)
        } else {
            ValueRef::Indirect(IndirectRef::with_value(value))
        }
    }

    /// A partial ref: hash only, value not resident.
    pub fn indirect(hash: Hash) -> Self {
        ValueRef::Indirect(IndirectRef::new(hash))
    }

    /// The hash of the referenced cell.
    pub fn hash(&self) -> Hash {
        match self {
            ValueRef::Embedded(value) => value.hash(),
            ValueRef::Indirect(r) => r.hash,
        }
    }

    /// Whether the child is spliced inline in the parent encoding.
    pub fn is_embedded(&self) -> bool {
        matches!(self, ValueRef::Embedded(_))
    }

    /// The referenced value, if resident.
    pub fn direct_value(&self) -> Option<&Value> {
        match self {
            ValueRef::Embedded(value) => Some(value),
            ValueRef::Indirect(r) => r.resolved.get(),
        }
    }

    /// Whether the referenced value is resident.
    pub fn is_direct(&self) -> bool {
        self.direct_value().is_some()
    }

    /// Dereference, failing with [`MissingData`] if the value is not
    /// resident.
    pub fn value(&self) -> Result<&Value, MissingData> {
        self.direct_value().ok_or(MissingData(self.hash()))
    }

    /// Attach a resolved value to a partial ref. Returns `true` if the value
    /// was attached (the hash matched and the slot was empty).
    pub fn resolve_with(&self, value: Value) -> bool {
        match self {
            ValueRef::Embedded(_) => false,
            ValueRef::Indirect(r) => {
                if value.hash() != r.hash {
                    return false;
                }
                r.resolved.set(value).is_ok()
            }
        }
    }
}

impl PartialEq for ValueRef {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for ValueRef {}
