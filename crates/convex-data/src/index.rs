//! Index cells: radix trees over blob keys, branching on hex digits.
//!
//! An index node covers every key that starts with its prefix (a nibble
//! sequence). A key exactly equal to the prefix sits in the node's entry
//! slot; longer keys are partitioned by their next hex digit into child
//! indexes. The shape is canonical: each node's prefix is the longest common
//! prefix of the keys it covers.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::blob::Blob;
use crate::cell::Cell;
use crate::error::AccessError;
use crate::value::{Value, ValueRef};

/// An index cell.
#[derive(Clone, Debug)]
pub struct Index {
    count: u64,
    /// Shared key prefix in nibbles (absolute, from the start of the key).
    prefix_length: u64,
    /// Packed prefix nibbles, high nibble first; the final pad nibble is 0.
    prefix: Vec<u8>,
    entry: Option<IndexEntry>,
    mask: u16,
    children: Vec<ValueRef>,
}

/// The entry for the key exactly equal to a node's prefix.
#[derive(Clone, Debug)]
pub struct IndexEntry {
    pub key: ValueRef,
    pub value: ValueRef,
}

impl Index {
    /// The empty index.
    pub fn empty() -> Index {
        Index {
            count: 0,
            prefix_length: 0,
            prefix: Vec::new(),
            entry: None,
            mask: 0,
            children: Vec::new(),
        }
    }

    /// Build an index over blob keys. Duplicate keys keep the last value.
    pub fn from_entries(entries: impl IntoIterator<Item = (Bytes, Value)>) -> Index {
        let mut by_key: BTreeMap<Vec<u8>, (Bytes, Value)> = BTreeMap::new();
        for (key, value) in entries {
            by_key.insert(key.to_vec(), (key, value));
        }
        let sorted: Vec<(Bytes, Value)> = by_key.into_values().collect();
        if sorted.is_empty() {
            return Index::empty();
        }
        Self::build(&sorted)
    }

    fn build(sorted: &[(Bytes, Value)]) -> Index {
        let count = sorted.len() as u64;
        let prefix_length = common_prefix_nibbles(sorted);

        let mut entry = None;
        let mut rest = sorted;
        if nibble_count(&sorted[0].0) == prefix_length {
            let (key, value) = &sorted[0];
            entry = Some(IndexEntry {
                key: ValueRef::of(Value::new(Cell::Blob(Blob::from_bytes(key.clone())))),
                value: ValueRef::of(value.clone()),
            });
            rest = &sorted[1..];
        }

        let mut mask: u16 = 0;
        let mut children = Vec::new();
        let mut start = 0;
        while start < rest.len() {
            let digit = nibble_at(&rest[start].0, prefix_length);
            let mut end = start;
            while end < rest.len() && nibble_at(&rest[end].0, prefix_length) == digit {
                end += 1;
            }
            mask |= 1 << digit;
            let child = Self::build(&rest[start..end]);
            children.push(ValueRef::of(Value::new(Cell::Index(child))));
            start = end;
        }

        Index {
            count,
            prefix_length,
            prefix: pack_nibbles(&sorted[0].0, prefix_length),
            entry,
            mask,
            children,
        }
    }

    /// Total entry count.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Returns `true` if the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Prefix length in nibbles.
    pub fn prefix_length(&self) -> u64 {
        self.prefix_length
    }

    /// Packed prefix nibbles.
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    /// The entry at the prefix, if any.
    pub fn entry(&self) -> Option<&IndexEntry> {
        self.entry.as_ref()
    }

    /// Child digit bitmap.
    pub fn mask(&self) -> u16 {
        self.mask
    }

    /// Child index refs, ascending digit order.
    pub fn children(&self) -> &[ValueRef] {
        &self.children
    }

    /// Child refs in encoding order: entry key/value, then subtree refs.
    pub fn child_refs(&self) -> Vec<&ValueRef> {
        let mut refs = Vec::new();
        if let Some(entry) = &self.entry {
            refs.push(&entry.key);
            refs.push(&entry.value);
        }
        refs.extend(self.children.iter());
        refs
    }

    /// Look up the value for a blob key.
    pub fn get(&self, key: &[u8]) -> Result<Option<Value>, AccessError> {
        if self.count == 0 {
            return Ok(None);
        }
        let n = nibble_count_bytes(key);
        if n < self.prefix_length || !self.matches_prefix(key) {
            return Ok(None);
        }
        if n == self.prefix_length {
            return match &self.entry {
                Some(entry) => Ok(Some(entry.value.value()?.clone())),
                None => Ok(None),
            };
        }
        let digit = nibble_at_bytes(key, self.prefix_length);
        if self.mask & (1 << digit) == 0 {
            return Ok(None);
        }
        let below = self.mask & ((1u16 << digit) - 1);
        let slot = below.count_ones() as usize;
        let value = self.children[slot].value()?;
        match value.cell() {
            Cell::Index(index) => index.get(key),
            _ => Err(AccessError::WrongKind),
        }
    }

    /// Whether the index contains a blob key.
    pub fn contains_key(&self, key: &[u8]) -> Result<bool, AccessError> {
        match self.get(key) {
            Ok(found) => Ok(found.is_some()),
            // A missing value ref still proves the key is present.
            Err(AccessError::Missing(_)) => Ok(true),
            Err(e) => Err(e),
        }
    }

    fn matches_prefix(&self, key: &[u8]) -> bool {
        for i in 0..self.prefix_length {
            if nibble_at_bytes(key, i) != unpack_nibble(&self.prefix, i) {
                return false;
            }
        }
        true
    }
}

pub(crate) fn nibble_count(key: &Bytes) -> u64 {
    nibble_count_bytes(key)
}

pub(crate) fn nibble_count_bytes(key: &[u8]) -> u64 {
    2 * key.len() as u64
}

fn nibble_at(key: &Bytes, position: u64) -> u8 {
    nibble_at_bytes(key, position)
}

pub(crate) fn nibble_at_bytes(key: &[u8], position: u64) -> u8 {
    let byte = key[(position / 2) as usize];
    if position % 2 == 0 {
        byte >> 4
    } else {
        byte & 0x0F
    }
}

pub(crate) fn unpack_nibble(packed: &[u8], position: u64) -> u8 {
    nibble_at_bytes(packed, position)
}

/// Pack the first `length` nibbles of a key, padding the final nibble with 0.
pub(crate) fn pack_nibbles(key: &Bytes, length: u64) -> Vec<u8> {
    let bytes = length.div_ceil(2) as usize;
    let mut packed = key[..bytes.min(key.len())].to_vec();
    packed.resize(bytes, 0);
    if length % 2 == 1 {
        // Clear the pad nibble for a canonical representation.
        packed[bytes - 1] &= 0xF0;
    }
    packed
}

/// Longest common nibble prefix across sorted, deduplicated keys.
fn common_prefix_nibbles(sorted: &[(Bytes, Value)]) -> u64 {
    let first = &sorted[0].0;
    let mut prefix = nibble_count(first);
    for (key, _) in &sorted[1..] {
        let mut common = 0;
        let limit = prefix.min(nibble_count(key));
        while common < limit && nibble_at(first, common) == nibble_at(key, common) {
            common += 1;
        }
        prefix = common;
    }
    prefix
}

impl Index {
    /// Reassemble a node from decoded parts. Callers validate the shape.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        count: u64,
        prefix_length: u64,
        prefix: Vec<u8>,
        entry: Option<IndexEntry>,
        mask: u16,
        children: Vec<ValueRef>,
    ) -> Self {
        Self {
            count,
            prefix_length,
            prefix,
            entry,
            mask,
            children,
        }
    }
}

impl Value {
    /// An index cell over the given blob keys.
    pub fn index(entries: impl IntoIterator<Item = (Bytes, Value)>) -> Value {
        Value::new(Cell::Index(Index::from_entries(entries)))
    }
}
