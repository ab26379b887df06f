//! Top-level encoding operations: single cells, multi-cell messages, delta
//! payloads, and stream-frame length peeking.
//!
//! A multi-cell message is one root cell's encoding followed by
//! length-prefixed encodings of transitively-reachable non-embedded
//! descendants, letting a receiver rebuild the graph without round trips.

use std::collections::{HashMap, HashSet};

use bytes::Bytes;
use convex_types::Hash;

use crate::decode;
use crate::error::{FormatError, FormatResult};
use crate::value::{Value, ValueRef};
use crate::vlq::{peek_vlq_count, read_vlq_count, write_vlq_count};

/// Maximum encoding length of a child spliced inline.
pub const MAX_EMBEDDED_LENGTH: usize = 140;

/// Maximum encoding length of any single cell.
pub const LIMIT_ENCODING_LENGTH: usize = 8192;

/// Flat chunk size for blobs and strings.
pub const CHUNK_LENGTH: usize = 4096;

/// Maximum length of a stream frame (multi-cell payloads may exceed the
/// per-cell limit; this is the separate transport bound).
pub const MAX_MESSAGE_LENGTH: u64 = i32::MAX as u64;

/// The single accepted NaN bit pattern.
pub const CANONICAL_NAN_BITS: u64 = 0x7FF8_0000_0000_0000;

/// The canonical encoding of a cell.
pub fn encode(value: &Value) -> Bytes {
    value.encoding().clone()
}

/// Read exactly one cell from a buffer. The whole buffer must be consumed.
pub fn read(data: Bytes) -> FormatResult<Value> {
    if data.is_empty() {
        return Err(FormatError::Empty);
    }
    let (value, consumed) = decode::read_cell(&data, 0)?;
    if consumed != data.len() {
        return Err(FormatError::TrailingBytes {
            remaining: data.len() - consumed,
        });
    }
    Ok(value)
}

/// Read one cell from a hex string. Test and tooling convenience.
pub fn read_hex(hex: &str) -> FormatResult<Value> {
    let bytes =
        hex::decode(hex).map_err(|_| FormatError::NonCanonical("invalid hex input"))?;
    read(Bytes::from(bytes))
}

/// Encode a root cell together with every reachable non-embedded descendant.
pub fn encode_multi_cell(root: &Value) -> Bytes {
    let mut out = Vec::from(root.encoding().as_ref());
    let mut seen: HashSet<Hash> = HashSet::new();
    seen.insert(root.hash());
    let mut pending: Vec<Value> = vec![root.clone()];
    while let Some(value) = pending.pop() {
        for child in value.cell().child_refs() {
            match child {
                // Embedded children are already inline, but may themselves
                // hold refs to non-embedded cells.
                ValueRef::Embedded(inner) => pending.push(inner.clone()),
                ValueRef::Indirect(_) => {
                    let Some(inner) = child.direct_value() else {
                        continue; // non-resident subtree: receiver must request it
                    };
                    if seen.insert(inner.hash()) {
                        write_vlq_count(&mut out, inner.encoding_length() as u64);
                        out.extend_from_slice(inner.encoding());
                        pending.push(inner.clone());
                    }
                }
            }
        }
    }
    Bytes::from(out)
}

/// Decode a multi-cell message, resolving indirect refs against the in-
/// message dictionary. Unresolved hashes remain partial refs for the caller
/// to fetch from a store or a peer.
pub fn decode_multi_cell(data: Bytes) -> FormatResult<Value> {
    if data.is_empty() {
        return Err(FormatError::Empty);
    }
    let (root, mut pos) = decode::read_cell(&data, 0)?;

    let mut dictionary: HashMap<Hash, Value> = HashMap::new();
    while pos < data.len() {
        let (length, consumed) = read_vlq_count(&data[pos..])?;
        pos += consumed;
        let length = length as usize;
        if length == 0 {
            return Err(FormatError::ChildLengthMismatch);
        }
        if length > LIMIT_ENCODING_LENGTH {
            return Err(FormatError::OversizeEncoding {
                length,
                limit: LIMIT_ENCODING_LENGTH,
            });
        }
        if pos + length > data.len() {
            return Err(FormatError::Truncated);
        }
        let (cell, end) = decode::read_cell(&data, pos)?;
        if end - pos != length {
            return Err(FormatError::ChildLengthMismatch);
        }
        // A canonical encoding would have inlined this cell, so shipping it
        // separately is redundant and rejected.
        if cell.is_embedded() {
            return Err(FormatError::RedundantRef);
        }
        pos = end;
        dictionary.entry(cell.hash()).or_insert(cell);
    }

    resolve_against(&root, &dictionary);
    Ok(root)
}

/// Attach dictionary cells to matching partial refs, transitively.
fn resolve_against(root: &Value, dictionary: &HashMap<Hash, Value>) {
    let mut visited: HashSet<Hash> = HashSet::new();
    let mut pending: Vec<Value> = vec![root.clone()];
    while let Some(value) = pending.pop() {
        if !visited.insert(value.hash()) {
            continue;
        }
        for child in value.cell().child_refs() {
            if !child.is_direct() {
                if let Some(resolved) = dictionary.get(&child.hash()) {
                    child.resolve_with(resolved.clone());
                }
            }
            if let Some(inner) = child.direct_value() {
                pending.push(inner.clone());
            }
        }
    }
}

/// Pack an announcer's novelty list into one delta message.
///
/// The announcer emits children before parents, so the last element is the
/// root: it is written first, with the earlier novelty length-prefixed
/// behind it, ready for [`decode_multi_cell`]. Duplicates are tolerated and
/// sent once.
pub fn encode_delta(novelty: &[Value]) -> FormatResult<Bytes> {
    let Some((root, rest)) = novelty.split_last() else {
        return Err(FormatError::Empty);
    };
    let mut out = Vec::from(root.encoding().as_ref());
    let mut seen: HashSet<Hash> = HashSet::new();
    seen.insert(root.hash());
    for value in rest {
        if value.is_embedded() || !seen.insert(value.hash()) {
            continue;
        }
        write_vlq_count(&mut out, value.encoding_length() as u64);
        out.extend_from_slice(value.encoding());
    }
    Ok(Bytes::from(out))
}

/// Encode a flat sequence of top-level cells (e.g. a data response payload):
/// the first cell raw, the rest length-prefixed, in order.
pub fn encode_cells(cells: &[Value]) -> FormatResult<Bytes> {
    let Some((first, rest)) = cells.split_first() else {
        return Err(FormatError::Empty);
    };
    let mut out = Vec::from(first.encoding().as_ref());
    for value in rest {
        write_vlq_count(&mut out, value.encoding_length() as u64);
        out.extend_from_slice(value.encoding());
    }
    Ok(Bytes::from(out))
}

/// Decode a flat sequence of top-level cells, preserving order and
/// duplicates. Unlike [`decode_multi_cell`], embeddable cells are fine here.
pub fn decode_cells(data: Bytes) -> FormatResult<Vec<Value>> {
    if data.is_empty() {
        return Err(FormatError::Empty);
    }
    let (first, mut pos) = decode::read_cell(&data, 0)?;
    let mut cells = vec![first];
    while pos < data.len() {
        let (length, consumed) = read_vlq_count(&data[pos..])?;
        pos += consumed;
        let length = length as usize;
        if length == 0 || length > LIMIT_ENCODING_LENGTH {
            return Err(FormatError::ChildLengthMismatch);
        }
        if pos + length > data.len() {
            return Err(FormatError::Truncated);
        }
        let (cell, end) = decode::read_cell(&data, pos)?;
        if end - pos != length {
            return Err(FormatError::ChildLengthMismatch);
        }
        cells.push(cell);
        pos = end;
    }
    Ok(cells)
}

/// Peek the length prefix of a stream frame.
///
/// Returns `Ok(None)` while the prefix itself is incomplete; fails once the
/// declared length exceeds [`MAX_MESSAGE_LENGTH`]. On success returns the
/// payload length and the prefix's own byte count.
pub fn peek_message_length(data: &[u8]) -> FormatResult<Option<(u64, usize)>> {
    match peek_vlq_count(data)? {
        None => Ok(None),
        Some((length, prefix)) => {
            if length > MAX_MESSAGE_LENGTH {
                return Err(FormatError::OversizeMessage(length));
            }
            Ok(Some((length, prefix)))
        }
    }
}
