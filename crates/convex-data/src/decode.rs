//! The canonical cell decoder.
//!
//! Parses a byte slice into a cell, enforcing every canonicality invariant:
//! known tags, minimal VLQs, minimal long payloads, the embedded/indirect
//! child discipline, UTF-8 validity, and per-cell encoding limits. Decoded
//! cells keep slices of the input buffer as their cached encodings, so blob
//! payloads are never copied.

use bytes::Bytes;
use convex_crypto::{AccountKey, Signature};
use convex_types::Address;

use crate::bigint::BigInt;
use crate::blob::{Blob, BlobTree};
use crate::cell::Cell;
use crate::error::{FormatError, FormatResult};
use crate::format::{CHUNK_LENGTH, LIMIT_ENCODING_LENGTH};
use crate::index::{Index, IndexEntry};
use crate::map::{Map, MapEntry, MapLeaf, MapTree};
use crate::records::{Belief, Block, Order};
use crate::signed::Signed;
use crate::symbolic::Symbolic;
use crate::tag;
use crate::tag::CellKind;
use crate::text::{Text, TextTree};
use crate::value::{Value, ValueRef};
use crate::vector::{Vector, VectorLeaf, VectorTree, VECTOR_FANOUT};
use crate::vlq::{read_vlq_count, read_vlq_long};

/// Maximum nesting depth the decoder will follow.
pub const MAX_DECODE_DEPTH: usize = 64;

/// Parse one cell starting at `offset`. Returns the cell and the offset just
/// past its encoding.
pub(crate) fn read_cell(data: &Bytes, offset: usize) -> FormatResult<(Value, usize)> {
    read_cell_at(data, offset, 0)
}

fn read_cell_at(data: &Bytes, offset: usize, depth: usize) -> FormatResult<(Value, usize)> {
    if depth > MAX_DECODE_DEPTH {
        return Err(FormatError::DepthLimit);
    }
    let start = offset;
    let tag = *data.get(offset).ok_or(FormatError::Truncated)?;
    let mut pos = offset + 1;

    if tag == tag::REF {
        return Err(FormatError::NonCanonical("bare hash ref is not a cell"));
    }
    // The closed kind registry rejects unknown tags; the tag byte then
    // selects the leaf/tree form within the kind.
    let cell = match tag::kind_for_tag(tag)? {
        CellKind::Null => Cell::Null,
        CellKind::Bool => Cell::Bool(tag == tag::TRUE),
        CellKind::ByteFlag => Cell::ByteFlag(tag - tag::BYTE_FLAG_BASE),
        CellKind::Long => read_long(data, &mut pos, (tag - tag::LONG_BASE) as usize)?,
        CellKind::Double => read_double(data, &mut pos)?,
        CellKind::BigInt => read_big_int(data, &mut pos)?,
        CellKind::String if tag == tag::STRING => read_string(data, &mut pos)?,
        CellKind::String => read_string_tree(data, &mut pos, depth)?,
        CellKind::Blob if tag == tag::BLOB => read_blob(data, &mut pos)?,
        CellKind::Blob => read_blob_tree(data, &mut pos, depth)?,
        CellKind::Symbol => Cell::Symbol(read_symbolic(data, &mut pos)?),
        CellKind::Keyword => Cell::Keyword(read_symbolic(data, &mut pos)?),
        CellKind::Vector if tag == tag::VECTOR_LEAF => read_vector_leaf(data, &mut pos, depth)?,
        CellKind::Vector => read_vector_tree(data, &mut pos, depth)?,
        CellKind::Map if tag == tag::MAP_LEAF => read_map_leaf(data, &mut pos, depth)?,
        CellKind::Map => read_map_tree(data, &mut pos, depth)?,
        CellKind::Index => read_index(data, &mut pos, depth)?,
        CellKind::Address => {
            let number = read_count(data, &mut pos)?;
            Cell::Address(Address::new(number))
        }
        CellKind::Signed => read_signed(data, &mut pos, depth)?,
        CellKind::Block => read_block(data, &mut pos, depth)?,
        CellKind::Order => read_order(data, &mut pos, depth)?,
        CellKind::Belief => {
            let orders = read_ref(data, &mut pos, depth, Some(CellKind::Map))?;
            Cell::Belief(Belief::from_parts(orders))
        }
    };

    let length = pos - start;
    if length > LIMIT_ENCODING_LENGTH {
        return Err(FormatError::OversizeEncoding {
            length,
            limit: LIMIT_ENCODING_LENGTH,
        });
    }
    let value = Value::new(cell);
    value.set_encoding(data.slice(start..pos));
    Ok((value, pos))
}

// ---------------------------------------------------------------------------
// Payload readers
// ---------------------------------------------------------------------------

fn take<'a>(data: &'a Bytes, pos: &mut usize, n: usize) -> FormatResult<&'a [u8]> {
    let end = pos.checked_add(n).ok_or(FormatError::Truncated)?;
    if end > data.len() {
        return Err(FormatError::Truncated);
    }
    let slice = &data[*pos..end];
    *pos = end;
    Ok(slice)
}

fn read_count(data: &Bytes, pos: &mut usize) -> FormatResult<u64> {
    let (value, consumed) = read_vlq_count(&data[*pos..])?;
    *pos += consumed;
    Ok(value)
}

fn read_long_vlq(data: &Bytes, pos: &mut usize) -> FormatResult<i64> {
    let (value, consumed) = read_vlq_long(&data[*pos..])?;
    *pos += consumed;
    Ok(value)
}

/// Read a child slot: an inline embedded cell or a 33-byte hash ref.
///
/// When `expected` names a kind, an embedded child of any other kind fails;
/// indirect refs cannot be checked until resolution.
fn read_ref(
    data: &Bytes,
    pos: &mut usize,
    depth: usize,
    expected: Option<CellKind>,
) -> FormatResult<ValueRef> {
    let lead = *data.get(*pos).ok_or(FormatError::Truncated)?;
    if lead == tag::REF {
        *pos += 1;
        let bytes = take(data, pos, 32)?;
        let mut hash = [0u8; 32];
        hash.copy_from_slice(bytes);
        return Ok(ValueRef::indirect(hash.into()));
    }
    let (value, end) = read_cell_at(data, *pos, depth + 1)?;
    if !value.is_embedded() {
        return Err(FormatError::IllegalEmbedded);
    }
    if let Some(kind) = expected {
        if value.kind() != kind {
            return Err(FormatError::NonCanonical("child kind mismatch"));
        }
    }
    *pos = end;
    Ok(ValueRef::Embedded(value))
}

fn read_long(data: &Bytes, pos: &mut usize, n: usize) -> FormatResult<Cell> {
    let bytes = take(data, pos, n)?;
    let mut value: i64 = match bytes.first() {
        Some(&first) if first >= 0x80 => -1,
        _ => 0,
    };
    for &byte in bytes {
        value = (value << 8) | byte as i64;
    }
    if crate::encode::long_byte_length(value) != n {
        return Err(FormatError::NonCanonical("long payload not minimal"));
    }
    Ok(Cell::Long(value))
}

fn read_double(data: &Bytes, pos: &mut usize) -> FormatResult<Cell> {
    let bytes = take(data, pos, 8)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    let bits = u64::from_be_bytes(raw);
    let value = f64::from_bits(bits);
    if value.is_nan() && bits != crate::format::CANONICAL_NAN_BITS {
        return Err(FormatError::NonCanonical("non-canonical NaN payload"));
    }
    Ok(Cell::Double(value))
}

fn read_big_int(data: &Bytes, pos: &mut usize) -> FormatResult<Cell> {
    let length = read_count(data, pos)? as usize;
    if length > LIMIT_ENCODING_LENGTH {
        return Err(FormatError::OversizeEncoding {
            length,
            limit: LIMIT_ENCODING_LENGTH,
        });
    }
    let bytes = take(data, pos, length)?.to_vec();
    Ok(Cell::BigInt(BigInt::from_be_bytes(bytes)?))
}

fn read_string(data: &Bytes, pos: &mut usize) -> FormatResult<Cell> {
    let length = read_count(data, pos)? as usize;
    if length > CHUNK_LENGTH {
        return Err(FormatError::NonCanonical("string leaf above chunk length"));
    }
    let bytes = take(data, pos, length)?;
    let s = std::str::from_utf8(bytes).map_err(|_| FormatError::InvalidUtf8)?;
    Ok(Cell::String(Text::Short(s.to_string())))
}

fn read_string_tree(data: &Bytes, pos: &mut usize, depth: usize) -> FormatResult<Cell> {
    let byte_count = read_count(data, pos)?;
    if byte_count <= CHUNK_LENGTH as u64 {
        return Err(FormatError::NonCanonical("string tree below chunk length"));
    }
    let child_count = read_count(data, pos)? as usize;
    if !(2..=16).contains(&child_count) {
        return Err(FormatError::NonCanonical("string tree fanout"));
    }
    let mut children = Vec::with_capacity(child_count);
    for _ in 0..child_count {
        children.push(read_ref(data, pos, depth, Some(CellKind::String))?);
    }
    Ok(Cell::String(Text::Tree(TextTree::from_parts(
        byte_count, children,
    ))))
}

fn read_blob(data: &Bytes, pos: &mut usize) -> FormatResult<Cell> {
    let length = read_count(data, pos)? as usize;
    if length > CHUNK_LENGTH {
        return Err(FormatError::NonCanonical("blob leaf above chunk length"));
    }
    let end = *pos + length;
    if end > data.len() {
        return Err(FormatError::Truncated);
    }
    // Slice, not copy: the decoded blob aliases the input buffer.
    let payload = data.slice(*pos..end);
    *pos = end;
    Ok(Cell::Blob(Blob::Leaf(payload)))
}

fn read_blob_tree(data: &Bytes, pos: &mut usize, depth: usize) -> FormatResult<Cell> {
    let byte_count = read_count(data, pos)?;
    if byte_count <= CHUNK_LENGTH as u64 {
        return Err(FormatError::NonCanonical("blob tree below chunk length"));
    }
    let chunk = Blob::chunk_size(byte_count as usize) as u64;
    let child_count = byte_count.div_ceil(chunk) as usize;
    let mut children = Vec::with_capacity(child_count);
    for _ in 0..child_count {
        children.push(read_ref(data, pos, depth, Some(CellKind::Blob))?);
    }
    Ok(Cell::Blob(Blob::Tree(BlobTree::from_parts(
        byte_count, children,
    ))))
}

fn read_symbolic(data: &Bytes, pos: &mut usize) -> FormatResult<Symbolic> {
    let length = read_count(data, pos)? as usize;
    if length > crate::symbolic::MAX_NAME_LENGTH {
        return Err(FormatError::NonCanonical("name too long"));
    }
    let bytes = take(data, pos, length)?;
    let s = std::str::from_utf8(bytes).map_err(|_| FormatError::InvalidUtf8)?;
    Symbolic::new(s)
}

fn read_vector_leaf(data: &Bytes, pos: &mut usize, depth: usize) -> FormatResult<Cell> {
    let count = read_count(data, pos)?;
    let fanout = VECTOR_FANOUT as u64;
    let (element_count, has_tail) = if count <= fanout {
        (count, false)
    } else if count % fanout == 0 {
        return Err(FormatError::NonCanonical("aligned vector must be a tree"));
    } else {
        (count % fanout, true)
    };
    let mut elements = Vec::with_capacity(element_count as usize);
    for _ in 0..element_count {
        elements.push(read_ref(data, pos, depth, None)?);
    }
    let tail = if has_tail {
        Some(read_ref(data, pos, depth, Some(CellKind::Vector))?)
    } else {
        None
    };
    Ok(Cell::Vector(Vector::Leaf(VectorLeaf::from_parts(
        count, elements, tail,
    ))))
}

fn read_vector_tree(data: &Bytes, pos: &mut usize, depth: usize) -> FormatResult<Cell> {
    let count = read_count(data, pos)?;
    let fanout = VECTOR_FANOUT as u64;
    if count <= fanout || count % fanout != 0 {
        return Err(FormatError::NonCanonical("vector tree count"));
    }
    let shift = take(data, pos, 1)?[0];
    let (chunk, expected_shift) = Vector::chunk_size(count);
    if shift != expected_shift {
        return Err(FormatError::NonCanonical("vector tree shift"));
    }
    let child_count = count.div_ceil(chunk) as usize;
    let mut children = Vec::with_capacity(child_count);
    for _ in 0..child_count {
        children.push(read_ref(data, pos, depth, Some(CellKind::Vector))?);
    }
    Ok(Cell::Vector(Vector::Tree(VectorTree::from_parts(
        count, shift, children,
    ))))
}

fn read_map_leaf(data: &Bytes, pos: &mut usize, depth: usize) -> FormatResult<Cell> {
    let count = read_count(data, pos)? as usize;
    if count > crate::map::MAP_LEAF_MAX_ENTRIES {
        return Err(FormatError::NonCanonical("map leaf entry count"));
    }
    let mut entries: Vec<MapEntry> = Vec::with_capacity(count);
    for _ in 0..count {
        let key = read_ref(data, pos, depth, None)?;
        let value = read_ref(data, pos, depth, None)?;
        if let Some(previous) = entries.last() {
            if previous.key.hash() >= key.hash() {
                return Err(FormatError::NonCanonical("map entries out of order"));
            }
        }
        entries.push(MapEntry { key, value });
    }
    Ok(Cell::Map(Map::Leaf(MapLeaf::from_parts(entries))))
}

fn read_map_tree(data: &Bytes, pos: &mut usize, depth: usize) -> FormatResult<Cell> {
    let count = read_count(data, pos)?;
    if count <= crate::map::MAP_LEAF_MAX_ENTRIES as u64 {
        return Err(FormatError::NonCanonical("map tree entry count"));
    }
    let shift = take(data, pos, 1)?[0];
    if shift as usize >= 64 {
        return Err(FormatError::NonCanonical("map tree shift"));
    }
    let mask_bytes = take(data, pos, 2)?;
    let mask = u16::from_be_bytes([mask_bytes[0], mask_bytes[1]]);
    let child_count = mask.count_ones() as usize;
    if child_count < 2 {
        return Err(FormatError::NonCanonical("map tree fanout"));
    }
    let mut children = Vec::with_capacity(child_count);
    for _ in 0..child_count {
        children.push(read_ref(data, pos, depth, Some(CellKind::Map))?);
    }
    Ok(Cell::Map(Map::Tree(MapTree::from_parts(
        count, shift, mask, children,
    ))))
}

fn read_index(data: &Bytes, pos: &mut usize, depth: usize) -> FormatResult<Cell> {
    let count = read_count(data, pos)?;
    let prefix_length = read_count(data, pos)?;
    if prefix_length > 2 * LIMIT_ENCODING_LENGTH as u64 {
        return Err(FormatError::NonCanonical("index prefix length"));
    }
    let prefix = take(data, pos, prefix_length.div_ceil(2) as usize)?.to_vec();
    if prefix_length % 2 == 1 && prefix.last().is_some_and(|b| b & 0x0F != 0) {
        return Err(FormatError::NonCanonical("index prefix pad nibble"));
    }
    let flag = take(data, pos, 1)?[0];
    let entry = match flag {
        0 => None,
        1 => {
            let key = read_ref(data, pos, depth, Some(CellKind::Blob))?;
            let value = read_ref(data, pos, depth, None)?;
            Some(IndexEntry { key, value })
        }
        _ => return Err(FormatError::NonCanonical("index entry flag")),
    };
    let mask_bytes = take(data, pos, 2)?;
    let mask = u16::from_be_bytes([mask_bytes[0], mask_bytes[1]]);
    let child_count = mask.count_ones() as usize;
    let mut children = Vec::with_capacity(child_count);
    for _ in 0..child_count {
        children.push(read_ref(data, pos, depth, Some(CellKind::Index))?);
    }

    if count == 0 {
        if entry.is_some() || !children.is_empty() || prefix_length != 0 {
            return Err(FormatError::NonCanonical("non-empty payload in empty index"));
        }
    } else {
        if entry.is_none() && children.is_empty() {
            return Err(FormatError::NonCanonical("index entries unaccounted for"));
        }
        if entry.is_none() && children.len() == 1 {
            return Err(FormatError::NonCanonical("index prefix not maximal"));
        }
        if count == 1 && !children.is_empty() {
            return Err(FormatError::NonCanonical("singleton index with children"));
        }
    }
    Ok(Cell::Index(Index::from_parts(
        count,
        prefix_length,
        prefix,
        entry,
        mask,
        children,
    )))
}

fn read_signed(data: &Bytes, pos: &mut usize, depth: usize) -> FormatResult<Cell> {
    let key_bytes = take(data, pos, 32)?;
    let mut key = [0u8; 32];
    key.copy_from_slice(key_bytes);
    let sig_bytes = take(data, pos, 64)?;
    let mut sig = [0u8; 64];
    sig.copy_from_slice(sig_bytes);
    let value = read_ref(data, pos, depth, None)?;
    Ok(Cell::Signed(Signed::from_parts(
        AccountKey::from_bytes(key),
        Signature::from_bytes(sig),
        value,
    )))
}

fn read_block(data: &Bytes, pos: &mut usize, depth: usize) -> FormatResult<Cell> {
    let timestamp = read_long_vlq(data, pos)?;
    let transactions = read_ref(data, pos, depth, Some(CellKind::Vector))?;
    Ok(Cell::Block(Block::from_parts(timestamp, transactions)))
}

fn read_order(data: &Bytes, pos: &mut usize, depth: usize) -> FormatResult<Cell> {
    let proposal_point = read_count(data, pos)?;
    let consensus_point = read_count(data, pos)?;
    let blocks = read_ref(data, pos, depth, Some(CellKind::Vector))?;
    Ok(Cell::Order(Order::from_parts(
        proposal_point,
        consensus_point,
        blocks,
    )))
}
