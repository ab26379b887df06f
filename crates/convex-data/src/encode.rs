//! The canonical cell encoder.
//!
//! Writes the tag and payload for each kind, splicing embedded children
//! inline and emitting 33-byte hash refs for everything else. The output is
//! injective: one cell, one byte string.

use bytes::Bytes;

use crate::blob::Blob;
use crate::cell::Cell;
use crate::format::{CANONICAL_NAN_BITS, LIMIT_ENCODING_LENGTH};
use crate::tag;
use crate::text::Text;
use crate::value::ValueRef;
use crate::vector::Vector;
use crate::vlq::{write_vlq_count, write_vlq_long};

/// Produce the canonical encoding of a cell.
///
/// The buffer is sized from the kind registry's per-kind bound. Builders
/// keep every canonical cell far below the encoding limit, so the limit
/// here is an internal invariant rather than a runtime error.
pub(crate) fn encode_cell(cell: &Cell) -> Bytes {
    let mut buf = Vec::with_capacity(cell.kind().max_encoding_length());
    write_cell(&mut buf, cell);
    debug_assert!(buf.len() <= LIMIT_ENCODING_LENGTH);
    Bytes::from(buf)
}

/// Number of payload bytes in the minimal two's-complement form of a long.
pub(crate) fn long_byte_length(value: i64) -> usize {
    if value == 0 {
        return 0;
    }
    let magnitude = if value < 0 { !value as u64 } else { value as u64 };
    let bits = 65 - magnitude.leading_zeros() as usize;
    bits.div_ceil(8)
}

fn write_cell(buf: &mut Vec<u8>, cell: &Cell) {
    match cell {
        Cell::Null => buf.push(tag::NULL),
        Cell::Bool(value) => buf.push(if *value { tag::TRUE } else { tag::FALSE }),
        Cell::ByteFlag(value) => buf.push(tag::BYTE_FLAG_BASE + value),
        Cell::Long(value) => {
            let n = long_byte_length(*value);
            buf.push(tag::LONG_BASE + n as u8);
            for i in (0..n).rev() {
                buf.push((*value >> (8 * i)) as u8);
            }
        }
        Cell::Double(value) => {
            buf.push(tag::DOUBLE);
            let bits = if value.is_nan() {
                CANONICAL_NAN_BITS
            } else {
                value.to_bits()
            };
            buf.extend_from_slice(&bits.to_be_bytes());
        }
        Cell::BigInt(big) => {
            buf.push(tag::BIG_INT);
            write_vlq_count(buf, big.byte_length() as u64);
            buf.extend_from_slice(big.be_bytes());
        }
        Cell::String(Text::Short(s)) => {
            buf.push(tag::STRING);
            write_vlq_count(buf, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Cell::String(Text::Tree(tree)) => {
            buf.push(tag::STRING_TREE);
            write_vlq_count(buf, tree.byte_count());
            write_vlq_count(buf, tree.children().len() as u64);
            for child in tree.children() {
                write_ref(buf, child);
            }
        }
        Cell::Blob(Blob::Leaf(data)) => {
            buf.push(tag::BLOB);
            write_vlq_count(buf, data.len() as u64);
            buf.extend_from_slice(data);
        }
        Cell::Blob(Blob::Tree(tree)) => {
            buf.push(tag::BLOB_TREE);
            write_vlq_count(buf, tree.byte_count());
            for child in tree.children() {
                write_ref(buf, child);
            }
        }
        Cell::Vector(Vector::Leaf(leaf)) => {
            buf.push(tag::VECTOR_LEAF);
            write_vlq_count(buf, leaf.count());
            for element in leaf.elements() {
                write_ref(buf, element);
            }
            if let Some(tail) = leaf.tail() {
                write_ref(buf, tail);
            }
        }
        Cell::Vector(Vector::Tree(tree)) => {
            buf.push(tag::VECTOR_TREE);
            write_vlq_count(buf, tree.count());
            buf.push(tree.shift());
            for child in tree.children() {
                write_ref(buf, child);
            }
        }
        Cell::Map(crate::map::Map::Leaf(leaf)) => {
            buf.push(tag::MAP_LEAF);
            write_vlq_count(buf, leaf.entries().len() as u64);
            for entry in leaf.entries() {
                write_ref(buf, &entry.key);
                write_ref(buf, &entry.value);
            }
        }
        Cell::Map(crate::map::Map::Tree(tree)) => {
            buf.push(tag::MAP_TREE);
            write_vlq_count(buf, tree.count());
            buf.push(tree.shift());
            buf.extend_from_slice(&tree.mask().to_be_bytes());
            for child in tree.children() {
                write_ref(buf, child);
            }
        }
        Cell::Index(index) => {
            buf.push(tag::INDEX);
            write_vlq_count(buf, index.count());
            write_vlq_count(buf, index.prefix_length());
            buf.extend_from_slice(index.prefix());
            match index.entry() {
                Some(entry) => {
                    buf.push(1);
                    write_ref(buf, &entry.key);
                    write_ref(buf, &entry.value);
                }
                None => buf.push(0),
            }
            buf.extend_from_slice(&index.mask().to_be_bytes());
            for child in index.children() {
                write_ref(buf, child);
            }
        }
        Cell::Address(address) => {
            buf.push(tag::ADDRESS);
            write_vlq_count(buf, address.number());
        }
        Cell::Keyword(name) => {
            buf.push(tag::KEYWORD);
            write_vlq_count(buf, name.name().len() as u64);
            buf.extend_from_slice(name.name().as_bytes());
        }
        Cell::Symbol(name) => {
            buf.push(tag::SYMBOL);
            write_vlq_count(buf, name.name().len() as u64);
            buf.extend_from_slice(name.name().as_bytes());
        }
        Cell::Block(block) => {
            buf.push(tag::BLOCK);
            write_vlq_long(buf, block.timestamp());
            write_ref(buf, block.transactions());
        }
        Cell::Order(order) => {
            buf.push(tag::ORDER);
            write_vlq_count(buf, order.proposal_point());
            write_vlq_count(buf, order.consensus_point());
            write_ref(buf, order.blocks());
        }
        Cell::Belief(belief) => {
            buf.push(tag::BELIEF);
            write_ref(buf, belief.orders());
        }
        Cell::Signed(signed) => {
            buf.push(tag::SIGNED);
            buf.extend_from_slice(signed.account_key().as_bytes());
            buf.extend_from_slice(signed.signature().as_bytes());
            write_ref(buf, signed.value_ref());
        }
    }
}

fn write_ref(buf: &mut Vec<u8>, r: &ValueRef) {
    match r {
        ValueRef::Embedded(value) => buf.extend_from_slice(value.encoding()),
        ValueRef::Indirect(_) => {
            buf.push(tag::REF);
            buf.extend_from_slice(r.hash().as_bytes());
        }
    }
}
