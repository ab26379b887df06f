//! Tag byte assignments and the cell kind registry.
//!
//! Tags are disjoint: a decoder selects the variant by the leading byte
//! alone. The registry is closed — an unknown tag is a format error, and
//! there is no user-registered tag space.

use crate::error::{FormatError, FormatResult};
use crate::vlq::{MAX_VLQ_COUNT_LENGTH, MAX_VLQ_LONG_LENGTH};

pub const NULL: u8 = 0x00;
/// Longs occupy `LONG_BASE + n` where `n` is the payload byte count (0..=8).
pub const LONG_BASE: u8 = 0x10;
pub const BIG_INT: u8 = 0x19;
pub const DOUBLE: u8 = 0x1D;
/// Marks an indirect child ref (followed by a 32-byte hash). Only valid in
/// child slots; a bare ref is not a cell.
pub const REF: u8 = 0x20;
pub const STRING: u8 = 0x30;
pub const STRING_TREE: u8 = 0x31;
pub const SYMBOL: u8 = 0x32;
pub const KEYWORD: u8 = 0x33;
pub const BLOB: u8 = 0x34;
pub const BLOB_TREE: u8 = 0x35;
pub const VECTOR_LEAF: u8 = 0x80;
pub const VECTOR_TREE: u8 = 0x81;
pub const MAP_LEAF: u8 = 0x88;
pub const MAP_TREE: u8 = 0x89;
pub const INDEX: u8 = 0x8A;
/// Byte flags occupy `BYTE_FLAG_BASE + v` for `v` in 0..=15; values 0 and 1
/// are the booleans.
pub const BYTE_FLAG_BASE: u8 = 0xB0;
pub const FALSE: u8 = 0xB0;
pub const TRUE: u8 = 0xB1;
pub const SIGNED: u8 = 0xCD;
pub const BLOCK: u8 = 0xE0;
pub const ORDER: u8 = 0xE1;
pub const BELIEF: u8 = 0xE2;
pub const ADDRESS: u8 = 0xEA;

/// The kind of a cell, independent of leaf/tree representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellKind {
    Null,
    Bool,
    ByteFlag,
    Long,
    Double,
    BigInt,
    String,
    Blob,
    Vector,
    Map,
    Index,
    Address,
    Keyword,
    Symbol,
    Block,
    Order,
    Belief,
    Signed,
}

impl CellKind {
    /// Whether cells of this kind may be spliced inline when small enough.
    ///
    /// Signed values and the consensus records are never embedded, so that
    /// announcement always sees them as distinct novelty.
    pub fn is_embeddable(&self) -> bool {
        !matches!(
            self,
            CellKind::Signed | CellKind::Block | CellKind::Order | CellKind::Belief
        )
    }

    /// Upper bound on the encoding length of any canonical cell of this
    /// kind, used to size encoder buffers. Actual encodings are usually far
    /// smaller.
    pub fn max_encoding_length(&self) -> usize {
        use crate::format::{CHUNK_LENGTH, LIMIT_ENCODING_LENGTH, MAX_EMBEDDED_LENGTH};
        match self {
            CellKind::Null | CellKind::Bool | CellKind::ByteFlag => 1,
            CellKind::Long | CellKind::Double => 9,
            CellKind::Address => 1 + MAX_VLQ_COUNT_LENGTH,
            CellKind::Blob | CellKind::String => 1 + MAX_VLQ_COUNT_LENGTH + CHUNK_LENGTH,
            CellKind::Keyword | CellKind::Symbol => 2 + crate::symbolic::MAX_NAME_LENGTH,
            // leaf form dominates: count + 16 embedded elements + tail ref
            CellKind::Vector => 1 + MAX_VLQ_COUNT_LENGTH + 17 * MAX_EMBEDDED_LENGTH,
            // tree form dominates: count + shift + bitmap + 16 children
            CellKind::Map => 4 + MAX_VLQ_COUNT_LENGTH + 16 * MAX_EMBEDDED_LENGTH,
            CellKind::Signed => 1 + 32 + 64 + MAX_EMBEDDED_LENGTH,
            CellKind::Block => 1 + MAX_VLQ_LONG_LENGTH + MAX_EMBEDDED_LENGTH,
            CellKind::Order => 1 + 2 * MAX_VLQ_COUNT_LENGTH + MAX_EMBEDDED_LENGTH,
            CellKind::Belief => 1 + MAX_EMBEDDED_LENGTH,
            // prefix and payload lengths are bounded only by the cell limit
            CellKind::BigInt | CellKind::Index => LIMIT_ENCODING_LENGTH,
        }
    }
}

/// Resolve a leading tag byte to its cell kind.
pub fn kind_for_tag(tag: u8) -> FormatResult<CellKind> {
    let kind = match tag {
        NULL => CellKind::Null,
        FALSE | TRUE => CellKind::Bool,
        t if (BYTE_FLAG_BASE..=BYTE_FLAG_BASE + 0x0F).contains(&t) => CellKind::ByteFlag,
        t if (LONG_BASE..=LONG_BASE + 8).contains(&t) => CellKind::Long,
        DOUBLE => CellKind::Double,
        BIG_INT => CellKind::BigInt,
        STRING | STRING_TREE => CellKind::String,
        BLOB | BLOB_TREE => CellKind::Blob,
        SYMBOL => CellKind::Symbol,
        KEYWORD => CellKind::Keyword,
        VECTOR_LEAF | VECTOR_TREE => CellKind::Vector,
        MAP_LEAF | MAP_TREE => CellKind::Map,
        INDEX => CellKind::Index,
        ADDRESS => CellKind::Address,
        SIGNED => CellKind::Signed,
        BLOCK => CellKind::Block,
        ORDER => CellKind::Order,
        BELIEF => CellKind::Belief,
        _ => return Err(FormatError::UnknownTag(tag)),
    };
    Ok(kind)
}
