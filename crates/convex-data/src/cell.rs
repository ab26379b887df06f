//! The cell data model.
//!
//! A [`Cell`] is the sole representable unit: an immutable typed value with a
//! canonical byte encoding and a 32-byte content hash. Structural kinds hold
//! their children as [`ValueRef`]s so that the embedded/indirect discipline
//! is visible to the encoder and the announcer without re-walking payloads.

use convex_types::Address;

use crate::bigint::BigInt;
use crate::blob::Blob;
use crate::index::Index;
use crate::map::Map;
use crate::records::{Belief, Block, Order};
use crate::signed::Signed;
use crate::symbolic::Symbolic;
use crate::tag::CellKind;
use crate::text::Text;
use crate::value::{Value, ValueRef};
use crate::vector::Vector;

/// One cell. Each variant has a fixed tag byte and a canonical payload
/// grammar; see the `encode` and `decode` modules.
#[derive(Clone, Debug)]
pub enum Cell {
    Null,
    Bool(bool),
    /// 4-bit flag values 2..=15 (0 and 1 are the booleans).
    ByteFlag(u8),
    Long(i64),
    Double(f64),
    BigInt(BigInt),
    String(Text),
    Blob(Blob),
    Vector(Vector),
    Map(Map),
    Index(Index),
    Address(Address),
    Keyword(Symbolic),
    Symbol(Symbolic),
    Block(Block),
    Order(Order),
    Belief(Belief),
    Signed(Signed),
}

impl Cell {
    /// The kind of this cell.
    pub fn kind(&self) -> CellKind {
        match self {
            Cell::Null => CellKind::Null,
            Cell::Bool(_) => CellKind::Bool,
            Cell::ByteFlag(_) => CellKind::ByteFlag,
            Cell::Long(_) => CellKind::Long,
            Cell::Double(_) => CellKind::Double,
            Cell::BigInt(_) => CellKind::BigInt,
            Cell::String(_) => CellKind::String,
            Cell::Blob(_) => CellKind::Blob,
            Cell::Vector(_) => CellKind::Vector,
            Cell::Map(_) => CellKind::Map,
            Cell::Index(_) => CellKind::Index,
            Cell::Address(_) => CellKind::Address,
            Cell::Keyword(_) => CellKind::Keyword,
            Cell::Symbol(_) => CellKind::Symbol,
            Cell::Block(_) => CellKind::Block,
            Cell::Order(_) => CellKind::Order,
            Cell::Belief(_) => CellKind::Belief,
            Cell::Signed(_) => CellKind::Signed,
        }
    }

    /// All child refs of this cell, in encoding order.
    pub fn child_refs(&self) -> Vec<&ValueRef> {
        match self {
            Cell::String(text) => text.child_refs(),
            Cell::Blob(blob) => blob.child_refs(),
            Cell::Vector(vector) => vector.child_refs(),
            Cell::Map(map) => map.child_refs(),
            Cell::Index(index) => index.child_refs(),
            Cell::Block(block) => vec![block.transactions()],
            Cell::Order(order) => vec![order.blocks()],
            Cell::Belief(belief) => vec![belief.orders()],
            Cell::Signed(signed) => vec![signed.value_ref()],
            _ => Vec::new(),
        }
    }
}

impl Value {
    /// The null cell.
    pub fn null() -> Value {
        Value::new(Cell::Null)
    }

    /// A boolean cell.
    pub fn boolean(value: bool) -> Value {
        Value::new(Cell::Bool(value))
    }

    /// A byte-flag cell. Values 0 and 1 normalize to the booleans; values
    /// above 15 do not exist.
    pub fn byte_flag(value: u8) -> Option<Value> {
        match value {
            0 => Some(Value::boolean(false)),
            1 => Some(Value::boolean(true)),
            2..=15 => Some(Value::new(Cell::ByteFlag(value))),
            _ => None,
        }
    }

    /// A 64-bit signed integer cell.
    pub fn long(value: i64) -> Value {
        Value::new(Cell::Long(value))
    }

    /// A double cell. NaN payloads are canonicalized at encoding time.
    pub fn double(value: f64) -> Value {
        Value::new(Cell::Double(value))
    }

    /// An address cell.
    pub fn address(address: Address) -> Value {
        Value::new(Cell::Address(address))
    }

    /// An arbitrary-precision integer cell, or a plain long when the value
    /// fits 64 bits.
    pub fn integer(value: i128) -> Value {
        match BigInt::from_i128(value) {
            Some(big) => Value::new(Cell::BigInt(big)),
            None => Value::long(value as i64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_match_variants() {
        assert_eq!(Value::null().kind(), CellKind::Null);
        assert_eq!(Value::boolean(true).kind(), CellKind::Bool);
        assert_eq!(Value::long(7).kind(), CellKind::Long);
        assert_eq!(Value::double(1.5).kind(), CellKind::Double);
        assert_eq!(Value::address(Address::new(12)).kind(), CellKind::Address);
    }

    #[test]
    fn byte_flag_normalizes_booleans() {
        assert_eq!(Value::byte_flag(0).unwrap(), Value::boolean(false));
        assert_eq!(Value::byte_flag(1).unwrap(), Value::boolean(true));
        assert_eq!(Value::byte_flag(10).unwrap().kind(), CellKind::ByteFlag);
        assert!(Value::byte_flag(16).is_none());
    }

    #[test]
    fn integer_picks_long_when_small() {
        assert_eq!(Value::integer(42).kind(), CellKind::Long);
        assert_eq!(Value::integer(i64::MAX as i128).kind(), CellKind::Long);
        assert_eq!(
            Value::integer(i64::MAX as i128 + 1).kind(),
            CellKind::BigInt
        );
        assert_eq!(
            Value::integer(i64::MIN as i128 - 1).kind(),
            CellKind::BigInt
        );
    }

    #[test]
    fn primitives_have_no_children() {
        assert!(Value::long(1).cell().child_refs().is_empty());
        assert!(Value::null().cell().child_refs().is_empty());
    }
}
