//! Consensus record cells: blocks, orders, and beliefs.
//!
//! These are positional-ref records: the codec fixes each field's place in
//! the payload. They are deliberately never embedded (see
//! [`CellKind::is_embeddable`]) so that belief propagation always treats
//! them as announceable novelty.
//!
//! [`CellKind::is_embeddable`]: crate::tag::CellKind::is_embeddable

use bytes::Bytes;
use convex_crypto::AccountKey;

use crate::blob::Blob;
use crate::cell::Cell;
use crate::error::AccessError;
use crate::map::Map;
use crate::value::{Value, ValueRef};
use crate::vector::Vector;

/// A block of transactions proposed at a timestamp.
#[derive(Clone, Debug)]
pub struct Block {
    timestamp: i64,
    transactions: ValueRef,
}

impl Block {
    /// Create a block. `transactions` is a vector of signed values.
    pub fn new(timestamp: i64, transactions: Value) -> Block {
        Block {
            timestamp,
            transactions: ValueRef::of(transactions),
        }
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn transactions(&self) -> &ValueRef {
        &self.transactions
    }

    /// The transactions vector, if resident.
    pub fn transactions_vector(&self) -> Result<Vector, AccessError> {
        match self.transactions.value()?.cell() {
            Cell::Vector(vector) => Ok(vector.clone()),
            _ => Err(AccessError::WrongKind),
        }
    }

    pub(crate) fn from_parts(timestamp: i64, transactions: ValueRef) -> Block {
        Block {
            timestamp,
            transactions,
        }
    }
}

/// An ordering of blocks with consensus progress points.
#[derive(Clone, Debug)]
pub struct Order {
    proposal_point: u64,
    consensus_point: u64,
    blocks: ValueRef,
}

impl Order {
    /// An empty order with no blocks and zero progress.
    pub fn empty() -> Order {
        Order::new(0, 0, Value::new(Cell::Vector(Vector::empty())))
    }

    /// Create an order. `blocks` is a vector of signed blocks.
    pub fn new(proposal_point: u64, consensus_point: u64, blocks: Value) -> Order {
        Order {
            proposal_point,
            consensus_point,
            blocks: ValueRef::of(blocks),
        }
    }

    /// A new order with a signed block appended.
    pub fn append(&self, signed_block: Value) -> Result<Order, AccessError> {
        let blocks = self.blocks_vector()?;
        let mut values = Vec::with_capacity(blocks.count() as usize + 1);
        for i in 0..blocks.count() {
            values.push(blocks.get(i)?.expect("index within count"));
        }
        values.push(signed_block);
        Ok(Order {
            proposal_point: self.proposal_point,
            consensus_point: self.consensus_point,
            blocks: ValueRef::of(Value::new(Cell::Vector(Vector::from_values(values)))),
        })
    }

    pub fn proposal_point(&self) -> u64 {
        self.proposal_point
    }

    pub fn consensus_point(&self) -> u64 {
        self.consensus_point
    }

    pub fn blocks(&self) -> &ValueRef {
        &self.blocks
    }

    /// The blocks vector, if resident.
    pub fn blocks_vector(&self) -> Result<Vector, AccessError> {
        match self.blocks.value()?.cell() {
            Cell::Vector(vector) => Ok(vector.clone()),
            _ => Err(AccessError::WrongKind),
        }
    }

    pub(crate) fn from_parts(
        proposal_point: u64,
        consensus_point: u64,
        blocks: ValueRef,
    ) -> Order {
        Order {
            proposal_point,
            consensus_point,
            blocks,
        }
    }
}

/// A peer's belief: a map from account key to that peer's signed order.
#[derive(Clone, Debug)]
pub struct Belief {
    orders: ValueRef,
}

impl Belief {
    /// Create a belief from an orders map value.
    pub fn new(orders: Value) -> Belief {
        Belief {
            orders: ValueRef::of(orders),
        }
    }

    /// Build a belief from per-peer signed orders.
    pub fn from_orders(orders: impl IntoIterator<Item = (AccountKey, Value)>) -> Belief {
        let map = Map::from_entries(orders.into_iter().map(|(key, signed_order)| {
            (account_key_cell(&key), signed_order)
        }));
        Belief::new(Value::new(Cell::Map(map)))
    }

    pub fn orders(&self) -> &ValueRef {
        &self.orders
    }

    /// The signed order for a peer, if present and resident.
    pub fn order_for(&self, key: &AccountKey) -> Result<Option<Value>, AccessError> {
        let Cell::Map(map) = self.orders.value()?.cell() else {
            return Err(AccessError::WrongKind);
        };
        map.get(&account_key_cell(key))
    }

    pub(crate) fn from_parts(orders: ValueRef) -> Belief {
        Belief { orders }
    }
}

/// Account keys appear in belief maps as 32-byte blob cells.
pub fn account_key_cell(key: &AccountKey) -> Value {
    Value::new(Cell::Blob(Blob::from_bytes(Bytes::copy_from_slice(
        key.as_bytes(),
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use convex_crypto::KeyPair;

    #[test]
    fn block_holds_transactions() {
        let block = Block::new(1000, Value::vector([Value::long(1)]));
        assert_eq!(block.timestamp(), 1000);
        assert_eq!(block.transactions_vector().unwrap().count(), 1);
    }

    #[test]
    fn order_append_grows_blocks() {
        let kp = KeyPair::from_seed(7);
        let order = Order::empty();
        assert_eq!(order.blocks_vector().unwrap().count(), 0);

        let block = Value::new(Cell::Block(Block::new(0, Value::vector([]))));
        let signed = Value::signed(&kp, block);
        let order = order.append(signed.clone()).unwrap();
        let order = order.append(signed).unwrap();
        assert_eq!(order.blocks_vector().unwrap().count(), 2);
    }

    #[test]
    fn belief_maps_keys_to_orders() {
        let kp = KeyPair::from_seed(42);
        let order = Value::new(Cell::Order(Order::empty()));
        let signed_order = Value::signed(&kp, order);

        let belief = Belief::from_orders([(kp.account_key(), signed_order.clone())]);
        let found = belief.order_for(&kp.account_key()).unwrap();
        assert_eq!(found, Some(signed_order));

        let other = KeyPair::from_seed(43);
        assert_eq!(belief.order_for(&other.account_key()).unwrap(), None);
    }
}
