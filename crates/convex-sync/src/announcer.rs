//! Novelty collection and bottom-up persistence.

use bytes::Bytes;
use convex_data::{format, Value};
use convex_store::CellStore;
use tracing::debug;

use crate::error::SyncResult;
use crate::status::{CellStatus, StatusTable};

/// Tracks what one peer has been sent and computes broadcast deltas.
///
/// Both traversals are post-order, so children always precede parents: the
/// novelty list arrives children-first (which [`format::encode_delta`]
/// relies on), and `persist` never leaves a dangling child reference in the
/// store.
pub struct Announcer {
    statuses: StatusTable,
}

impl Announcer {
    /// Create an announcer with a fresh status table.
    pub fn new() -> Self {
        Self {
            statuses: StatusTable::new(),
        }
    }

    /// The underlying status table.
    pub fn statuses(&self) -> &StatusTable {
        &self.statuses
    }

    /// Post-order traversal invoking `handler` for every reachable
    /// non-embedded cell not yet announced, then marking it announced.
    ///
    /// Calling this twice with the same cell invokes the handler for
    /// nothing the second time.
    pub fn announce(&self, value: &Value, handler: &mut dyn FnMut(&Value)) {
        if self.already(value, CellStatus::Announced) {
            return;
        }
        for child in value.cell().child_refs() {
            if let Some(inner) = child.direct_value() {
                self.announce(inner, handler);
            }
        }
        if !value.is_embedded() {
            handler(value);
            self.statuses.advance(value.hash(), CellStatus::Announced);
        }
    }

    /// Collect the novelty for a cell: every not-yet-announced non-embedded
    /// cell in its graph, children before parents.
    pub fn novelty(&self, value: &Value) -> Vec<Value> {
        let mut novelty = Vec::new();
        self.announce(value, &mut |cell| novelty.push(cell.clone()));
        novelty
    }

    /// Collect novelty and pack it into one delta message with `value` as
    /// the root. An already-fully-announced graph yields a root-only delta,
    /// which receivers tolerate.
    pub fn delta(&self, value: &Value) -> SyncResult<Bytes> {
        let mut novelty = self.novelty(value);
        if novelty.last() != Some(value) {
            novelty.push(value.clone());
        }
        Ok(format::encode_delta(&novelty)?)
    }

    /// Write every reachable non-embedded cell to the store, children before
    /// parents, marking each persisted.
    ///
    /// Subtrees whose root is already in the store are skipped: the
    /// children-first write order guarantees they are complete.
    pub fn persist(&self, value: &Value, store: &dyn CellStore) -> SyncResult<()> {
        if !value.is_embedded() && store.contains(&value.hash())? {
            self.statuses.advance(value.hash(), CellStatus::Persisted);
            return Ok(());
        }
        for child in value.cell().child_refs() {
            if let Some(inner) = child.direct_value() {
                self.persist(inner, store)?;
            }
        }
        if !value.is_embedded() {
            let hash = value.hash();
            store.put(&hash, value.encoding().clone())?;
            self.statuses.advance(hash, CellStatus::Persisted);
            debug!(hash = %hash.short_hex(), "persisted cell");
        }
        Ok(())
    }

    fn already(&self, value: &Value, status: CellStatus) -> bool {
        !value.is_embedded() && self.statuses.status(&value.hash()) >= status
    }
}

impl Default for Announcer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convex_crypto::KeyPair;
    use convex_data::records::{Belief, Block, Order};
    use convex_data::{format, total_ref_count, Blob, Cell};
    use convex_store::{InMemoryCellStore, StoreResult};
    use convex_types::Hash;
    use rand::{RngCore, SeedableRng};
    use std::sync::Mutex;

    fn random_blob(seed: u64, len: usize) -> Value {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut data = vec![0u8; len];
        rng.fill_bytes(&mut data);
        Value::new(Cell::Blob(Blob::from_bytes(Bytes::from(data))))
    }

    fn block(timestamp: i64, transactions: Vec<Value>) -> Value {
        Value::new(Cell::Block(Block::new(
            timestamp,
            Value::vector(transactions),
        )))
    }

    fn belief_of(kp: &KeyPair, order: Order) -> Value {
        let signed_order = Value::signed(kp, Value::new(Cell::Order(order)));
        Value::new(Cell::Belief(Belief::from_orders([(
            kp.account_key(),
            signed_order,
        )])))
    }

    // -----------------------------------------------------------------------
    // Novelty collection
    // -----------------------------------------------------------------------

    #[test]
    fn embedded_roots_yield_only_their_heavy_children() {
        let announcer = Announcer::new();
        let blob = random_blob(1234, 2 * format::MAX_EMBEDDED_LENGTH);
        let v = Value::vector([Value::long(1), blob.clone(), blob.clone()]);
        assert!(v.is_embedded());

        let mut novelty = announcer.novelty(&v);
        if v.is_embedded() {
            novelty.push(v.clone());
        }
        // the blob once, the vector once
        assert_eq!(novelty.len(), 2);
        assert_eq!(novelty[0], blob);

        let delta = format::encode_delta(&novelty).unwrap();
        let decoded = format::decode_multi_cell(delta).unwrap();
        assert_eq!(decoded, v);
        assert_eq!(decoded.hash(), v.hash());
    }

    #[test]
    fn announce_is_idempotent() {
        let announcer = Announcer::new();
        let v = Value::vector([random_blob(9, 500), random_blob(10, 600)]);

        assert!(!announcer.novelty(&v).is_empty());
        assert!(announcer.novelty(&v).is_empty());
    }

    #[test]
    fn children_precede_parents_in_novelty() {
        let announcer = Announcer::new();
        let inner = random_blob(2, 300);
        let middle = Value::vector((0..40u64).map(|i| {
            if i == 0 {
                inner.clone()
            } else {
                random_blob(100 + i, 200)
            }
        }));
        let novelty = announcer.novelty(&middle);
        let position = |needle: &Value| {
            novelty
                .iter()
                .position(|v| v == needle)
                .expect("cell in novelty")
        };
        // the inner blob is referenced from the vector's tail subtree
        assert!(position(&inner) < novelty.len() - 1);
    }

    // -----------------------------------------------------------------------
    // Belief broadcast
    // -----------------------------------------------------------------------

    #[test]
    fn belief_delta_roundtrip() {
        let kp = KeyPair::from_seed(101);
        let mut order = Order::empty();
        order = order
            .append(Value::signed(&kp, block(0, vec![])))
            .unwrap();
        let transaction = Value::signed(
            &kp,
            Value::vector([Value::long(1), random_blob(55, 400)]),
        );
        order = order
            .append(Value::signed(&kp, block(2, vec![transaction])))
            .unwrap();
        order = order.append(Value::signed(&kp, block(2, vec![]))).unwrap();
        let belief = belief_of(&kp, order);

        let announcer = Announcer::new();
        let novelty = announcer.novelty(&belief);
        assert!(!novelty.is_empty());
        // post-order: the belief itself arrives last
        assert_eq!(novelty.last(), Some(&belief));

        let encoded = format::encode_delta(&novelty).unwrap();
        let decoded = format::decode_multi_cell(encoded).unwrap();
        assert_eq!(decoded, belief);
        assert_eq!(total_ref_count(&decoded), total_ref_count(&belief));

        // announcing again yields nothing
        assert!(announcer.novelty(&belief).is_empty());
    }

    #[test]
    fn extended_belief_sends_only_new_cells() {
        let kp = KeyPair::from_seed(101);
        let mut order = Order::empty();
        order = order
            .append(Value::signed(&kp, block(0, vec![])))
            .unwrap();
        let belief = belief_of(&kp, order.clone());

        let store = InMemoryCellStore::new();
        let announcer = Announcer::new();
        announcer.persist(&belief, &store).unwrap();
        assert_eq!(
            announcer.statuses().status(&belief.hash()),
            CellStatus::Persisted
        );

        let first = announcer.novelty(&belief);
        assert!(!first.is_empty());

        // extend with a new block and re-announce
        let extended_order = order
            .append(Value::signed(&kp, block(400, vec![])))
            .unwrap();
        let belief2 = belief_of(&kp, extended_order);

        let second = announcer.novelty(&belief2);
        assert!(!second.is_empty());
        assert!(second.len() < first.len() + 2);

        // the delta decodes to a belief whose old subtrees stay partial
        let encoded = format::encode_delta(&second).unwrap();
        let decoded = format::decode_multi_cell(encoded).unwrap();
        let stats = convex_data::ref_tree_stats(&decoded);
        assert!(stats.direct < stats.total);
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    struct RecordingStore {
        inner: InMemoryCellStore,
        log: Mutex<Vec<Hash>>,
    }

    impl RecordingStore {
        fn new() -> Self {
            Self {
                inner: InMemoryCellStore::new(),
                log: Mutex::new(Vec::new()),
            }
        }
    }

    impl CellStore for RecordingStore {
        fn get(&self, hash: &Hash) -> StoreResult<Option<Bytes>> {
            self.inner.get(hash)
        }

        fn put(&self, hash: &Hash, encoding: Bytes) -> StoreResult<()> {
            self.log.lock().expect("lock poisoned").push(*hash);
            self.inner.put(hash, encoding)
        }

        fn contains(&self, hash: &Hash) -> StoreResult<bool> {
            self.inner.contains(hash)
        }

        fn root_hash(&self) -> StoreResult<Option<Hash>> {
            self.inner.root_hash()
        }

        fn set_root_hash(&self, hash: Hash) -> StoreResult<()> {
            self.inner.set_root_hash(hash)
        }
    }

    #[test]
    fn persist_writes_children_before_parents() {
        let store = RecordingStore::new();
        let announcer = Announcer::new();

        let leaf = random_blob(77, 500);
        let middle = Value::vector([leaf.clone(), random_blob(78, 500)]);
        let kp = KeyPair::from_seed(3);
        let root = Value::signed(&kp, middle.clone());

        announcer.persist(&root, &store).unwrap();

        let log = store.log.lock().expect("lock poisoned").clone();
        let position = |hash: Hash| log.iter().position(|h| *h == hash).expect("written");
        assert!(position(leaf.hash()) < position(root.hash()));
        assert!(store.contains(&root.hash()).unwrap());
        assert!(store.contains(&leaf.hash()).unwrap());
    }

    #[test]
    fn persist_is_idempotent() {
        let store = RecordingStore::new();
        let announcer = Announcer::new();
        let v = Value::vector([random_blob(5, 400)]);

        announcer.persist(&v, &store).unwrap();
        let writes = store.log.lock().expect("lock poisoned").len();
        announcer.persist(&v, &store).unwrap();
        assert_eq!(store.log.lock().expect("lock poisoned").len(), writes);
    }

    #[test]
    fn persisted_graph_can_be_reloaded() {
        let store = InMemoryCellStore::new();
        let announcer = Announcer::new();
        let blob = random_blob(6, 900);
        let v = Value::vector((0..5u64).map(|i| {
            if i == 0 {
                blob.clone()
            } else {
                random_blob(600 + i, 500)
            }
        }));
        assert!(!v.is_embedded());
        announcer.persist(&v, &store).unwrap();

        // the root encoding decodes, and its child resolves from the store
        let root_encoding = store.get(&v.hash()).unwrap().expect("root stored");
        let decoded = format::read(root_encoding).unwrap();
        assert_eq!(decoded, v);
        let child_encoding = store.get(&blob.hash()).unwrap().expect("child stored");
        assert_eq!(format::read(child_encoding).unwrap(), blob);
    }

    #[test]
    fn persist_then_announce_still_produces_novelty() {
        let store = InMemoryCellStore::new();
        let announcer = Announcer::new();
        let v = Value::vector([random_blob(8, 700)]);

        announcer.persist(&v, &store).unwrap();
        assert!(!announcer.novelty(&v).is_empty());
        assert!(announcer.novelty(&v).is_empty());
    }

    #[test]
    fn delta_convenience_includes_embedded_root() {
        let announcer = Announcer::new();
        let v = Value::vector([Value::long(1), random_blob(90, 300)]);
        assert!(v.is_embedded());
        let delta = announcer.delta(&v).unwrap();
        let decoded = format::decode_multi_cell(delta).unwrap();
        assert_eq!(decoded, v);
    }
}
