//! Statistics over the ref tree of a cell graph.

use crate::value::Value;

/// Counts over a cell's ref tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefTreeStats {
    /// Every ref in the tree, the root included.
    pub total: u64,
    /// Refs whose value is resident (embedded or resolved).
    pub direct: u64,
}

/// Compute ref tree statistics for a value.
///
/// Each ref occurrence counts once, so a child referenced twice contributes
/// twice; this makes the count a structural fingerprint that survives
/// encode/decode round trips.
pub fn ref_tree_stats(value: &Value) -> RefTreeStats {
    let mut stats = RefTreeStats {
        total: 1,
        direct: 1,
    };
    walk(value, &mut stats);
    stats
}

/// Total ref count: `1 +` the ref counts of all reachable children.
pub fn total_ref_count(value: &Value) -> u64 {
    ref_tree_stats(value).total
}

fn walk(value: &Value, stats: &mut RefTreeStats) {
    for child in value.cell().child_refs() {
        stats.total += 1;
        if let Some(child_value) = child.direct_value() {
            stats.direct += 1;
            walk(child_value, stats);
        }
    }
}
