//! Cached walk entries.

use cvid_graph::{GraphNode, StructuralRecord};

/// A node together with the record of its first walk.
///
/// Holding the node keeps its handle alive for as long as the entry exists,
/// so a cached identity is never confused with a later object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    pub node: GraphNode,
    /// The record observed on first visit.
    pub record: StructuralRecord,
    /// How many times the node has been visited through the cache.
    pub visits: u64,
}

impl CacheEntry {
    /// A freshly stored entry, counting the visit that stored it.
    pub fn new(node: GraphNode, record: StructuralRecord) -> Self {
        Self {
            node,
            record,
            visits: 1,
        }
    }

    /// Returns `true` if `fresh` reproduces the stored record.
    pub fn matches(&self, fresh: &StructuralRecord) -> bool {
        self.record == *fresh
    }
}
