//! The walk cache and its instability verifier.
//!
//! [`WalkCache`] remembers the record of every node the first time it is
//! visited. Entries are kept in first-visit order so that scans and reports
//! are deterministic; a `HashMap` indexes them by node identity.

use std::collections::HashMap;

use cvid_graph::{GraphNode, GraphVisitor, NodeLabeler, StructuralRecord};
use cvid_walk::Walker;
use tracing::{debug, error, info};

use crate::entry::CacheEntry;
use crate::error::{CacheError, CacheResult};
use crate::report::{InstabilityReport, UnstableNode};

/// Cap on the number of unstable nodes detailed in one report.
pub const DEFAULT_MAX_REPORTED: usize = 1000;

/// First-observed walk records, keyed by node identity.
///
/// Entries live until [`reset`](Self::reset); there is no eviction.
pub struct WalkCache {
    walker: Walker,
    entries: Vec<CacheEntry>,
    index: HashMap<GraphNode, usize>,
    max_reported: usize,
    column_width: usize,
}

impl std::fmt::Debug for WalkCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalkCache")
            .field("entries", &self.entries.len())
            .field("max_reported", &self.max_reported)
            .finish()
    }
}

impl WalkCache {
    /// An empty cache over `walker`.
    pub fn new(walker: Walker) -> Self {
        Self {
            walker,
            entries: Vec::new(),
            index: HashMap::new(),
            max_reported: DEFAULT_MAX_REPORTED,
            column_width: cvid_diff::DEFAULT_COLUMN_WIDTH,
        }
    }

    /// Detail at most `max` unstable nodes per report.
    pub fn with_max_reported(mut self, max: usize) -> Self {
        self.max_reported = max;
        self
    }

    /// Fit each report diff column to `width` characters.
    pub fn with_column_width(mut self, width: usize) -> Self {
        self.column_width = width;
        self
    }

    pub fn walker(&self) -> &Walker {
        &self.walker
    }

    /// Number of cached nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been visited since the last reset.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, node: &GraphNode) -> bool {
        self.index.contains_key(node)
    }

    /// The cached entry for `node`, if it has been visited.
    pub fn get(&self, node: &GraphNode) -> Option<&CacheEntry> {
        self.index.get(node).map(|&slot| &self.entries[slot])
    }

    /// The record stored on the first visit of `node`.
    pub fn cached_record(&self, node: &GraphNode) -> Option<&StructuralRecord> {
        self.get(node).map(|entry| &entry.record)
    }

    /// Cached nodes in first-visit order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.entries.iter().map(|entry| &entry.node)
    }

    // ---------------------------------------------------------------
    // Visiting
    // ---------------------------------------------------------------

    /// Walk `node`, verify the walk against the first one, and return it.
    ///
    /// The first visit stores the record. A later visit whose record differs
    /// triggers a full instability scan; the scan's report is returned as
    /// [`CacheError::Unstable`], or [`CacheError::UnattributedMismatch`] if
    /// the scan finds every node stable.
    pub fn verified_record(&mut self, node: &GraphNode) -> CacheResult<StructuralRecord> {
        let fresh = self.walker.record(node);

        let slot = self.index.get(node).copied();
        let matches = match slot {
            Some(slot) => {
                let entry = &mut self.entries[slot];
                entry.visits += 1;
                entry.matches(&fresh)
            }
            None => {
                debug!(
                    node = %self.label(node),
                    entries = fresh.len(),
                    "storing first walk"
                );
                self.index.insert(node.clone(), self.entries.len());
                self.entries.push(CacheEntry::new(node.clone(), fresh.clone()));
                true
            }
        };

        if !matches {
            self.check_for_instability()?;
            let label = self.label(node);
            error!(node = %label, "record changed but no unstable node was found");
            return Err(CacheError::UnattributedMismatch { node: label });
        }
        Ok(fresh)
    }

    /// Walk `node` through the cache, streaming the verified record into
    /// `visitor`. Nothing reaches the visitor if verification fails.
    pub fn visit(&mut self, node: &GraphNode, visitor: &mut dyn GraphVisitor) -> CacheResult<()> {
        let record = self.verified_record(node)?;
        record.replay(visitor);
        Ok(())
    }

    // ---------------------------------------------------------------
    // Verification
    // ---------------------------------------------------------------

    /// Re-walk every cached node and fail if any walk changed.
    pub fn check_for_instability(&self) -> CacheResult<()> {
        let labeler: &dyn NodeLabeler = &**self.walker.space();
        let mut nodes = Vec::new();
        let mut total = 0;

        for entry in &self.entries {
            let fresh = self.walker.record(&entry.node);
            if entry.matches(&fresh) {
                continue;
            }
            total += 1;
            if nodes.len() < self.max_reported {
                nodes.push(UnstableNode::new(
                    labeler.label(&entry.node),
                    entry.record.render_lines(labeler),
                    fresh.render_lines(labeler),
                ));
            }
        }

        if total == 0 {
            return Ok(());
        }

        let report = InstabilityReport::new(nodes, total).with_column_width(self.column_width);
        error!(
            unstable = total,
            first = report.labels().next().unwrap_or_default(),
            "walk cache found unstable nodes"
        );
        Err(CacheError::Unstable(Box::new(report)))
    }

    /// Forget every cached record.
    pub fn reset(&mut self) {
        info!(entries = self.entries.len(), "resetting walk cache");
        self.entries.clear();
        self.index.clear();
    }

    fn label(&self, node: &GraphNode) -> String {
        NodeLabeler::label(&**self.walker.space(), node)
    }
}
