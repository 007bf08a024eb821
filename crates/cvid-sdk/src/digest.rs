//! Content digests of graph nodes.
//!
//! A node's digest folds every entry of its verified record into an
//! [`Accumulator`], replacing each referenced node by that node's digest.
//! Constants also fold their value fingerprint. A reference to a node that
//! is still being digested further up the current path is folded as a
//! back-reference carrying the distance to it, which makes cyclic graphs
//! terminate while keeping digests independent of object handles.

use std::collections::HashMap;

use cvid_cache::WalkCache;
use cvid_crypto::Accumulator;
use cvid_graph::{GraphNode, VisitRecord};
use cvid_types::Digest;
use tracing::trace;

use crate::error::SdkResult;

const TAG_HASH: u64 = 1;
const TAG_NAME: u64 = 2;
const TAG_NODE: u64 = 3;
const TAG_NAMED_NODE: u64 = 4;
const TAG_ERROR: u64 = 5;
const TAG_BACK_REFERENCE: u64 = 6;
const TAG_VALUE: u64 = 7;

/// No back-reference escapes the subtree.
const CLOSED: usize = usize::MAX;

/// Computes digests for one request.
///
/// Memoized results live only as long as the builder, so every request
/// re-verifies each node it reaches against the walk cache.
pub struct DigestBuilder<'c> {
    cache: &'c mut WalkCache,
    /// Depth of every node on the current path.
    path: HashMap<GraphNode, usize>,
    memo: HashMap<GraphNode, Digest>,
}

impl<'c> DigestBuilder<'c> {
    pub fn new(cache: &'c mut WalkCache) -> Self {
        Self {
            cache,
            path: HashMap::new(),
            memo: HashMap::new(),
        }
    }

    /// The digest of `node`.
    pub fn digest(&mut self, node: &GraphNode) -> SdkResult<Digest> {
        let (digest, _) = self.visit(node, 0)?;
        Ok(digest)
    }

    /// Number of nodes whose digest is memoized.
    pub fn memoized(&self) -> usize {
        self.memo.len()
    }

    /// Digest `node` at `depth`, returning the shallowest path depth any
    /// back-reference inside it points at (or [`CLOSED`]).
    fn visit(&mut self, node: &GraphNode, depth: usize) -> SdkResult<(Digest, usize)> {
        if let Some(digest) = self.memo.get(node) {
            return Ok((*digest, CLOSED));
        }

        let record = self.cache.verified_record(node)?;
        self.path.insert(node.clone(), depth);

        let mut acc = Accumulator::for_nodes();
        if let Some(fingerprint) = self.cache.walker().value_fingerprint(node) {
            acc.fold(TAG_VALUE);
            acc.fold_digest(&fingerprint);
        }

        let mut low = CLOSED;
        let result = self.fold_entries(&mut acc, record.entries(), depth, &mut low);
        self.path.remove(node);
        result?;

        let digest = acc.finalize();
        let closed = low >= depth;
        if closed {
            self.memo.insert(node.clone(), digest);
            low = CLOSED;
        }
        trace!(depth, digest = %digest.short_hex(), closed, "digested node");
        Ok((digest, low))
    }

    fn fold_entries(
        &mut self,
        acc: &mut Accumulator,
        entries: &[VisitRecord],
        depth: usize,
        low: &mut usize,
    ) -> SdkResult<()> {
        for entry in entries {
            match entry {
                VisitRecord::Hash(hash) => {
                    acc.fold(TAG_HASH);
                    acc.fold_digest(hash);
                }
                VisitRecord::Name(name) => {
                    acc.fold(TAG_NAME);
                    acc.fold_str(name);
                }
                VisitRecord::Node(child) => {
                    acc.fold(TAG_NODE);
                    self.fold_child(acc, child, depth, low)?;
                }
                VisitRecord::NamedNode(name, child) => {
                    acc.fold(TAG_NAMED_NODE);
                    acc.fold_str(name);
                    self.fold_child(acc, child, depth, low)?;
                }
                VisitRecord::Error(message) => {
                    acc.fold(TAG_ERROR);
                    acc.fold_str(message);
                }
            }
        }
        Ok(())
    }

    fn fold_child(
        &mut self,
        acc: &mut Accumulator,
        child: &GraphNode,
        depth: usize,
        low: &mut usize,
    ) -> SdkResult<()> {
        if let Some(&target) = self.path.get(child) {
            acc.fold(TAG_BACK_REFERENCE);
            acc.fold((depth - target) as u64);
            *low = (*low).min(target);
            return Ok(());
        }
        let (digest, child_low) = self.visit(child, depth + 1)?;
        acc.fold_digest(&digest);
        *low = (*low).min(child_low);
        Ok(())
    }
}
