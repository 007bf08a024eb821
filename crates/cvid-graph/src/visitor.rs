use cvid_types::Digest;

use crate::node::GraphNode;

/// The five-channel visitor every walk reports through.
///
/// Callbacks are invoked in a fixed order per node kind. Anything that
/// consumes a walk (digest computation, record capture, rendering) implements
/// this trait; none of them may observe a different sequence.
pub trait GraphVisitor {
    /// A raw contribution: a discriminant, count, marker, or content hash.
    fn visit_hash(&mut self, hash: Digest);

    /// An opaque string folded by content.
    fn visit_name(&mut self, name: &str);

    /// Another node that is part of this node's structure.
    fn visit_node(&mut self, node: GraphNode);

    /// A name paired with a node, from a name→value mapping.
    fn visit_named_node(&mut self, name: &str, node: GraphNode);

    /// The walk met a shape it did not expect.
    fn visit_error(&mut self, message: &str);
}

/// A [`GraphVisitor`] assembled from five closures.
pub struct FnVisitor<H, N, R, P, E> {
    on_hash: H,
    on_name: N,
    on_node: R,
    on_named_node: P,
    on_error: E,
}

impl<H, N, R, P, E> FnVisitor<H, N, R, P, E>
where
    H: FnMut(Digest),
    N: FnMut(&str),
    R: FnMut(GraphNode),
    P: FnMut(&str, GraphNode),
    E: FnMut(&str),
{
    pub fn new(on_hash: H, on_name: N, on_node: R, on_named_node: P, on_error: E) -> Self {
        Self {
            on_hash,
            on_name,
            on_node,
            on_named_node,
            on_error,
        }
    }
}

impl<H, N, R, P, E> GraphVisitor for FnVisitor<H, N, R, P, E>
where
    H: FnMut(Digest),
    N: FnMut(&str),
    R: FnMut(GraphNode),
    P: FnMut(&str, GraphNode),
    E: FnMut(&str),
{
    fn visit_hash(&mut self, hash: Digest) {
        (self.on_hash)(hash)
    }

    fn visit_name(&mut self, name: &str) {
        (self.on_name)(name)
    }

    fn visit_node(&mut self, node: GraphNode) {
        (self.on_node)(node)
    }

    fn visit_named_node(&mut self, name: &str, node: GraphNode) {
        (self.on_named_node)(name, node)
    }

    fn visit_error(&mut self, message: &str) {
        (self.on_error)(message)
    }
}
