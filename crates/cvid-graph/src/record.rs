//! Structural records: the captured call sequence of one walk.

use std::fmt;

use cvid_types::Digest;

use crate::node::GraphNode;
use crate::visitor::GraphVisitor;

/// Produces diagnostic labels for nodes. Labels never reach a digest.
pub trait NodeLabeler {
    fn label(&self, node: &GraphNode) -> String;
}

/// The kind of a [`VisitRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Hash,
    Name,
    Node,
    NamedNode,
    Error,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hash => write!(f, "Hash"),
            Self::Name => write!(f, "Name"),
            Self::Node => write!(f, "Node"),
            Self::NamedNode => write!(f, "NamedNode"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// One entry of a structural record, mirroring one visitor callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VisitRecord {
    Hash(Digest),
    Name(String),
    Node(GraphNode),
    NamedNode(String, GraphNode),
    Error(String),
}

impl VisitRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Hash(_) => RecordKind::Hash,
            Self::Name(_) => RecordKind::Name,
            Self::Node(_) => RecordKind::Node,
            Self::NamedNode(..) => RecordKind::NamedNode,
            Self::Error(_) => RecordKind::Error,
        }
    }

    /// Re-issue the callback this entry was captured from.
    pub fn replay(&self, visitor: &mut dyn GraphVisitor) {
        match self {
            Self::Hash(h) => visitor.visit_hash(*h),
            Self::Name(name) => visitor.visit_name(name),
            Self::Node(node) => visitor.visit_node(node.clone()),
            Self::NamedNode(name, node) => visitor.visit_named_node(name, node.clone()),
            Self::Error(message) => visitor.visit_error(message),
        }
    }

    /// Single-line rendering used in instability reports.
    pub fn render(&self, labeler: &dyn NodeLabeler) -> String {
        match self {
            Self::Hash(h) => format!("Hash({})", h.short_hex()),
            Self::Name(name) => format!("Name({name})"),
            Self::Node(node) => format!("Node({})", labeler.label(node)),
            Self::NamedNode(name, node) => format!("NamedNode({name}={})", labeler.label(node)),
            Self::Error(message) => format!("Error({message})"),
        }
    }
}

/// Ordered log of the entries produced by one walk of a node.
///
/// Two records are equal iff their entry sequences are element-wise equal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StructuralRecord {
    entries: Vec<VisitRecord>,
}

impl StructuralRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[VisitRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: VisitRecord) {
        self.entries.push(entry);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VisitRecord> {
        self.entries.iter()
    }

    /// Returns `true` if the walk hit a structural fault.
    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|e| e.kind() == RecordKind::Error)
    }

    /// Every node referenced by this record, in order.
    pub fn children(&self) -> impl Iterator<Item = &GraphNode> {
        self.entries.iter().filter_map(|e| match e {
            VisitRecord::Node(node) | VisitRecord::NamedNode(_, node) => Some(node),
            _ => None,
        })
    }

    /// Feed the captured sequence into another visitor.
    pub fn replay(&self, visitor: &mut dyn GraphVisitor) {
        for entry in &self.entries {
            entry.replay(visitor);
        }
    }

    pub fn render_lines(&self, labeler: &dyn NodeLabeler) -> Vec<String> {
        self.entries.iter().map(|e| e.render(labeler)).collect()
    }

    /// One rendered entry per line, each terminated by a newline.
    pub fn render(&self, labeler: &dyn NodeLabeler) -> String {
        let mut out = String::new();
        for line in self.render_lines(labeler) {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

impl GraphVisitor for StructuralRecord {
    fn visit_hash(&mut self, hash: Digest) {
        self.entries.push(VisitRecord::Hash(hash));
    }

    fn visit_name(&mut self, name: &str) {
        self.entries.push(VisitRecord::Name(name.to_string()));
    }

    fn visit_node(&mut self, node: GraphNode) {
        self.entries.push(VisitRecord::Node(node));
    }

    fn visit_named_node(&mut self, name: &str, node: GraphNode) {
        self.entries
            .push(VisitRecord::NamedNode(name.to_string(), node));
    }

    fn visit_error(&mut self, message: &str) {
        self.entries.push(VisitRecord::Error(message.to_string()));
    }
}

impl<'a> IntoIterator for &'a StructuralRecord {
    type Item = &'a VisitRecord;
    type IntoIter = std::slice::Iter<'a, VisitRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
