//! Graph node handles.
//!
//! A [`GraphNode`] is either a node of the (already normalized) type graph or a
//! dynamic object living in an object space. Both are compared and hashed by
//! reference identity: two handles are equal when they point at the same
//! underlying node, never because their contents look alike.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use cvid_types::ObjId;

use crate::visitor::GraphVisitor;

/// A node of the type graph.
///
/// The walker knows nothing about the inside of individual type kinds; it
/// asks the node to enumerate its own compiler-visible internals. Enumeration
/// must be deterministic.
pub trait TypeNode: Send + Sync {
    /// Human-readable name, for diagnostics only.
    fn name(&self) -> String;

    /// Report every compiler-visible piece of this type to `visitor`.
    fn visit_compiler_visible_internals(&self, visitor: &mut dyn GraphVisitor);
}

/// Shared handle to a [`TypeNode`], compared by address.
#[derive(Clone)]
pub struct TypeRef(Arc<dyn TypeNode>);

impl TypeRef {
    /// Wrap a type node in a new handle.
    pub fn new<T: TypeNode + 'static>(node: T) -> Self {
        Self(Arc::new(node))
    }

    /// Wrap an existing shared type node.
    pub fn from_arc(node: Arc<dyn TypeNode>) -> Self {
        Self(node)
    }

    /// The type's diagnostic name.
    pub fn name(&self) -> String {
        self.0.name()
    }

    /// Delegate to the type's own internals enumerator.
    pub fn visit_compiler_visible_internals(&self, visitor: &mut dyn GraphVisitor) {
        self.0.visit_compiler_visible_internals(visitor);
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.addr() as usize).hash(state);
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self.name())
    }
}

/// A node inspected by the walker.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GraphNode {
    /// A node of the type graph.
    Type(TypeRef),
    /// A live object of the object space.
    Dynamic(ObjId),
}

impl GraphNode {
    /// Returns `true` for type-graph nodes.
    pub fn is_type(&self) -> bool {
        matches!(self, Self::Type(_))
    }

    /// The object handle, if this is a dynamic node.
    pub fn as_dynamic(&self) -> Option<ObjId> {
        match self {
            Self::Dynamic(id) => Some(*id),
            Self::Type(_) => None,
        }
    }
}

impl From<ObjId> for GraphNode {
    fn from(id: ObjId) -> Self {
        Self::Dynamic(id)
    }
}

impl From<TypeRef> for GraphNode {
    fn from(ty: TypeRef) -> Self {
        Self::Type(ty)
    }
}
