//! Graph nodes, visitors and structural records.
//!
//! A walk of a [`GraphNode`] is reported through the five callbacks of
//! [`GraphVisitor`]. Capturing those callbacks in order yields a
//! [`StructuralRecord`]; replaying a record into another visitor reproduces
//! the exact call sequence, which is what makes record equality a faithful
//! proxy for digest equality.

pub mod node;
pub mod record;
pub mod visitor;

pub use node::{GraphNode, TypeNode, TypeRef};
pub use record::{NodeLabeler, RecordKind, StructuralRecord, VisitRecord};
pub use visitor::{FnVisitor, GraphVisitor};
