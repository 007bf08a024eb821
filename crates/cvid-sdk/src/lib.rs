//! Compiler-visible identity service.
//!
//! [`IdentityService`] is the entry point for embedding applications: it
//! owns the walk cache for one object space and turns graph nodes into
//! verified structural records and content digests.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use cvid_graph::GraphNode;
//! use cvid_runtime::ObjectSpace;
//! use cvid_sdk::IdentityService;
//!
//! let space = Arc::new(ObjectSpace::new());
//! let items = space.with(|heap| {
//!     let a = heap.int(1);
//!     heap.tuple(vec![a])
//! });
//! let service = IdentityService::new(space);
//! let digest = service.digest(&GraphNode::from(items)).unwrap();
//! assert_eq!(digest, service.digest(&GraphNode::from(items)).unwrap());
//! ```

pub mod config;
pub mod digest;
pub mod error;
pub mod service;

pub use config::SessionConfig;
pub use digest::DigestBuilder;
pub use error::{SdkError, SdkResult};
pub use service::IdentityService;

// Re-export key types
pub use cvid_cache::{CacheError, InstabilityReport, UnstableNode};
pub use cvid_graph::{GraphNode, GraphVisitor, StructuralRecord, TypeNode, TypeRef};
pub use cvid_runtime::{Heap, ObjectSpace};
pub use cvid_types::{Digest, ObjId};
