//! Arena-backed dynamic object space.
//!
//! Objects live in a [`Heap`] and are addressed by [`ObjId`](cvid_types::ObjId)
//! handles whose identity is the arena slot. A heap bootstraps the builtin
//! type objects and the `builtins`, `os` and `weakref` modules; further
//! modules are created and registered by name. [`ObjectSpace`] puts the heap
//! behind the single lock every walk acquires.

pub mod error;
pub mod heap;
pub mod object;
pub mod space;

pub use error::{RuntimeError, RuntimeResult};
pub use heap::{CodeSpec, FunctionSpec, Heap};
pub use object::{
    BuiltinType, ClassObject, CodeObject, DescriptorKind, FunctionObject, Mapping, ModuleObject,
    Object,
};
pub use space::ObjectSpace;
