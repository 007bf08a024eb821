//! Classification of dynamic objects into walk shapes.
//!
//! Rules are tried in a fixed order and the first match wins. The order is
//! significant: a function that is globally addressable and stable is
//! identified by name and never decomposed.

use cvid_graph::TypeRef;
use cvid_runtime::{BuiltinType, CodeObject, FunctionObject, Heap, Object};
use cvid_types::ObjId;

use crate::names::SIMPLE_CONSTANT_TYPES;
use crate::resolver::{Addressability, CanonicalResolver};

/// What the walker does with one dynamic object.
#[derive(Clone, Debug)]
pub enum Shape<'h> {
    /// The handle names no live object.
    Dangling,
    Environment,
    SimpleConstant,
    TypedInstance(&'h TypeRef),
    CanonicalModule(String),
    GlobalName(String),
    TypedClass(&'h TypeRef),
    Code(&'h CodeObject),
    Function(&'h FunctionObject),
    Class {
        dict: Option<ObjId>,
        bases: Vec<ObjId>,
    },
    StaticMethod(Option<ObjId>),
    ClassMethod(Option<ObjId>),
    Tuple(&'h [ObjId]),
    MutableContainer(ObjId),
    Cell(Option<ObjId>),
    MethodDescriptor {
        owner: ObjId,
        name: ObjId,
    },
    /// Identified by its runtime type only.
    Opaque(ObjId),
}

/// Whether `id` is a leaf whose value, if anything, is hashed separately.
pub fn is_simple_constant(heap: &Heap, id: ObjId) -> bool {
    match heap.get(id) {
        Some(
            Object::None
            | Object::Bool(_)
            | Object::Int(_)
            | Object::Float(_)
            | Object::Str(_)
            | Object::Bytes(_)
            | Object::Descriptor(_),
        ) => true,
        Some(Object::Builtin { kind, .. }) => SIMPLE_CONSTANT_TYPES.contains(kind),
        Some(Object::Module(_)) => id == heap.builtins_module(),
        Some(Object::Dict(_)) => heap.getattr(heap.builtins_module(), "__dict__").ok() == Some(id),
        _ => false,
    }
}

pub fn classify<'h>(heap: &'h Heap, resolver: &CanonicalResolver, id: ObjId) -> Shape<'h> {
    let Some(object) = heap.get(id) else {
        return Shape::Dangling;
    };

    if matches!(object, Object::Environ(_)) {
        return Shape::Environment;
    }
    if is_simple_constant(heap, id) {
        return Shape::SimpleConstant;
    }
    if let Object::TypedInstance(ty) = object {
        return Shape::TypedInstance(ty);
    }
    if let Some(name) = resolver.canonical_module_name(heap, id) {
        return Shape::CanonicalModule(name);
    }
    if let resolved @ Addressability::Stable { .. } = resolver.resolve(heap, id) {
        if let Some(qualified) = resolved.qualified_name() {
            return Shape::GlobalName(qualified);
        }
    }

    match object {
        Object::TypedClass(ty) => Shape::TypedClass(ty),
        Object::Code(code) => Shape::Code(code),
        Object::Function(func) => Shape::Function(func),
        Object::Class(class) => Shape::Class {
            dict: class.dict,
            bases: class.bases.clone(),
        },
        Object::Builtin { .. } => Shape::Class {
            dict: None,
            bases: vec![heap.builtin_type(BuiltinType::Object)],
        },
        Object::StaticMethod(func) => Shape::StaticMethod(*func),
        Object::ClassMethod(func) => Shape::ClassMethod(*func),
        Object::Tuple(items) => Shape::Tuple(items),
        Object::Dict(_)
        | Object::Set(_)
        | Object::List(_)
        | Object::WeakSet(_)
        | Object::WeakKeyDictionary(_)
        | Object::WeakValueDictionary(_) => Shape::MutableContainer(runtime_type(heap, id)),
        Object::Cell(contents) => Shape::Cell(*contents),
        Object::MethodDescriptor { owner, name, .. } => Shape::MethodDescriptor {
            owner: *owner,
            name: *name,
        },
        _ => Shape::Opaque(runtime_type(heap, id)),
    }
}

fn runtime_type(heap: &Heap, id: ObjId) -> ObjId {
    heap.type_of(id)
        .unwrap_or_else(|_| heap.builtin_type(BuiltinType::Object))
}
