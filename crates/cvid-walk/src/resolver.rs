//! Canonical-identity resolution.
//!
//! An object is *globally addressable* when its `__module__` and `__name__`
//! attributes are strings and looking the name up in the registered module
//! yields the very same object. Such an object can be identified by name
//! alone. Every failure on the way is expected and only logged.

use cvid_runtime::{Heap, Object};
use cvid_types::ObjId;
use tracing::trace;

use crate::names::StableModules;

/// How far an object can be identified by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Addressability {
    NotAddressable,
    /// The name round-trips, but the module is not trusted to stay put.
    Addressable { module: String, name: String },
    /// The name round-trips and may stand in for the object's contents.
    Stable { module: String, name: String },
}

impl Addressability {
    pub fn is_addressable(&self) -> bool {
        !matches!(self, Self::NotAddressable)
    }

    pub fn is_stable(&self) -> bool {
        matches!(self, Self::Stable { .. })
    }

    /// The `module|name` form folded into digests.
    pub fn qualified_name(&self) -> Option<String> {
        match self {
            Self::NotAddressable => None,
            Self::Addressable { module, name } | Self::Stable { module, name } => {
                Some(format!("{module}|{name}"))
            }
        }
    }
}

/// Decides whether objects may be identified by name.
#[derive(Clone, Debug, Default)]
pub struct CanonicalResolver {
    stable: StableModules,
}

impl CanonicalResolver {
    pub fn new(stable: StableModules) -> Self {
        Self { stable }
    }

    pub fn stable_modules(&self) -> &StableModules {
        &self.stable
    }

    pub fn resolve(&self, heap: &Heap, id: ObjId) -> Addressability {
        let (module, name) = match round_trip(heap, id) {
            Ok(found) => found,
            Err(reason) => {
                trace!(object = %id, %reason, "not globally addressable");
                return Addressability::NotAddressable;
            }
        };
        let builtin_callable = matches!(heap.get(id), Some(Object::BuiltinFunction { .. }));
        if self.stable.contains(&module) || builtin_callable {
            Addressability::Stable { module, name }
        } else {
            Addressability::Addressable { module, name }
        }
    }

    pub fn is_globally_addressable(&self, heap: &Heap, id: ObjId) -> bool {
        self.resolve(heap, id).is_addressable()
    }

    pub fn is_globally_addressable_and_stable(&self, heap: &Heap, id: ObjId) -> bool {
        self.resolve(heap, id).is_stable()
    }

    /// The name of a module that is its own registry entry and is stable.
    pub fn canonical_module_name(&self, heap: &Heap, id: ObjId) -> Option<String> {
        if !matches!(heap.get(id), Some(Object::Module(_))) {
            return None;
        }
        let name = heap
            .getattr(id, "__name__")
            .ok()
            .and_then(|n| heap.str_value(n))?;
        if heap.module(name) != Some(id) {
            trace!(module = name, object = %id, "module is not its registry entry");
            return None;
        }
        self.stable.contains(name).then(|| name.to_string())
    }
}

fn round_trip(heap: &Heap, id: ObjId) -> Result<(String, String), String> {
    let module_attr = heap.getattr(id, "__module__").map_err(|e| e.to_string())?;
    let name_attr = heap.getattr(id, "__name__").map_err(|e| e.to_string())?;
    let module = heap
        .str_value(module_attr)
        .ok_or("__module__ is not a string")?;
    let name = heap.str_value(name_attr).ok_or("__name__ is not a string")?;
    let module_obj = heap
        .module(module)
        .ok_or_else(|| format!("module {module:?} is not registered"))?;
    let found = heap.getattr(module_obj, name).map_err(|e| e.to_string())?;
    if found != id {
        return Err(format!("{module}.{name} resolves to {found}"));
    }
    Ok((module.to_string(), name.to_string()))
}
