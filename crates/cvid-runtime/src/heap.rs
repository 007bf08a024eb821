use std::collections::{HashMap, HashSet};

use cvid_graph::{GraphNode, NodeLabeler, TypeRef};
use cvid_types::ObjId;
use tracing::debug;

use crate::error::{RuntimeError, RuntimeResult};
use crate::object::{
    BuiltinType, ClassObject, CodeObject, DescriptorKind, FunctionObject, Mapping, ModuleObject,
    Object,
};

/// Construction parameters for a code object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeSpec {
    pub name: String,
    pub filename: String,
    pub argcount: u32,
    pub kwonlyargcount: u32,
    pub nlocals: u32,
    pub stacksize: u32,
    pub flags: u32,
    pub firstlineno: u32,
    pub bytecode: Vec<u8>,
    pub consts: Vec<ObjId>,
    pub names: Vec<String>,
    pub varnames: Vec<String>,
    pub freevars: Vec<String>,
    pub cellvars: Vec<String>,
    pub linetable: Vec<u8>,
}

impl CodeSpec {
    pub fn new(name: impl Into<String>, bytecode: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            filename: "<memory>".to_string(),
            argcount: 0,
            kwonlyargcount: 0,
            nlocals: 0,
            stacksize: 1,
            flags: 0,
            firstlineno: 1,
            bytecode,
            consts: Vec::new(),
            names: Vec::new(),
            varnames: Vec::new(),
            freevars: Vec::new(),
            cellvars: Vec::new(),
            linetable: Vec::new(),
        }
    }
}

/// Construction parameters for a function object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionSpec {
    pub name: String,
    pub module: String,
    pub code: ObjId,
    pub globals: ObjId,
    pub closure: Option<Vec<ObjId>>,
    pub annotations: Option<ObjId>,
    pub defaults: Option<ObjId>,
    pub kwdefaults: Option<ObjId>,
}

impl FunctionSpec {
    pub fn new(name: impl Into<String>, module: impl Into<String>, code: ObjId, globals: ObjId) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            code,
            globals,
            closure: None,
            annotations: None,
            defaults: None,
            kwdefaults: None,
        }
    }
}

/// Arena of live objects plus the module registry.
///
/// Object identity is the arena slot. Slots are never reused, so an [`ObjId`]
/// names the same object for the lifetime of the heap.
pub struct Heap {
    objects: Vec<Object>,
    builtin_types: Vec<ObjId>,
    modules: HashMap<String, ObjId>,
    none: ObjId,
    true_obj: ObjId,
    false_obj: ObjId,
    builtins_module: ObjId,
    environ: ObjId,
}

impl Heap {
    /// A heap holding the singletons, builtin types and the `builtins`, `os`
    /// and `weakref` modules.
    pub fn new() -> Self {
        let placeholder = ObjId::from_index(0);
        let mut heap = Self {
            objects: Vec::new(),
            builtin_types: Vec::with_capacity(BuiltinType::ALL.len()),
            modules: HashMap::new(),
            none: placeholder,
            true_obj: placeholder,
            false_obj: placeholder,
            builtins_module: placeholder,
            environ: placeholder,
        };
        heap.none = heap.alloc(Object::None);
        heap.true_obj = heap.alloc(Object::Bool(true));
        heap.false_obj = heap.alloc(Object::Bool(false));

        for kind in BuiltinType::ALL {
            let module = heap.str(kind.module());
            let name = heap.str(kind.name());
            let id = heap.alloc(Object::Builtin { kind, module, name });
            heap.builtin_types.push(id);
        }

        heap.builtins_module = heap.bootstrap_module("builtins", Vec::new());

        let environ_dict = heap.dict();
        heap.environ = heap.alloc(Object::Environ(environ_dict));
        let environ = heap.environ;
        heap.bootstrap_module("os", vec![("environ", environ)]);
        heap.bootstrap_module("weakref", Vec::new());
        heap
    }

    fn bootstrap_module(&mut self, name: &str, mut members: Vec<(&str, ObjId)>) -> ObjId {
        for kind in BuiltinType::ALL {
            if kind.module() == name {
                members.push((kind.name(), self.builtin_type(kind)));
            }
        }
        let name_id = self.str(name);
        members.insert(0, ("__name__", name_id));
        let dict = self.dict_from(&members);
        let id = self.alloc(Object::Module(ModuleObject {
            name: name_id,
            dict,
        }));
        self.modules.insert(name.to_string(), id);
        id
    }

    fn alloc(&mut self, object: Object) -> ObjId {
        let id = ObjId::from_index(self.objects.len() as u32);
        self.objects.push(object);
        id
    }

    /// Number of allocated objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: ObjId) -> bool {
        id.index() < self.objects.len()
    }

    pub fn get(&self, id: ObjId) -> Option<&Object> {
        self.objects.get(id.index())
    }

    pub fn get_mut(&mut self, id: ObjId) -> Option<&mut Object> {
        self.objects.get_mut(id.index())
    }

    /// Like [`Heap::get`], failing on a dangling handle.
    pub fn object(&self, id: ObjId) -> RuntimeResult<&Object> {
        self.get(id).ok_or(RuntimeError::DanglingObject(id))
    }

    // -- singletons ---------------------------------------------------------

    pub fn none(&self) -> ObjId {
        self.none
    }

    pub fn bool(&self, value: bool) -> ObjId {
        if value {
            self.true_obj
        } else {
            self.false_obj
        }
    }

    pub fn builtin_type(&self, kind: BuiltinType) -> ObjId {
        self.builtin_types[kind.index()]
    }

    pub fn builtins_module(&self) -> ObjId {
        self.builtins_module
    }

    /// The `os.environ` mapping.
    pub fn environ(&self) -> ObjId {
        self.environ
    }

    // -- constructors -------------------------------------------------------

    pub fn str(&mut self, value: &str) -> ObjId {
        self.alloc(Object::Str(value.to_string()))
    }

    pub fn int(&mut self, value: i64) -> ObjId {
        self.alloc(Object::Int(value))
    }

    pub fn float(&mut self, value: f64) -> ObjId {
        self.alloc(Object::Float(value))
    }

    pub fn bytes(&mut self, value: &[u8]) -> ObjId {
        self.alloc(Object::Bytes(value.to_vec()))
    }

    pub fn tuple(&mut self, items: Vec<ObjId>) -> ObjId {
        self.alloc(Object::Tuple(items))
    }

    pub fn list(&mut self, items: Vec<ObjId>) -> ObjId {
        self.alloc(Object::List(items))
    }

    pub fn set(&mut self, items: Vec<ObjId>) -> ObjId {
        self.alloc(Object::Set(items))
    }

    /// An empty dict.
    pub fn dict(&mut self) -> ObjId {
        self.alloc(Object::Dict(Mapping::new()))
    }

    /// A dict with string keys, in the given order.
    pub fn dict_from(&mut self, entries: &[(&str, ObjId)]) -> ObjId {
        let mut mapping = Mapping::new();
        for (key, value) in entries {
            let key = self.str(key);
            mapping.insert(key, *value);
        }
        self.alloc(Object::Dict(mapping))
    }

    pub fn weak_set(&mut self) -> ObjId {
        self.alloc(Object::WeakSet(Vec::new()))
    }

    pub fn weak_key_dict(&mut self) -> ObjId {
        self.alloc(Object::WeakKeyDictionary(Mapping::new()))
    }

    pub fn weak_value_dict(&mut self) -> ObjId {
        self.alloc(Object::WeakValueDictionary(Mapping::new()))
    }

    pub fn cell(&mut self, contents: Option<ObjId>) -> ObjId {
        self.alloc(Object::Cell(contents))
    }

    pub fn static_method(&mut self, func: Option<ObjId>) -> ObjId {
        self.alloc(Object::StaticMethod(func))
    }

    pub fn class_method(&mut self, func: Option<ObjId>) -> ObjId {
        self.alloc(Object::ClassMethod(func))
    }

    pub fn descriptor(&mut self, kind: DescriptorKind) -> ObjId {
        self.alloc(Object::Descriptor(kind))
    }

    pub fn builtin_function(&mut self, module: &str, name: &str) -> ObjId {
        let module = self.str(module);
        let name = self.str(name);
        self.alloc(Object::BuiltinFunction { module, name })
    }

    pub fn method_descriptor(&mut self, owner: ObjId, name: &str) -> ObjId {
        let name = self.str(name);
        self.alloc(Object::MethodDescriptor {
            owner,
            name,
            class_method: false,
        })
    }

    pub fn class_method_descriptor(&mut self, owner: ObjId, name: &str) -> ObjId {
        let name = self.str(name);
        self.alloc(Object::MethodDescriptor {
            owner,
            name,
            class_method: true,
        })
    }

    pub fn typed_instance(&mut self, ty: TypeRef) -> ObjId {
        self.alloc(Object::TypedInstance(ty))
    }

    pub fn typed_class(&mut self, ty: TypeRef) -> ObjId {
        self.alloc(Object::TypedClass(ty))
    }

    /// A fresh module, registered under `name` (shadowing any previous entry).
    pub fn new_module(&mut self, name: &str) -> ObjId {
        let name_id = self.str(name);
        let dict = self.dict_from(&[("__name__", name_id)]);
        let id = self.alloc(Object::Module(ModuleObject {
            name: name_id,
            dict,
        }));
        self.register_module(name, id);
        id
    }

    /// A class whose dict holds the usual bookkeeping entries plus `members`.
    pub fn new_class(
        &mut self,
        name: &str,
        module: &str,
        bases: Vec<ObjId>,
        members: &[(&str, ObjId)],
    ) -> ObjId {
        let name_id = self.str(name);
        let module_id = self.str(module);
        let mut entries = vec![
            ("__module__", module_id),
            ("__qualname__", name_id),
            ("__doc__", self.none),
        ];
        entries.extend_from_slice(members);
        let dict = self.dict_from(&entries);
        self.alloc(Object::Class(ClassObject {
            name: name_id,
            dict: Some(dict),
            bases,
        }))
    }

    pub fn instance(&mut self, class: ObjId) -> ObjId {
        let dict = self.dict();
        self.alloc(Object::Instance { class, dict })
    }

    pub fn new_code(&mut self, spec: CodeSpec) -> ObjId {
        let name = self.str(&spec.name);
        let filename = self.str(&spec.filename);
        let names = self.strs(&spec.names);
        let varnames = self.strs(&spec.varnames);
        let freevars = self.strs(&spec.freevars);
        let cellvars = self.strs(&spec.cellvars);
        let linetable = self.bytes(&spec.linetable);
        self.alloc(Object::Code(CodeObject {
            name,
            filename,
            argcount: spec.argcount,
            kwonlyargcount: spec.kwonlyargcount,
            nlocals: spec.nlocals,
            stacksize: spec.stacksize,
            flags: spec.flags,
            firstlineno: spec.firstlineno,
            bytecode: spec.bytecode,
            consts: spec.consts,
            names,
            varnames,
            freevars,
            cellvars,
            linetable,
        }))
    }

    fn strs(&mut self, values: &[String]) -> Vec<ObjId> {
        values.iter().map(|v| self.str(v)).collect()
    }

    pub fn new_function(&mut self, spec: FunctionSpec) -> ObjId {
        let name = self.str(&spec.name);
        let module = self.str(&spec.module);
        self.alloc(Object::Function(FunctionObject {
            name,
            module,
            code: spec.code,
            globals: spec.globals,
            closure: spec.closure,
            annotations: spec.annotations,
            defaults: spec.defaults,
            kwdefaults: spec.kwdefaults,
        }))
    }

    // -- mutation -----------------------------------------------------------

    pub fn set_cell(&mut self, cell: ObjId, contents: Option<ObjId>) -> RuntimeResult<()> {
        match self.get_mut(cell) {
            Some(Object::Cell(slot)) => {
                *slot = contents;
                Ok(())
            }
            Some(_) => Err(RuntimeError::WrongKind {
                object: cell,
                expected: "cell",
            }),
            None => Err(RuntimeError::DanglingObject(cell)),
        }
    }

    pub fn list_push(&mut self, list: ObjId, value: ObjId) -> RuntimeResult<()> {
        match self.get_mut(list) {
            Some(Object::List(items)) => {
                items.push(value);
                Ok(())
            }
            Some(_) => Err(RuntimeError::WrongKind {
                object: list,
                expected: "list",
            }),
            None => Err(RuntimeError::DanglingObject(list)),
        }
    }

    // -- dicts --------------------------------------------------------------

    /// The mapping behind a dict object.
    pub fn mapping(&self, dict: ObjId) -> RuntimeResult<&Mapping> {
        match self.object(dict)? {
            Object::Dict(mapping) => Ok(mapping),
            _ => Err(RuntimeError::WrongKind {
                object: dict,
                expected: "dict",
            }),
        }
    }

    fn mapping_mut(&mut self, dict: ObjId) -> RuntimeResult<&mut Mapping> {
        match self.get_mut(dict) {
            Some(Object::Dict(mapping)) => Ok(mapping),
            Some(_) => Err(RuntimeError::WrongKind {
                object: dict,
                expected: "dict",
            }),
            None => Err(RuntimeError::DanglingObject(dict)),
        }
    }

    fn find_str_key(&self, mapping: &Mapping, key: &str) -> Option<usize> {
        mapping
            .entries()
            .iter()
            .position(|(k, _)| self.str_value(*k) == Some(key))
    }

    pub fn dict_get(&self, dict: ObjId, key: &str) -> RuntimeResult<Option<ObjId>> {
        let mapping = self.mapping(dict)?;
        Ok(self
            .find_str_key(mapping, key)
            .map(|pos| mapping.entries()[pos].1))
    }

    /// Insert or replace a string-keyed entry.
    pub fn dict_set(&mut self, dict: ObjId, key: &str, value: ObjId) -> RuntimeResult<()> {
        let existing = self.find_str_key(self.mapping(dict)?, key);
        match existing {
            Some(pos) => self.mapping_mut(dict)?.set_value_at(pos, value),
            None => {
                let key = self.str(key);
                self.mapping_mut(dict)?.insert(key, value);
            }
        }
        Ok(())
    }

    /// Insert an entry keyed by an arbitrary object.
    pub fn dict_set_item(&mut self, dict: ObjId, key: ObjId, value: ObjId) -> RuntimeResult<()> {
        self.mapping_mut(dict)?.insert(key, value);
        Ok(())
    }

    pub fn dict_remove(&mut self, dict: ObjId, key: &str) -> RuntimeResult<Option<ObjId>> {
        let existing = self.find_str_key(self.mapping(dict)?, key);
        match existing {
            Some(pos) => Ok(Some(self.mapping_mut(dict)?.remove_at(pos))),
            None => Ok(None),
        }
    }

    // -- modules ------------------------------------------------------------

    /// The module registered under `name`.
    pub fn module(&self, name: &str) -> Option<ObjId> {
        self.modules.get(name).copied()
    }

    /// Register `module` under `name`, returning the entry it replaced.
    pub fn register_module(&mut self, name: &str, module: ObjId) -> Option<ObjId> {
        debug!(name, %module, "registering module");
        self.modules.insert(name.to_string(), module)
    }

    pub fn unregister_module(&mut self, name: &str) -> Option<ObjId> {
        debug!(name, "unregistering module");
        self.modules.remove(name)
    }

    // -- attributes ---------------------------------------------------------

    fn attr_dict(&self, target: ObjId) -> RuntimeResult<ObjId> {
        match self.object(target)? {
            Object::Module(m) => Ok(m.dict),
            Object::Class(ClassObject { dict: Some(d), .. }) => Ok(*d),
            Object::Instance { dict, .. } => Ok(*dict),
            _ => Err(RuntimeError::WrongKind {
                object: target,
                expected: "object with a __dict__",
            }),
        }
    }

    /// Set an attribute on a module, class or instance.
    pub fn setattr(&mut self, target: ObjId, name: &str, value: ObjId) -> RuntimeResult<()> {
        let dict = self.attr_dict(target)?;
        self.dict_set(dict, name, value)
    }

    pub fn delattr(&mut self, target: ObjId, name: &str) -> RuntimeResult<Option<ObjId>> {
        let dict = self.attr_dict(target)?;
        self.dict_remove(dict, name)
    }

    /// Attribute lookup. Class attributes are searched through the bases.
    pub fn getattr(&self, id: ObjId, name: &str) -> RuntimeResult<ObjId> {
        let missing = || RuntimeError::AttributeMissing {
            object: id,
            name: name.to_string(),
        };
        let found = match self.object(id)? {
            Object::Module(m) => match name {
                "__name__" => Some(m.name),
                "__dict__" => Some(m.dict),
                _ => self.dict_get(m.dict, name)?,
            },
            Object::Class(c) => match name {
                "__name__" => Some(c.name),
                "__dict__" => c.dict,
                _ => self.class_lookup(id, name)?,
            },
            Object::Instance { class, dict } => match name {
                "__class__" => Some(*class),
                "__dict__" => Some(*dict),
                _ => match self.dict_get(*dict, name)? {
                    Some(v) => Some(v),
                    None => self.class_lookup(*class, name)?,
                },
            },
            Object::Function(f) => match name {
                "__name__" | "__qualname__" => Some(f.name),
                "__module__" => Some(f.module),
                "__code__" => Some(f.code),
                "__globals__" => Some(f.globals),
                "__annotations__" => f.annotations,
                "__defaults__" => f.defaults,
                "__kwdefaults__" => f.kwdefaults,
                _ => None,
            },
            Object::Builtin { module, name: n, .. } | Object::BuiltinFunction { module, name: n } => {
                match name {
                    "__name__" | "__qualname__" => Some(*n),
                    "__module__" => Some(*module),
                    _ => None,
                }
            }
            Object::MethodDescriptor { owner, name: n, .. } => match name {
                "__name__" => Some(*n),
                "__objclass__" => Some(*owner),
                _ => None,
            },
            Object::StaticMethod(func) | Object::ClassMethod(func) if name == "__func__" => *func,
            Object::Code(c) => match name {
                "co_name" => Some(c.name),
                "co_filename" => Some(c.filename),
                _ => None,
            },
            _ => None,
        };
        found.ok_or_else(missing)
    }

    fn class_lookup(&self, class: ObjId, name: &str) -> RuntimeResult<Option<ObjId>> {
        let mut stack = vec![class];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Object::Class(c) = self.object(current)? {
                if let Some(Object::Dict(mapping)) = c.dict.and_then(|d| self.get(d)) {
                    if let Some(pos) = self.find_str_key(mapping, name) {
                        return Ok(Some(mapping.entries()[pos].1));
                    }
                }
                stack.extend(c.bases.iter().rev());
            }
        }
        Ok(None)
    }

    /// The type object of `id`.
    pub fn type_of(&self, id: ObjId) -> RuntimeResult<ObjId> {
        let kind = match self.object(id)? {
            Object::None => BuiltinType::NoneType,
            Object::Bool(_) => BuiltinType::Bool,
            Object::Int(_) => BuiltinType::Int,
            Object::Float(_) => BuiltinType::Float,
            Object::Str(_) => BuiltinType::Str,
            Object::Bytes(_) => BuiltinType::Bytes,
            Object::Builtin { .. } | Object::Class(_) | Object::TypedClass(_) => BuiltinType::Type,
            Object::Descriptor(kind) => kind.builtin_type(),
            Object::BuiltinFunction { .. } => BuiltinType::BuiltinFunction,
            Object::MethodDescriptor { class_method, .. } => {
                if *class_method {
                    BuiltinType::ClassMethodDescriptor
                } else {
                    BuiltinType::MethodDescriptor
                }
            }
            Object::Environ(_) => BuiltinType::Environ,
            Object::Tuple(_) => BuiltinType::Tuple,
            Object::List(_) => BuiltinType::List,
            Object::Set(_) => BuiltinType::Set,
            Object::Dict(_) => BuiltinType::Dict,
            Object::WeakSet(_) => BuiltinType::WeakSet,
            Object::WeakKeyDictionary(_) => BuiltinType::WeakKeyDictionary,
            Object::WeakValueDictionary(_) => BuiltinType::WeakValueDictionary,
            Object::Cell(_) => BuiltinType::Cell,
            Object::Module(_) => BuiltinType::Module,
            Object::Code(_) => BuiltinType::Code,
            Object::Function(_) => BuiltinType::Function,
            Object::StaticMethod(_) => BuiltinType::StaticMethod,
            Object::ClassMethod(_) => BuiltinType::ClassMethod,
            Object::TypedInstance(_) => BuiltinType::Object,
            Object::Instance { class, .. } => return Ok(*class),
        };
        Ok(self.builtin_type(kind))
    }

    /// The contents of a string object.
    pub fn str_value(&self, id: ObjId) -> Option<&str> {
        match self.get(id) {
            Some(Object::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Diagnostic description of an object.
    pub fn label(&self, id: ObjId) -> String {
        let name_of = |n: ObjId| self.str_value(n).unwrap_or("?").to_string();
        let Some(object) = self.get(id) else {
            return format!("<dangling {id}>");
        };
        match object {
            Object::None => "None".to_string(),
            Object::Bool(true) => "True".to_string(),
            Object::Bool(false) => "False".to_string(),
            Object::Int(v) => v.to_string(),
            Object::Float(v) => format!("{v:?}"),
            Object::Str(s) => format!("{s:?}"),
            Object::Bytes(b) => format!("bytes[{}]", b.len()),
            Object::Builtin { kind, .. } => format!("<type {}>", kind.name()),
            Object::Descriptor(kind) => format!("<{}>", kind.builtin_type().name()),
            Object::BuiltinFunction { module, name } => {
                format!("<built-in function {}.{}>", name_of(*module), name_of(*name))
            }
            Object::MethodDescriptor { owner, name, .. } => {
                format!("<method {} of {}>", name_of(*name), self.label(*owner))
            }
            Object::Environ(_) => "os.environ".to_string(),
            Object::Tuple(v) => format!("tuple[{}]", v.len()),
            Object::List(v) => format!("list[{}]", v.len()),
            Object::Set(v) => format!("set[{}]", v.len()),
            Object::Dict(m) => format!("dict[{}]", m.len()),
            Object::WeakSet(v) => format!("WeakSet[{}]", v.len()),
            Object::WeakKeyDictionary(m) => format!("WeakKeyDictionary[{}]", m.len()),
            Object::WeakValueDictionary(m) => format!("WeakValueDictionary[{}]", m.len()),
            Object::Cell(_) => "<cell>".to_string(),
            Object::Module(m) => format!("<module {}>", name_of(m.name)),
            Object::Code(c) => format!("<code {}>", name_of(c.name)),
            Object::Function(f) => {
                format!("<function {}.{}>", name_of(f.module), name_of(f.name))
            }
            Object::Class(c) => format!("<class {}>", name_of(c.name)),
            Object::StaticMethod(_) => "<staticmethod>".to_string(),
            Object::ClassMethod(_) => "<classmethod>".to_string(),
            Object::TypedInstance(ty) => format!("<{} instance>", ty.name()),
            Object::TypedClass(ty) => format!("<typed class {}>", ty.name()),
            Object::Instance { class, .. } => format!("<{} object>", self.label(*class)),
        }
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeLabeler for Heap {
    fn label(&self, node: &GraphNode) -> String {
        match node {
            GraphNode::Dynamic(id) => Heap::label(self, *id),
            GraphNode::Type(ty) => ty.name(),
        }
    }
}

impl std::fmt::Debug for Heap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heap")
            .field("object_count", &self.objects.len())
            .field("module_count", &self.modules.len())
            .finish()
    }
}
