//! Object kinds held by a [`Heap`](crate::Heap).

use cvid_graph::TypeRef;
use cvid_types::ObjId;

// ---------------------------------------------------------------------------
// Builtin types
// ---------------------------------------------------------------------------

/// The built-in type objects every heap is bootstrapped with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinType {
    Object,
    Type,
    NoneType,
    Bool,
    Int,
    Float,
    Str,
    Bytes,
    Tuple,
    List,
    Dict,
    Set,
    Module,
    Function,
    BuiltinFunction,
    Code,
    Cell,
    StaticMethod,
    ClassMethod,
    Property,
    ClassMethodDescriptor,
    GetSetDescriptor,
    MemberDescriptor,
    MethodDescriptor,
    WrapperDescriptor,
    MappingProxy,
    MethodWrapper,
    Environ,
    WeakSet,
    WeakKeyDictionary,
    WeakValueDictionary,
}

impl BuiltinType {
    /// Every builtin type, in declaration order.
    pub const ALL: [BuiltinType; 31] = [
        Self::Object,
        Self::Type,
        Self::NoneType,
        Self::Bool,
        Self::Int,
        Self::Float,
        Self::Str,
        Self::Bytes,
        Self::Tuple,
        Self::List,
        Self::Dict,
        Self::Set,
        Self::Module,
        Self::Function,
        Self::BuiltinFunction,
        Self::Code,
        Self::Cell,
        Self::StaticMethod,
        Self::ClassMethod,
        Self::Property,
        Self::ClassMethodDescriptor,
        Self::GetSetDescriptor,
        Self::MemberDescriptor,
        Self::MethodDescriptor,
        Self::WrapperDescriptor,
        Self::MappingProxy,
        Self::MethodWrapper,
        Self::Environ,
        Self::WeakSet,
        Self::WeakKeyDictionary,
        Self::WeakValueDictionary,
    ];

    /// Position in [`Self::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// The type's `__name__`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Type => "type",
            Self::NoneType => "NoneType",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bytes => "bytes",
            Self::Tuple => "tuple",
            Self::List => "list",
            Self::Dict => "dict",
            Self::Set => "set",
            Self::Module => "module",
            Self::Function => "function",
            Self::BuiltinFunction => "builtin_function_or_method",
            Self::Code => "code",
            Self::Cell => "cell",
            Self::StaticMethod => "staticmethod",
            Self::ClassMethod => "classmethod",
            Self::Property => "property",
            Self::ClassMethodDescriptor => "classmethod_descriptor",
            Self::GetSetDescriptor => "getset_descriptor",
            Self::MemberDescriptor => "member_descriptor",
            Self::MethodDescriptor => "method_descriptor",
            Self::WrapperDescriptor => "wrapper_descriptor",
            Self::MappingProxy => "mappingproxy",
            Self::MethodWrapper => "method-wrapper",
            Self::Environ => "_Environ",
            Self::WeakSet => "WeakSet",
            Self::WeakKeyDictionary => "WeakKeyDictionary",
            Self::WeakValueDictionary => "WeakValueDictionary",
        }
    }

    /// The type's `__module__`.
    pub fn module(self) -> &'static str {
        match self {
            Self::Environ => "os",
            Self::WeakSet | Self::WeakKeyDictionary | Self::WeakValueDictionary => "weakref",
            _ => "builtins",
        }
    }
}

impl std::fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Native attribute descriptors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    Property,
    GetSet,
    Member,
    Wrapper,
    MappingProxy,
    MethodWrapper,
}

impl DescriptorKind {
    /// The builtin type instances of this kind belong to.
    pub fn builtin_type(self) -> BuiltinType {
        match self {
            Self::Property => BuiltinType::Property,
            Self::GetSet => BuiltinType::GetSetDescriptor,
            Self::Member => BuiltinType::MemberDescriptor,
            Self::Wrapper => BuiltinType::WrapperDescriptor,
            Self::MappingProxy => BuiltinType::MappingProxy,
            Self::MethodWrapper => BuiltinType::MethodWrapper,
        }
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Insertion-ordered key/value storage behind dict objects.
///
/// Keys are compared by identity. String-keyed access goes through the heap,
/// which knows how to read key contents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mapping {
    entries: Vec<(ObjId, ObjId)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[(ObjId, ObjId)] {
        &self.entries
    }

    /// Insert or replace by key identity. Replacing keeps the original position.
    pub fn insert(&mut self, key: ObjId, value: ObjId) -> Option<ObjId> {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => Some(std::mem::replace(&mut slot.1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: ObjId) -> Option<ObjId> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    pub fn remove(&mut self, key: ObjId) -> Option<ObjId> {
        let pos = self.entries.iter().position(|(k, _)| *k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub(crate) fn set_value_at(&mut self, pos: usize, value: ObjId) {
        self.entries[pos].1 = value;
    }

    pub(crate) fn remove_at(&mut self, pos: usize) -> ObjId {
        self.entries.remove(pos).1
    }
}

// ---------------------------------------------------------------------------
// Compound objects
// ---------------------------------------------------------------------------

/// A compiled code body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeObject {
    pub name: ObjId,
    pub filename: ObjId,
    pub argcount: u32,
    pub kwonlyargcount: u32,
    pub nlocals: u32,
    pub stacksize: u32,
    pub flags: u32,
    pub firstlineno: u32,
    pub bytecode: Vec<u8>,
    pub consts: Vec<ObjId>,
    pub names: Vec<ObjId>,
    pub varnames: Vec<ObjId>,
    pub freevars: Vec<ObjId>,
    pub cellvars: Vec<ObjId>,
    pub linetable: ObjId,
}

/// A user-defined function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionObject {
    pub name: ObjId,
    pub module: ObjId,
    pub code: ObjId,
    pub globals: ObjId,
    pub closure: Option<Vec<ObjId>>,
    pub annotations: Option<ObjId>,
    pub defaults: Option<ObjId>,
    pub kwdefaults: Option<ObjId>,
}

/// A user-defined class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassObject {
    pub name: ObjId,
    pub dict: Option<ObjId>,
    pub bases: Vec<ObjId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleObject {
    pub name: ObjId,
    pub dict: ObjId,
}

/// Everything an arena slot can hold.
#[derive(Clone, Debug)]
pub enum Object {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// A builtin type object.
    Builtin {
        kind: BuiltinType,
        module: ObjId,
        name: ObjId,
    },
    Descriptor(DescriptorKind),
    BuiltinFunction {
        module: ObjId,
        name: ObjId,
    },
    /// A method descriptor bound to its owning type.
    MethodDescriptor {
        owner: ObjId,
        name: ObjId,
        class_method: bool,
    },
    /// The process environment mapping, backed by a dict.
    Environ(ObjId),
    Tuple(Vec<ObjId>),
    List(Vec<ObjId>),
    Set(Vec<ObjId>),
    Dict(Mapping),
    WeakSet(Vec<ObjId>),
    WeakKeyDictionary(Mapping),
    WeakValueDictionary(Mapping),
    Cell(Option<ObjId>),
    Module(ModuleObject),
    Code(CodeObject),
    Function(FunctionObject),
    Class(ClassObject),
    StaticMethod(Option<ObjId>),
    ClassMethod(Option<ObjId>),
    /// An instance of a type-graph type.
    TypedInstance(TypeRef),
    /// A class whose identity is carried by a type-graph type.
    TypedClass(TypeRef),
    /// An instance of a user-defined class.
    Instance {
        class: ObjId,
        dict: ObjId,
    },
}

impl Object {
    /// Short kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::Builtin { .. } => "type",
            Self::Descriptor(_) => "descriptor",
            Self::BuiltinFunction { .. } => "builtin_function_or_method",
            Self::MethodDescriptor { .. } => "method_descriptor",
            Self::Environ(_) => "_Environ",
            Self::Tuple(_) => "tuple",
            Self::List(_) => "list",
            Self::Set(_) => "set",
            Self::Dict(_) => "dict",
            Self::WeakSet(_) => "WeakSet",
            Self::WeakKeyDictionary(_) => "WeakKeyDictionary",
            Self::WeakValueDictionary(_) => "WeakValueDictionary",
            Self::Cell(_) => "cell",
            Self::Module(_) => "module",
            Self::Code(_) => "code",
            Self::Function(_) => "function",
            Self::Class(_) => "class",
            Self::StaticMethod(_) => "staticmethod",
            Self::ClassMethod(_) => "classmethod",
            Self::TypedInstance(_) => "typed instance",
            Self::TypedClass(_) => "typed class",
            Self::Instance { .. } => "instance",
        }
    }
}
