use std::collections::BTreeMap;
use std::sync::Arc;

use cvid_crypto::{Accumulator, ContentHasher};
use cvid_graph::{GraphNode, GraphVisitor, StructuralRecord};
use cvid_runtime::{CodeObject, FunctionObject, Heap, Object, ObjectSpace};
use cvid_types::{Digest, ObjId};
use tracing::trace;

use crate::discriminant::{self as d, hash};
use crate::globals::{GlobalsEnumerator, ReferencedNames};
use crate::names::{is_special_ignorable_name, StableModules};
use crate::resolver::CanonicalResolver;
use crate::shape::{classify, is_simple_constant, Shape};

/// Decomposes graph nodes into the sequence of contributions the compiler can
/// see.
///
/// Dynamic nodes are decomposed one at a time under the object space lock
/// into a [`StructuralRecord`]; the lock is released before anything is
/// reported, so visitors may re-enter the walker for referenced nodes.
pub struct Walker {
    space: Arc<ObjectSpace>,
    resolver: CanonicalResolver,
    globals: Arc<dyn GlobalsEnumerator>,
}

impl Walker {
    /// A walker over `space` using the default stable-module allow-list.
    pub fn new(space: Arc<ObjectSpace>) -> Self {
        Self::with_stable_modules(space, StableModules::default())
    }

    pub fn with_stable_modules(space: Arc<ObjectSpace>, stable: StableModules) -> Self {
        Self {
            space,
            resolver: CanonicalResolver::new(stable),
            globals: Arc::new(ReferencedNames),
        }
    }

    /// Replace the compiler-visible globals enumerator.
    pub fn with_globals_enumerator(mut self, globals: Arc<dyn GlobalsEnumerator>) -> Self {
        self.globals = globals;
        self
    }

    pub fn space(&self) -> &Arc<ObjectSpace> {
        &self.space
    }

    pub fn resolver(&self) -> &CanonicalResolver {
        &self.resolver
    }

    /// Capture the walk of `node`.
    pub fn record(&self, node: &GraphNode) -> StructuralRecord {
        let mut record = StructuralRecord::new();
        match node {
            GraphNode::Type(ty) => {
                record.visit_hash(hash(d::TYPE_NODE));
                ty.visit_compiler_visible_internals(&mut record);
            }
            GraphNode::Dynamic(id) => {
                let heap = self.space.lock();
                let shape = classify(&heap, &self.resolver, *id);
                trace!(object = %id, ?shape, "decomposing");
                Decomposer {
                    heap: &heap,
                    globals: self.globals.as_ref(),
                    out: &mut record,
                }
                .emit(shape);
            }
        }
        record
    }

    /// Walk `node`, reporting every contribution to `visitor`.
    pub fn walk(&self, node: &GraphNode, visitor: &mut dyn GraphVisitor) {
        self.record(node).replay(visitor);
    }

    /// The walk of `node`, one rendered entry per line.
    pub fn render(&self, node: &GraphNode) -> String {
        let record = self.record(node);
        let heap = self.space.lock();
        record.render(&*heap)
    }

    /// Whether `node` is a leaf constant.
    pub fn is_simple_constant(&self, node: &GraphNode) -> bool {
        match node {
            GraphNode::Dynamic(id) => is_simple_constant(&self.space.lock(), *id),
            GraphNode::Type(_) => false,
        }
    }

    /// A hash of a constant's kind and value; `None` for anything else.
    ///
    /// Constants contribute nothing structurally, so their values reach a
    /// digest only through this path.
    pub fn value_fingerprint(&self, node: &GraphNode) -> Option<Digest> {
        let GraphNode::Dynamic(id) = node else {
            return None;
        };
        let heap = self.space.lock();
        if !is_simple_constant(&heap, *id) {
            return None;
        }
        let constant = |tag: u64, payload: &[u8]| {
            let mut acc = Accumulator::for_constants();
            acc.fold(tag);
            acc.fold_bytes(payload);
            acc.finalize()
        };
        let fingerprint = match heap.get(*id)? {
            Object::None => constant(0, &[]),
            Object::Bool(b) => constant(1, &[u8::from(*b)]),
            Object::Int(v) => constant(2, &v.to_le_bytes()),
            Object::Float(v) => constant(3, &v.to_bits().to_le_bytes()),
            Object::Str(s) => constant(4, s.as_bytes()),
            Object::Bytes(b) => constant(5, b),
            Object::Builtin { kind, .. } => constant(6, kind.name().as_bytes()),
            Object::Descriptor(kind) => constant(7, kind.builtin_type().name().as_bytes()),
            Object::Module(_) => constant(8, b"builtins"),
            Object::Dict(_) => constant(9, b"builtins.__dict__"),
            _ => return None,
        };
        Some(fingerprint)
    }
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("stable_modules", &self.resolver.stable_modules().len())
            .finish()
    }
}

/// Emits the contribution of one classified object.
struct Decomposer<'a> {
    heap: &'a Heap,
    globals: &'a dyn GlobalsEnumerator,
    out: &'a mut dyn GraphVisitor,
}

impl Decomposer<'_> {
    fn hash(&mut self, value: u64) {
        self.out.visit_hash(hash(value));
    }

    fn node(&mut self, id: ObjId) {
        self.out.visit_node(GraphNode::Dynamic(id));
    }

    fn nodes(&mut self, ids: &[ObjId]) {
        self.hash(ids.len() as u64);
        for &id in ids {
            self.node(id);
        }
    }

    fn emit(&mut self, shape: Shape<'_>) {
        match shape {
            Shape::Dangling => self.out.visit_error("dangling object reference"),
            Shape::Environment => self.hash(d::ENVIRONMENT),
            Shape::SimpleConstant => {}
            Shape::TypedInstance(ty) => {
                self.hash(d::TYPED_INSTANCE);
                self.out.visit_node(GraphNode::Type(ty.clone()));
            }
            Shape::CanonicalModule(name) => {
                self.hash(d::CANONICAL_MODULE);
                self.out.visit_name(&name);
            }
            Shape::GlobalName(qualified) => {
                self.hash(d::GLOBAL_NAME);
                self.out.visit_name(&qualified);
            }
            Shape::TypedClass(ty) => {
                self.hash(d::TYPED_CLASS);
                self.out.visit_node(GraphNode::Type(ty.clone()));
            }
            Shape::Code(code) => self.code(code),
            Shape::Function(func) => self.function(func),
            Shape::Class { dict, bases } => {
                self.hash(d::CLASS);
                self.hash(d::ABSENT);
                if dict.is_some() {
                    self.mapping(dict, true);
                }
                self.hash(d::ABSENT);
                for base in bases {
                    self.node(base);
                }
                self.hash(d::ABSENT);
            }
            Shape::StaticMethod(func) => self.method_wrapper(d::STATIC_METHOD, func),
            Shape::ClassMethod(func) => self.method_wrapper(d::CLASS_METHOD, func),
            Shape::Tuple(items) => {
                self.hash(d::TUPLE);
                self.nodes(items);
            }
            Shape::MutableContainer(ty) => {
                self.hash(d::MUTABLE_CONTAINER);
                self.node(ty);
            }
            Shape::Cell(contents) => {
                self.hash(d::CELL);
                match contents {
                    Some(value) => {
                        self.hash(d::PRESENT);
                        self.node(value);
                    }
                    None => self.hash(d::ABSENT),
                }
            }
            Shape::MethodDescriptor { owner, name } => {
                self.node(owner);
                self.node(name);
            }
            Shape::Opaque(ty) => self.node(ty),
        }
    }

    fn code(&mut self, co: &CodeObject) {
        self.hash(d::CODE);
        self.hash(u64::from(co.argcount));
        self.hash(u64::from(co.kwonlyargcount));
        self.hash(u64::from(co.nlocals));
        self.hash(u64::from(co.stacksize));
        self.hash(u64::from(co.firstlineno));
        self.out
            .visit_hash(ContentHasher::BYTECODE.hash(&co.bytecode));
        self.nodes(&co.consts);
        self.nodes(&co.names);
        self.nodes(&co.varnames);
        self.nodes(&co.freevars);
        self.nodes(&co.cellvars);
        self.node(co.name);
        self.node(co.linetable);
    }

    fn function(&mut self, func: &FunctionObject) {
        self.hash(d::FUNCTION);
        match &func.closure {
            Some(cells) => {
                self.hash(cells.len() as u64);
                for &cell in cells {
                    if matches!(self.heap.get(cell), Some(Object::Cell(_))) {
                        self.node(cell);
                    }
                }
            }
            None => self.hash(d::ABSENT),
        }
        self.node(func.name);
        self.node(func.code);
        self.mapping_or_sequence(func.annotations);
        self.mapping_or_sequence(func.defaults);
        self.mapping_or_sequence(func.kwdefaults);

        self.hash(d::PRESENT);
        if matches!(self.heap.get(func.globals), Some(Object::Dict(_))) {
            let out = &mut *self.out;
            self.globals.visit_compiler_visible_globals(
                self.heap,
                func.code,
                func.globals,
                &mut |name: &str, value: ObjId| {
                    if !is_special_ignorable_name(name) {
                        out.visit_named_node(name, GraphNode::Dynamic(value));
                    }
                },
            );
        }
        self.hash(d::ABSENT);
    }

    fn method_wrapper(&mut self, discriminant: u64, func: Option<ObjId>) {
        self.hash(discriminant);
        match func {
            Some(func) => self.node(func),
            None => self.out.visit_error("not a func obj"),
        }
    }

    /// Sorted walk of the string keys of a dict.
    fn mapping(&mut self, dict: Option<ObjId>, ignore_special_names: bool) {
        let Some(dict) = dict else {
            self.hash(d::ABSENT);
            return;
        };
        let mapping = match self.heap.get(dict) {
            Some(Object::Dict(mapping)) => mapping,
            other => {
                let kind = other.map_or("<dangling>", Object::kind_name);
                self.out.visit_error(&format!("not a dict: {kind}"));
                return;
            }
        };

        let mut names = BTreeMap::new();
        for &(key, value) in mapping.entries() {
            if let Some(name) = self.heap.str_value(key) {
                if !(ignore_special_names && is_special_ignorable_name(name)) {
                    names.insert(name, value);
                }
            }
        }

        self.hash(names.len() as u64);
        for (name, value) in names {
            self.out.visit_named_node(name, GraphNode::Dynamic(value));
        }
    }

    fn mapping_or_sequence(&mut self, value: Option<ObjId>) {
        let Some(id) = value else {
            self.hash(d::ABSENT);
            return;
        };
        match self.heap.get(id) {
            Some(Object::Dict(_)) => self.mapping(Some(id), false),
            Some(Object::Tuple(items)) => self.nodes(items),
            _ => self.out.visit_error("not a dict or tuple"),
        }
    }
}
