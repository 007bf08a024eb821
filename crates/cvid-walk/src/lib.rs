//! Compiler-visible structural walker.
//!
//! Given a [`GraphNode`](cvid_graph::GraphNode), the [`Walker`] reports the
//! pieces of it that a compiler could observe: discriminants, counts, names
//! and references to further nodes. Objects that can be identified by a
//! stable global name are reported by that name alone; constants are leaves;
//! mutable containers contribute only their type.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use cvid_graph::GraphNode;
//! use cvid_runtime::ObjectSpace;
//! use cvid_walk::Walker;
//!
//! let space = Arc::new(ObjectSpace::new());
//! let json = space.with(|heap| heap.new_module("json"));
//! let walker = Walker::new(space);
//! assert_eq!(walker.record(&GraphNode::from(json)).len(), 2);
//! ```

pub mod discriminant;
pub mod globals;
pub mod names;
pub mod resolver;
pub mod shape;
pub mod walker;

pub use globals::{GlobalsEnumerator, ReferencedNames};
pub use names::{is_special_ignorable_name, StableModules};
pub use resolver::{Addressability, CanonicalResolver};
pub use shape::{classify, is_simple_constant, Shape};
pub use walker::Walker;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discriminant::{self as d, hash};
    use cvid_crypto::ContentHasher;
    use cvid_graph::{GraphNode, GraphVisitor, TypeNode, TypeRef, VisitRecord};
    use cvid_runtime::{BuiltinType, CodeSpec, FunctionSpec, Heap, Object, ObjectSpace};
    use cvid_types::ObjId;
    use proptest::prelude::*;
    use std::sync::Arc;

    /// Helper: a type node whose internals are a single name.
    struct Leaf(&'static str);

    impl TypeNode for Leaf {
        fn name(&self) -> String {
            self.0.to_string()
        }

        fn visit_compiler_visible_internals(&self, visitor: &mut dyn GraphVisitor) {
            visitor.visit_name(self.0);
        }
    }

    fn setup() -> (Arc<ObjectSpace>, Walker) {
        let space = Arc::new(ObjectSpace::new());
        let walker = Walker::new(Arc::clone(&space));
        (space, walker)
    }

    fn entries(walker: &Walker, id: ObjId) -> Vec<VisitRecord> {
        walker.record(&GraphNode::Dynamic(id)).entries().to_vec()
    }

    fn h(value: u64) -> VisitRecord {
        VisitRecord::Hash(hash(value))
    }

    fn n(id: ObjId) -> VisitRecord {
        VisitRecord::Node(GraphNode::Dynamic(id))
    }

    fn named(name: &str, id: ObjId) -> VisitRecord {
        VisitRecord::NamedNode(name.to_string(), GraphNode::Dynamic(id))
    }

    /// Helper: a function in a module that does not register it by name.
    fn plain_function(heap: &mut Heap, module: &str, names: &[&str]) -> (ObjId, ObjId) {
        let m = heap.module(module).unwrap_or_else(|| heap.new_module(module));
        let globals = heap.getattr(m, "__dict__").unwrap();
        let code = heap.new_code(CodeSpec {
            names: names.iter().map(|s| s.to_string()).collect(),
            ..CodeSpec::new("f", vec![0x74, 0x00, 0x53, 0x00])
        });
        let f = heap.new_function(FunctionSpec::new("f", module, code, globals));
        (f, code)
    }

    // -----------------------------------------------------------------------
    // 1. Type nodes and typed objects
    // -----------------------------------------------------------------------
    #[test]
    fn type_node_delegates_to_internals() {
        let (_space, walker) = setup();
        let ty = TypeRef::new(Leaf("ListOf(Int)"));
        let record = walker.record(&GraphNode::Type(ty));
        assert_eq!(
            record.entries(),
            &[h(d::TYPE_NODE), VisitRecord::Name("ListOf(Int)".into())]
        );
    }

    #[test]
    fn typed_instance_and_class() {
        let (space, walker) = setup();
        let ty = TypeRef::new(Leaf("Point"));
        let (inst, class) =
            space.with(|heap| (heap.typed_instance(ty.clone()), heap.typed_class(ty.clone())));
        let expect = |disc| vec![h(disc), VisitRecord::Node(GraphNode::Type(ty.clone()))];
        assert_eq!(entries(&walker, inst), expect(d::TYPED_INSTANCE));
        assert_eq!(entries(&walker, class), expect(d::TYPED_CLASS));
    }

    // -----------------------------------------------------------------------
    // 2. Leaves: environment, constants, canonical modules
    // -----------------------------------------------------------------------
    #[test]
    fn environment_is_never_hashed() {
        let (space, walker) = setup();
        let (environ, value) = space.with(|heap| {
            let value = heap.str("secret");
            let environ = heap.environ();
            (environ, value)
        });
        let before = entries(&walker, environ);
        space.with(|heap| {
            if let Some(Object::Environ(dict)) = heap.get(environ).cloned() {
                heap.dict_set(dict, "HOME", value).unwrap();
            }
        });
        assert_eq!(before, vec![h(d::ENVIRONMENT)]);
        assert_eq!(entries(&walker, environ), before);
    }

    #[test]
    fn constants_emit_nothing() {
        let (space, walker) = setup();
        let ids = space.with(|heap| {
            vec![
                heap.none(),
                heap.int(12),
                heap.str("abc"),
                heap.builtin_type(BuiltinType::Int),
                heap.builtins_module(),
            ]
        });
        for id in ids {
            assert!(entries(&walker, id).is_empty());
            assert!(walker.is_simple_constant(&GraphNode::Dynamic(id)));
        }
    }

    #[test]
    fn canonical_module_short_circuits() {
        let (space, walker) = setup();
        let json = space.with(|heap| {
            let json = heap.new_module("json");
            let v = heap.int(1);
            heap.setattr(json, "anything", v).unwrap();
            json
        });
        assert_eq!(
            entries(&walker, json),
            vec![h(d::CANONICAL_MODULE), VisitRecord::Name("json".into())]
        );
    }

    #[test]
    fn shadowed_module_is_walked_by_type() {
        let (space, walker) = setup();
        let (stale, module_type) = space.with(|heap| {
            let stale = heap.new_module("json");
            heap.new_module("json");
            (stale, heap.builtin_type(BuiltinType::Module))
        });
        assert_eq!(entries(&walker, stale), vec![n(module_type)]);
    }

    // -----------------------------------------------------------------------
    // 3. Global names
    // -----------------------------------------------------------------------
    #[test]
    fn stable_function_is_identified_by_name() {
        let (space, walker) = setup();
        let f = space.with(|heap| {
            let (f, _) = plain_function(heap, "json", &[]);
            let json = heap.module("json").unwrap();
            heap.setattr(json, "f", f).unwrap();
            f
        });
        assert_eq!(
            entries(&walker, f),
            vec![h(d::GLOBAL_NAME), VisitRecord::Name("json|f".into())]
        );
    }

    #[test]
    fn failed_round_trip_forces_structural_walk() {
        let (space, walker) = setup();
        let f = space.with(|heap| plain_function(heap, "json", &[]).0);
        let record = entries(&walker, f);
        assert_eq!(record[0], h(d::FUNCTION));
    }

    #[test]
    fn globally_addressable_function_trusts_its_name() {
        let (space, walker) = setup();
        let (f, code) = space.with(|heap| {
            let (f, code) = plain_function(heap, "json", &[]);
            let json = heap.module("json").unwrap();
            heap.setattr(json, "f", f).unwrap();
            (f, code)
        });
        let before = entries(&walker, f);

        // Patch the body in place; the name still round-trips.
        space.with(|heap| {
            if let Some(Object::Code(co)) = heap.get_mut(code) {
                co.bytecode = vec![0x00];
            }
        });
        assert_eq!(entries(&walker, f), before);
    }

    #[test]
    fn builtin_function_in_any_module_is_stable() {
        let (space, walker) = setup();
        let f = space.with(|heap| {
            let m = heap.new_module("_native");
            let f = heap.builtin_function("_native", "crc");
            heap.setattr(m, "crc", f).unwrap();
            f
        });
        assert_eq!(
            entries(&walker, f),
            vec![h(d::GLOBAL_NAME), VisitRecord::Name("_native|crc".into())]
        );
    }

    // -----------------------------------------------------------------------
    // 4. Code objects
    // -----------------------------------------------------------------------
    #[test]
    fn code_sequence() {
        let (space, walker) = setup();
        let (code, consts, names, name, linetable) = space.with(|heap| {
            let k = heap.int(3);
            let code = heap.new_code(CodeSpec {
                argcount: 2,
                kwonlyargcount: 1,
                nlocals: 4,
                stacksize: 5,
                firstlineno: 10,
                consts: vec![k],
                names: vec!["g".into()],
                linetable: vec![1, 2],
                ..CodeSpec::new("f", vec![0x64, 0x01])
            });
            let Some(Object::Code(co)) = heap.get(code) else {
                unreachable!()
            };
            (code, co.consts.clone(), co.names.clone(), co.name, co.linetable)
        });

        let mut expected = vec![h(d::CODE), h(2), h(1), h(4), h(5), h(10)];
        expected.push(VisitRecord::Hash(ContentHasher::BYTECODE.hash(&[0x64, 0x01])));
        expected.extend([h(1), n(consts[0])]);
        expected.extend([h(1), n(names[0])]);
        expected.extend([h(0), h(0), h(0)]);
        expected.extend([n(name), n(linetable)]);
        assert_eq!(entries(&walker, code), expected);
    }

    #[test]
    fn code_ignores_flags_and_filename() {
        let (space, walker) = setup();
        let (a, b) = space.with(|heap| {
            let a = heap.new_code(CodeSpec::new("f", vec![1, 2, 3]));
            let b = heap.new_code(CodeSpec {
                flags: 0x20,
                filename: "/elsewhere/module.py".into(),
                ..CodeSpec::new("f", vec![1, 2, 3])
            });
            (a, b)
        });
        // The name and linetable objects differ by identity, so compare the
        // leading scalar part only.
        assert_eq!(entries(&walker, a)[..7], entries(&walker, b)[..7]);
    }

    // -----------------------------------------------------------------------
    // 5. Functions
    // -----------------------------------------------------------------------
    #[test]
    fn function_sequence_with_globals_fence() {
        let (space, walker) = setup();
        let (f, name, code, helper) = space.with(|heap| {
            let (f, code) = plain_function(heap, "mypkg", &["helper", "__file__", "missing"]);
            let m = heap.module("mypkg").unwrap();
            let helper = heap.int(1);
            heap.setattr(m, "helper", helper).unwrap();
            let file = heap.str("/tmp/mypkg.py");
            heap.setattr(m, "__file__", file).unwrap();
            let name = heap.getattr(f, "__name__").unwrap();
            (f, name, code, helper)
        });
        assert_eq!(
            entries(&walker, f),
            vec![
                h(d::FUNCTION),
                h(d::ABSENT),
                n(name),
                n(code),
                h(d::ABSENT),
                h(d::ABSENT),
                h(d::ABSENT),
                h(d::PRESENT),
                named("helper", helper),
                h(d::ABSENT),
            ]
        );
    }

    #[test]
    fn closure_counts_every_slot_but_references_only_cells() {
        let (space, walker) = setup();
        let (f, cell) = space.with(|heap| {
            let (f, _) = plain_function(heap, "mypkg", &[]);
            let v = heap.int(5);
            let cell = heap.cell(Some(v));
            let junk = heap.int(6);
            if let Some(Object::Function(func)) = heap.get_mut(f) {
                func.closure = Some(vec![cell, junk]);
            }
            (f, cell)
        });
        let record = entries(&walker, f);
        assert_eq!(record[1], h(2));
        assert_eq!(record[2], n(cell));
        assert_eq!(record[3].kind(), cvid_graph::RecordKind::Node);
    }

    #[test]
    fn defaults_and_kwdefaults() {
        let (space, walker) = setup();
        let (f, a, b) = space.with(|heap| {
            let (f, _) = plain_function(heap, "mypkg", &[]);
            let a = heap.int(1);
            let b = heap.int(2);
            let defaults = heap.tuple(vec![a]);
            let kwdefaults = heap.dict_from(&[("z", b)]);
            let bogus = heap.list(vec![]);
            if let Some(Object::Function(func)) = heap.get_mut(f) {
                func.defaults = Some(defaults);
                func.kwdefaults = Some(kwdefaults);
                func.annotations = Some(bogus);
            }
            (f, a, b)
        });
        let record = entries(&walker, f);
        assert_eq!(record[4], VisitRecord::Error("not a dict or tuple".into()));
        assert_eq!(record[5..7], [h(1), n(a)]);
        assert_eq!(record[7..9], [h(1), named("z", b)]);
        assert_eq!(record[9], h(d::PRESENT));
    }

    #[test]
    fn non_dict_globals_leave_an_empty_fence() {
        let (space, walker) = setup();
        let f = space.with(|heap| {
            let (f, _) = plain_function(heap, "mypkg", &["x"]);
            let t = heap.tuple(vec![]);
            if let Some(Object::Function(func)) = heap.get_mut(f) {
                func.globals = t;
            }
            f
        });
        let record = entries(&walker, f);
        let tail = &record[record.len() - 2..];
        assert_eq!(tail, [h(d::PRESENT), h(d::ABSENT)]);
    }

    // -----------------------------------------------------------------------
    // 6. Classes and mappings
    // -----------------------------------------------------------------------
    #[test]
    fn class_filters_bookkeeping_names_and_sorts() {
        let (space, walker) = setup();
        let (class, base, init, zeta, alpha) = space.with(|heap| {
            let base = heap.new_class("Base", "mypkg", vec![], &[]);
            let init = heap.int(1);
            let zeta = heap.int(2);
            let alpha = heap.int(3);
            let class = heap.new_class(
                "C",
                "mypkg",
                vec![base],
                &[("zeta", zeta), ("__init__", init), ("__slots__", zeta), ("alpha", alpha)],
            );
            (class, base, init, zeta, alpha)
        });
        assert_eq!(
            entries(&walker, class),
            vec![
                h(d::CLASS),
                h(d::ABSENT),
                h(3),
                named("__init__", init),
                named("alpha", alpha),
                named("zeta", zeta),
                h(d::ABSENT),
                n(base),
                h(d::ABSENT),
            ]
        );
    }

    #[test]
    fn class_dict_faults() {
        let (space, walker) = setup();
        let (missing, wrong) = space.with(|heap| {
            let missing = heap.new_class("A", "mypkg", vec![], &[]);
            let wrong = heap.new_class("B", "mypkg", vec![], &[]);
            let t = heap.tuple(vec![]);
            if let Some(Object::Class(c)) = heap.get_mut(missing) {
                c.dict = None;
            }
            if let Some(Object::Class(c)) = heap.get_mut(wrong) {
                c.dict = Some(t);
            }
            (missing, wrong)
        });
        assert_eq!(
            entries(&walker, missing),
            vec![h(d::CLASS), h(d::ABSENT), h(d::ABSENT), h(d::ABSENT)]
        );
        assert_eq!(
            entries(&walker, wrong)[2],
            VisitRecord::Error("not a dict: tuple".into())
        );
    }

    #[test]
    fn non_string_keys_are_skipped() {
        let (space, walker) = setup();
        let (f, v) = space.with(|heap| {
            let (f, _) = plain_function(heap, "mypkg", &[]);
            let kw = heap.dict();
            let key = heap.int(1);
            let v = heap.int(2);
            heap.dict_set_item(kw, key, v).unwrap();
            heap.dict_set(kw, "s", v).unwrap();
            if let Some(Object::Function(func)) = heap.get_mut(f) {
                func.kwdefaults = Some(kw);
            }
            (f, v)
        });
        let record = entries(&walker, f);
        assert_eq!(record[6..8], [h(1), named("s", v)]);
    }

    proptest! {
        #[test]
        fn mapping_order_does_not_matter(
            keys in proptest::collection::btree_set("[a-z]{1,8}", 1..12),
            seed in any::<u64>(),
        ) {
            let keys: Vec<String> = keys.into_iter().collect();
            let mut shuffled = keys.clone();
            // Deterministic rotation plus reversal driven by the seed.
            let len = shuffled.len();
            shuffled.rotate_left((seed as usize) % len);
            if seed % 2 == 0 {
                shuffled.reverse();
            }

            let (space, walker) = setup();
            let (a, b) = space.with(|heap| {
                let values: Vec<ObjId> = (0..keys.len() as i64).map(|i| heap.int(i)).collect();
                let by_key = |k: &String| values[keys.iter().position(|x| x == k).unwrap()];
                let first: Vec<(&str, ObjId)> =
                    keys.iter().map(|k| (k.as_str(), by_key(k))).collect();
                let second: Vec<(&str, ObjId)> =
                    shuffled.iter().map(|k| (k.as_str(), by_key(k))).collect();
                let a = heap.new_class("A", "mypkg", vec![], &first);
                let b = heap.new_class("A", "mypkg", vec![], &second);
                (a, b)
            });
            prop_assert_eq!(entries(&walker, a), entries(&walker, b));
        }
    }

    // -----------------------------------------------------------------------
    // 7. Wrappers, tuples, containers, cells, descriptors, fallback
    // -----------------------------------------------------------------------
    #[test]
    fn method_wrappers() {
        let (space, walker) = setup();
        let (sm, cm, broken, f) = space.with(|heap| {
            let (f, _) = plain_function(heap, "mypkg", &[]);
            (heap.static_method(Some(f)), heap.class_method(Some(f)), heap.static_method(None), f)
        });
        assert_eq!(entries(&walker, sm), vec![h(d::STATIC_METHOD), n(f)]);
        assert_eq!(entries(&walker, cm), vec![h(d::CLASS_METHOD), n(f)]);
        assert_eq!(
            entries(&walker, broken),
            vec![h(d::STATIC_METHOD), VisitRecord::Error("not a func obj".into())]
        );
    }

    #[test]
    fn tuples_containers_cells() {
        let (space, walker) = setup();
        let (tuple, a, b, set, set_type, full, empty) = space.with(|heap| {
            let a = heap.int(1);
            let b = heap.str("x");
            let tuple = heap.tuple(vec![a, b]);
            let set = heap.set(vec![a]);
            let full = heap.cell(Some(a));
            let empty = heap.cell(None);
            (tuple, a, b, set, heap.builtin_type(BuiltinType::Set), full, empty)
        });
        assert_eq!(entries(&walker, tuple), vec![h(d::TUPLE), h(2), n(a), n(b)]);
        assert_eq!(entries(&walker, set), vec![h(d::MUTABLE_CONTAINER), n(set_type)]);
        assert_eq!(entries(&walker, full), vec![h(d::CELL), h(d::PRESENT), n(a)]);
        assert_eq!(entries(&walker, empty), vec![h(d::CELL), h(d::ABSENT)]);
    }

    #[test]
    fn mutable_container_contents_are_invisible() {
        let (space, walker) = setup();
        let list = space.with(|heap| heap.list(vec![]));
        let before = entries(&walker, list);
        space.with(|heap| {
            let v = heap.int(1);
            heap.list_push(list, v).unwrap();
        });
        assert_eq!(entries(&walker, list), before);
    }

    #[test]
    fn method_descriptor_and_fallback() {
        let (space, walker) = setup();
        let (desc, owner, name, obj, class) = space.with(|heap| {
            let owner = heap.builtin_type(BuiltinType::Str);
            let desc = heap.method_descriptor(owner, "join");
            let Some(Object::MethodDescriptor { name, .. }) = heap.get(desc).cloned() else {
                unreachable!()
            };
            let class = heap.new_class("Point", "mypkg", vec![], &[]);
            let obj = heap.instance(class);
            (desc, owner, name, obj, class)
        });
        assert_eq!(entries(&walker, desc), vec![n(owner), n(name)]);
        assert_eq!(entries(&walker, obj), vec![n(class)]);
    }

    #[test]
    fn dangling_reference_is_a_fault() {
        let (_space, walker) = setup();
        let record = walker.record(&GraphNode::Dynamic(ObjId::from_index(8_000_000)));
        assert!(record.has_errors());
        let other = walker.record(&GraphNode::Dynamic(ObjId::from_index(8_000_001)));
        assert_eq!(record.entries(), other.entries());
        assert_eq!(
            record.entries(),
            [VisitRecord::Error("dangling object reference".into())]
        );
    }

    // -----------------------------------------------------------------------
    // 8. Determinism, fingerprints, rendering, re-entrancy
    // -----------------------------------------------------------------------
    #[test]
    fn repeated_walks_agree() {
        let (space, walker) = setup();
        let f = space.with(|heap| plain_function(heap, "mypkg", &["x"]).0);
        assert_eq!(entries(&walker, f), entries(&walker, f));
    }

    #[test]
    fn value_fingerprints() {
        let (space, walker) = setup();
        let (one, other_one, two, s, b, tuple) = space.with(|heap| {
            let tuple = heap.tuple(vec![]);
            let b = heap.bytes(b"1");
            (heap.int(1), heap.int(1), heap.int(2), heap.str("1"), b, tuple)
        });
        let fp = |id| walker.value_fingerprint(&GraphNode::Dynamic(id));
        assert_eq!(fp(one), fp(other_one));
        assert_ne!(fp(one), fp(two));
        assert_ne!(fp(one), fp(s));
        assert_ne!(fp(s), fp(b));
        assert!(fp(one).is_some());
        assert_eq!(fp(tuple), None);
    }

    #[test]
    fn render_lists_entries() {
        let (space, walker) = setup();
        let tuple = space.with(|heap| {
            let a = heap.str("x");
            heap.tuple(vec![a])
        });
        let text = walker.render(&GraphNode::Dynamic(tuple));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "Node(\"x\")");
    }

    #[test]
    fn visitors_may_reenter_the_walker() {
        let (space, walker) = setup();
        let outer = space.with(|heap| {
            let a = heap.int(1);
            let inner = heap.tuple(vec![a]);
            heap.tuple(vec![inner])
        });
        let mut seen = 0usize;
        let mut visitor = cvid_graph::FnVisitor::new(
            |_| {},
            |_: &str| {},
            |node: GraphNode| seen += walker.record(&node).len(),
            |_: &str, _| {},
            |_: &str| {},
        );
        walker.walk(&GraphNode::Dynamic(outer), &mut visitor);
        drop(visitor);
        assert_eq!(seen, 3);
    }

    #[test]
    fn custom_globals_enumerator() {
        struct Nothing;
        impl GlobalsEnumerator for Nothing {
            fn visit_compiler_visible_globals(
                &self,
                _heap: &Heap,
                _code: ObjId,
                _globals: ObjId,
                _visit: &mut dyn FnMut(&str, ObjId),
            ) {
            }
        }

        let space = Arc::new(ObjectSpace::new());
        let f = space.with(|heap| {
            let (f, _) = plain_function(heap, "mypkg", &["x"]);
            let m = heap.module("mypkg").unwrap();
            let v = heap.int(1);
            heap.setattr(m, "x", v).unwrap();
            f
        });
        let walker = Walker::new(Arc::clone(&space)).with_globals_enumerator(Arc::new(Nothing));
        let record = walker.record(&GraphNode::Dynamic(f));
        let tail = &record.entries()[record.len() - 2..];
        assert_eq!(tail, [h(d::PRESENT), h(d::ABSENT)]);
    }

    #[test]
    fn extra_stable_modules() {
        let space = Arc::new(ObjectSpace::new());
        let m = space.with(|heap| heap.new_module("mypkg.models"));
        let mut stable = StableModules::default();
        stable.insert("mypkg");
        let walker = Walker::with_stable_modules(Arc::clone(&space), stable);
        assert_eq!(
            entries(&walker, m),
            vec![h(d::CANONICAL_MODULE), VisitRecord::Name("mypkg.models".into())]
        );
    }
}
