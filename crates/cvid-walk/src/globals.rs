use std::collections::HashSet;

use cvid_runtime::{Heap, Object};
use cvid_types::ObjId;

/// Enumerates the globals a code object can observe.
///
/// Implementations must be deterministic: the same code and globals yield the
/// same `(name, value)` pairs in the same order.
pub trait GlobalsEnumerator: Send + Sync {
    fn visit_compiler_visible_globals(
        &self,
        heap: &Heap,
        code: ObjId,
        globals: ObjId,
        visit: &mut dyn FnMut(&str, ObjId),
    );
}

/// Reports every global name a code object (or any code nested in its
/// constants) references, in order of first reference. Names missing from
/// the globals mapping are skipped.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReferencedNames;

impl GlobalsEnumerator for ReferencedNames {
    fn visit_compiler_visible_globals(
        &self,
        heap: &Heap,
        code: ObjId,
        globals: ObjId,
        visit: &mut dyn FnMut(&str, ObjId),
    ) {
        let mut stack = vec![code];
        let mut seen_code = HashSet::new();
        let mut seen_names = HashSet::new();

        while let Some(current) = stack.pop() {
            if !seen_code.insert(current) {
                continue;
            }
            let Some(Object::Code(co)) = heap.get(current) else {
                continue;
            };
            for &name_id in &co.names {
                let Some(name) = heap.str_value(name_id) else {
                    continue;
                };
                if !seen_names.insert(name) {
                    continue;
                }
                if let Ok(Some(value)) = heap.dict_get(globals, name) {
                    visit(name, value);
                }
            }
            for &constant in co.consts.iter().rev() {
                if matches!(heap.get(constant), Some(Object::Code(_))) {
                    stack.push(constant);
                }
            }
        }
    }
}
