use std::sync::{Mutex, MutexGuard};

use cvid_graph::{GraphNode, NodeLabeler};

use crate::heap::Heap;

/// A heap behind the single lock that serializes every inspection.
///
/// The walker takes the lock to decompose one node and releases it before
/// any visitor callback runs, so callbacks may freely re-enter the space.
pub struct ObjectSpace {
    heap: Mutex<Heap>,
}

impl ObjectSpace {
    /// A space holding a freshly bootstrapped heap.
    pub fn new() -> Self {
        Self::from_heap(Heap::new())
    }

    pub fn from_heap(heap: Heap) -> Self {
        Self {
            heap: Mutex::new(heap),
        }
    }

    /// Acquire exclusive access to the heap.
    pub fn lock(&self) -> MutexGuard<'_, Heap> {
        self.heap.lock().expect("object space lock poisoned")
    }

    /// Run `f` with exclusive access to the heap.
    pub fn with<R>(&self, f: impl FnOnce(&mut Heap) -> R) -> R {
        f(&mut self.lock())
    }
}

impl Default for ObjectSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeLabeler for ObjectSpace {
    fn label(&self, node: &GraphNode) -> String {
        NodeLabeler::label(&*self.lock(), node)
    }
}

impl std::fmt::Debug for ObjectSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.lock().len();
        f.debug_struct("ObjectSpace")
            .field("object_count", &count)
            .finish()
    }
}
