use std::fmt;

/// Handle of a dynamic object inside an object space.
///
/// An `ObjId` is the arena slot of the object. Slots are never reused, so two
/// handles are equal exactly when they name the same live object: equality is
/// reference identity, not structural equivalence.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(u32);

impl ObjId {
    /// Create a handle from an arena index.
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// The arena index this handle points at.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjId({})", self.0)
    }
}

impl fmt::Display for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}
