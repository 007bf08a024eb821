//! Discriminants opening each node kind's contribution.
//!
//! These values are part of the digest format. Changing one changes every
//! digest that passes through the corresponding rule.

use cvid_types::Digest;

pub const TYPE_NODE: u64 = 1;
pub const TYPED_INSTANCE: u64 = 2;
pub const TYPED_CLASS: u64 = 3;
pub const CODE: u64 = 4;
pub const FUNCTION: u64 = 5;
pub const CLASS: u64 = 6;
pub const STATIC_METHOD: u64 = 7;
pub const CLASS_METHOD: u64 = 8;
pub const TUPLE: u64 = 9;
pub const MUTABLE_CONTAINER: u64 = 10;
pub const CELL: u64 = 11;
pub const CANONICAL_MODULE: u64 = 12;
pub const ENVIRONMENT: u64 = 13;
pub const GLOBAL_NAME: u64 = 14;

/// Marker for an absent optional part, and the closing fence of a section.
pub const ABSENT: u64 = 0;
/// Marker for a present optional part, and the opening fence of globals.
pub const PRESENT: u64 = 1;

/// The hash contribution carrying a small integer.
pub fn hash(value: u64) -> Digest {
    Digest::from_seed(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn discriminants_are_distinct() {
        let all = [
            TYPE_NODE,
            TYPED_INSTANCE,
            TYPED_CLASS,
            CODE,
            FUNCTION,
            CLASS,
            STATIC_METHOD,
            CLASS_METHOD,
            TUPLE,
            MUTABLE_CONTAINER,
            CELL,
            CANONICAL_MODULE,
            ENVIRONMENT,
            GLOBAL_NAME,
        ];
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
        assert!(!unique.contains(&ABSENT));
    }

    #[test]
    fn hash_is_seeded() {
        assert_eq!(hash(CODE), Digest::from_seed(4));
        assert_ne!(hash(ABSENT), hash(PRESENT));
    }
}
