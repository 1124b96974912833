//! Arena handles.
//!
//! Every cross-reference in the compiled schema is one of these handles rather
//! than an owning pointer, which keeps parent links, leafref targets, identity
//! bases and grouping references representable in a cyclic graph.

use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Create a handle from a raw arena index.
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            /// Create a handle from a `Vec` index.
            pub(crate) fn from_index(index: usize) -> Self {
                debug_assert!(index <= u32::MAX as usize, concat!($tag, " arena overflow"));
                Self(index as u32)
            }

            /// The raw arena index.
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// The arena index as `usize`.
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "#{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// A schema node (container, leaf, uses, augment, …).
    NodeId,
    "node"
);
arena_id!(
    /// A module or submodule.
    ModuleId,
    "module"
);
arena_id!(
    /// A `type` statement instance (leaf type, typedef type, union member).
    TypeId,
    "type"
);
arena_id!(
    /// A `typedef` definition.
    TypedefId,
    "typedef"
);
arena_id!(
    /// An `identity` definition.
    IdentityId,
    "identity"
);
arena_id!(
    /// A `feature` definition.
    FeatureId,
    "feature"
);
