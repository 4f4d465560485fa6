//! Identifier newtypes.
//!
//! `BrainId` and `NodeId` are dense indices: a `BrainId` addresses a slot in
//! the wrangler's `BrainStore`, a `NodeId` a node in one tree's arena.
//! `AgentId` is opaque, whatever the host entity system hands us.
//!
//! Each id displays with a one-letter prefix (`A3`, `B0`, `N12`), matching
//! the `T42` form of [`Tick`](crate::Tick).

use std::fmt;

macro_rules! typed_id {
    ($(#[$attr:meta])* $name:ident, $prefix:literal) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub u32);

        impl $name {
            /// Placeholder for "no id"; also the `Default`.
            pub const INVALID: $name = $name(u32::MAX);

            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

typed_id! {
    /// Host-side identity of the entity a brain thinks for.
    AgentId, "A"
}

typed_id! {
    /// Slot of a brain in the wrangler's `BrainStore`.  Slots are never
    /// reused.
    BrainId, "B"
}

typed_id! {
    /// Index of a node in one tree's arena.  Only meaningful for the tree
    /// that issued it.
    NodeId, "N"
}
