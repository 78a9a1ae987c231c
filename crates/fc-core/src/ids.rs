//! Strongly typed, zero-cost identifier wrappers.
//!
//! `NodeId` is the 32-bit key the backing store assigns to every station,
//! parking site and vehicle.  Unlike a dense array index it may be sparse and
//! arbitrary, so it is only ever used as a map key.  `EdgeId` is a dense index
//! into the travel network's CSR edge arrays.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID": equivalent to `u32::MAX`.
            pub const INVALID: $name = $name(<$inner>::MAX);

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

typed_id! {
    /// Backing-store identifier of a station, parking site or vehicle.
    pub struct NodeId(u32);
}

typed_id! {
    /// Index of a directed travel-network edge.
    pub struct EdgeId(u32);
}

impl EdgeId {
    /// Cast to `usize` for direct use as a `Vec` index.
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
