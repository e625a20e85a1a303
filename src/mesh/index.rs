//! Handle types for mesh entities.
//!
//! Every vertex, half-edge and face is addressed by a typed integer handle.
//! A handle is the entity's slot in its arena; slots are never reused, so a
//! handle doubles as a stable, monotonically increasing id for the life of
//! the mesh. Handles of destroyed entities stay printable for diagnostics
//! but must not be dereferenced.

use std::fmt::{self, Debug};

/// A type-safe vertex handle.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId(usize);

/// A type-safe half-edge handle.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct HalfedgeId(usize);

/// A type-safe face handle.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId(usize);

const INVALID: usize = usize::MAX;

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a handle from a raw slot index.
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(index)
            }

            /// The invalid/null handle.
            #[inline]
            pub fn invalid() -> Self {
                Self(INVALID)
            }

            /// Get the raw slot index.
            #[inline]
            pub fn index(self) -> usize {
                self.0
            }

            /// Check if this is a valid (non-null) handle.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != INVALID
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $display, self.0)
                } else {
                    write!(f, "{}(INVALID)", $display)
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }
    };
}

impl_index_type!(VertexId, "V");
impl_index_type!(HalfedgeId, "HE");
impl_index_type!(FaceId, "F");
