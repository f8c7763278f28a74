// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visual identity types.

use core::fmt;

/// Sentinel value indicating "no visual" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a visual in a [`VisualTree`](super::VisualTree).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a visual is destroyed and the slot is reused. A
/// binding that holds a `VisualId` therefore refers to its target weakly: the
/// handle never keeps the visual alive and simply stops validating once the
/// visual is gone.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VisualId {
    /// Slot index into the tree's arrays.
    pub(crate) idx: u32,
    /// Generation counter; must match the tree's generation for this slot.
    pub(crate) generation: u32,
}

impl VisualId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Rebuilds a handle from its raw parts.
    ///
    /// Used by diagnostics decoders; the result is only meaningful against the
    /// tree that produced the parts.
    #[inline]
    #[must_use]
    pub const fn from_raw(idx: u32, generation: u32) -> Self {
        Self { idx, generation }
    }
}

impl fmt::Debug for VisualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VisualId({}@gen{})", self.idx, self.generation)
    }
}
