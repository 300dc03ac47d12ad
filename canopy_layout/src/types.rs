// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node identifiers, per-node layout state and invalidation reasons.

use core::fmt;

/// Identifier for a node in a [`Tree`](crate::Tree).
///
/// A slot index plus a generation counter. Removing a node frees its slot;
/// reusing the slot bumps the generation, so a stale `NodeId` never aliases a
/// different live node. Use [`Tree::is_alive`](crate::Tree::is_alive) to
/// check liveness.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Returns the generation counter.
    #[must_use]
    #[inline]
    pub const fn generation(self) -> u32 {
        self.1
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}@{})", self.0, self.1)
    }
}

bitflags::bitflags! {
    /// Layout state of a node.
    ///
    /// `MEASURE`, `ARRANGE` and `RENDER` are dirty bits set by invalidation and
    /// cleared by the matching pass. `MEASURED` and `ARRANGED` record that the
    /// node went through a pass at least once.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct LayoutFlags: u8 {
        /// Desired size must be recomputed.
        const MEASURE = 1 << 0;
        /// Placement must be recomputed.
        const ARRANGE = 1 << 1;
        /// The node must be repainted.
        const RENDER = 1 << 2;
        /// The node has a desired size.
        const MEASURED = 1 << 3;
        /// The node has an arranged rectangle.
        const ARRANGED = 1 << 4;
    }
}

impl LayoutFlags {
    /// The dirty bits.
    pub const DIRTY: Self = Self::MEASURE.union(Self::ARRANGE).union(Self::RENDER);
}

impl Default for LayoutFlags {
    fn default() -> Self {
        Self::DIRTY
    }
}

/// Why a node was invalidated. Carried into trace logs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InvalidateReason {
    /// A property with an invalidation mode changed.
    PropertyChanged(&'static str),
    /// A child was added.
    ChildAdded,
    /// A child was removed.
    ChildRemoved,
    /// Requested through [`Tree::invalidate`](crate::Tree::invalidate), for
    /// example after an external resource changed.
    Explicit,
}
