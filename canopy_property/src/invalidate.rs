// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Invalidation vocabulary.
//!
//! A change asks for one of three effects on the changed node (repaint,
//! re-place, re-size) and, independently, one of the same three effects on
//! its parent. Both halves live in one [`InvalidateMode`] bit set; the
//! reducers [`InvalidateMode::self_effect`] and
//! [`InvalidateMode::parent_effect`] collapse it to a single [`Effect`].

use core::fmt;

bitflags::bitflags! {
    /// What a change requires, on the node itself and on its parent.
    ///
    /// ```rust
    /// use canopy_property::{Effect, InvalidateMode};
    ///
    /// let mode = InvalidateMode::RENDER | InvalidateMode::MEASURE;
    /// assert_eq!(mode.self_effect(), Effect::Measure);
    ///
    /// let mode = InvalidateMode::PARENT_RENDER | InvalidateMode::PARENT_ARRANGE;
    /// assert_eq!(mode.self_effect(), Effect::None);
    /// assert_eq!(mode.parent_effect(), Effect::Arrange);
    /// ```
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InvalidateMode: u8 {
        /// Repaint the node.
        const RENDER = 1 << 0;
        /// Recompute the node's placement (implies render).
        const ARRANGE = 1 << 1;
        /// Recompute the node's desired size (implies arrange).
        const MEASURE = 1 << 2;
        /// Repaint the parent.
        const PARENT_RENDER = 1 << 3;
        /// Re-place the parent's children.
        const PARENT_ARRANGE = 1 << 4;
        /// Re-measure the parent.
        const PARENT_MEASURE = 1 << 5;
        /// Every effect on both the node and its parent.
        const ALL = Self::RENDER.bits()
            | Self::ARRANGE.bits()
            | Self::MEASURE.bits()
            | Self::PARENT_RENDER.bits()
            | Self::PARENT_ARRANGE.bits()
            | Self::PARENT_MEASURE.bits();
    }
}

impl InvalidateMode {
    /// No effect.
    pub const NONE: Self = Self::empty();

    /// The strongest effect requested on the node itself.
    #[must_use]
    pub fn self_effect(self) -> Effect {
        if self.contains(Self::MEASURE) {
            Effect::Measure
        } else if self.contains(Self::ARRANGE) {
            Effect::Arrange
        } else if self.contains(Self::RENDER) {
            Effect::Render
        } else {
            Effect::None
        }
    }

    /// The strongest effect the parent must apply.
    ///
    /// A node that re-measures (or re-arranges, or repaints) forces the same
    /// on its parent, so both the plain flag and its `PARENT_` counterpart
    /// count here.
    #[must_use]
    pub fn parent_effect(self) -> Effect {
        if self.intersects(Self::MEASURE | Self::PARENT_MEASURE) {
            Effect::Measure
        } else if self.intersects(Self::ARRANGE | Self::PARENT_ARRANGE) {
            Effect::Arrange
        } else if self.intersects(Self::RENDER | Self::PARENT_RENDER) {
            Effect::Render
        } else {
            Effect::None
        }
    }

    /// Keeps only the flags about the node itself.
    #[must_use]
    pub fn self_part(self) -> Self {
        self & (Self::RENDER | Self::ARRANGE | Self::MEASURE)
    }
}

impl fmt::Debug for InvalidateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("InvalidateMode(NONE)");
        }
        f.write_str("InvalidateMode(")?;
        bitflags::parser::to_writer(self, &mut *f)?;
        f.write_str(")")
    }
}

/// A single reduced effect, ordered by strength.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Effect {
    /// Nothing to do.
    #[default]
    None,
    /// Repaint only.
    Render,
    /// Re-place and repaint.
    Arrange,
    /// Re-size, re-place and repaint.
    Measure,
}

impl Effect {
    /// The self-directed mode that requests this effect.
    #[must_use]
    pub fn mode(self) -> InvalidateMode {
        match self {
            Self::None => InvalidateMode::NONE,
            Self::Render => InvalidateMode::RENDER,
            Self::Arrange => InvalidateMode::ARRANGE,
            Self::Measure => InvalidateMode::MEASURE,
        }
    }
}
