// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layout override points and the context handed to them.

use alloc::format;
use core::any::Any;

use canopy_property::{Error, ObjectType, Property, PropertyType, Result};
use kurbo::{Rect, Size};
use smallvec::SmallVec;

use crate::tree::Tree;
use crate::types::NodeId;
use crate::visual::VISUAL;

/// Children of one node, copied out so the tree can be borrowed mutably.
pub type ChildList = SmallVec<[NodeId; 8]>;

/// How a node sizes and places its children.
///
/// [`Tree::measure`] and [`Tree::arrange`] handle the node's own margin,
/// explicit size, min/max bounds, alignment and caching, and call into the
/// layout only for the content:
///
/// - [`measure_core`](Self::measure_core) receives the space available to
///   the content (margins removed, explicit sizes applied; either extent may
///   be infinite) and returns the size the content wants.
/// - [`arrange_core`](Self::arrange_core) receives the content rectangle in
///   tree coordinates and arranges every visible child inside it.
///
/// Layouts hold per-node state only; configuration lives in properties so
/// that changing it invalidates the tree.
pub trait Layout: Any + Send {
    /// The runtime type of nodes using this layout, for property overrides.
    fn object_type(&self) -> &'static ObjectType {
        &VISUAL
    }

    /// Measures the content. Must measure every visible child.
    fn measure_core(&mut self, cx: &mut LayoutCx<'_>, available: Size) -> Result<Size>;

    /// Arranges every visible child within `rect`.
    fn arrange_core(&mut self, cx: &mut LayoutCx<'_>, rect: Rect) -> Result<()>;
}

/// The tree as seen from inside a [`Layout`] callback.
///
/// Only the node being laid out and its direct children can be measured
/// or arranged; any live node can be read.
pub struct LayoutCx<'a> {
    pub(crate) tree: &'a mut Tree,
    pub(crate) node: NodeId,
}

impl LayoutCx<'_> {
    /// The node being laid out.
    #[must_use]
    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Read access to the whole tree.
    #[must_use]
    #[inline]
    pub fn tree(&self) -> &Tree {
        &*self.tree
    }

    /// All children of the node, in order.
    #[must_use]
    pub fn children(&self) -> ChildList {
        self.tree.children(self.node).iter().copied().collect()
    }

    /// The children that take part in layout.
    #[must_use]
    pub fn visible_children(&self) -> ChildList {
        self.tree
            .children(self.node)
            .iter()
            .copied()
            .filter(|c| self.tree.is_visible(*c))
            .collect()
    }

    /// Reads a property of any node, usually an attached property of a child.
    ///
    /// # Panics
    ///
    /// Panics if `node` is stale.
    #[must_use]
    pub fn get<T: PropertyType>(&self, node: NodeId, property: Property<T>) -> T {
        self.tree.get(node, property)
    }

    /// Returns `true` if `node` has a local value for `property`.
    #[must_use]
    pub fn is_set<T>(&self, node: NodeId, property: Property<T>) -> bool {
        self.tree.is_set(node, property)
    }

    /// Returns `true` if `node` takes part in layout.
    #[must_use]
    pub fn is_visible(&self, node: NodeId) -> bool {
        self.tree.is_visible(node)
    }

    /// Measures a child and returns its desired size, margins included.
    pub fn measure(&mut self, child: NodeId, available: Size) -> Result<Size> {
        self.check_child(child)?;
        self.tree.measure(child, available)
    }

    /// Arranges a child in `rect`, margins included.
    pub fn arrange(&mut self, child: NodeId, rect: Rect) -> Result<()> {
        self.check_child(child)?;
        self.tree.arrange(child, rect)
    }

    /// Returns a child's last desired size, or zero if it was never measured.
    #[must_use]
    pub fn desired_size(&self, child: NodeId) -> Size {
        self.tree.desired_size(child).unwrap_or(Size::ZERO)
    }

    fn check_child(&self, child: NodeId) -> Result<()> {
        if self.tree.parent(child) == Some(self.node) {
            Ok(())
        } else {
            Err(Error::invalid_argument(
                "child",
                format!("{child:?} is not a child of {:?}", self.node),
            ))
        }
    }
}

impl core::fmt::Debug for LayoutCx<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayoutCx")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}
