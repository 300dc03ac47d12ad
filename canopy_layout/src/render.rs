// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render hand-off.

use kurbo::Rect;

use crate::tree::Tree;
use crate::types::NodeId;

/// Paints nodes once their layout is settled.
///
/// [`Tree::render`] calls this for every visible node marked for render,
/// parents before children, with the node's arranged rectangle. The tree is
/// read-only during the call; properties such as
/// [`OPACITY`](crate::OPACITY) are read through it.
///
/// Closures taking `(&Tree, NodeId, Rect)` implement this trait.
pub trait Renderer {
    /// Paints one node.
    fn render(&mut self, tree: &Tree, node: NodeId, rect: Rect);
}

impl<F> Renderer for F
where
    F: FnMut(&Tree, NodeId, Rect),
{
    fn render(&mut self, tree: &Tree, node: NodeId, rect: Rect) {
        self(tree, node, rect);
    }
}
