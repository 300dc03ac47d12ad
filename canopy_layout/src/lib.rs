// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Layout: a visual tree with a two-pass Measure/Arrange engine.
//!
//! Each node of a [`Tree`] owns a [`PropertyStore`](canopy_property::PropertyStore),
//! an ordered list of children and a [`Layout`]. Layout runs in two
//! passes:
//!
//! - **Measure** (top-down call, bottom-up result): [`Tree::measure`] asks a
//!   node how much space it wants within a constraint. Either extent of the
//!   constraint may be infinite.
//! - **Arrange**: [`Tree::arrange`] gives the node a concrete, finite
//!   rectangle; the node places itself within it according to its margin,
//!   size and alignment, then arranges its children.
//!
//! Setting a property invalidates the node as the property's
//! [`InvalidateMode`](canopy_property::InvalidateMode) asks, and marks
//! ancestors so the next pass reaches it. Clean nodes with unchanged inputs
//! return cached results.
//!
//! Once layout is settled, [`Tree::render`] hands every node marked for
//! render to a [`Renderer`].
//!
//! ## Writing a layout
//!
//! ```rust
//! use canopy_layout::{Layout, LayoutCx, Tree, HEIGHT, WIDTH};
//! use canopy_property::Result;
//! use kurbo::{Point, Rect, Size};
//!
//! /// Places children side by side.
//! struct Row;
//!
//! impl Layout for Row {
//!     fn measure_core(&mut self, cx: &mut LayoutCx<'_>, available: Size) -> Result<Size> {
//!         let mut total = Size::ZERO;
//!         for child in cx.visible_children() {
//!             let size = cx.measure(child, Size::new(f64::INFINITY, available.height))?;
//!             total.width += size.width;
//!             total.height = total.height.max(size.height);
//!         }
//!         Ok(total)
//!     }
//!
//!     fn arrange_core(&mut self, cx: &mut LayoutCx<'_>, rect: Rect) -> Result<()> {
//!         let mut x = rect.x0;
//!         for child in cx.visible_children() {
//!             let width = cx.desired_size(child).width;
//!             let slot = Rect::from_origin_size(Point::new(x, rect.y0), (width, rect.height()));
//!             cx.arrange(child, slot)?;
//!             x += width;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut tree = Tree::new();
//! let row = tree.insert(Row);
//! for width in [10.0, 20.0] {
//!     let child = tree.insert(canopy_layout::Visual);
//!     tree.set(child, *WIDTH, width).unwrap();
//!     tree.set(child, *HEIGHT, 5.0).unwrap();
//!     tree.append_child(row, child).unwrap();
//! }
//! tree.update_layout(row, Size::new(100.0, 5.0)).unwrap();
//! let second = tree.children(row)[1];
//! assert_eq!(tree.arranged_rect(second).unwrap(), Rect::new(10.0, 0.0, 30.0, 5.0));
//! ```

extern crate alloc;

mod children;
mod layout;
mod render;
mod tree;
mod types;
mod visual;

pub use layout::{ChildList, Layout, LayoutCx};
pub use render::Renderer;
pub use tree::Tree;
pub use types::{InvalidateReason, LayoutFlags, NodeId};
pub use visual::{
    Alignment, HEIGHT, HORIZONTAL_ALIGNMENT, IS_VISIBLE, MARGIN, MAX_HEIGHT, MAX_WIDTH,
    MIN_HEIGHT, MIN_WIDTH, OPACITY, VERTICAL_ALIGNMENT, VISUAL, Visual, WIDTH, deflate, inflate,
};
