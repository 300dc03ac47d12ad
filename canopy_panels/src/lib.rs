// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Panels: the standard container layouts.
//!
//! Each panel is a [`Layout`](canopy_layout::Layout) for a node in a
//! [`canopy_layout::Tree`], with its own runtime type derived from [`PANEL`]
//! so that its properties resolve per panel:
//!
//! - [`Canvas`]: children anchored by attached offsets.
//! - [`Dock`]: children docked against the edges in order.
//! - [`Stack`]: children one after another along an axis.
//! - [`Wrap`]: children in lines that wrap when full.
//! - [`Grid`]: children in cells of star, auto and fixed rows and columns.
//!
//! Panel settings and per-child placement are properties, kept in the
//! panel's module (`stack::SPACING`, `dock::DOCK`, `grid::ROW`, ...).
//! Setting them invalidates the panel with the right strength: a child's
//! dock side re-measures its parent, a canvas offset only re-arranges it.
//!
//! ## Example
//!
//! ```rust
//! use canopy_layout::{HEIGHT, Tree, Visual};
//! use canopy_panels::{Dock, DockSide, dock};
//! use kurbo::{Rect, Size};
//!
//! let mut tree = Tree::new();
//! let panel = tree.insert(Dock::new());
//! let header = tree.insert(Visual);
//! tree.set(header, *dock::DOCK, DockSide::Top).unwrap();
//! tree.set(header, *HEIGHT, 20.0).unwrap();
//! let body = tree.insert(Visual);
//! tree.append_child(panel, header).unwrap();
//! tree.append_child(panel, body).unwrap();
//!
//! tree.update_layout(panel, Size::new(200.0, 100.0)).unwrap();
//! assert_eq!(tree.arranged_rect(header).unwrap(), Rect::new(0.0, 0.0, 200.0, 20.0));
//! assert_eq!(tree.arranged_rect(body).unwrap(), Rect::new(0.0, 20.0, 200.0, 100.0));
//! ```

extern crate alloc;

pub mod canvas;
pub mod dock;
pub mod grid;
mod orientation;
pub mod stack;
pub mod wrap;

use canopy_layout::VISUAL;
use canopy_property::ObjectType;

/// The type every panel derives from.
pub static PANEL: ObjectType = ObjectType::new("Panel", &VISUAL);

pub use canvas::{AxisPlacement, Canvas, CanvasOptions};
pub use dock::{Dock, DockNeighbors, DockSide};
pub use grid::{DimensionKind, Grid, GridDimension, resolve_dimensions};
pub use orientation::{Orientation, Uv};
pub use stack::Stack;
pub use wrap::{Wrap, WrapLine, wrap_lines};
