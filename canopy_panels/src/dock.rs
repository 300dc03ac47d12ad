// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Edge docking.

use std::sync::LazyLock;

use canopy_layout::{Layout, LayoutCx, NodeId};
use canopy_property::{
    DescriptorBuilder, InvalidateMode, ObjectType, Property, PropertyRegistry, Result,
    object_property_type,
};
use hashbrown::HashMap;
use kurbo::{Rect, Size};
use smallvec::SmallVec;

use crate::PANEL;

/// Runtime type of [`Dock`] nodes.
pub static DOCK_PANEL: ObjectType = ObjectType::new("DockPanel", &PANEL);

/// The edge a child is docked against.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DockSide {
    /// Consumes a band on the left.
    #[default]
    Left,
    /// Consumes a band at the top.
    Top,
    /// Consumes a band on the right.
    Right,
    /// Consumes a band at the bottom.
    Bottom,
}

object_property_type!(DockSide);

/// Attached: the edge a child docks against.
///
/// Changing it does not resize the child, only its panel's layout.
pub static DOCK: LazyLock<Property<DockSide>> = LazyLock::new(|| {
    PropertyRegistry::global().register(
        DescriptorBuilder::<DockSide>::new(&DOCK_PANEL, "Dock")
            .invalidate(InvalidateMode::PARENT_MEASURE)
            .build(),
    )
});

/// The last visible child takes whatever space remains. On by default.
pub static LAST_CHILD_FILL: LazyLock<Property<bool>> = LazyLock::new(|| {
    PropertyRegistry::global().register(
        DescriptorBuilder::<bool>::new(&DOCK_PANEL, "LastChildFill")
            .default_value(true)
            .invalidate(InvalidateMode::ARRANGE)
            .build(),
    )
});

/// Lets bands extend past the space left by earlier children. Off by default.
pub static ALLOW_OVERLAP: LazyLock<Property<bool>> = LazyLock::new(|| {
    PropertyRegistry::global().register(
        DescriptorBuilder::<bool>::new(&DOCK_PANEL, "AllowOverlap")
            .invalidate(InvalidateMode::ARRANGE)
            .build(),
    )
});

/// The siblings bordering a docked child when it was placed, as indices
/// into the panel's children.
///
/// Each edge names the most recent child docked against that edge before
/// this one, which is the sibling across that edge of the space the child
/// was cut from.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DockNeighbors {
    /// Neighbor on the left.
    pub left: Option<usize>,
    /// Neighbor above.
    pub top: Option<usize>,
    /// Neighbor on the right.
    pub right: Option<usize>,
    /// Neighbor below.
    pub bottom: Option<usize>,
}

impl DockNeighbors {
    fn record(&mut self, side: DockSide, index: usize) {
        match side {
            DockSide::Left => self.left = Some(index),
            DockSide::Top => self.top = Some(index),
            DockSide::Right => self.right = Some(index),
            DockSide::Bottom => self.bottom = Some(index),
        }
    }
}

/// A panel that docks children against its edges in order.
///
/// Each child cuts a band off the remaining rectangle: its desired width for
/// left and right docks, its desired height for top and bottom docks. The
/// child's own alignment places it across the band. With
/// [`LAST_CHILD_FILL`], the last visible child gets the rest.
///
/// Every arrange pass rebuilds the consumed bands and the neighbor map
/// from scratch; read them with [`Tree::layout`](canopy_layout::Tree::layout).
#[derive(Clone, Debug, Default)]
pub struct Dock {
    bands: SmallVec<[(usize, Rect); 8]>,
    neighbors: HashMap<usize, DockNeighbors>,
}

impl Dock {
    /// Creates a dock panel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The band consumed by the child at `index` in the last arrange pass.
    ///
    /// For the filling child this is the remaining rectangle.
    #[must_use]
    pub fn band(&self, index: usize) -> Option<Rect> {
        self.bands
            .iter()
            .find_map(|(i, rect)| (*i == index).then_some(*rect))
    }

    /// The neighbors of the child at `index` in the last arrange pass.
    ///
    /// The filling child has no entry.
    #[must_use]
    pub fn neighbors(&self, index: usize) -> Option<&DockNeighbors> {
        self.neighbors.get(&index)
    }
}

/// Visible children with their index among all children.
fn indexed_visible(cx: &LayoutCx<'_>) -> SmallVec<[(usize, NodeId); 8]> {
    cx.children()
        .into_iter()
        .enumerate()
        .filter(|(_, child)| cx.is_visible(*child))
        .collect()
}

impl Layout for Dock {
    fn object_type(&self) -> &'static ObjectType {
        &DOCK_PANEL
    }

    fn measure_core(&mut self, cx: &mut LayoutCx<'_>, available: Size) -> Result<Size> {
        let mut desired = Size::ZERO;
        let mut used = Size::ZERO;
        for child in cx.visible_children() {
            let remaining = Size::new(
                (available.width - used.width).max(0.0),
                (available.height - used.height).max(0.0),
            );
            let size = cx.measure(child, remaining)?;
            match cx.get(child, *DOCK) {
                DockSide::Left | DockSide::Right => {
                    desired.height = desired.height.max(used.height + size.height);
                    used.width += size.width;
                }
                DockSide::Top | DockSide::Bottom => {
                    desired.width = desired.width.max(used.width + size.width);
                    used.height += size.height;
                }
            }
        }
        Ok(Size::new(
            desired.width.max(used.width),
            desired.height.max(used.height),
        ))
    }

    fn arrange_core(&mut self, cx: &mut LayoutCx<'_>, rect: Rect) -> Result<()> {
        self.bands.clear();
        self.neighbors.clear();

        let node = cx.node();
        let fill = cx.get(node, *LAST_CHILD_FILL);
        let overlap = cx.get(node, *ALLOW_OVERLAP);
        let children = indexed_visible(cx);
        let fill_index = if fill {
            children.last().map(|(i, _)| *i)
        } else {
            None
        };

        let mut remaining = rect;
        let mut nearest = DockNeighbors::default();
        for (index, child) in children {
            if Some(index) == fill_index {
                let band = Rect::new(
                    remaining.x0,
                    remaining.y0,
                    remaining.x1.max(remaining.x0),
                    remaining.y1.max(remaining.y0),
                );
                self.bands.push((index, band));
                cx.arrange(child, band)?;
                break;
            }

            let desired = cx.desired_size(child);
            let free = Size::new(
                (remaining.x1 - remaining.x0).max(0.0),
                (remaining.y1 - remaining.y0).max(0.0),
            );
            let width = if overlap {
                desired.width
            } else {
                desired.width.min(free.width)
            };
            let height = if overlap {
                desired.height
            } else {
                desired.height.min(free.height)
            };
            // Cross-axis extent of a band never goes negative.
            let (y1, x1) = (
                remaining.y1.max(remaining.y0),
                remaining.x1.max(remaining.x0),
            );
            let side = cx.get(child, *DOCK);
            let band = match side {
                DockSide::Left => {
                    let band = Rect::new(remaining.x0, remaining.y0, remaining.x0 + width, y1);
                    remaining.x0 += width;
                    band
                }
                DockSide::Right => {
                    let band = Rect::new(remaining.x1 - width, remaining.y0, remaining.x1, y1);
                    remaining.x1 -= width;
                    band
                }
                DockSide::Top => {
                    let band = Rect::new(remaining.x0, remaining.y0, x1, remaining.y0 + height);
                    remaining.y0 += height;
                    band
                }
                DockSide::Bottom => {
                    let band = Rect::new(remaining.x0, remaining.y1 - height, x1, remaining.y1);
                    remaining.y1 -= height;
                    band
                }
            };
            self.bands.push((index, band));
            self.neighbors.insert(index, nearest);
            nearest.record(side, index);
            cx.arrange(child, band)?;
        }
        tracing::trace!(node = ?node, bands = self.bands.len(), "dock arranged");
        Ok(())
    }
}
