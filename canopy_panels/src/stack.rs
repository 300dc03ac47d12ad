// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Linear stacking.

use std::sync::LazyLock;

use canopy_layout::{Layout, LayoutCx};
use canopy_property::{
    DescriptorBuilder, Error, InvalidateMode, ObjectType, Property, PropertyRegistry, Result,
};
use kurbo::{Rect, Size};

use crate::PANEL;
use crate::orientation::{Orientation, Uv, rect_at};

/// Runtime type of [`Stack`] nodes.
pub static STACK: ObjectType = ObjectType::new("StackPanel", &PANEL);

/// The stacking axis. Vertical by default.
pub static ORIENTATION: LazyLock<Property<Orientation>> = LazyLock::new(|| {
    PropertyRegistry::global().register(
        DescriptorBuilder::<Orientation>::new(&STACK, "Orientation")
            .invalidate(InvalidateMode::MEASURE)
            .build(),
    )
});

/// Gap before, between and after children. Only the component along the
/// stacking axis is used.
pub static SPACING: LazyLock<Property<Size>> = LazyLock::new(|| {
    PropertyRegistry::global().register(
        DescriptorBuilder::<Size>::new(&STACK, "Spacing")
            .convert(|s: Size| {
                if s.width >= 0.0 && s.height >= 0.0 && s.is_finite() {
                    Ok(s)
                } else {
                    Err(Error::invalid_argument(
                        "value",
                        "spacing must be finite and non-negative",
                    ))
                }
            })
            .invalidate(InvalidateMode::MEASURE)
            .build(),
    )
});

/// Kept for parity with [`dock::LAST_CHILD_FILL`](crate::dock::LAST_CHILD_FILL).
///
/// A stack always gives each child its desired extent on the stacking axis,
/// so this does not change the geometry.
pub static LAST_CHILD_FILL: LazyLock<Property<bool>> = LazyLock::new(|| {
    PropertyRegistry::global().register(
        DescriptorBuilder::<bool>::new(&STACK, "LastChildFill")
            .default_value(true)
            .invalidate(InvalidateMode::ARRANGE)
            .build(),
    )
});

/// A panel that places children one after another along an axis.
///
/// Each child gets its desired extent on the stacking axis and the full
/// extent across it. With `n` visible children the stack asks for the sum
/// of their extents plus `n + 1` gaps: one before each child and one after
/// the last.
#[derive(Clone, Copy, Debug, Default)]
pub struct Stack;

impl Stack {
    /// Creates a stack panel.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Layout for Stack {
    fn object_type(&self) -> &'static ObjectType {
        &STACK
    }

    fn measure_core(&mut self, cx: &mut LayoutCx<'_>, available: Size) -> Result<Size> {
        let node = cx.node();
        let orientation = cx.get(node, *ORIENTATION);
        let spacing = Uv::from_size(orientation, cx.get(node, *SPACING)).u;
        let available = Uv::from_size(orientation, available);

        let children = cx.visible_children();
        if children.is_empty() {
            return Ok(Size::ZERO);
        }
        let mut used = Uv::new(spacing, 0.0);
        for child in children {
            let remaining = Uv::new((available.u - used.u).max(0.0), available.v);
            let size = Uv::from_size(orientation, cx.measure(child, remaining.to_size(orientation))?);
            used.u += size.u + spacing;
            used.v = used.v.max(size.v);
        }
        Ok(used.to_size(orientation))
    }

    fn arrange_core(&mut self, cx: &mut LayoutCx<'_>, rect: Rect) -> Result<()> {
        let node = cx.node();
        let orientation = cx.get(node, *ORIENTATION);
        let spacing = Uv::from_size(orientation, cx.get(node, *SPACING)).u;
        let cross = Uv::from_size(orientation, rect.size()).v;

        let mut cursor = spacing;
        for child in cx.visible_children() {
            let extent = Uv::from_size(orientation, cx.desired_size(child)).u;
            let slot = rect_at(
                orientation,
                rect,
                Uv::new(cursor, 0.0),
                Uv::new(extent, cross),
            );
            cx.arrange(child, slot)?;
            cursor += extent + spacing;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_layout::{HEIGHT, Tree, Visual, WIDTH};

    #[test]
    fn horizontal_slots_advance_by_width() {
        let mut tree = Tree::new();
        let stack = tree.insert(Stack::new());
        tree.set(stack, *ORIENTATION, Orientation::Horizontal).unwrap();
        tree.set(stack, *SPACING, Size::new(5.0, 100.0)).unwrap();
        let mut children = Vec::new();
        for width in [10.0, 20.0] {
            let child = tree.insert(Visual);
            tree.set(child, *WIDTH, width).unwrap();
            tree.set(child, *HEIGHT, 4.0).unwrap();
            tree.append_child(stack, child).unwrap();
            children.push(child);
        }
        tree.update_layout(stack, Size::new(f64::INFINITY, 30.0)).unwrap();
        assert_eq!(tree.desired_size(stack).unwrap(), Size::new(45.0, 4.0));
        // Fixed-height children center in the full cross extent.
        assert_eq!(
            tree.arranged_rect(children[1]).unwrap(),
            Rect::new(20.0, 13.0, 40.0, 17.0)
        );
    }

    #[test]
    fn empty_stack_wants_nothing() {
        let mut tree = Tree::new();
        let stack = tree.insert(Stack::new());
        tree.set(stack, *SPACING, Size::new(3.0, 3.0)).unwrap();
        tree.update_layout(stack, Size::new(f64::INFINITY, f64::INFINITY))
            .unwrap();
        assert_eq!(tree.desired_size(stack).unwrap(), Size::ZERO);
    }

    #[test]
    fn negative_spacing_is_rejected() {
        let mut tree = Tree::new();
        let stack = tree.insert(Stack::new());
        assert!(tree.set(stack, *SPACING, Size::new(0.0, -1.0)).is_err());
    }
}
