// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line wrapping.

use core::ops::Range;
use std::sync::LazyLock;

use canopy_layout::{Layout, LayoutCx, NodeId};
use canopy_property::{
    DescriptorBuilder, Error, InvalidateMode, ObjectType, Property, PropertyRegistry, Result,
};
use kurbo::{Rect, Size};
use smallvec::SmallVec;

use crate::PANEL;
use crate::orientation::{Orientation, Uv, rect_at};

/// Runtime type of [`Wrap`] nodes.
pub static WRAP: ObjectType = ObjectType::new("WrapPanel", &PANEL);

/// The axis items accumulate along within a line. Horizontal by default.
pub static ORIENTATION: LazyLock<Property<Orientation>> = LazyLock::new(|| {
    PropertyRegistry::global().register(
        DescriptorBuilder::<Orientation>::new(&WRAP, "Orientation")
            .default_value(Orientation::Horizontal)
            .invalidate(InvalidateMode::MEASURE)
            .build(),
    )
});

fn item_size(name: &'static str) -> Property<f64> {
    PropertyRegistry::global().register(
        DescriptorBuilder::<f64>::new(&WRAP, name)
            .default_value(f64::NAN)
            .convert(|v: f64| {
                if v.is_nan() || (v >= 0.0 && v.is_finite()) {
                    Ok(v)
                } else {
                    Err(Error::invalid_argument(
                        "value",
                        "item size must be NaN (auto) or finite and non-negative",
                    ))
                }
            })
            .invalidate(InvalidateMode::MEASURE)
            .build(),
    )
}

/// Width given to every item, overriding measured widths. `NaN` when unset.
pub static ITEM_WIDTH: LazyLock<Property<f64>> = LazyLock::new(|| item_size("ItemWidth"));

/// Height given to every item, overriding measured heights. `NaN` when unset.
pub static ITEM_HEIGHT: LazyLock<Property<f64>> = LazyLock::new(|| item_size("ItemHeight"));

/// One line of wrapped items.
#[derive(Clone, Debug, PartialEq)]
pub struct WrapLine {
    /// Indices of the items on the line.
    pub items: Range<usize>,
    /// Sum of the items' U extents.
    pub u: f64,
    /// Largest V extent on the line.
    pub v: f64,
}

/// Breaks items into lines no longer than `available_u`.
///
/// Items join the current line until the next one would overflow it. An
/// item wider than `available_u` on its own gets a line to itself.
///
/// ```rust
/// use canopy_panels::{Uv, wrap_lines};
///
/// let items = [Uv::new(30.0, 10.0); 5];
/// let lines = wrap_lines(&items, 100.0);
/// assert_eq!(lines.len(), 2);
/// assert_eq!(lines[0].items, 0..3);
/// assert_eq!(lines[1].u, 60.0);
/// ```
#[must_use]
pub fn wrap_lines(items: &[Uv], available_u: f64) -> Vec<WrapLine> {
    let mut lines = Vec::new();
    let mut line = WrapLine {
        items: 0..0,
        u: 0.0,
        v: 0.0,
    };
    for (index, item) in items.iter().enumerate() {
        if !line.items.is_empty() && line.u + item.u > available_u {
            let next = WrapLine {
                items: index..index,
                u: 0.0,
                v: 0.0,
            };
            lines.push(core::mem::replace(&mut line, next));
        }
        line.items.end = index + 1;
        line.u += item.u;
        line.v = line.v.max(item.v);
        if item.u > available_u {
            let next = WrapLine {
                items: index + 1..index + 1,
                u: 0.0,
                v: 0.0,
            };
            lines.push(core::mem::replace(&mut line, next));
        }
    }
    if !line.items.is_empty() {
        lines.push(line);
    }
    lines
}

/// A panel that places children in lines, starting a new line when the
/// current one is full.
///
/// [`ITEM_WIDTH`] and [`ITEM_HEIGHT`] give every item a uniform slot,
/// replacing the measured size on the axes where they are set.
#[derive(Clone, Copy, Debug, Default)]
pub struct Wrap;

impl Wrap {
    /// Creates a wrap panel.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Per-node settings read once per pass.
struct Settings {
    orientation: Orientation,
    item: Size,
}

impl Settings {
    fn read(cx: &LayoutCx<'_>) -> Self {
        let node = cx.node();
        Self {
            orientation: cx.get(node, *ORIENTATION),
            item: Size::new(cx.get(node, *ITEM_WIDTH), cx.get(node, *ITEM_HEIGHT)),
        }
    }

    /// The slot of an item with measured size `desired`.
    fn extent(&self, desired: Size) -> Uv {
        let pick = |item: f64, desired: f64| if item.is_nan() { desired } else { item };
        let size = Size::new(
            pick(self.item.width, desired.width),
            pick(self.item.height, desired.height),
        );
        Uv::from_size(self.orientation, size)
    }

    fn extents(&self, cx: &LayoutCx<'_>, children: &[NodeId]) -> SmallVec<[Uv; 8]> {
        children
            .iter()
            .map(|child| self.extent(cx.desired_size(*child)))
            .collect()
    }
}

impl Layout for Wrap {
    fn object_type(&self) -> &'static ObjectType {
        &WRAP
    }

    fn measure_core(&mut self, cx: &mut LayoutCx<'_>, available: Size) -> Result<Size> {
        let settings = Settings::read(cx);
        let pick = |item: f64, available: f64| if item.is_nan() { available } else { item };
        let constraint = Size::new(
            pick(settings.item.width, available.width),
            pick(settings.item.height, available.height),
        );
        let children = cx.visible_children();
        for child in &children {
            cx.measure(*child, constraint)?;
        }

        let extents = settings.extents(cx, &children);
        let lines = wrap_lines(&extents, Uv::from_size(settings.orientation, available).u);
        let desired = lines.iter().fold(Uv::default(), |acc, line| {
            Uv::new(acc.u.max(line.u), acc.v + line.v)
        });
        Ok(desired.to_size(settings.orientation))
    }

    fn arrange_core(&mut self, cx: &mut LayoutCx<'_>, rect: Rect) -> Result<()> {
        let settings = Settings::read(cx);
        let children = cx.visible_children();
        let extents = settings.extents(cx, &children);
        let available_u = Uv::from_size(settings.orientation, rect.size()).u;

        let mut v = 0.0;
        for line in wrap_lines(&extents, available_u) {
            let mut u = 0.0;
            for index in line.items.clone() {
                let slot = rect_at(
                    settings.orientation,
                    rect,
                    Uv::new(u, v),
                    Uv::new(extents[index].u, line.v),
                );
                cx.arrange(children[index], slot)?;
                u += extents[index].u;
            }
            v += line.v;
        }
        Ok(())
    }
}
