// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Anchored placement.
//!
//! Children of a [`Canvas`] are positioned by the attached [`LEFT`], [`TOP`],
//! [`RIGHT`] and [`BOTTOM`] offsets. The two axes are resolved independently
//! by [`place`]:
//!
//! - With a near offset (left or top), the child starts there. If the far
//!   offset is also set and the child has no explicit size on that axis, the
//!   span between the two forces the child's extent.
//! - With only a far offset, the child ends that far from the far edge. A
//!   stretching child without an explicit size spans from the near edge out
//!   to the offset.
//! - With neither, the child's alignment places it; `Stretch` fills the axis
//!   only when the options ask for it and otherwise pins to the near edge.

use std::sync::LazyLock;

use canopy_layout::{
    Alignment, HEIGHT, HORIZONTAL_ALIGNMENT, Layout, LayoutCx, VERTICAL_ALIGNMENT, WIDTH,
};
use canopy_property::{
    DescriptorBuilder, Error, InvalidateMode, ObjectType, Property, PropertyRegistry, Result,
};
use kurbo::{Rect, Size};

use crate::PANEL;

/// Runtime type of [`Canvas`] nodes.
pub static CANVAS: ObjectType = ObjectType::new("Canvas", &PANEL);

fn offset_property(name: &'static str) -> Property<f64> {
    PropertyRegistry::global().register(
        DescriptorBuilder::<f64>::new(&CANVAS, name)
            .default_value(f64::NAN)
            .convert(|v: f64| {
                if v.is_infinite() {
                    Err(Error::invalid_argument(
                        "value",
                        "canvas offsets must be finite or NaN (unset)",
                    ))
                } else {
                    Ok(v)
                }
            })
            .invalidate(InvalidateMode::PARENT_ARRANGE)
            .build(),
    )
}

/// Distance from the canvas's left edge to the child. `NaN` when unset.
pub static LEFT: LazyLock<Property<f64>> = LazyLock::new(|| offset_property("Left"));

/// Distance from the canvas's top edge to the child. `NaN` when unset.
pub static TOP: LazyLock<Property<f64>> = LazyLock::new(|| offset_property("Top"));

/// Distance from the canvas's right edge to the child. `NaN` when unset.
pub static RIGHT: LazyLock<Property<f64>> = LazyLock::new(|| offset_property("Right"));

/// Distance from the canvas's bottom edge to the child. `NaN` when unset.
pub static BOTTOM: LazyLock<Property<f64>> = LazyLock::new(|| offset_property("Bottom"));

/// Behaviour switches for a [`Canvas`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CanvasOptions {
    /// Let children with `Stretch` alignment and no explicit size fill the
    /// axes on which they have no offsets at all.
    pub stretch_children: bool,
}

/// Inputs for placing a child on one axis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AxisPlacement {
    /// Extent of the canvas on this axis.
    pub parent: f64,
    /// Near offset (left or top), `NaN` when unset.
    pub near: f64,
    /// Far offset (right or bottom), `NaN` when unset.
    pub far: f64,
    /// The child's desired extent, margins included.
    pub desired: f64,
    /// The child's explicit size on this axis, `NaN` for auto.
    pub explicit: f64,
    /// The child's alignment on this axis.
    pub alignment: Alignment,
}

/// Resolves one axis of a canvas child to `(origin, extent)`, relative to
/// the canvas's near edge.
///
/// A near offset wins as the origin; with a far offset too, an auto-sized
/// child spans the gap between them. A child with only a far offset ends at
/// that offset, and spans out to it from the near edge when it stretches
/// with no explicit size. [`CanvasOptions::stretch_children`] only governs
/// children with no offsets on the axis.
#[must_use]
pub fn place(axis: AxisPlacement, options: CanvasOptions) -> (f64, f64) {
    let auto = axis.explicit.is_nan();
    let stretch = auto && axis.alignment == Alignment::Stretch;
    match (axis.near.is_nan(), axis.far.is_nan()) {
        (false, false) if auto => (axis.near, (axis.parent - axis.near - axis.far).max(0.0)),
        (false, _) => (axis.near, axis.desired),
        (true, false) if stretch => (0.0, (axis.parent - axis.far).max(0.0)),
        (true, false) => (axis.parent - axis.far - axis.desired, axis.desired),
        (true, true) if stretch && options.stretch_children => (0.0, axis.parent),
        (true, true) => match axis.alignment {
            Alignment::Near | Alignment::Stretch => (0.0, axis.desired),
            align => (align.offset(axis.parent, axis.desired), axis.desired),
        },
    }
}

/// A panel that positions children by explicit offsets.
///
/// The canvas asks for the extent its anchored children reach from the near
/// edges; children anchored only to a far edge contribute their own size.
#[derive(Clone, Debug, Default)]
pub struct Canvas {
    options: CanvasOptions,
}

impl Canvas {
    /// Creates a canvas with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a canvas with `options`.
    #[must_use]
    pub fn with_options(options: CanvasOptions) -> Self {
        Self { options }
    }

    /// Returns the options.
    #[must_use]
    pub fn options(&self) -> CanvasOptions {
        self.options
    }

    /// Replaces the options. Invalidate the node afterwards.
    pub fn set_options(&mut self, options: CanvasOptions) {
        self.options = options;
    }
}

fn reach(near: f64, desired: f64) -> f64 {
    if near.is_nan() { desired } else { near + desired }
}

impl Layout for Canvas {
    fn object_type(&self) -> &'static ObjectType {
        &CANVAS
    }

    fn measure_core(&mut self, cx: &mut LayoutCx<'_>, _available: Size) -> Result<Size> {
        let mut extent = Size::ZERO;
        for child in cx.visible_children() {
            let desired = cx.measure(child, Size::new(f64::INFINITY, f64::INFINITY))?;
            extent.width = extent.width.max(reach(cx.get(child, *LEFT), desired.width));
            extent.height = extent.height.max(reach(cx.get(child, *TOP), desired.height));
        }
        Ok(extent)
    }

    fn arrange_core(&mut self, cx: &mut LayoutCx<'_>, rect: Rect) -> Result<()> {
        for child in cx.visible_children() {
            let desired = cx.desired_size(child);
            let (x, width) = place(
                AxisPlacement {
                    parent: rect.width(),
                    near: cx.get(child, *LEFT),
                    far: cx.get(child, *RIGHT),
                    desired: desired.width,
                    explicit: cx.get(child, *WIDTH),
                    alignment: cx.get(child, *HORIZONTAL_ALIGNMENT),
                },
                self.options,
            );
            let (y, height) = place(
                AxisPlacement {
                    parent: rect.height(),
                    near: cx.get(child, *TOP),
                    far: cx.get(child, *BOTTOM),
                    desired: desired.height,
                    explicit: cx.get(child, *HEIGHT),
                    alignment: cx.get(child, *VERTICAL_ALIGNMENT),
                },
                self.options,
            );
            let slot = Rect::new(rect.x0 + x, rect.y0 + y, rect.x0 + x + width, rect.y0 + y + height);
            cx.arrange(child, slot)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(near: f64, far: f64, explicit: f64, alignment: Alignment) -> AxisPlacement {
        AxisPlacement {
            parent: 100.0,
            near,
            far,
            desired: 20.0,
            explicit,
            alignment,
        }
    }

    const OFF: CanvasOptions = CanvasOptions {
        stretch_children: false,
    };
    const ON: CanvasOptions = CanvasOptions {
        stretch_children: true,
    };

    #[test]
    fn near_offset_wins() {
        let a = axis(10.0, f64::NAN, f64::NAN, Alignment::Far);
        assert_eq!(place(a, OFF), (10.0, 20.0));
    }

    #[test]
    fn both_offsets_force_the_span() {
        let a = axis(10.0, 30.0, f64::NAN, Alignment::Stretch);
        assert_eq!(place(a, OFF), (10.0, 60.0));
        // An explicit size keeps its extent.
        let a = axis(10.0, 30.0, 20.0, Alignment::Stretch);
        assert_eq!(place(a, OFF), (10.0, 20.0));
        // Offsets wider than the canvas collapse to nothing.
        let a = axis(60.0, 60.0, f64::NAN, Alignment::Stretch);
        assert_eq!(place(a, OFF), (60.0, 0.0));
    }

    #[test]
    fn far_offset_only() {
        // Stretching out to a far offset does not need the option.
        let a = axis(f64::NAN, 5.0, f64::NAN, Alignment::Stretch);
        assert_eq!(place(a, OFF), (0.0, 95.0));
        assert_eq!(place(a, ON), (0.0, 95.0));
        let a = axis(f64::NAN, 5.0, 20.0, Alignment::Stretch);
        assert_eq!(place(a, ON), (75.0, 20.0));
        let a = axis(f64::NAN, 5.0, f64::NAN, Alignment::Center);
        assert_eq!(place(a, OFF), (75.0, 20.0));
    }

    #[test]
    fn alignment_without_offsets() {
        let center = axis(f64::NAN, f64::NAN, f64::NAN, Alignment::Center);
        assert_eq!(place(center, OFF), (40.0, 20.0));
        let far = axis(f64::NAN, f64::NAN, f64::NAN, Alignment::Far);
        assert_eq!(place(far, OFF), (80.0, 20.0));
        let stretch = axis(f64::NAN, f64::NAN, f64::NAN, Alignment::Stretch);
        assert_eq!(place(stretch, OFF), (0.0, 20.0));
        assert_eq!(place(stretch, ON), (0.0, 100.0));
    }

    #[test]
    fn infinite_offsets_are_rejected() {
        let mut store = canopy_property::PropertyStore::new(&canopy_layout::VISUAL);
        assert!(store.set(*LEFT, f64::INFINITY).is_err());
        assert!(store.set(*LEFT, -5.0).is_ok());
    }
}
