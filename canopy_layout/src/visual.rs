// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The base visual type, its common properties and the default layout.

use std::sync::LazyLock;

use canopy_property::{
    DescriptorBuilder, Error, InvalidateMode, ObjectType, PROPERTY_OWNER, Property,
    PropertyRegistry, Result, object_property_type,
};
use kurbo::{Insets, Rect, Size};

use crate::layout::{Layout, LayoutCx};

/// The type every laid-out node derives from.
pub static VISUAL: ObjectType = ObjectType::new("Visual", &PROPERTY_OWNER);

/// Placement of a child within the space its parent offers, on one axis.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Alignment {
    /// Left or top.
    Near,
    /// Centered.
    Center,
    /// Right or bottom.
    Far,
    /// Fill the available extent.
    #[default]
    Stretch,
}

object_property_type!(Alignment);

impl Alignment {
    /// Offset of an item of `extent` inside `available` space.
    ///
    /// `Stretch` centers: a stretched item only falls short of the space when
    /// a maximum size caps it.
    #[must_use]
    pub fn offset(self, available: f64, extent: f64) -> f64 {
        match self {
            Self::Near => 0.0,
            Self::Center | Self::Stretch => (available - extent) / 2.0,
            Self::Far => available - extent,
        }
    }
}

fn auto_or_non_negative(value: f64) -> Result<f64> {
    if value.is_nan() || (value >= 0.0 && value.is_finite()) {
        Ok(value)
    } else {
        Err(Error::invalid_argument(
            "value",
            "size must be NaN (auto) or a finite, non-negative number",
        ))
    }
}

fn min_size(value: f64) -> Result<f64> {
    if value >= 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(Error::invalid_argument(
            "value",
            "minimum size must be finite and non-negative",
        ))
    }
}

fn max_size(value: f64) -> Result<f64> {
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(Error::invalid_argument(
            "value",
            "maximum size must be non-negative",
        ))
    }
}

fn size_property(name: &'static str, default: f64, check: fn(f64) -> Result<f64>) -> Property<f64> {
    PropertyRegistry::global().register(
        DescriptorBuilder::<f64>::new(&VISUAL, name)
            .default_value(default)
            .convert(check)
            .invalidate(InvalidateMode::MEASURE)
            .build(),
    )
}

/// Explicit width. `NaN` (the default) sizes to content.
pub static WIDTH: LazyLock<Property<f64>> =
    LazyLock::new(|| size_property("Width", f64::NAN, auto_or_non_negative));

/// Explicit height. `NaN` (the default) sizes to content.
pub static HEIGHT: LazyLock<Property<f64>> =
    LazyLock::new(|| size_property("Height", f64::NAN, auto_or_non_negative));

/// Lower bound on the width.
pub static MIN_WIDTH: LazyLock<Property<f64>> =
    LazyLock::new(|| size_property("MinWidth", 0.0, min_size));

/// Lower bound on the height.
pub static MIN_HEIGHT: LazyLock<Property<f64>> =
    LazyLock::new(|| size_property("MinHeight", 0.0, min_size));

/// Upper bound on the width. Unbounded by default.
pub static MAX_WIDTH: LazyLock<Property<f64>> =
    LazyLock::new(|| size_property("MaxWidth", f64::INFINITY, max_size));

/// Upper bound on the height. Unbounded by default.
pub static MAX_HEIGHT: LazyLock<Property<f64>> =
    LazyLock::new(|| size_property("MaxHeight", f64::INFINITY, max_size));

/// Space kept clear around the node, outside its own bounds.
pub static MARGIN: LazyLock<Property<Insets>> = LazyLock::new(|| {
    PropertyRegistry::global().register(
        DescriptorBuilder::<Insets>::new(&VISUAL, "Margin")
            .invalidate(InvalidateMode::MEASURE)
            .build(),
    )
});

/// Horizontal placement within the arranged slot.
pub static HORIZONTAL_ALIGNMENT: LazyLock<Property<Alignment>> = LazyLock::new(|| {
    PropertyRegistry::global().register(
        DescriptorBuilder::<Alignment>::new(&VISUAL, "HorizontalAlignment")
            .invalidate(InvalidateMode::ARRANGE)
            .build(),
    )
});

/// Vertical placement within the arranged slot.
pub static VERTICAL_ALIGNMENT: LazyLock<Property<Alignment>> = LazyLock::new(|| {
    PropertyRegistry::global().register(
        DescriptorBuilder::<Alignment>::new(&VISUAL, "VerticalAlignment")
            .invalidate(InvalidateMode::ARRANGE)
            .build(),
    )
});

/// Invisible nodes take no space and are skipped by both passes.
pub static IS_VISIBLE: LazyLock<Property<bool>> = LazyLock::new(|| {
    PropertyRegistry::global().register(
        DescriptorBuilder::<bool>::new(&VISUAL, "IsVisible")
            .default_value(true)
            .invalidate(InvalidateMode::MEASURE | InvalidateMode::PARENT_MEASURE)
            .build(),
    )
});

/// Opacity in `[0, 1]`. Out-of-range values are clamped.
pub static OPACITY: LazyLock<Property<f64>> = LazyLock::new(|| {
    PropertyRegistry::global().register(
        DescriptorBuilder::<f64>::new(&VISUAL, "Opacity")
            .default_value(1.0)
            .convert(|v: f64| {
                if v.is_nan() {
                    Err(Error::invalid_argument("value", "opacity cannot be NaN"))
                } else {
                    Ok(v.clamp(0.0, 1.0))
                }
            })
            .invalidate(InvalidateMode::RENDER)
            .build(),
    )
});

/// Shrinks `size` by `insets`, never below zero. Infinite extents stay infinite.
#[must_use]
pub fn deflate(size: Size, insets: Insets) -> Size {
    Size::new(
        (size.width - insets.x_value()).max(0.0),
        (size.height - insets.y_value()).max(0.0),
    )
}

/// Grows `size` by `insets`.
#[must_use]
pub fn inflate(size: Size, insets: Insets) -> Size {
    Size::new(size.width + insets.x_value(), size.height + insets.y_value())
}

/// The default layout: children are overlaid and each is arranged in the
/// node's full rectangle, where its own alignment places it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Visual;

impl Layout for Visual {
    fn measure_core(&mut self, cx: &mut LayoutCx<'_>, available: Size) -> Result<Size> {
        let mut desired = Size::ZERO;
        for child in cx.visible_children() {
            let size = cx.measure(child, available)?;
            desired.width = desired.width.max(size.width);
            desired.height = desired.height.max(size.height);
        }
        Ok(desired)
    }

    fn arrange_core(&mut self, cx: &mut LayoutCx<'_>, rect: Rect) -> Result<()> {
        for child in cx.visible_children() {
            cx.arrange(child, rect)?;
        }
        Ok(())
    }
}
