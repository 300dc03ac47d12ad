// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Orientation and the U/V axis mapping shared by the linear panels.

use canopy_property::object_property_type;
use kurbo::{Point, Rect, Size};

/// The axis along which a panel accumulates its children.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Left to right.
    Horizontal,
    /// Top to bottom.
    #[default]
    Vertical,
}

object_property_type!(Orientation);

/// A size expressed relative to an [`Orientation`].
///
/// `u` is the extent along the orientation axis and `v` the extent across
/// it. For [`Orientation::Horizontal`] that is width then height; for
/// [`Orientation::Vertical`] the mapping swaps.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Uv {
    /// Extent along the orientation axis.
    pub u: f64,
    /// Extent across the orientation axis.
    pub v: f64,
}

impl Uv {
    /// Creates a U/V pair.
    #[must_use]
    pub const fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }

    /// Maps `size` into U/V space.
    #[must_use]
    pub fn from_size(orientation: Orientation, size: Size) -> Self {
        match orientation {
            Orientation::Horizontal => Self::new(size.width, size.height),
            Orientation::Vertical => Self::new(size.height, size.width),
        }
    }

    /// Maps back to a [`Size`].
    #[must_use]
    pub fn to_size(self, orientation: Orientation) -> Size {
        match orientation {
            Orientation::Horizontal => Size::new(self.u, self.v),
            Orientation::Vertical => Size::new(self.v, self.u),
        }
    }

    /// Maps back to a [`Point`] offset.
    #[must_use]
    pub fn to_point(self, orientation: Orientation) -> Point {
        let size = self.to_size(orientation);
        Point::new(size.width, size.height)
    }
}

/// The rectangle at U/V `offset` from the origin of `rect`, with U/V `size`.
pub(crate) fn rect_at(orientation: Orientation, rect: Rect, offset: Uv, size: Uv) -> Rect {
    let origin = rect.origin() + offset.to_point(orientation).to_vec2();
    Rect::from_origin_size(origin, size.to_size(orientation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertical_swaps_axes() {
        let size = Size::new(3.0, 7.0);
        let uv = Uv::from_size(Orientation::Vertical, size);
        assert_eq!(uv, Uv::new(7.0, 3.0));
        assert_eq!(uv.to_size(Orientation::Vertical), size);
        assert_eq!(Uv::from_size(Orientation::Horizontal, size), Uv::new(3.0, 7.0));
    }

    #[test]
    fn rect_at_offsets_from_the_origin() {
        let rect = Rect::new(10.0, 20.0, 110.0, 120.0);
        let r = rect_at(
            Orientation::Vertical,
            rect,
            Uv::new(5.0, 1.0),
            Uv::new(4.0, 50.0),
        );
        assert_eq!(r, Rect::new(11.0, 25.0, 61.0, 29.0));
    }
}
