// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Star, auto and fixed sizing of rows and columns, and the [`Grid`] panel
//! built on it.

use alloc::vec::Vec;
use std::sync::LazyLock;

use canopy_layout::{Layout, LayoutCx, NodeId};
use canopy_property::{
    DescriptorBuilder, Error, InvalidateMode, ObjectType, Property, PropertyRegistry, Result,
};
use kurbo::{Rect, Size};
use smallvec::SmallVec;

use crate::PANEL;

/// How a [`GridDimension`] gets its size.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DimensionKind {
    /// Sized to its content.
    Auto,
    /// A share of the space left after fixed and auto dimensions.
    Star,
    /// A fixed extent.
    Fixed,
}

/// One row or column of a grid-like owner.
///
/// A dimension is [`Star`](DimensionKind::Star) when its star factor is
/// non-zero, [`Auto`](DimensionKind::Auto) when its size is `NaN`, and
/// [`Fixed`](DimensionKind::Fixed) otherwise. A positive star factor and a
/// positive size exclude each other: setting one clears the other.
///
/// [`resolve_dimensions`] fills in [`desired`](Self::desired) and
/// [`offset`](Self::offset).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridDimension {
    stars: f64,
    size: f64,
    min: f64,
    max: f64,
    desired: f64,
    offset: f64,
}

impl Default for GridDimension {
    fn default() -> Self {
        Self::auto()
    }
}

impl GridDimension {
    /// A dimension sized to its content.
    #[must_use]
    pub const fn auto() -> Self {
        Self {
            stars: 0.0,
            size: f64::NAN,
            min: 0.0,
            max: f64::INFINITY,
            desired: 0.0,
            offset: 0.0,
        }
    }

    /// A proportional dimension.
    #[must_use]
    pub fn star(stars: f64) -> Self {
        let mut dim = Self::auto();
        dim.set_stars(stars);
        dim
    }

    /// A fixed dimension.
    #[must_use]
    pub fn fixed(size: f64) -> Self {
        let mut dim = Self::auto();
        dim.set_size(size);
        dim
    }

    /// Returns a copy bounded to `[min, max]`.
    #[must_use]
    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = min.max(0.0);
        self.max = max.max(self.min);
        self
    }

    /// Returns how this dimension is sized.
    #[must_use]
    pub fn kind(&self) -> DimensionKind {
        if self.stars != 0.0 {
            DimensionKind::Star
        } else if self.size.is_nan() {
            DimensionKind::Auto
        } else {
            DimensionKind::Fixed
        }
    }

    /// Returns the star factor.
    #[must_use]
    pub fn stars(&self) -> f64 {
        self.stars
    }

    /// Sets the star factor. A positive factor makes the size auto.
    pub fn set_stars(&mut self, stars: f64) {
        self.stars = if stars.is_finite() { stars.max(0.0) } else { 0.0 };
        if self.stars > 0.0 {
            self.size = f64::NAN;
        }
    }

    /// Returns the fixed size, `NaN` for auto.
    #[must_use]
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Sets the fixed size; `NaN` means auto. A positive size clears the
    /// star factor.
    pub fn set_size(&mut self, size: f64) {
        self.size = if size.is_nan() { size } else { size.max(0.0) };
        if self.size > 0.0 {
            self.stars = 0.0;
        }
    }

    /// Returns the lower bound.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Returns the upper bound.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// The resolved extent, clamped to the bounds.
    #[must_use]
    pub fn desired(&self) -> f64 {
        self.desired
    }

    /// The resolved start, the sum of the preceding extents.
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    fn clamp(&self, value: f64) -> f64 {
        value.min(self.max).max(self.min)
    }
}

/// Resolves the extents and offsets of `dims` within `available`.
///
/// `content[i]` is the extent the content of dimension `i` asks for; it
/// sizes auto dimensions and is ignored otherwise (missing entries read as
/// zero). Star dimensions split what is left of `available` after the fixed
/// and auto dimensions, in proportion to their factors. When `available`
/// is infinite there is nothing to split and star dimensions size to their
/// content.
///
/// Every extent is clamped to its dimension's bounds after the split. The
/// split is not redone when clamping changes the total, so heavily bounded
/// star dimensions can leave space unused or overflow `available`.
///
/// Returns the sum of the resolved extents.
///
/// ```rust
/// use canopy_panels::{GridDimension, resolve_dimensions};
///
/// let mut dims = [
///     GridDimension::star(1.0),
///     GridDimension::star(1.0),
///     GridDimension::star(2.0),
///     GridDimension::fixed(100.0),
/// ];
/// resolve_dimensions(&mut dims, 400.0, &[]);
/// let sizes: Vec<f64> = dims.iter().map(|d| d.desired()).collect();
/// assert_eq!(sizes, [75.0, 75.0, 150.0, 100.0]);
/// assert_eq!(dims[3].offset(), 300.0);
/// ```
pub fn resolve_dimensions(dims: &mut [GridDimension], available: f64, content: &[f64]) -> f64 {
    let content_of = |i: usize| content.get(i).copied().unwrap_or(0.0);

    let mut claimed = 0.0;
    let mut star_total = 0.0;
    for (i, dim) in dims.iter().enumerate() {
        match dim.kind() {
            DimensionKind::Fixed => claimed += dim.size,
            DimensionKind::Auto => claimed += content_of(i),
            DimensionKind::Star => star_total += dim.stars,
        }
    }
    let remaining = (available - claimed).max(0.0);

    let mut offset = 0.0;
    for (i, dim) in dims.iter_mut().enumerate() {
        let raw = match dim.kind() {
            DimensionKind::Fixed => dim.size,
            DimensionKind::Auto => content_of(i),
            DimensionKind::Star if remaining.is_finite() => remaining * dim.stars / star_total,
            DimensionKind::Star => content_of(i),
        };
        dim.desired = dim.clamp(raw);
        dim.offset = offset;
        offset += dim.desired;
    }
    offset
}

/// Runtime type of [`Grid`] nodes.
pub static GRID: ObjectType = ObjectType::new("Grid", &PANEL);

fn index_property(name: &'static str) -> Property<i64> {
    PropertyRegistry::global().register(
        DescriptorBuilder::<i64>::new(&GRID, name)
            .convert(|v: i64| {
                if v >= 0 {
                    Ok(v)
                } else {
                    Err(Error::invalid_argument("value", "grid index cannot be negative"))
                }
            })
            .invalidate(InvalidateMode::PARENT_MEASURE)
            .build(),
    )
}

/// Attached: the row a child occupies. Out-of-range rows clamp to the last.
pub static ROW: LazyLock<Property<i64>> = LazyLock::new(|| index_property("Row"));

/// Attached: the column a child occupies. Out-of-range columns clamp to the last.
pub static COLUMN: LazyLock<Property<i64>> = LazyLock::new(|| index_property("Column"));

/// A panel that places children in cells of rows and columns.
///
/// The dimensions belong to the panel; change them through
/// [`Tree::layout_mut`](canopy_layout::Tree::layout_mut) and invalidate the
/// node. A grid without rows (or columns) behaves as if it had one star row
/// (or column).
#[derive(Clone, Debug, Default)]
pub struct Grid {
    rows: Vec<GridDimension>,
    columns: Vec<GridDimension>,
    implicit_row: Option<GridDimension>,
    implicit_column: Option<GridDimension>,
    row_content: SmallVec<[f64; 8]>,
    column_content: SmallVec<[f64; 8]>,
}

impl Grid {
    /// Creates a grid with one implicit cell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `rows`.
    #[must_use]
    pub fn with_rows(mut self, rows: impl IntoIterator<Item = GridDimension>) -> Self {
        self.rows = rows.into_iter().collect();
        self
    }

    /// Returns a copy with `columns`.
    #[must_use]
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = GridDimension>) -> Self {
        self.columns = columns.into_iter().collect();
        self
    }

    /// The rows, resolved by the last layout pass.
    #[must_use]
    pub fn rows(&self) -> &[GridDimension] {
        &self.rows
    }

    /// The columns, resolved by the last layout pass.
    #[must_use]
    pub fn columns(&self) -> &[GridDimension] {
        &self.columns
    }

    /// Mutable rows. Invalidate the node after changing them.
    pub fn rows_mut(&mut self) -> &mut Vec<GridDimension> {
        &mut self.rows
    }

    /// Mutable columns. Invalidate the node after changing them.
    pub fn columns_mut(&mut self) -> &mut Vec<GridDimension> {
        &mut self.columns
    }
}

fn effective<'a>(
    dims: &'a mut Vec<GridDimension>,
    implicit: &'a mut Option<GridDimension>,
) -> &'a mut [GridDimension] {
    if dims.is_empty() {
        core::slice::from_mut(implicit.insert(GridDimension::star(1.0)))
    } else {
        dims.as_mut_slice()
    }
}

fn cell_index(index: i64, len: usize) -> usize {
    usize::try_from(index).unwrap_or(0).min(len.saturating_sub(1))
}

/// The extent a child may use in a dimension before resolution.
fn measure_extent(dim: &GridDimension, available: f64) -> f64 {
    match dim.kind() {
        DimensionKind::Fixed => dim.clamp(dim.size),
        DimensionKind::Auto => dim.max,
        DimensionKind::Star => available.min(dim.max),
    }
}

impl Layout for Grid {
    fn object_type(&self) -> &'static ObjectType {
        &GRID
    }

    fn measure_core(&mut self, cx: &mut LayoutCx<'_>, available: Size) -> Result<Size> {
        let rows = effective(&mut self.rows, &mut self.implicit_row);
        let columns = effective(&mut self.columns, &mut self.implicit_column);
        self.row_content.clear();
        self.row_content.resize(rows.len(), 0.0);
        self.column_content.clear();
        self.column_content.resize(columns.len(), 0.0);

        for child in cx.visible_children() {
            let row = cell_index(cx.get(child, *ROW), rows.len());
            let column = cell_index(cx.get(child, *COLUMN), columns.len());
            let constraint = Size::new(
                measure_extent(&columns[column], available.width),
                measure_extent(&rows[row], available.height),
            );
            let size = cx.measure(child, constraint)?;
            self.column_content[column] = self.column_content[column].max(size.width);
            self.row_content[row] = self.row_content[row].max(size.height);
        }

        Ok(Size::new(
            resolve_dimensions(columns, available.width, &self.column_content),
            resolve_dimensions(rows, available.height, &self.row_content),
        ))
    }

    fn arrange_core(&mut self, cx: &mut LayoutCx<'_>, rect: Rect) -> Result<()> {
        let rows = effective(&mut self.rows, &mut self.implicit_row);
        let columns = effective(&mut self.columns, &mut self.implicit_column);
        resolve_dimensions(columns, rect.width(), &self.column_content);
        resolve_dimensions(rows, rect.height(), &self.row_content);

        let cells: SmallVec<[(NodeId, Rect); 8]> = cx
            .visible_children()
            .into_iter()
            .map(|child| {
                let row = &rows[cell_index(cx.get(child, *ROW), rows.len())];
                let column = &columns[cell_index(cx.get(child, *COLUMN), columns.len())];
                let x0 = rect.x0 + column.offset;
                let y0 = rect.y0 + row.offset;
                (
                    child,
                    Rect::new(x0, y0, x0 + column.desired, y0 + row.desired),
                )
            })
            .collect();
        for (child, cell) in cells {
            cx.arrange(child, cell)?;
        }
        Ok(())
    }
}
