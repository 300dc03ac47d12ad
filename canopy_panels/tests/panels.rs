// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the `canopy_panels` crate.
//!
//! These lay out small trees through each panel and check the geometry
//! the panels promise, along with how attached properties invalidate.

use canopy_layout::{
    Alignment, HEIGHT, HORIZONTAL_ALIGNMENT, LayoutFlags, NodeId, Tree, VERTICAL_ALIGNMENT, Visual,
    WIDTH,
};
use canopy_panels::{
    Canvas, CanvasOptions, Dock, DockSide, Grid, GridDimension, Orientation, Stack, Wrap, canvas,
    dock, grid, resolve_dimensions, stack, wrap,
};
use kurbo::{Rect, Size};

fn leaf(tree: &mut Tree, parent: NodeId, width: f64, height: f64) -> NodeId {
    let node = tree.insert(Visual);
    tree.set(node, *WIDTH, width).unwrap();
    tree.set(node, *HEIGHT, height).unwrap();
    tree.append_child(parent, node).unwrap();
    node
}

fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

fn dock_fixture(allow_overlap: bool, left: f64, right: f64) -> (Tree, NodeId) {
    let mut tree = Tree::new();
    let panel = tree.insert(Dock::new());
    tree.set(panel, *dock::ALLOW_OVERLAP, allow_overlap).unwrap();
    for (side, width) in [
        (DockSide::Left, left),
        (DockSide::Top, 30.0),
        (DockSide::Right, right),
    ] {
        let child = leaf(&mut tree, panel, width, 30.0);
        tree.set(child, *dock::DOCK, side).unwrap();
    }
    let fill = tree.insert(Visual);
    tree.append_child(panel, fill).unwrap();
    (tree, panel)
}

#[test]
fn dock_arrange_is_reproducible() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let (mut tree, panel) = dock_fixture(false, 50.0, 40.0);
    tree.update_layout(panel, Size::new(200.0, 100.0)).unwrap();
    let children = tree.children(panel).to_vec();
    let first: Vec<Rect> = children
        .iter()
        .map(|c| tree.arranged_rect(*c).unwrap())
        .collect();

    // Force a fresh arrange with unchanged inputs.
    tree.invalidate(
        panel,
        canopy_property::InvalidateMode::ARRANGE,
        canopy_layout::InvalidateReason::Explicit,
    )
    .unwrap();
    tree.update_layout(panel, Size::new(200.0, 100.0)).unwrap();
    let second: Vec<Rect> = children
        .iter()
        .map(|c| tree.arranged_rect(*c).unwrap())
        .collect();
    assert_eq!(first, second);

    let layout = tree.layout::<Dock>(panel).unwrap();
    assert_eq!(layout.band(0), Some(Rect::new(0.0, 0.0, 50.0, 100.0)));
    assert_eq!(layout.band(1), Some(Rect::new(50.0, 0.0, 200.0, 30.0)));
    assert_eq!(layout.band(2), Some(Rect::new(160.0, 30.0, 200.0, 100.0)));
    assert_eq!(layout.band(3), Some(Rect::new(50.0, 30.0, 160.0, 100.0)));
}

#[test]
fn dock_bands_do_not_overlap_unless_allowed() {
    let (mut tree, panel) = dock_fixture(false, 150.0, 150.0);
    tree.update_layout(panel, Size::new(200.0, 100.0)).unwrap();
    let layout = tree.layout::<Dock>(panel).unwrap();
    let bands: Vec<Rect> = (0..3).map(|i| layout.band(i).unwrap()).collect();
    for (i, a) in bands.iter().enumerate() {
        for b in &bands[i + 1..] {
            assert!(!overlaps(*a, *b), "{a:?} overlaps {b:?}");
        }
    }

    let (mut tree, panel) = dock_fixture(true, 150.0, 150.0);
    tree.update_layout(panel, Size::new(200.0, 100.0)).unwrap();
    let layout = tree.layout::<Dock>(panel).unwrap();
    assert!(overlaps(layout.band(0).unwrap(), layout.band(2).unwrap()));
}

#[test]
fn dock_side_change_remeasures_the_panel() {
    let (mut tree, panel) = dock_fixture(false, 50.0, 40.0);
    tree.update_layout(panel, Size::new(200.0, 100.0)).unwrap();
    let child = tree.children(panel)[0];
    tree.set(child, *dock::DOCK, DockSide::Bottom).unwrap();
    assert!(tree.flags(panel).unwrap().contains(LayoutFlags::MEASURE));
    assert!(!tree.flags(child).unwrap().contains(LayoutFlags::MEASURE));
}

/// Lays out a left-docked child with the given cross-axis alignment and
/// optional height, next to a fill child, and returns the child's rect.
fn left_docked_rect(alignment: Alignment, height: Option<f64>) -> Rect {
    let mut tree = Tree::new();
    let panel = tree.insert(Dock::new());
    let child = tree.insert(Visual);
    tree.set(child, *dock::DOCK, DockSide::Left).unwrap();
    tree.set(child, *WIDTH, 40.0).unwrap();
    if let Some(height) = height {
        tree.set(child, *HEIGHT, height).unwrap();
    }
    tree.set(child, *VERTICAL_ALIGNMENT, alignment).unwrap();
    tree.append_child(panel, child).unwrap();
    let fill = tree.insert(Visual);
    tree.append_child(panel, fill).unwrap();
    tree.update_layout(panel, Size::new(200.0, 100.0)).unwrap();
    assert_eq!(
        tree.layout::<Dock>(panel).unwrap().band(0),
        Some(Rect::new(0.0, 0.0, 40.0, 100.0)),
        "band spans the panel height"
    );
    tree.arranged_rect(child).unwrap()
}

#[test]
fn dock_cross_axis_alignment_within_band() {
    assert_eq!(
        left_docked_rect(Alignment::Stretch, None),
        Rect::new(0.0, 0.0, 40.0, 100.0)
    );
    assert_eq!(
        left_docked_rect(Alignment::Near, Some(30.0)),
        Rect::new(0.0, 0.0, 40.0, 30.0)
    );
    assert_eq!(
        left_docked_rect(Alignment::Center, Some(30.0)),
        Rect::new(0.0, 35.0, 40.0, 65.0)
    );
    assert_eq!(
        left_docked_rect(Alignment::Far, Some(30.0)),
        Rect::new(0.0, 70.0, 40.0, 100.0)
    );
}

#[test]
fn star_sizing_distribution() {
    let mut dims = [
        GridDimension::star(1.0),
        GridDimension::star(1.0),
        GridDimension::star(2.0),
    ];
    resolve_dimensions(&mut dims, 400.0, &[]);
    let sizes: Vec<f64> = dims.iter().map(GridDimension::desired).collect();
    assert_eq!(sizes, [100.0, 100.0, 200.0]);

    let mut dims = [
        GridDimension::star(1.0),
        GridDimension::fixed(100.0),
        GridDimension::star(1.0),
        GridDimension::star(2.0),
    ];
    resolve_dimensions(&mut dims, 400.0, &[]);
    let stars: Vec<f64> = [0, 2, 3].iter().map(|i| dims[*i].desired()).collect();
    assert_eq!(stars, [75.0, 75.0, 150.0]);
}

#[test]
fn stack_spacing() {
    let mut tree = Tree::new();
    let panel = tree.insert(Stack::new());
    tree.set(panel, *stack::SPACING, Size::new(0.0, 2.0)).unwrap();
    let children: Vec<NodeId> = (0..3).map(|_| leaf(&mut tree, panel, 15.0, 10.0)).collect();
    tree.update_layout(panel, Size::new(50.0, f64::INFINITY))
        .unwrap();
    assert_eq!(tree.desired_size(panel).unwrap().height, 38.0);
    let tops: Vec<f64> = children
        .iter()
        .map(|c| tree.arranged_rect(*c).unwrap().y0)
        .collect();
    assert_eq!(tops, [2.0, 14.0, 26.0]);
}

#[test]
fn stack_skips_invisible_children() {
    let mut tree = Tree::new();
    let panel = tree.insert(Stack::new());
    tree.set(panel, *stack::ORIENTATION, Orientation::Horizontal)
        .unwrap();
    let a = leaf(&mut tree, panel, 10.0, 10.0);
    let hidden = leaf(&mut tree, panel, 500.0, 10.0);
    let b = leaf(&mut tree, panel, 10.0, 10.0);
    tree.set(hidden, *canopy_layout::IS_VISIBLE, false).unwrap();
    tree.update_layout(panel, Size::new(f64::INFINITY, 10.0))
        .unwrap();
    assert_eq!(tree.desired_size(panel).unwrap().width, 20.0);
    assert_eq!(tree.arranged_rect(a).unwrap().x1, tree.arranged_rect(b).unwrap().x0);
}

#[test]
fn wrap_line_breaking() {
    let mut tree = Tree::new();
    let panel = tree.insert(Wrap::new());
    let children: Vec<NodeId> = (0..5).map(|_| leaf(&mut tree, panel, 30.0, 10.0)).collect();
    tree.update_layout(panel, Size::new(100.0, f64::INFINITY))
        .unwrap();
    assert_eq!(tree.desired_size(panel).unwrap(), Size::new(90.0, 20.0));
    let origins: Vec<(f64, f64)> = children
        .iter()
        .map(|c| {
            let r = tree.arranged_rect(*c).unwrap();
            (r.x0, r.y0)
        })
        .collect();
    assert_eq!(
        origins,
        [(0.0, 0.0), (30.0, 0.0), (60.0, 0.0), (0.0, 10.0), (30.0, 10.0)]
    );
}

#[test]
fn wrap_reflows_when_narrowed() {
    let mut tree = Tree::new();
    let panel = tree.insert(Wrap::new());
    (0..5).for_each(|_| {
        leaf(&mut tree, panel, 30.0, 10.0);
    });
    tree.set(panel, *WIDTH, 60.0).unwrap();
    tree.update_layout(panel, Size::new(100.0, f64::INFINITY))
        .unwrap();
    assert_eq!(tree.desired_size(panel).unwrap().height, 30.0);
    tree.set(panel, *wrap::ITEM_HEIGHT, 4.0).unwrap();
    tree.update_layout(panel, Size::new(100.0, f64::INFINITY))
        .unwrap();
    assert_eq!(tree.desired_size(panel).unwrap().height, 12.0);
}

#[test]
fn canvas_offsets() {
    let mut tree = Tree::new();
    let panel = tree.insert(Canvas::new());
    let pinned = leaf(&mut tree, panel, 20.0, 10.0);
    tree.set(pinned, *canvas::LEFT, 5.0).unwrap();
    tree.set(pinned, *canvas::TOP, 7.0).unwrap();
    let corner = leaf(&mut tree, panel, 20.0, 10.0);
    tree.set(corner, *canvas::RIGHT, 10.0).unwrap();
    tree.set(corner, *canvas::BOTTOM, 0.0).unwrap();
    let spanned = tree.insert(Visual);
    tree.set(spanned, *canvas::LEFT, 10.0).unwrap();
    tree.set(spanned, *canvas::RIGHT, 10.0).unwrap();
    tree.set(spanned, *HEIGHT, 5.0).unwrap();
    tree.append_child(panel, spanned).unwrap();

    tree.update_layout(panel, Size::new(100.0, 50.0)).unwrap();
    assert_eq!(tree.arranged_rect(pinned).unwrap(), Rect::new(5.0, 7.0, 25.0, 17.0));
    assert_eq!(tree.arranged_rect(corner).unwrap(), Rect::new(70.0, 40.0, 90.0, 50.0));
    assert_eq!(tree.arranged_rect(spanned).unwrap(), Rect::new(10.0, 0.0, 90.0, 5.0));
    assert_eq!(tree.desired_size(panel).unwrap(), Size::new(25.0, 17.0));
}

#[test]
fn canvas_far_offset_stretches_without_options() {
    let mut tree = Tree::new();
    let panel = tree.insert(Canvas::new());
    let child = tree.insert(Visual);
    tree.set(child, *HEIGHT, 10.0).unwrap();
    tree.set(child, *canvas::RIGHT, 30.0).unwrap();
    tree.append_child(panel, child).unwrap();
    tree.update_layout(panel, Size::new(80.0, 40.0)).unwrap();
    assert_eq!(tree.arranged_rect(child).unwrap(), Rect::new(0.0, 0.0, 50.0, 10.0));
}

#[test]
fn canvas_offset_change_only_rearranges() {
    let mut tree = Tree::new();
    let panel = tree.insert(Canvas::with_options(CanvasOptions {
        stretch_children: true,
    }));
    let child = tree.insert(Visual);
    tree.set(child, *HORIZONTAL_ALIGNMENT, Alignment::Stretch).unwrap();
    tree.append_child(panel, child).unwrap();
    tree.update_layout(panel, Size::new(80.0, 40.0)).unwrap();
    assert_eq!(tree.arranged_rect(child).unwrap(), Rect::new(0.0, 0.0, 80.0, 40.0));

    tree.set(child, *canvas::RIGHT, 30.0).unwrap();
    let flags = tree.flags(panel).unwrap();
    assert!(flags.contains(LayoutFlags::ARRANGE));
    assert!(!flags.contains(LayoutFlags::MEASURE));
    tree.update_layout(panel, Size::new(80.0, 40.0)).unwrap();
    assert_eq!(tree.arranged_rect(child).unwrap(), Rect::new(0.0, 0.0, 50.0, 40.0));
}

#[test]
fn grid_cells() {
    let mut tree = Tree::new();
    let panel = tree.insert(
        Grid::new()
            .with_columns([GridDimension::fixed(50.0), GridDimension::star(1.0)])
            .with_rows([GridDimension::auto(), GridDimension::star(1.0)]),
    );
    let header = leaf(&mut tree, panel, 10.0, 20.0);
    tree.set(header, *grid::COLUMN, 1).unwrap();
    let body = tree.insert(Visual);
    tree.set(body, *grid::ROW, 1).unwrap();
    tree.set(body, *grid::COLUMN, 9).unwrap();
    tree.append_child(panel, body).unwrap();

    tree.update_layout(panel, Size::new(150.0, 100.0)).unwrap();
    let layout = tree.layout::<Grid>(panel).unwrap();
    assert_eq!(layout.rows()[0].desired(), 20.0);
    assert_eq!(layout.rows()[1].offset(), 20.0);
    assert_eq!(layout.columns()[1].desired(), 100.0);
    // Out-of-range column 9 lands in the last column.
    assert_eq!(tree.arranged_rect(body).unwrap(), Rect::new(50.0, 20.0, 150.0, 100.0));
    assert_eq!(tree.arranged_rect(header).unwrap(), Rect::new(95.0, 0.0, 105.0, 20.0));
}

#[test]
fn grid_without_dimensions_is_one_cell() {
    let mut tree = Tree::new();
    let panel = tree.insert(Grid::new());
    let child = tree.insert(Visual);
    tree.append_child(panel, child).unwrap();
    tree.update_layout(panel, Size::new(30.0, 20.0)).unwrap();
    assert_eq!(tree.arranged_rect(child).unwrap(), Rect::new(0.0, 0.0, 30.0, 20.0));
    assert!(tree.layout::<Grid>(panel).unwrap().rows().is_empty());
}
