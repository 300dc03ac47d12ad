// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for the measure/arrange passes over panel trees.
//!
//! Each case builds a synthetic tree and then times a full layout after a
//! leaf change (the usual incremental case) and a cached layout with no
//! change at all.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use kurbo::Size;

use canopy_layout::{HEIGHT, NodeId, Tree, Visual, WIDTH};
use canopy_panels::{Dock, DockSide, Grid, GridDimension, Stack, Wrap, dock, grid};

const VIEWPORT: Size = Size::new(1280.0, 800.0);

fn leaf(tree: &mut Tree, parent: NodeId, i: usize) -> NodeId {
    let node = tree.insert(Visual);
    let extent = 10.0 + (i % 7) as f64 * 3.0;
    tree.set(node, *WIDTH, extent).unwrap();
    tree.set(node, *HEIGHT, 12.0).unwrap();
    tree.append_child(parent, node).unwrap();
    node
}

/// A dock with a toolbar, a sidebar stack, a status bar and a wrapping body.
fn build_app(items: usize) -> (Tree, NodeId, NodeId) {
    let mut tree = Tree::new();
    let root = tree.insert(Dock::new());

    let toolbar = tree.insert(Stack::new());
    tree.set(toolbar, *dock::DOCK, DockSide::Top).unwrap();
    tree.append_child(root, toolbar).unwrap();
    for i in 0..12 {
        leaf(&mut tree, toolbar, i);
    }

    let sidebar = tree.insert(Stack::new());
    tree.set(sidebar, *dock::DOCK, DockSide::Left).unwrap();
    tree.append_child(root, sidebar).unwrap();
    for i in 0..40 {
        leaf(&mut tree, sidebar, i);
    }

    let status = tree.insert(
        Grid::new().with_columns([
            GridDimension::star(1.0),
            GridDimension::fixed(120.0),
            GridDimension::auto(),
        ]),
    );
    tree.set(status, *dock::DOCK, DockSide::Bottom).unwrap();
    tree.append_child(root, status).unwrap();
    for i in 0..3 {
        let cell = leaf(&mut tree, status, i);
        tree.set(cell, *grid::COLUMN, i64::try_from(i).unwrap()).unwrap();
    }

    let body = tree.insert(Wrap::new());
    tree.append_child(root, body).unwrap();
    let mut last = body;
    for i in 0..items {
        last = leaf(&mut tree, body, i);
    }
    (tree, root, last)
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/app");

    for items in [100_usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("full", items), &items, |b, &items| {
            let (mut tree, root, _) = build_app(items);
            let mut toggle = false;
            b.iter(|| {
                // Resizing the viewport forces every pass.
                toggle = !toggle;
                let width = if toggle { VIEWPORT.width } else { VIEWPORT.width - 1.0 };
                black_box(
                    tree.update_layout(root, Size::new(width, VIEWPORT.height))
                        .unwrap(),
                )
            });
        });

        group.bench_with_input(BenchmarkId::new("leaf_change", items), &items, |b, &items| {
            let (mut tree, root, last) = build_app(items);
            tree.update_layout(root, VIEWPORT).unwrap();
            let mut toggle = false;
            b.iter(|| {
                toggle = !toggle;
                tree.set(last, *WIDTH, if toggle { 40.0 } else { 20.0 })
                    .unwrap();
                black_box(tree.update_layout(root, VIEWPORT).unwrap())
            });
        });

        group.bench_with_input(BenchmarkId::new("cached", items), &items, |b, &items| {
            let (mut tree, root, _) = build_app(items);
            tree.update_layout(root, VIEWPORT).unwrap();
            b.iter(|| black_box(tree.update_layout(root, VIEWPORT).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_layout);
criterion_main!(benches);
