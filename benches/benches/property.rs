// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `canopy_property` reads, writes and override resolution.

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use std::sync::Once;

use canopy_property::{
    DescriptorBuilder, InvalidateMode, ObjectType, PROPERTY_OWNER, Property, PropertyRegistry,
    PropertyStore, SetOptions,
};

static CONTROL: ObjectType = ObjectType::new("BenchControl", &PROPERTY_OWNER);
static SLIDER: ObjectType = ObjectType::new("BenchSlider", &CONTROL);
static THUMB: ObjectType = ObjectType::new("BenchThumb", &SLIDER);

struct Properties {
    width: Property<f64>,
    overridden: Property<f64>,
    with_hooks: Property<f64>,
}

fn properties() -> &'static Properties {
    static PROPS: std::sync::OnceLock<Properties> = std::sync::OnceLock::new();
    PROPS.get_or_init(|| {
        let registry = PropertyRegistry::global();
        let width = registry.register::<f64>(
            DescriptorBuilder::<f64>::new(&CONTROL, "Width")
                .invalidate(InvalidateMode::MEASURE)
                .build(),
        );
        let overridden = registry.register::<f64>(
            DescriptorBuilder::<f64>::new(&CONTROL, "Height")
                .invalidate(InvalidateMode::MEASURE)
                .build(),
        );
        registry.register::<f64>(
            DescriptorBuilder::<f64>::new(&SLIDER, "Height")
                .default_value(24.0)
                .invalidate(InvalidateMode::MEASURE)
                .build(),
        );
        let with_hooks = registry.register::<f64>(
            DescriptorBuilder::<f64>::new(&CONTROL, "Value")
                .convert(|v| Ok(v.clamp(0.0, 100.0)))
                .changing(|new, _| new.is_finite())
                .changed(|new, _| {
                    black_box(new);
                })
                .build(),
        );
        Properties {
            width,
            overridden,
            with_hooks,
        }
    })
}

fn bench_property(c: &mut Criterion) {
    static PRINT_SIZES: Once = Once::new();
    PRINT_SIZES.call_once(|| {
        eprintln!(
            "sizes: PropertyStore={} Value={}",
            size_of::<PropertyStore>(),
            size_of::<canopy_property::Value>(),
        );
    });
    let props = properties();

    let mut group = c.benchmark_group("property/get");

    group.bench_function("default", |b| {
        let store = PropertyStore::new(&CONTROL);
        b.iter(|| black_box(store.get(props.width)));
    });

    group.bench_function("local", |b| {
        let mut store = PropertyStore::new(&CONTROL);
        store.set(props.width, 100.0).unwrap();
        b.iter(|| black_box(store.get(props.width)));
    });

    group.bench_function("overridden/base_type", |b| {
        let store = PropertyStore::new(&CONTROL);
        b.iter(|| black_box(store.get(props.overridden)));
    });

    group.bench_function("overridden/derived_type", |b| {
        let store = PropertyStore::new(&THUMB);
        b.iter(|| black_box(store.get(props.overridden)));
    });

    group.bench_function("all_declared_set", |b| {
        let registry = PropertyRegistry::global();
        let mut store = PropertyStore::new(&CONTROL);
        for d in registry.declared_on(&CONTROL) {
            store
                .set_value(d, canopy_property::Value::Float(1.0), SetOptions::empty())
                .unwrap();
        }
        b.iter(|| black_box(store.get(props.with_hooks)));
    });

    group.finish();

    let mut group = c.benchmark_group("property/set");

    group.bench_function("changed", |b| {
        b.iter_batched(
            || PropertyStore::new(&CONTROL),
            |mut store| {
                black_box(store.set(props.width, 123.0).unwrap());
                store
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("unchanged", |b| {
        let mut store = PropertyStore::new(&CONTROL);
        store.set(props.width, 123.0).unwrap();
        b.iter(|| black_box(store.set(props.width, 123.0).unwrap()));
    });

    group.bench_function("hooks", |b| {
        let mut store = PropertyStore::new(&CONTROL);
        let mut v = 0.0;
        b.iter(|| {
            v = (v + 1.0) % 100.0;
            black_box(store.set(props.with_hooks, v).unwrap())
        });
    });

    group.bench_function("listener", |b| {
        let mut store = PropertyStore::new(&CONTROL);
        let mut count = 0_u64;
        let _listener = store.subscribe(move |event| {
            count += 1;
            black_box((count, event.descriptor().id()));
        });
        let mut v = 0.0;
        b.iter(|| {
            v += 1.0;
            black_box(store.set(props.width, v).unwrap())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_property);
criterion_main!(benches);
