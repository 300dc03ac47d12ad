// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the `canopy_property` crate.
//!
//! These exercise override resolution through the global registry, the set
//! pipeline's no-op guarantees and the invalidation reducers.

use std::sync::{Arc, Mutex};

use canopy_property::{
    DescriptorBuilder, Effect, InvalidateMode, ObjectType, PROPERTY_OWNER, PropertyEvent,
    PropertyRegistry, PropertyStore, SetOptions, object_property_type,
};

static BASE: ObjectType = ObjectType::new("TestBase", &PROPERTY_OWNER);
static DERIVED: ObjectType = ObjectType::new("TestDerived", &BASE);
static SIBLING: ObjectType = ObjectType::new("TestSibling", &BASE);

#[derive(Clone, Debug, Default, PartialEq)]
struct Tag(String);

object_property_type!(Tag);

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum Side {
    #[default]
    Left,
    Right,
}

object_property_type!(Side);

/// Counts hook invocations and events for one store.
#[derive(Default)]
struct Counters {
    changing: u32,
    changed: u32,
    events: u32,
}

fn counting_store(ty: &'static ObjectType, counters: &Arc<Mutex<Counters>>) -> PropertyStore {
    let mut store = PropertyStore::new(ty);
    let sink = counters.clone();
    store.subscribe(move |event| {
        if matches!(event, PropertyEvent::Changed { .. }) {
            sink.lock().unwrap().events += 1;
        }
    });
    store
}

#[test]
fn override_resolves_per_runtime_type() {
    let registry = PropertyRegistry::global();
    let base = registry.register::<f64>(
        DescriptorBuilder::<f64>::new(&BASE, "Thickness")
            .default_value(1.0)
            .build(),
    );
    let derived = registry.register::<f64>(
        DescriptorBuilder::<f64>::new(&DERIVED, "Thickness")
            .default_value(2.0)
            .build(),
    );

    assert!(base.descriptor().is_overridden());
    assert_eq!(
        registry.get_final(&DERIVED, base.descriptor()),
        derived.descriptor()
    );
    assert_eq!(registry.get_final(&BASE, base.descriptor()), base.descriptor());
    assert_eq!(
        registry.get_final(&SIBLING, base.descriptor()),
        base.descriptor()
    );

    // Stores see the redeclared default through the base handle.
    assert_eq!(PropertyStore::new(&DERIVED).get(base), 2.0);
    assert_eq!(PropertyStore::new(&SIBLING).get(base), 1.0);

    // Setting through the base handle lands on the derived descriptor.
    let mut store = PropertyStore::new(&DERIVED);
    store.set(base, 5.0).unwrap();
    assert_eq!(store.get(derived), 5.0);
    assert!(store.is_set(derived));
}

#[test]
fn reregistering_on_the_same_type_replaces_for_new_lookups() {
    let registry = PropertyRegistry::global();
    let first = registry.register::<i64>(DescriptorBuilder::<i64>::new(&BASE, "Replaced").build());
    let second = registry.register::<i64>(
        DescriptorBuilder::<i64>::new(&BASE, "Replaced")
            .default_value(9)
            .build(),
    );
    assert_ne!(first, second);
    assert_eq!(registry.by_name(&BASE, "Replaced"), Some(second.descriptor()));
    assert_eq!(PropertyStore::new(&BASE).get(first), 9);
}

#[test]
fn setting_the_same_value_twice_notifies_once() {
    let counters = Arc::new(Mutex::new(Counters::default()));
    let (c1, c2) = (counters.clone(), counters.clone());
    let p = PropertyRegistry::global().register::<Tag>(
        DescriptorBuilder::<Tag>::new(&BASE, "Tag")
            .changing(move |_, _| {
                c1.lock().unwrap().changing += 1;
                true
            })
            .changed(move |_, _| c2.lock().unwrap().changed += 1)
            .build(),
    );
    let mut store = counting_store(&BASE, &counters);

    assert!(store.set(p, Tag("a".into())).unwrap());
    assert!(!store.set(p, Tag("a".into())).unwrap());

    let counters = counters.lock().unwrap();
    assert_eq!(counters.changing, 1);
    assert_eq!(counters.changed, 1);
    assert_eq!(counters.events, 1);
}

#[test]
fn veto_keeps_value_and_stays_silent() {
    let counters = Arc::new(Mutex::new(Counters::default()));
    let c = counters.clone();
    let p = PropertyRegistry::global().register::<i64>(
        DescriptorBuilder::<i64>::new(&BASE, "Capped")
            .default_value(1)
            .changing(|new, _| *new <= 100)
            .changed(move |_, _| c.lock().unwrap().changed += 1)
            .build(),
    );
    let mut store = counting_store(&BASE, &counters);

    assert!(store.set(p, 50).unwrap());
    assert!(!store.set(p, 500).unwrap());
    assert_eq!(store.get(p), 50);

    let counters = counters.lock().unwrap();
    assert_eq!(counters.changed, 1);
    assert_eq!(counters.events, 1);
}

#[test]
fn skipping_equality_fires_again() {
    let counters = Arc::new(Mutex::new(Counters::default()));
    let p = PropertyRegistry::global()
        .register::<bool>(DescriptorBuilder::<bool>::new(&BASE, "Pulse").build());
    let mut store = counting_store(&BASE, &counters);
    store.set(p, true).unwrap();
    store
        .set_with(p, true, SetOptions::DONT_TEST_VALUES_EQUALITY)
        .unwrap();
    assert_eq!(counters.lock().unwrap().events, 2);
}

#[test]
fn changed_hook_receives_old_value() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let p = PropertyRegistry::global().register::<i64>(
        DescriptorBuilder::<i64>::new(&BASE, "History")
            .changed(move |new, old| sink.lock().unwrap().push((*new, old.copied())))
            .build(),
    );
    let mut store = PropertyStore::new(&BASE);
    store.set(p, 1).unwrap();
    store.set(p, 2).unwrap();
    assert_eq!(*seen.lock().unwrap(), [(1, None), (2, Some(1))]);
}

#[test]
fn invalidation_reduction() {
    let mode = InvalidateMode::RENDER | InvalidateMode::MEASURE;
    assert_eq!(mode.self_effect(), Effect::Measure);

    let mode = InvalidateMode::PARENT_RENDER | InvalidateMode::PARENT_ARRANGE;
    assert_eq!(mode.parent_effect(), Effect::Arrange);

    assert_eq!(InvalidateMode::NONE.self_effect(), Effect::None);
    assert_eq!(InvalidateMode::NONE.parent_effect(), Effect::None);
}

#[test]
fn descriptor_keeps_invalidate_mode() {
    let p = PropertyRegistry::global().register::<f64>(
        DescriptorBuilder::<f64>::new(&BASE, "Dock")
            .invalidate(InvalidateMode::PARENT_MEASURE)
            .build(),
    );
    let mode = p.descriptor().invalidate_mode();
    assert_eq!(mode.self_effect(), Effect::None);
    assert_eq!(mode.parent_effect(), Effect::Measure);
}

#[test]
fn nullable_object_property_holds_values() {
    let p = PropertyRegistry::global().register::<Option<Side>>(
        DescriptorBuilder::<Option<Side>>::new(&BASE, "PreferredSide")
            .default_value(Some(Side::Left))
            .build(),
    );
    let mut store = PropertyStore::new(&BASE);
    assert_eq!(store.get(p), Some(Side::Left));

    assert!(store.set(p, Some(Side::Right)).unwrap());
    assert_eq!(store.get(p), Some(Side::Right));
    assert!(!store.set(p, Some(Side::Right)).unwrap());

    assert!(store.set(p, None).unwrap());
    assert_eq!(store.get(p), None);
    assert!(store.is_set(p));

    assert_eq!(store.reset(p), Some(None));
    assert_eq!(store.get(p), Some(Side::Left));
    assert!(!store.is_set(p));
}

#[test]
fn nullable_object_property_rejects_other_payloads() {
    let p = PropertyRegistry::global().register::<Option<Side>>(
        DescriptorBuilder::<Option<Side>>::new(&BASE, "NullableSide").build(),
    );
    let mut store = PropertyStore::new(&BASE);
    assert_eq!(store.get(p), None);
    let err = store
        .set_value(
            p.descriptor(),
            canopy_property::Value::Object(canopy_property::ErasedValue::new(Tag("x".into()))),
            SetOptions::empty(),
        )
        .unwrap_err();
    assert!(matches!(err, canopy_property::Error::InvalidArgument { .. }));
    assert!(!store.is_set(p));
}
