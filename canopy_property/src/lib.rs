// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Property: descriptors, per-object value stores and invalidation flags.
//!
//! This crate is the bottom layer of the Canopy toolkit core. It provides:
//!
//! - [`ObjectType`]: static type tokens with a single-inheritance base chain.
//! - [`PropertyRegistry`]: the global, append-only catalog of
//!   [`PropertyDescriptor`]s with per-type override resolution.
//! - [`PropertyStore`]: a sparse per-object map of local values with
//!   convert, veto and changed hooks and synchronous [`PropertyEvent`]s.
//! - [`InvalidateMode`]: what a property change requires from the layout
//!   pipeline, reduced to a single [`Effect`] for the node and its parent.
//! - [`Error`]: the error type shared by every Canopy crate.
//!
//! ## Override resolution
//!
//! A property declared on a base type can be redeclared, with the same name,
//! on a subtype. Handles to the base declaration keep working: every store
//! access resolves the handle for the store's runtime type through
//! [`PropertyRegistry::get_final`]. The walk up the type chain happens once
//! at registration; reads of properties that were never redeclared check a
//! single flag.
//!
//! ## Quick Start
//!
//! ```rust
//! use canopy_property::{
//!     DescriptorBuilder, InvalidateMode, ObjectType, PropertyRegistry, PropertyStore,
//!     PROPERTY_OWNER,
//! };
//!
//! static CONTROL: ObjectType = ObjectType::new("QuickControl", &PROPERTY_OWNER);
//! static SLIDER: ObjectType = ObjectType::new("QuickSlider", &CONTROL);
//!
//! let registry = PropertyRegistry::global();
//! let width = registry.register::<f64>(
//!     DescriptorBuilder::<f64>::new(&CONTROL, "Width")
//!         .default_value(f64::NAN)
//!         .invalidate(InvalidateMode::MEASURE)
//!         .build(),
//! );
//! // Sliders default to a fixed width.
//! registry.register::<f64>(
//!     DescriptorBuilder::<f64>::new(&SLIDER, "Width")
//!         .default_value(120.0)
//!         .invalidate(InvalidateMode::MEASURE)
//!         .build(),
//! );
//!
//! let control = PropertyStore::new(&CONTROL);
//! let mut slider = PropertyStore::new(&SLIDER);
//! assert!(control.get(width).is_nan());
//! assert_eq!(slider.get(width), 120.0);
//!
//! assert!(slider.set(width, 80.0).unwrap());
//! assert!(!slider.set(width, 80.0).unwrap());
//! assert_eq!(slider.reset(width), Some(80.0));
//! ```
//!
//! ## Threading
//!
//! The registry may be read from any thread. Registration takes a write lock
//! and is expected during type initialization. Stores are plain owned values
//! mutated through `&mut`; wrap them in a lock to share across threads.

extern crate alloc;

mod descriptor;
mod error;
mod event;
mod invalidate;
mod object_type;
mod registry;
mod store;
mod value;

pub use descriptor::{
    ChangedHook, ChangingHook, ConvertHook, DescriptorBuilder, DescriptorId, Property,
    PropertyDescriptor, ValidateHook,
};
pub use error::{Error, ErrorCode, Result};
pub use event::{ListenerId, PropertyEvent, SetOptions};
pub use invalidate::{Effect, InvalidateMode};
pub use object_type::{ObjectType, PROPERTY_OWNER};
pub use registry::PropertyRegistry;
pub use store::PropertyStore;
pub use value::{ErasedValue, PropertyType, Value, ValueKind, ValueType};
