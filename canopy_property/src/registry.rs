// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Global property registry.
//!
//! The registry is a process-wide, append-only catalog. Registration hands
//! out ids, freezes the descriptor, indexes it by `(declaring type, name)`
//! and flags the nearest ancestor declaration of the same name as
//! overridden. Reads are lock-free on the fast path: a descriptor that was
//! never overridden resolves to itself without touching the index.

use alloc::boxed::Box;
use alloc::format;
use alloc::vec::Vec;
use core::sync::atomic::Ordering;
use std::sync::LazyLock;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::descriptor::{DescriptorId, Property, PropertyDescriptor};
use crate::error::{Error, ErrorCode, Result};
use crate::object_type::ObjectType;
use crate::value::{PropertyType, ValueType};

static GLOBAL: LazyLock<PropertyRegistry> = LazyLock::new(PropertyRegistry::new);

/// Descriptors are leaked on registration so handles can be `&'static`.
type Entry = &'static PropertyDescriptor;

#[derive(Default)]
struct Inner {
    /// Indexed by `id - 1`.
    by_id: Vec<Entry>,
    /// Declaring type, then name.
    by_type: HashMap<&'static ObjectType, HashMap<&'static str, Entry>>,
    /// Memoized `get_final` results for overridden descriptors.
    finals: HashMap<(&'static ObjectType, DescriptorId), Entry>,
}

/// The property registry.
///
/// ```rust
/// use canopy_property::{
///     DescriptorBuilder, InvalidateMode, ObjectType, PropertyRegistry, PROPERTY_OWNER,
/// };
///
/// static BUTTON: ObjectType = ObjectType::new("DocButton", &PROPERTY_OWNER);
/// static TOGGLE: ObjectType = ObjectType::new("DocToggle", &BUTTON);
///
/// let registry = PropertyRegistry::global();
/// let base = registry
///     .add::<f64>(DescriptorBuilder::<f64>::new(&BUTTON, "Padding").build())
///     .unwrap();
/// let redeclared = registry
///     .add::<f64>(
///         DescriptorBuilder::<f64>::new(&TOGGLE, "Padding")
///             .default_value(4.0)
///             .invalidate(InvalidateMode::MEASURE)
///             .build(),
///     )
///     .unwrap();
///
/// assert!(base.descriptor().is_overridden());
/// assert_eq!(registry.get_final(&TOGGLE, base.descriptor()), redeclared.descriptor());
/// assert_eq!(registry.get_final(&BUTTON, base.descriptor()), base.descriptor());
/// ```
pub struct PropertyRegistry {
    inner: RwLock<Inner>,
}

impl PropertyRegistry {
    fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Returns the process-wide registry.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Registers a descriptor and returns its typed handle.
    ///
    /// The descriptor gets the next id, its default is coerced to the value
    /// type (or synthesized as the type's zero), and it is frozen. If an
    /// ancestor of the declaring type already declares the same name, that
    /// ancestor's descriptor is flagged as overridden. Registering a name
    /// twice on the same type replaces the earlier entry for future lookups.
    ///
    /// # Errors
    ///
    /// - [`ErrorCode::NotPropertyOwner`] if the declaring type does not
    ///   derive from [`PROPERTY_OWNER`](crate::PROPERTY_OWNER).
    /// - [`ErrorCode::DescriptorFrozen`] if the descriptor is already registered.
    /// - [`Error::InvalidArgument`] if `T` does not match the descriptor or
    ///   the default cannot be converted.
    pub fn add<T: PropertyType>(&self, mut descriptor: PropertyDescriptor) -> Result<Property<T>> {
        let declaring = descriptor.declaring_type();
        if !declaring.is_property_owner() {
            return Err(Error::invariant(
                ErrorCode::NotPropertyOwner,
                format!(
                    "`{declaring}` cannot declare `{}`: it does not derive from PropertyOwner",
                    descriptor.name()
                ),
            ));
        }
        if descriptor.is_frozen() || descriptor.id().is_registered() {
            return Err(Error::invariant(
                ErrorCode::DescriptorFrozen,
                format!(
                    "`{declaring}.{}` is already registered as {:?}",
                    descriptor.name(),
                    descriptor.id()
                ),
            ));
        }
        if descriptor.value_type().type_id() != ValueType::of::<T>().type_id() {
            return Err(Error::invalid_argument(
                "descriptor",
                format!(
                    "`{}` holds `{}`, not `{}`",
                    descriptor.name(),
                    descriptor.value_type().type_name(),
                    core::any::type_name::<T>()
                ),
            ));
        }
        descriptor.finalize_default()?;

        let mut inner = self.inner.write();
        let next = inner.by_id.len() + 1;
        let id = u32::try_from(next)
            .map(DescriptorId)
            .map_err(|_| Error::invalid_argument("descriptor", "too many properties"))?;
        descriptor.id = id;
        descriptor.frozen.store(true, Ordering::Release);

        let name = descriptor.name();
        let entry: Entry = Box::leak(Box::new(descriptor));
        let handle = Property::<T>::from_descriptor(entry)?;

        inner.by_id.push(entry);
        let previous = inner.by_type.entry(declaring).or_default().insert(name, entry);
        if let Some(previous) = previous {
            previous.overridden.store(true, Ordering::Release);
            tracing::debug!(
                property = name,
                declaring_type = declaring.name(),
                old = previous.id().get(),
                new = id.get(),
                "re-registered property replaces earlier declaration"
            );
        }

        // The root itself never declares overridable properties.
        for ancestor in declaring
            .ancestors()
            .take_while(|a| a.base().is_some())
        {
            if let Some(base) = inner.by_type.get(ancestor).and_then(|m| m.get(name)) {
                base.overridden.store(true, Ordering::Release);
                tracing::debug!(
                    property = name,
                    declaring_type = declaring.name(),
                    overrides = ancestor.name(),
                    "property override detected"
                );
                break;
            }
        }
        inner.finals.clear();

        tracing::debug!(
            id = id.get(),
            property = name,
            declaring_type = declaring.name(),
            value_type = entry.value_type().type_name(),
            "registered property"
        );
        Ok(handle)
    }

    /// Registers a descriptor for static initialization.
    ///
    /// # Panics
    ///
    /// Panics if [`add`](Self::add) fails.
    pub fn register<T: PropertyType>(&self, descriptor: PropertyDescriptor) -> Property<T> {
        let name = descriptor.name();
        match self.add(descriptor) {
            Ok(property) => property,
            Err(err) => panic!("failed to register property `{name}`: {err}"),
        }
    }

    /// Resolves `descriptor` to the declaration seen by objects of `runtime_type`.
    ///
    /// Descriptors that were never overridden resolve to themselves. Otherwise
    /// the runtime type's chain is searched, most derived first, for a
    /// declaration with the same name; the first one found wins. Types outside
    /// the redeclaring branch fall back to `descriptor`.
    #[must_use]
    pub fn get_final(
        &self,
        runtime_type: &'static ObjectType,
        descriptor: &'static PropertyDescriptor,
    ) -> &'static PropertyDescriptor {
        if !descriptor.is_overridden() {
            return descriptor;
        }
        let key = (runtime_type, descriptor.id());
        let cached = self.inner.read().finals.get(&key).copied();
        if let Some(found) = cached {
            return found;
        }

        let mut inner = self.inner.write();
        let name = descriptor.name();
        let declaring = descriptor.declaring_type();
        let resolved = core::iter::once(runtime_type)
            .chain(runtime_type.ancestors())
            .take_while(|ty| ty.is_subtype_of(declaring))
            .find_map(|ty| inner.by_type.get(ty).and_then(|m| m.get(name)).copied())
            .unwrap_or(descriptor);
        inner.finals.insert(key, resolved);
        resolved
    }

    /// Looks up a descriptor by id.
    #[must_use]
    pub fn by_id(&self, id: DescriptorId) -> Option<&'static PropertyDescriptor> {
        let index = usize::try_from(id.get()).ok()?.checked_sub(1)?;
        self.inner.read().by_id.get(index).copied()
    }

    /// Looks up the descriptor declared on exactly `declaring_type` under `name`.
    #[must_use]
    pub fn by_name(
        &self,
        declaring_type: &'static ObjectType,
        name: &str,
    ) -> Option<&'static PropertyDescriptor> {
        self.inner
            .read()
            .by_type
            .get(declaring_type)
            .and_then(|m| m.get(name))
            .copied()
    }

    /// Finds `name` on `runtime_type` or its nearest ancestor declaring it.
    #[must_use]
    pub fn find(
        &self,
        runtime_type: &'static ObjectType,
        name: &str,
    ) -> Option<&'static PropertyDescriptor> {
        let inner = self.inner.read();
        core::iter::once(runtime_type)
            .chain(runtime_type.ancestors())
            .find_map(|ty| inner.by_type.get(ty).and_then(|m| m.get(name)).copied())
    }

    /// Returns the descriptors declared directly on `declaring_type`, by id.
    #[must_use]
    pub fn declared_on(&self, declaring_type: &'static ObjectType) -> Vec<&'static PropertyDescriptor> {
        let mut found: Vec<_> = self
            .inner
            .read()
            .by_type
            .get(declaring_type)
            .map(|m| m.values().copied().collect())
            .unwrap_or_default();
        found.sort_by_key(|d| d.id());
        found
    }

    /// Returns the number of registered descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    /// Returns `true` if nothing was registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl core::fmt::Debug for PropertyRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("PropertyRegistry")
            .field("count", &inner.by_id.len())
            .field("types", &inner.by_type.len())
            .finish_non_exhaustive()
    }
}
