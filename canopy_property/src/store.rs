// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-object sparse property storage.
//!
//! Values live in a `SmallVec` sorted by descriptor id and searched with
//! binary search: objects rarely set more than a handful of properties, so
//! the first eight entries stay inline. An absent entry reads as the
//! descriptor default.
//!
//! Every access first resolves the descriptor through
//! [`PropertyRegistry::get_final`] for the store's runtime type, so a handle
//! to a base declaration transparently reaches a subtype's redeclaration.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use smallvec::SmallVec;

use crate::descriptor::{DescriptorId, Property, PropertyDescriptor};
use crate::error::Result;
use crate::event::{ListenerId, PropertyEvent, SetOptions};
use crate::object_type::ObjectType;
use crate::registry::PropertyRegistry;
use crate::value::{PropertyType, Value};

const INLINE_CAPACITY: usize = 8;

type Listener = Box<dyn FnMut(&PropertyEvent<'_>) + Send>;

/// Local property values of one object.
///
/// ```rust
/// use canopy_property::{
///     DescriptorBuilder, ObjectType, PropertyEvent, PropertyRegistry, PropertyStore,
///     PROPERTY_OWNER,
/// };
/// use std::sync::{Arc, Mutex};
///
/// static LABEL: ObjectType = ObjectType::new("DocLabel", &PROPERTY_OWNER);
///
/// let font_size = PropertyRegistry::global()
///     .register::<f64>(DescriptorBuilder::<f64>::new(&LABEL, "FontSize").default_value(12.0).build());
///
/// let mut store = PropertyStore::new(&LABEL);
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// store.subscribe(move |event| {
///     if let PropertyEvent::Changed { name, .. } = event {
///         sink.lock().unwrap().push(*name);
///     }
/// });
///
/// assert_eq!(store.get(font_size), 12.0);
/// assert!(store.set(font_size, 14.0).unwrap());
/// assert!(!store.set(font_size, 14.0).unwrap());
/// assert_eq!(store.get(font_size), 14.0);
/// assert_eq!(*seen.lock().unwrap(), ["FontSize"]);
/// ```
pub struct PropertyStore {
    object_type: &'static ObjectType,
    entries: SmallVec<[(DescriptorId, Value); INLINE_CAPACITY]>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u32,
    raise_errors_changed: bool,
}

impl PropertyStore {
    /// Creates an empty store for an object of `object_type`.
    #[must_use]
    pub fn new(object_type: &'static ObjectType) -> Self {
        Self {
            object_type,
            entries: SmallVec::new(),
            listeners: Vec::new(),
            next_listener: 0,
            raise_errors_changed: true,
        }
    }

    /// Returns the runtime type used for override resolution.
    #[must_use]
    #[inline]
    pub fn object_type(&self) -> &'static ObjectType {
        self.object_type
    }

    /// Returns the number of properties with a local value.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no property has a local value.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the locally set values in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static PropertyDescriptor, &Value)> + '_ {
        let registry = PropertyRegistry::global();
        self.entries
            .iter()
            .filter_map(move |(id, value)| registry.by_id(*id).map(|d| (d, value)))
    }

    /// Resolves `descriptor` for this store's runtime type.
    #[must_use]
    #[inline]
    pub fn resolve(&self, descriptor: &'static PropertyDescriptor) -> &'static PropertyDescriptor {
        PropertyRegistry::global().get_final(self.object_type, descriptor)
    }

    #[inline]
    fn find(&self, id: DescriptorId) -> core::result::Result<usize, usize> {
        self.entries.binary_search_by_key(&id, |(id, _)| *id)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Returns the effective value: the local value or the default.
    #[must_use]
    pub fn get_value(&self, descriptor: &'static PropertyDescriptor) -> &Value {
        let descriptor = self.resolve(descriptor);
        match self.find(descriptor.id()) {
            Ok(idx) => &self.entries[idx].1,
            Err(_) => descriptor.default_value(),
        }
    }

    /// Returns the effective value of a typed property.
    ///
    /// # Panics
    ///
    /// Panics if a redeclaration on the runtime type changed the value type.
    #[must_use]
    pub fn get<T: PropertyType>(&self, property: Property<T>) -> T {
        let value = self.get_value(property.descriptor());
        T::from_value(value).unwrap_or_else(|| {
            panic!(
                "property `{}` holds {:?}, which is not a `{}`",
                property.name(),
                value,
                core::any::type_name::<T>()
            )
        })
    }

    /// Returns the local value, or `None` if the property is not set.
    #[must_use]
    pub fn try_get<T: PropertyType>(&self, property: Property<T>) -> Option<T> {
        let descriptor = self.resolve(property.descriptor());
        self.find(descriptor.id())
            .ok()
            .and_then(|idx| T::from_value(&self.entries[idx].1))
    }

    /// Returns `true` if the property has a local value.
    #[must_use]
    pub fn is_set<T>(&self, property: Property<T>) -> bool {
        self.is_value_set(property.descriptor())
    }

    /// Returns `true` if the descriptor has a local value.
    #[must_use]
    pub fn is_value_set(&self, descriptor: &'static PropertyDescriptor) -> bool {
        self.find(self.resolve(descriptor).id()).is_ok()
    }

    /// Returns the validation errors of the effective value.
    #[must_use]
    pub fn errors<T>(&self, property: Property<T>) -> Vec<String> {
        let descriptor = self.resolve(property.descriptor());
        descriptor.validate(self.get_value(descriptor))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Sets a typed property. Returns `true` if the stored value changed.
    ///
    /// # Errors
    ///
    /// Fails if the convert hook rejects the value.
    pub fn set<T: PropertyType>(&mut self, property: Property<T>, value: T) -> Result<bool> {
        self.set_value(property.descriptor(), value.into_value(), SetOptions::empty())
    }

    /// Sets a typed property with explicit options.
    ///
    /// # Errors
    ///
    /// Fails if the convert hook rejects the value.
    pub fn set_with<T: PropertyType>(
        &mut self,
        property: Property<T>,
        value: T,
        options: SetOptions,
    ) -> Result<bool> {
        self.set_value(property.descriptor(), value.into_value(), options)
    }

    /// Sets a dynamically typed value.
    ///
    /// In order: resolve the final descriptor, convert, snapshot the errors,
    /// compare with the stored value, ask the changing hook, raise
    /// [`PropertyEvent::Changing`], store, run the changed hook, then raise
    /// [`PropertyEvent::Changed`] for the name and each alias and
    /// [`PropertyEvent::ErrorsChanged`] if needed. An equal value or a veto
    /// returns `Ok(false)` without touching anything.
    ///
    /// # Errors
    ///
    /// Fails if the value cannot be converted to the property's value type or
    /// the convert hook rejects it. The store is left unchanged.
    pub fn set_value(
        &mut self,
        descriptor: &'static PropertyDescriptor,
        value: Value,
        options: SetOptions,
    ) -> Result<bool> {
        let descriptor = self.resolve(descriptor);
        let new = descriptor.convert(value)?;

        let force_errors = options.contains(SetOptions::FORCE_RAISE_ON_ERRORS_CHANGED);
        let track_errors = self.raise_errors_changed
            && !options.contains(SetOptions::DONT_RAISE_ON_ERRORS_CHANGED)
            && (force_errors || descriptor.has_validation());
        let old_errors = track_errors.then(|| descriptor.validate(self.get_value(descriptor)));

        let id = descriptor.id();
        let slot = self.find(id);
        let old = slot.ok().map(|idx| &self.entries[idx].1);
        if let Some(old) = old {
            if !options.contains(SetOptions::DONT_TEST_VALUES_EQUALITY) && old.same_as(&new) {
                return Ok(false);
            }
        }
        if !descriptor.allows_change(&new, old) {
            tracing::trace!(property = descriptor.name(), "set vetoed");
            return Ok(false);
        }
        if !options.contains(SetOptions::DONT_RAISE_ON_PROPERTY_CHANGING) {
            Self::dispatch(
                &mut self.listeners,
                &PropertyEvent::Changing {
                    descriptor,
                    new: &new,
                    old,
                },
            );
        }

        let (idx, old) = match slot {
            Ok(idx) => (idx, Some(core::mem::replace(&mut self.entries[idx].1, new))),
            Err(idx) => {
                self.entries.insert(idx, (id, new));
                (idx, None)
            }
        };
        let new = &self.entries[idx].1;

        descriptor.on_changed(new, old.as_ref());
        if !options.contains(SetOptions::DONT_RAISE_ON_PROPERTY_CHANGED) {
            Self::announce(&mut self.listeners, descriptor, new, old.as_ref());
        }
        if let Some(old_errors) = old_errors {
            let errors = descriptor.validate(new);
            if force_errors || errors != old_errors {
                Self::dispatch(
                    &mut self.listeners,
                    &PropertyEvent::ErrorsChanged {
                        descriptor,
                        errors: &errors,
                    },
                );
            }
        }
        Ok(true)
    }

    /// Removes a typed local value and returns it.
    ///
    /// Listeners see a [`PropertyEvent::Changed`] carrying the default if a
    /// value was removed. Hooks do not run.
    pub fn reset<T: PropertyType>(&mut self, property: Property<T>) -> Option<T> {
        self.reset_value(property.descriptor())
            .and_then(|old| T::from_value(&old))
    }

    /// Removes a local value and returns it.
    pub fn reset_value(&mut self, descriptor: &'static PropertyDescriptor) -> Option<Value> {
        let descriptor = self.resolve(descriptor);
        let idx = self.find(descriptor.id()).ok()?;
        let (_, old) = self.entries.remove(idx);
        Self::announce(
            &mut self.listeners,
            descriptor,
            descriptor.default_value(),
            Some(&old),
        );
        Some(old)
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Adds a listener called synchronously for every event of this store.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&PropertyEvent<'_>) + Send + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener = self.next_listener.wrapping_add(1);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Enables or disables [`PropertyEvent::ErrorsChanged`] for this store.
    pub fn set_raise_errors_changed(&mut self, enabled: bool) {
        self.raise_errors_changed = enabled;
    }

    /// Returns `true` if errors-changed notifications are enabled.
    #[must_use]
    pub fn raises_errors_changed(&self) -> bool {
        self.raise_errors_changed
    }

    fn announce(
        listeners: &mut [(ListenerId, Listener)],
        descriptor: &'static PropertyDescriptor,
        new: &Value,
        old: Option<&Value>,
    ) {
        if listeners.is_empty() {
            return;
        }
        let names = core::iter::once(descriptor.name()).chain(descriptor.aliases().iter().copied());
        for name in names {
            Self::dispatch(
                listeners,
                &PropertyEvent::Changed {
                    name,
                    descriptor,
                    new,
                    old,
                },
            );
        }
    }

    fn dispatch(listeners: &mut [(ListenerId, Listener)], event: &PropertyEvent<'_>) {
        for (_, listener) in listeners.iter_mut() {
            listener(event);
        }
    }
}

impl fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyStore")
            .field("object_type", &self.object_type.name())
            .field("entries", &self.entries)
            .field("listeners", &self.listeners.len())
            .field("raise_errors_changed", &self.raise_errors_changed)
            .finish()
    }
}
