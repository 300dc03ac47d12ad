// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property descriptors and typed handles.

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::sync::atomic::{AtomicBool, Ordering};

use smallvec::SmallVec;

use crate::error::{Error, ErrorCode, Result};
use crate::invalidate::InvalidateMode;
use crate::object_type::ObjectType;
use crate::value::{PropertyType, Value, ValueType};

/// Converts an incoming value before it is stored. Returning an error rejects the set.
pub type ConvertHook = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// Veto hook: receives `(new, old)` and returns `false` to cancel the set.
///
/// `old` is the previously stored value, or `None` if the property was unset.
pub type ChangingHook = Arc<dyn Fn(&Value, Option<&Value>) -> bool + Send + Sync>;

/// Invoked after a value changed, with `(new, old)`.
pub type ChangedHook = Arc<dyn Fn(&Value, Option<&Value>) + Send + Sync>;

/// Computes validation errors for a value. An empty list means valid.
pub type ValidateHook = Arc<dyn Fn(&Value) -> Vec<String> + Send + Sync>;

/// Identifier of a registered descriptor.
///
/// Ids are handed out by the registry starting at 1 and never change.
/// `0` marks a descriptor that has not been registered.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DescriptorId(pub(crate) u32);

impl DescriptorId {
    /// The id of unregistered descriptors.
    pub const UNREGISTERED: Self = Self(0);

    /// Returns the raw id.
    #[must_use]
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns `true` if this id was assigned by the registry.
    #[must_use]
    #[inline]
    pub const fn is_registered(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Debug for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DescriptorId").field(&self.0).finish()
    }
}

/// Metadata of one property declared on one type.
///
/// Built with [`DescriptorBuilder`], then handed to
/// [`PropertyRegistry::add`](crate::PropertyRegistry::add), which assigns the
/// id and freezes it. Before that the option setters can still adjust it;
/// afterwards they fail with [`ErrorCode::DescriptorFrozen`].
///
/// Two descriptors are equal iff they carry the same registered id.
pub struct PropertyDescriptor {
    pub(crate) id: DescriptorId,
    name: &'static str,
    declaring_type: &'static ObjectType,
    value_type: ValueType,
    raw_default: Option<Value>,
    pub(crate) default_value: Value,
    convert: Option<ConvertHook>,
    changing: Option<ChangingHook>,
    changed: Option<ChangedHook>,
    validate: Option<ValidateHook>,
    invalidate_mode: InvalidateMode,
    aliases: SmallVec<[&'static str; 2]>,
    pub(crate) frozen: AtomicBool,
    pub(crate) overridden: AtomicBool,
}

impl PropertyDescriptor {
    /// Returns the id. [`DescriptorId::UNREGISTERED`] before registration.
    #[must_use]
    #[inline]
    pub fn id(&self) -> DescriptorId {
        self.id
    }

    /// Returns the property name.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the type that declares this property.
    #[must_use]
    #[inline]
    pub fn declaring_type(&self) -> &'static ObjectType {
        self.declaring_type
    }

    /// Returns the declared value type.
    #[must_use]
    #[inline]
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    /// Returns the default exactly as supplied, before coercion.
    #[must_use]
    #[inline]
    pub fn raw_default_value(&self) -> Option<&Value> {
        self.raw_default.as_ref()
    }

    /// Returns the default coerced to the value type.
    #[must_use]
    #[inline]
    pub fn default_value(&self) -> &Value {
        &self.default_value
    }

    /// Returns what a change of this property invalidates.
    #[must_use]
    #[inline]
    pub fn invalidate_mode(&self) -> InvalidateMode {
        self.invalidate_mode
    }

    /// Returns additional names announced when this property changes.
    #[must_use]
    pub fn aliases(&self) -> &[&'static str] {
        &self.aliases
    }

    /// Returns `true` once the descriptor is registered.
    #[must_use]
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    /// Returns `true` if a subtype of the declaring type redeclared this name.
    #[must_use]
    #[inline]
    pub fn is_overridden(&self) -> bool {
        self.overridden.load(Ordering::Acquire)
    }

    fn ensure_mutable(&self) -> Result<()> {
        if self.is_frozen() {
            return Err(Error::invariant(
                ErrorCode::DescriptorFrozen,
                format!(
                    "descriptor `{}.{}` is registered and can no longer change",
                    self.declaring_type.name(),
                    self.name
                ),
            ));
        }
        Ok(())
    }

    /// Replaces the default value.
    pub fn set_default_value(&mut self, value: Value) -> Result<()> {
        self.ensure_mutable()?;
        self.raw_default = Some(value);
        Ok(())
    }

    /// Replaces the invalidation mode.
    pub fn set_invalidate_mode(&mut self, mode: InvalidateMode) -> Result<()> {
        self.ensure_mutable()?;
        self.invalidate_mode = mode;
        Ok(())
    }

    /// Adds a name announced alongside the property's own on change.
    pub fn add_alias(&mut self, alias: &'static str) -> Result<()> {
        self.ensure_mutable()?;
        self.aliases.push(alias);
        Ok(())
    }

    /// Resolves the effective default and checks it against the value type.
    ///
    /// Called once by the registry before freezing.
    pub(crate) fn finalize_default(&mut self) -> Result<()> {
        self.default_value = match self.raw_default.clone() {
            Some(raw) => raw.coerce(&self.value_type)?,
            None if self.value_type.is_nullable() => Value::Null,
            None => self.value_type.kind().zero().ok_or_else(|| {
                Error::invalid_argument(
                    "default_value",
                    format!(
                        "property `{}` of type `{}` needs an explicit default",
                        self.name,
                        self.value_type.type_name()
                    ),
                )
            })?,
        };
        Ok(())
    }

    /// Coerces `value` to the value type, then runs the convert hook.
    pub(crate) fn convert(&self, value: Value) -> Result<Value> {
        let value = value.coerce(&self.value_type)?;
        match &self.convert {
            Some(hook) => hook(value)?.coerce(&self.value_type),
            None => Ok(value),
        }
    }

    pub(crate) fn allows_change(&self, new: &Value, old: Option<&Value>) -> bool {
        self.changing.as_ref().is_none_or(|hook| hook(new, old))
    }

    pub(crate) fn on_changed(&self, new: &Value, old: Option<&Value>) {
        if let Some(hook) = &self.changed {
            hook(new, old);
        }
    }

    pub(crate) fn has_validation(&self) -> bool {
        self.validate.is_some()
    }

    /// Returns the validation errors for `value`.
    #[must_use]
    pub fn validate(&self, value: &Value) -> Vec<String> {
        self.validate
            .as_ref()
            .map(|hook| hook(value))
            .unwrap_or_default()
    }
}

impl Clone for PropertyDescriptor {
    /// The clone keeps the id and the frozen state: a copy of a registered
    /// descriptor cannot be edited and registered as a new one.
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name,
            declaring_type: self.declaring_type,
            value_type: self.value_type,
            raw_default: self.raw_default.clone(),
            default_value: self.default_value.clone(),
            convert: self.convert.clone(),
            changing: self.changing.clone(),
            changed: self.changed.clone(),
            validate: self.validate.clone(),
            invalidate_mode: self.invalidate_mode,
            aliases: self.aliases.clone(),
            frozen: AtomicBool::new(self.is_frozen()),
            overridden: AtomicBool::new(self.is_overridden()),
        }
    }
}

impl PartialEq for PropertyDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id.is_registered() && self.id == other.id
    }
}

impl Hash for PropertyDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("declaring_type", &self.declaring_type.name())
            .field("value_type", &self.value_type.type_name())
            .field("default_value", &self.default_value)
            .field("invalidate_mode", &self.invalidate_mode)
            .field("frozen", &self.is_frozen())
            .field("overridden", &self.is_overridden())
            .finish_non_exhaustive()
    }
}

/// Builder for typed descriptors.
///
/// ```rust
/// use canopy_property::{DescriptorBuilder, InvalidateMode, ObjectType, PROPERTY_OWNER};
///
/// static GAUGE: ObjectType = ObjectType::new("Gauge", &PROPERTY_OWNER);
///
/// let descriptor = DescriptorBuilder::<f64>::new(&GAUGE, "Level")
///     .default_value(0.5)
///     .convert(|v| Ok(v.clamp(0.0, 1.0)))
///     .invalidate(InvalidateMode::RENDER)
///     .build();
///
/// assert_eq!(descriptor.name(), "Level");
/// assert!(!descriptor.is_frozen());
/// ```
pub struct DescriptorBuilder<T: PropertyType> {
    descriptor: PropertyDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: PropertyType> DescriptorBuilder<T> {
    /// Starts a descriptor for `name` declared on `declaring_type`.
    ///
    /// Without [`default_value`](Self::default_value) the registry uses the
    /// type's zero value.
    #[must_use]
    pub fn new(declaring_type: &'static ObjectType, name: &'static str) -> Self {
        Self {
            descriptor: PropertyDescriptor {
                id: DescriptorId::UNREGISTERED,
                name,
                declaring_type,
                value_type: ValueType::of::<T>(),
                raw_default: T::zero().map(T::into_value),
                default_value: Value::Null,
                convert: None,
                changing: None,
                changed: None,
                validate: None,
                invalidate_mode: InvalidateMode::NONE,
                aliases: SmallVec::new(),
                frozen: AtomicBool::new(false),
                overridden: AtomicBool::new(false),
            },
            _marker: PhantomData,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: T) -> Self {
        self.descriptor.raw_default = Some(value.into_value());
        self
    }

    /// Sets what a change of this property invalidates.
    #[must_use]
    pub fn invalidate(mut self, mode: InvalidateMode) -> Self {
        self.descriptor.invalidate_mode = mode;
        self
    }

    /// Adds a name announced alongside the property's own on change.
    #[must_use]
    pub fn alias(mut self, alias: &'static str) -> Self {
        self.descriptor.aliases.push(alias);
        self
    }

    /// Converts incoming values. Returning an error rejects the set.
    #[must_use]
    pub fn convert<F>(mut self, convert: F) -> Self
    where
        F: Fn(T) -> Result<T> + Send + Sync + 'static,
    {
        self.descriptor.convert = Some(Arc::new(move |value: Value| {
            let typed = T::from_value(&value).ok_or_else(|| {
                Error::invalid_argument(
                    "value",
                    format!("expected `{}`", core::any::type_name::<T>()),
                )
            })?;
            convert(typed).map(T::into_value)
        }));
        self
    }

    /// Vetoes changes: return `false` from `changing(new, old)` to keep the old value.
    #[must_use]
    pub fn changing<F>(mut self, changing: F) -> Self
    where
        F: Fn(&T, Option<&T>) -> bool + Send + Sync + 'static,
    {
        self.descriptor.changing = Some(Arc::new(move |new: &Value, old: Option<&Value>| {
            match T::from_value(new) {
                Some(new) => {
                    let old = old.and_then(T::from_value);
                    changing(&new, old.as_ref())
                }
                None => true,
            }
        }));
        self
    }

    /// Runs `changed(new, old)` after every effective change.
    #[must_use]
    pub fn changed<F>(mut self, changed: F) -> Self
    where
        F: Fn(&T, Option<&T>) + Send + Sync + 'static,
    {
        self.descriptor.changed = Some(Arc::new(move |new: &Value, old: Option<&Value>| {
            if let Some(new) = T::from_value(new) {
                let old = old.and_then(T::from_value);
                changed(&new, old.as_ref());
            }
        }));
        self
    }

    /// Validates values; errors feed the errors-changed notification.
    #[must_use]
    pub fn validate<F>(mut self, validate: F) -> Self
    where
        F: Fn(&T) -> Vec<String> + Send + Sync + 'static,
    {
        self.descriptor.validate = Some(Arc::new(move |value: &Value| {
            T::from_value(value).map(|v| validate(&v)).unwrap_or_default()
        }));
        self
    }

    /// Returns the unregistered descriptor.
    #[must_use]
    pub fn build(self) -> PropertyDescriptor {
        self.descriptor
    }
}

impl<T: PropertyType> fmt::Debug for DescriptorBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorBuilder")
            .field("descriptor", &self.descriptor)
            .finish()
    }
}

/// A typed handle to a registered descriptor.
///
/// `Copy`, pointer-sized, and valid for the life of the process: registered
/// descriptors are never removed.
pub struct Property<T> {
    descriptor: &'static PropertyDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: PropertyType> Property<T> {
    /// Wraps a registered descriptor, checking its value type.
    pub fn from_descriptor(descriptor: &'static PropertyDescriptor) -> Result<Self> {
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
        Ok(Self {
            descriptor,
            _marker: PhantomData,
        })
    }
}

impl<T> Property<T> {
    /// Returns the descriptor.
    #[must_use]
    #[inline]
    pub fn descriptor(self) -> &'static PropertyDescriptor {
        self.descriptor
    }

    /// Returns the descriptor id.
    #[must_use]
    #[inline]
    pub fn id(self) -> DescriptorId {
        self.descriptor.id
    }

    /// Returns the property name.
    #[must_use]
    #[inline]
    pub fn name(self) -> &'static str {
        self.descriptor.name
    }
}

impl<T> Copy for Property<T> {}

impl<T> Clone for Property<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Property<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.id == other.descriptor.id
    }
}

impl<T> Eq for Property<T> {}

impl<T> Hash for Property<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.descriptor.id.hash(state);
    }
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("id", &self.descriptor.id)
            .field("name", &self.descriptor.name)
            .field("type", &core::any::type_name::<T>())
            .finish()
    }
}
