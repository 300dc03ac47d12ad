// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property values.
//!
//! Stores hold a closed set of value shapes ([`Value`]) so that the common
//! layout types never go through dynamic typing. Anything else (brushes,
//! geometries, user enums) travels in [`Value::Object`] through the
//! type-erased [`ErasedValue`].

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::{Any, TypeId};
use core::fmt;

use kurbo::{Insets, Point, Rect, Size};

use crate::error::{Error, Result};

/// A type-erased value with dynamic equality.
///
/// ```rust
/// use canopy_property::ErasedValue;
///
/// let value = ErasedValue::new(42_i32);
/// assert!(value.is::<i32>());
/// assert_eq!(value.downcast_ref::<i32>(), Some(&42));
/// assert_eq!(value, ErasedValue::new(42_i32));
/// assert_ne!(value, ErasedValue::new(42_u32));
/// ```
pub struct ErasedValue {
    inner: Box<dyn ErasedValueTrait>,
    type_id: TypeId,
    type_name: &'static str,
}

impl ErasedValue {
    /// Wraps a concrete value.
    #[must_use]
    pub fn new<T: Clone + PartialEq + Send + Sync + 'static>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
            inner: Box::new(value),
        }
    }

    /// Returns the [`TypeId`] of the contained value.
    #[must_use]
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name of the contained value.
    #[must_use]
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the contained value is of type `T`.
    #[must_use]
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Attempts to downcast to a reference of type `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if self.is::<T>() {
            self.inner.as_any().downcast_ref()
        } else {
            None
        }
    }
}

impl Clone for ErasedValue {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_boxed(),
            type_id: self.type_id,
            type_name: self.type_name,
        }
    }
}

impl PartialEq for ErasedValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.inner.eq_dyn(other.inner.as_any())
    }
}

impl fmt::Debug for ErasedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedValue")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}

trait ErasedValueTrait: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn clone_boxed(&self) -> Box<dyn ErasedValueTrait>;
    fn eq_dyn(&self, other: &dyn Any) -> bool;
}

impl<T: Clone + PartialEq + Send + Sync + 'static> ErasedValueTrait for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn ErasedValueTrait> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().is_some_and(|o| self == o)
    }
}

/// The shape of a [`Value`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `bool`.
    Bool,
    /// Signed integers.
    Int,
    /// `f64`; `NaN` is a legal value and is commonly used as "auto".
    Float,
    /// [`kurbo::Size`].
    Size,
    /// [`kurbo::Point`].
    Point,
    /// [`kurbo::Rect`].
    Rect,
    /// [`kurbo::Insets`].
    Insets,
    /// Shared string. Nullable.
    Str,
    /// Any other type, carried by [`ErasedValue`].
    Object,
}

impl ValueKind {
    /// Returns `true` for kinds that behave as values (never null).
    #[must_use]
    pub const fn is_value_kind(self) -> bool {
        !matches!(self, Self::Str)
    }

    /// The zero value of a built-in kind. `Object` has no generic zero.
    #[must_use]
    pub fn zero(self) -> Option<Value> {
        Some(match self {
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::Size => Value::Size(Size::ZERO),
            Self::Point => Value::Point(Point::ZERO),
            Self::Rect => Value::Rect(Rect::ZERO),
            Self::Insets => Value::Insets(Insets::ZERO),
            Self::Str | Self::Object => return None,
        })
    }
}

/// The declared value type of a property: its kind plus the Rust type behind it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueType {
    kind: ValueKind,
    nullable: bool,
    type_id: TypeId,
    payload_id: TypeId,
    type_name: &'static str,
}

impl ValueType {
    /// Returns the value type of `T`.
    #[must_use]
    pub fn of<T: PropertyType>() -> Self {
        Self {
            kind: T::KIND,
            nullable: T::NULLABLE,
            type_id: TypeId::of::<T>(),
            payload_id: T::payload_type_id(),
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Returns the kind.
    #[must_use]
    #[inline]
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Returns `true` if [`Value::Null`] is a legal value.
    #[must_use]
    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns the [`TypeId`] of the Rust type.
    #[must_use]
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the [`TypeId`] an [`ErasedValue`] must carry to be a value
    /// of this type. For `Option<T>` this is the payload type `T`.
    #[must_use]
    #[inline]
    pub fn payload_type_id(&self) -> TypeId {
        self.payload_id
    }

    /// Returns the Rust type name.
    #[must_use]
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if this is a value kind that is not nullable.
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        !self.nullable && self.kind.is_value_kind()
    }
}

/// A stored property value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Absent reference.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// Size.
    Size(Size),
    /// Point.
    Point(Point),
    /// Rectangle.
    Rect(Rect),
    /// Insets (margins, paddings).
    Insets(Insets),
    /// Shared string.
    Str(Arc<str>),
    /// Any other value.
    Object(ErasedValue),
}

impl Value {
    /// Returns the kind of this value, or `None` for [`Value::Null`].
    #[must_use]
    pub fn kind(&self) -> Option<ValueKind> {
        Some(match self {
            Self::Null => return None,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Size(_) => ValueKind::Size,
            Self::Point(_) => ValueKind::Point,
            Self::Rect(_) => ValueKind::Rect,
            Self::Insets(_) => ValueKind::Insets,
            Self::Str(_) => ValueKind::Str,
            Self::Object(_) => ValueKind::Object,
        })
    }

    /// Equality used by the store's change detection.
    ///
    /// Unlike `==`, two `NaN` floats compare equal here so that setting a
    /// `NaN` ("auto") property twice is a no-op.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => self == other,
        }
    }

    /// Converts this value to `target`.
    ///
    /// Same-kind values pass through; integers widen to floats; integral
    /// floats narrow to integers; `Null` becomes the zero of a non-nullable
    /// value kind. Everything else is rejected.
    pub fn coerce(self, target: &ValueType) -> Result<Self> {
        let kind = target.kind();
        match (self, kind) {
            (Self::Null, _) if target.is_nullable() => Ok(Self::Null),
            (Self::Null, k) => k.zero().ok_or_else(|| {
                Error::invalid_argument(
                    "value",
                    format!("null is not a valid `{}`", target.type_name()),
                )
            }),
            (Self::Int(i), ValueKind::Float) => Ok(Self::Float(i as f64)),
            (Self::Float(f), ValueKind::Int) => {
                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "only used after checking the float is integral and in range"
                )]
                let truncated = f as i64;
                let exact = f.fract() == 0.0 && truncated as f64 == f;
                if exact {
                    Ok(Self::Int(truncated))
                } else {
                    Err(Error::invalid_argument(
                        "value",
                        format!("{f} is not an integer"),
                    ))
                }
            }
            (Self::Object(o), ValueKind::Object) if o.type_id() != target.payload_type_id() => {
                Err(Error::invalid_argument(
                    "value",
                    format!(
                        "expected `{}`, got `{}`",
                        target.type_name(),
                        o.type_name()
                    ),
                ))
            }
            (v, k) if v.kind() == Some(k) => Ok(v),
            (v, _) => Err(Error::invalid_argument(
                "value",
                format!(
                    "{:?} cannot be converted to `{}`",
                    v.kind(),
                    target.type_name()
                ),
            )),
        }
    }
}

/// Conversion between a Rust type and [`Value`].
///
/// Implemented for the built-in kinds, for `Option<T>` (nullable), and via
/// [`object_property_type!`](crate::object_property_type) for user types.
pub trait PropertyType: Clone + Send + Sync + 'static {
    /// The kind of values produced by [`into_value`](Self::into_value).
    const KIND: ValueKind;
    /// Whether [`Value::Null`] maps to a value of this type.
    const NULLABLE: bool = false;

    /// Converts into a stored value.
    fn into_value(self) -> Value;

    /// Reads back from a stored value. `None` if the shape does not match.
    fn from_value(value: &Value) -> Option<Self>;

    /// Default used when a property is registered without one.
    fn zero() -> Option<Self> {
        None
    }

    /// The type wrapped by [`Value::Object`] for values of this type.
    fn payload_type_id() -> TypeId {
        TypeId::of::<Self>()
    }
}

macro_rules! builtin_property_type {
    ($ty:ty, $kind:ident, $zero:expr) => {
        impl PropertyType for $ty {
            const KIND: ValueKind = ValueKind::$kind;

            fn into_value(self) -> Value {
                Value::$kind(self.into())
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$kind(v) => Some(*v),
                    _ => None,
                }
            }

            fn zero() -> Option<Self> {
                Some($zero)
            }
        }
    };
}

builtin_property_type!(bool, Bool, false);
builtin_property_type!(i64, Int, 0);
builtin_property_type!(f64, Float, 0.0);
builtin_property_type!(Size, Size, Size::ZERO);
builtin_property_type!(Point, Point, Point::ZERO);
builtin_property_type!(Rect, Rect, Rect::ZERO);
builtin_property_type!(Insets, Insets, Insets::ZERO);

impl PropertyType for Arc<str> {
    const KIND: ValueKind = ValueKind::Str;

    fn into_value(self) -> Value {
        Value::Str(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl PropertyType for String {
    const KIND: ValueKind = ValueKind::Str;

    fn into_value(self) -> Value {
        Value::Str(self.into())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(String::from(&**s)),
            _ => None,
        }
    }
}

impl<T: PropertyType> PropertyType for Option<T> {
    const KIND: ValueKind = T::KIND;
    const NULLABLE: bool = true;

    fn into_value(self) -> Value {
        self.map_or(Value::Null, T::into_value)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            v => T::from_value(v).map(Some),
        }
    }

    fn zero() -> Option<Self> {
        Some(None)
    }

    fn payload_type_id() -> TypeId {
        T::payload_type_id()
    }
}

/// Implements [`PropertyType`] for user types stored as [`Value::Object`].
///
/// The types must be `Clone + PartialEq + Default + Send + Sync + 'static`;
/// `Default::default()` is the zero used when a property is registered
/// without a default.
///
/// ```rust
/// use canopy_property::{PropertyType, Value, object_property_type};
///
/// #[derive(Clone, Copy, Debug, Default, PartialEq)]
/// enum Side { #[default] Left, Right }
///
/// object_property_type!(Side);
///
/// let v = Side::Right.into_value();
/// assert_eq!(Side::from_value(&v), Some(Side::Right));
/// assert!(matches!(v, Value::Object(_)));
/// ```
#[macro_export]
macro_rules! object_property_type {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::PropertyType for $ty {
                const KIND: $crate::ValueKind = $crate::ValueKind::Object;

                fn into_value(self) -> $crate::Value {
                    $crate::Value::Object($crate::ErasedValue::new(self))
                }

                fn from_value(value: &$crate::Value) -> ::core::option::Option<Self> {
                    match value {
                        $crate::Value::Object(o) => o.downcast_ref::<Self>().cloned(),
                        _ => ::core::option::Option::None,
                    }
                }

                fn zero() -> ::core::option::Option<Self> {
                    ::core::option::Option::Some(<Self as ::core::default::Default>::default())
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    enum Mode {
        #[default]
        Off,
        On,
    }

    object_property_type!(Mode);

    #[test]
    fn erased_equality_requires_same_type() {
        let a = ErasedValue::new(Mode::On);
        assert_eq!(a, ErasedValue::new(Mode::On));
        assert_ne!(a, ErasedValue::new(Mode::Off));
        assert_ne!(ErasedValue::new(1_i32), ErasedValue::new(1_i64));
    }

    #[test]
    fn erased_debug_names_type() {
        let debug = format!("{:?}", ErasedValue::new(Mode::On));
        assert!(debug.contains("Mode"));
    }

    #[test]
    fn nan_is_same_as_nan() {
        assert!(Value::Float(f64::NAN).same_as(&Value::Float(f64::NAN)));
        assert!(!Value::Float(1.0).same_as(&Value::Float(f64::NAN)));
        assert!(Value::Null.same_as(&Value::Null));
    }

    #[test]
    fn coerce_int_to_float() {
        let v = Value::Int(3).coerce(&ValueType::of::<f64>()).unwrap();
        assert_eq!(v, Value::Float(3.0));
    }

    #[test]
    fn coerce_float_to_int_requires_integral() {
        let ty = ValueType::of::<i64>();
        assert_eq!(Value::Float(4.0).coerce(&ty).unwrap(), Value::Int(4));
        assert!(Value::Float(4.5).coerce(&ty).is_err());
    }

    #[test]
    fn coerce_null() {
        assert_eq!(
            Value::Null.coerce(&ValueType::of::<f64>()).unwrap(),
            Value::Float(0.0)
        );
        assert_eq!(
            Value::Null.coerce(&ValueType::of::<Option<f64>>()).unwrap(),
            Value::Null
        );
        assert!(Value::Null.coerce(&ValueType::of::<String>()).is_err());
    }

    #[test]
    fn coerce_rejects_foreign_object() {
        let v = Value::Object(ErasedValue::new(5_u8));
        assert!(v.coerce(&ValueType::of::<Mode>()).is_err());
        let v = Mode::On.into_value();
        assert!(v.coerce(&ValueType::of::<Mode>()).is_ok());
    }

    #[test]
    fn coerce_accepts_nullable_object() {
        let ty = ValueType::of::<Option<Mode>>();
        assert_eq!(ty.payload_type_id(), TypeId::of::<Mode>());
        let v = Some(Mode::On).into_value().coerce(&ty).unwrap();
        assert_eq!(Option::<Mode>::from_value(&v), Some(Some(Mode::On)));
        assert!(Value::Object(ErasedValue::new(5_u8)).coerce(&ty).is_err());
    }

    #[test]
    fn coerce_rejects_kind_mismatch() {
        let err = Value::Bool(true).coerce(&ValueType::of::<Size>()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn option_round_trips_null() {
        assert_eq!(Option::<f64>::from_value(&Value::Null), Some(None));
        assert_eq!(Option::<f64>::from_value(&Value::Float(2.0)), Some(Some(2.0)));
        assert_eq!(Option::<f64>::from_value(&Value::Bool(true)), None);
    }

    #[test]
    fn value_type_classification() {
        assert!(ValueType::of::<f64>().is_value_type());
        assert!(ValueType::of::<Mode>().is_value_type());
        assert!(!ValueType::of::<String>().is_value_type());
        assert!(!ValueType::of::<Option<Size>>().is_value_type());
    }
}
