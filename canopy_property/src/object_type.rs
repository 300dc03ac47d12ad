// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Static type tokens for property-owning objects.
//!
//! There is no runtime reflection: every object kind that owns properties is
//! described by an [`ObjectType`] declared as a `static`, linked to its base
//! type. Identity is the address of that static, so two tokens with the same
//! name but different statics are different types.

use core::fmt;
use core::hash::{Hash, Hasher};

/// The root of every property-owning type chain.
pub static PROPERTY_OWNER: ObjectType = ObjectType::root("PropertyOwner");

/// A type token with a single-inheritance base chain.
///
/// Always declare tokens as `static` items. A `const` would be copied at each
/// use site and lose its identity.
///
/// ```rust
/// use canopy_property::{ObjectType, PROPERTY_OWNER};
///
/// static SHAPE: ObjectType = ObjectType::new("Shape", &PROPERTY_OWNER);
/// static CIRCLE: ObjectType = ObjectType::new("Circle", &SHAPE);
///
/// assert!(CIRCLE.is_subtype_of(&SHAPE));
/// assert!(!SHAPE.is_subtype_of(&CIRCLE));
/// assert!(CIRCLE.is_property_owner());
/// ```
pub struct ObjectType {
    name: &'static str,
    base: Option<&'static ObjectType>,
}

impl ObjectType {
    /// Creates a type deriving from `base`.
    #[must_use]
    pub const fn new(name: &'static str, base: &'static Self) -> Self {
        Self {
            name,
            base: Some(base),
        }
    }

    /// Creates a type without a base.
    ///
    /// Only [`PROPERTY_OWNER`] roots a chain that can declare properties;
    /// other roots exist to describe foreign objects.
    #[must_use]
    pub const fn root(name: &'static str) -> Self {
        Self { name, base: None }
    }

    /// Returns the type name.
    #[must_use]
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the base type, if any.
    #[must_use]
    #[inline]
    pub const fn base(&self) -> Option<&'static Self> {
        self.base
    }

    /// Iterates over the base types, nearest first. The type itself is not included.
    pub fn ancestors(&self) -> impl Iterator<Item = &'static Self> {
        let mut next = self.base;
        core::iter::from_fn(move || {
            let current = next?;
            next = current.base;
            Some(current)
        })
    }

    /// Returns `true` if `self` is `other` or derives from it.
    #[must_use]
    pub fn is_subtype_of(&self, other: &Self) -> bool {
        self == other || self.ancestors().any(|a| a == other)
    }

    /// Returns `true` if this type's chain ends at [`PROPERTY_OWNER`].
    #[must_use]
    pub fn is_property_owner(&self) -> bool {
        self.is_subtype_of(&PROPERTY_OWNER)
    }

    #[inline]
    fn addr(&self) -> usize {
        core::ptr::from_ref(self) as usize
    }
}

impl PartialEq for ObjectType {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self, other)
    }
}

impl Eq for ObjectType {}

impl Hash for ObjectType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectType")
            .field("name", &self.name)
            .field("base", &self.base.map(|b| b.name))
            .finish()
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
