// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change notifications and set options.

use alloc::string::String;
use core::fmt;

use crate::descriptor::PropertyDescriptor;
use crate::value::Value;

bitflags::bitflags! {
    /// Adjusts a single [`PropertyStore::set_with`](crate::PropertyStore::set_with) call.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SetOptions: u8 {
        /// Store and notify even when the new value equals the stored one.
        const DONT_TEST_VALUES_EQUALITY = 1 << 0;
        /// Skip [`PropertyEvent::Changing`].
        const DONT_RAISE_ON_PROPERTY_CHANGING = 1 << 1;
        /// Skip [`PropertyEvent::Changed`].
        const DONT_RAISE_ON_PROPERTY_CHANGED = 1 << 2;
        /// Skip [`PropertyEvent::ErrorsChanged`].
        const DONT_RAISE_ON_ERRORS_CHANGED = 1 << 3;
        /// Raise [`PropertyEvent::ErrorsChanged`] even if the errors are unchanged.
        const FORCE_RAISE_ON_ERRORS_CHANGED = 1 << 4;
    }
}

impl fmt::Debug for SetOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("SetOptions(NONE)");
        }
        f.write_str("SetOptions(")?;
        bitflags::parser::to_writer(self, &mut *f)?;
        f.write_str(")")
    }
}

/// A notification delivered synchronously to store listeners.
///
/// `old` is the previously stored local value; `None` means the property
/// was not set and read as its default.
#[derive(Clone, Copy, Debug)]
pub enum PropertyEvent<'a> {
    /// A value is about to be stored. Vetoes have already run.
    Changing {
        /// The resolved descriptor.
        descriptor: &'static PropertyDescriptor,
        /// The incoming value after conversion.
        new: &'a Value,
        /// The stored value being replaced.
        old: Option<&'a Value>,
    },
    /// A value was stored. Raised once for the property name and once per alias.
    Changed {
        /// The name being announced: the property's own name or an alias.
        name: &'static str,
        /// The resolved descriptor.
        descriptor: &'static PropertyDescriptor,
        /// The stored value.
        new: &'a Value,
        /// The replaced value.
        old: Option<&'a Value>,
    },
    /// The validation errors of a property changed.
    ErrorsChanged {
        /// The resolved descriptor.
        descriptor: &'static PropertyDescriptor,
        /// The current errors; empty when the value became valid.
        errors: &'a [String],
    },
}

impl PropertyEvent<'_> {
    /// Returns the descriptor the event is about.
    #[must_use]
    pub fn descriptor(&self) -> &'static PropertyDescriptor {
        match self {
            Self::Changing { descriptor, .. }
            | Self::Changed { descriptor, .. }
            | Self::ErrorsChanged { descriptor, .. } => descriptor,
        }
    }
}

/// Handle returned by [`PropertyStore::subscribe`](crate::PropertyStore::subscribe).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u32);
