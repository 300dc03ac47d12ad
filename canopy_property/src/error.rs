// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Toolkit error type shared by the property store, the layout engine and
//! the panels.
//!
//! Failures fall into three groups:
//!
//! - [`Error::InvalidArgument`]: bad input (stale handles, out-of-range
//!   indices, values that cannot be converted to a property's type).
//! - [`Error::Invariant`]: a structural rule of the toolkit was broken
//!   (re-parenting an attached child, exceeding a child collection's
//!   capacity, changing a frozen descriptor). These carry an [`ErrorCode`].
//! - [`Error::InvalidOperation`]: calls made in the wrong order, such as
//!   arranging a node that was never measured.
//!
//! None of these are recoverable conditions at the point they are raised;
//! they surface to the caller through `?`.

use alloc::string::String;
use core::fmt;

/// Short, stable diagnostic code attached to invariant and sequencing failures.
///
/// The string form (see [`ErrorCode::as_str`]) is what ends up in logs and
/// bug reports, so existing codes never change meaning.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// A registered (frozen) descriptor was modified or registered again.
    DescriptorFrozen,
    /// The declaring type does not derive from the property-owning root.
    NotPropertyOwner,
    /// A child is already attached to a parent.
    AlreadyParented,
    /// A child appears twice in the same collection.
    DuplicateChild,
    /// A child collection is full.
    CapacityExceeded,
    /// A node was inserted below one of its own descendants.
    CyclicParent,
    /// A node was arranged before it was measured.
    NotMeasured,
    /// A node's arranged rectangle or rendering was requested before arrange.
    NotArranged,
}

impl ErrorCode {
    /// Returns the stable string form of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DescriptorFrozen => "CNP0001",
            Self::NotPropertyOwner => "CNP0002",
            Self::AlreadyParented => "CNL0001",
            Self::DuplicateChild => "CNL0002",
            Self::CapacityExceeded => "CNL0003",
            Self::CyclicParent => "CNL0004",
            Self::NotMeasured => "CNL0101",
            Self::NotArranged => "CNL0102",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A toolkit failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// An argument was rejected.
    #[error("invalid argument `{argument}`: {reason}")]
    InvalidArgument {
        /// Name of the offending argument.
        argument: &'static str,
        /// Human readable description.
        reason: String,
    },
    /// A toolkit invariant would be violated.
    #[error("[{code}] {message}")]
    Invariant {
        /// Stable diagnostic code.
        code: ErrorCode,
        /// Human readable description.
        message: String,
    },
    /// The operation is not valid in the current state.
    #[error("[{code}] invalid operation: {message}")]
    InvalidOperation {
        /// Stable diagnostic code.
        code: ErrorCode,
        /// Human readable description.
        message: String,
    },
}

impl Error {
    /// Builds an [`Error::InvalidArgument`].
    pub fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    /// Builds an [`Error::Invariant`].
    pub fn invariant(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Invariant {
            code,
            message: message.into(),
        }
    }

    /// Builds an [`Error::InvalidOperation`].
    pub fn invalid_operation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            code,
            message: message.into(),
        }
    }

    /// Returns the diagnostic code, if this failure carries one.
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::InvalidArgument { .. } => None,
            Self::Invariant { code, .. } | Self::InvalidOperation { code, .. } => Some(*code),
        }
    }
}

/// Shorthand for results carrying an [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;
