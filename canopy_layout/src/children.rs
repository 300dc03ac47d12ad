// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered child collection.

use alloc::format;
use alloc::vec::Vec;

use canopy_property::{Error, ErrorCode, Result};

use crate::types::NodeId;

/// The ordered children of one node.
///
/// Rejects duplicates and, when a capacity is set, refuses to grow past it.
/// Parent bookkeeping lives in [`Tree`](crate::Tree); this type only keeps
/// the order.
#[derive(Clone, Debug, Default)]
pub(crate) struct Children {
    items: Vec<NodeId>,
    capacity: Option<usize>,
}

impl Children {
    /// Returns the children in order.
    #[must_use]
    #[inline]
    pub(crate) fn as_slice(&self) -> &[NodeId] {
        &self.items
    }

    /// Returns the number of children.
    #[must_use]
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns the declared capacity, if bounded.
    #[must_use]
    #[inline]
    pub(crate) fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Returns the position of `child`.
    #[must_use]
    pub(crate) fn index_of(&self, child: NodeId) -> Option<usize> {
        self.items.iter().position(|c| *c == child)
    }

    /// Returns `true` if `child` is in the collection.
    #[must_use]
    pub(crate) fn contains(&self, child: NodeId) -> bool {
        self.index_of(child).is_some()
    }

    /// Bounds the collection. `None` removes the bound.
    pub(crate) fn set_capacity(&mut self, capacity: Option<usize>) -> Result<()> {
        if let Some(cap) = capacity {
            if self.items.len() > cap {
                return Err(Error::invariant(
                    ErrorCode::CapacityExceeded,
                    format!("{} children do not fit a capacity of {cap}", self.items.len()),
                ));
            }
        }
        self.capacity = capacity;
        Ok(())
    }

    /// Checks that `child` can be inserted at `index`.
    pub(crate) fn check_insert(&self, index: usize, child: NodeId) -> Result<()> {
        if self.contains(child) {
            return Err(Error::invariant(
                ErrorCode::DuplicateChild,
                format!("{child:?} is already in this collection"),
            ));
        }
        if let Some(cap) = self.capacity {
            if self.items.len() >= cap {
                return Err(Error::invariant(
                    ErrorCode::CapacityExceeded,
                    format!("collection is full ({cap} children)"),
                ));
            }
        }
        if index > self.items.len() {
            return Err(Error::invalid_argument(
                "index",
                format!("{index} is out of range for {} children", self.items.len()),
            ));
        }
        Ok(())
    }

    pub(crate) fn insert(&mut self, index: usize, child: NodeId) -> Result<()> {
        self.check_insert(index, child)?;
        self.items.insert(index, child);
        Ok(())
    }

    pub(crate) fn remove(&mut self, child: NodeId) -> bool {
        match self.index_of(child) {
            Some(idx) => {
                self.items.remove(idx);
                true
            }
            None => false,
        }
    }

    pub(crate) fn take(&mut self) -> Vec<NodeId> {
        core::mem::take(&mut self.items)
    }
}
