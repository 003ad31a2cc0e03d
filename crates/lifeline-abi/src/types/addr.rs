// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Memory address type.

use core::fmt;

/// A memory address on the target.
///
/// Microcontroller ports have a flat address space, so there is no split
/// between physical and virtual addresses.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Addr(usize);

impl Addr {
    /// Create a new address.
    #[inline]
    #[must_use]
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    /// Create a null (zero) address.
    #[inline]
    #[must_use]
    pub const fn null() -> Self {
        Self(0)
    }

    /// Check if this is a null address.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Get the raw address value.
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// Apply a signed offset.
    ///
    /// Returns `None` if the result leaves the address space.
    #[inline]
    #[must_use]
    pub const fn checked_offset(self, delta: isize) -> Option<Self> {
        match self.0.checked_add_signed(delta) {
            Some(addr) => Some(Self(addr)),
            None => None,
        }
    }

    /// Add an unsigned offset.
    ///
    /// Returns `None` on overflow.
    #[inline]
    #[must_use]
    pub const fn checked_add(self, offset: usize) -> Option<Self> {
        match self.0.checked_add(offset) {
            Some(addr) => Some(Self(addr)),
            None => None,
        }
    }

    /// Subtract an unsigned offset.
    ///
    /// Returns `None` on underflow.
    #[inline]
    #[must_use]
    pub const fn checked_sub(self, offset: usize) -> Option<Self> {
        match self.0.checked_sub(offset) {
            Some(addr) => Some(Self(addr)),
            None => None,
        }
    }

    /// Distance from `other` up to `self`, zero if `other` is higher.
    #[inline]
    #[must_use]
    pub const fn distance_from(self, other: Self) -> usize {
        self.0.saturating_sub(other.0)
    }
}

impl fmt::Debug for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Addr({:#x})", self.0)
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<usize> for Addr {
    fn from(addr: usize) -> Self {
        Self(addr)
    }
}

impl From<Addr> for usize {
    fn from(addr: Addr) -> Self {
        addr.0
    }
}
