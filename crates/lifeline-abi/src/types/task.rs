// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Opaque scheduler task handle.

use core::fmt;

/// Handle of a scheduler task (`TaskHandle_t`).
///
/// Only ever carried through for reporting; the runtime never dereferences it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct TaskHandle(usize);

impl TaskHandle {
    /// Wrap a raw handle.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// Get the raw handle value.
    #[inline]
    #[must_use]
    pub const fn as_raw(self) -> usize {
        self.0
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskHandle({:#x})", self.0)
    }
}
