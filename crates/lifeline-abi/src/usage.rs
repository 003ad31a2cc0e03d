// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! RAM usage records.
//!
//! Teensy 4.x boards have two RAM banks: RAM1 (tightly coupled, holds data,
//! bss, heap and the main stack) and RAM2 (OCRAM, `DMAMEM` and the C heap
//! on some configurations). All sizes are in bytes.

/// Usage breakdown of RAM1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ram1Usage {
    /// Bytes not used by anything.
    pub free: usize,
    /// Bytes used by initialized data.
    pub data_used: usize,
    /// Bytes used by zero-initialized data.
    pub bss_used: usize,
    /// Bytes handed out by the heap allocator.
    pub heap_used: usize,
    /// Free bytes left to the system between heap and stack.
    pub system_free: usize,
    /// Total size of the bank.
    pub size: usize,
}

/// Usage breakdown of RAM2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ram2Usage {
    /// Bytes not used by anything.
    pub free: usize,
    /// Total size of the bank.
    pub size: usize,
}

impl Ram2Usage {
    /// Bytes in use.
    #[inline]
    #[must_use]
    pub const fn used(&self) -> usize {
        self.size.saturating_sub(self.free)
    }
}
