// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Unwind frames discovered during a backtrace.

/// One stack activation seen by the unwinder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnwindFrame {
    /// Position in the walk, 0 for the innermost frame.
    pub depth: u32,
    /// Instruction pointer reported by the unwinder.
    pub ip: usize,
    /// Start address of the function containing `ip`.
    pub region_start: usize,
}

impl UnwindFrame {
    /// Create a frame record.
    #[inline]
    #[must_use]
    pub const fn new(depth: u32, ip: usize, region_start: usize) -> Self {
        Self {
            depth,
            ip,
            region_start,
        }
    }

    /// Address printed for this frame.
    ///
    /// Every frame except the innermost one reports a return address, which
    /// points past the call. Those are moved back by one and have the Thumb
    /// bit cleared so they land on the call instruction itself. Depth 0 is
    /// the frame the unwinder was started from and is printed unchanged.
    #[inline]
    #[must_use]
    pub const fn call_site(&self) -> usize {
        if self.depth == 0 {
            self.ip
        } else {
            self.ip.wrapping_sub(1) & !1
        }
    }

    /// Check whether this frame marks the bottom of a task stack.
    ///
    /// `task_entry` is the address of the task exit trap; its Thumb bit is
    /// masked off before comparing. A zero instruction pointer also ends the
    /// stack.
    #[inline]
    #[must_use]
    pub const fn is_task_entry(&self, task_entry: usize) -> bool {
        self.ip == (task_entry & !1) || self.ip == 0
    }
}
