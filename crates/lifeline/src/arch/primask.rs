// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! PRIMASK based interrupt mask.

use cortex_m::interrupt;
use cortex_m::register::primask;

use crate::platform::InterruptMask;

/// Masks all configurable-priority interrupts through PRIMASK.
#[derive(Debug, Clone, Copy, Default)]
pub struct Primask;

// SAFETY: the supported MCUs are single core, so with PRIMASK set nothing
// but faults and NMI can preempt the running code.
unsafe impl InterruptMask for Primask {
    type State = primask::Primask;

    #[inline]
    fn save_and_disable(&self) -> primask::Primask {
        let state = primask::read();
        interrupt::disable();
        state
    }

    #[inline]
    fn restore(&self, state: primask::Primask) {
        if state.is_active() {
            // SAFETY: interrupts were enabled when `state` was saved, so
            // enabling them again ends our own critical section.
            unsafe { interrupt::enable() };
        }
    }
}
