// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Cycle-counted busy-wait.
//!
//! Fault paths mask the interrupt that advances the millisecond time base,
//! so a delay that polls `micros()` no longer measures time there. This one
//! only trusts the core clock: it spins a fixed number of cycles per
//! millisecond, derived from the clock the core currently runs at.

/// Millisecond delay driven by a cycle-count spin primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleDelay {
    core_hz: u32,
}

impl CycleDelay {
    /// Delay for a core running at `core_hz`.
    #[must_use]
    pub const fn new(core_hz: u32) -> Self {
        Self { core_hz }
    }

    /// Core clock the delay is calibrated for.
    #[must_use]
    pub const fn core_hz(&self) -> u32 {
        self.core_hz
    }

    /// Recalibrate after a clock change.
    pub const fn set_core_hz(&mut self, core_hz: u32) {
        self.core_hz = core_hz;
    }

    /// Cycles spun per millisecond, never zero.
    #[must_use]
    pub const fn cycles_per_ms(&self) -> u32 {
        let cycles = self.core_hz / 1_000;
        if cycles == 0 { 1 } else { cycles }
    }

    /// Wait `ms` milliseconds, calling `spin` once per millisecond with the
    /// number of cycles to burn.
    ///
    /// On the target `spin` is `cortex_m::asm::delay`.
    pub fn delay_ms(&self, ms: u32, mut spin: impl FnMut(u32)) {
        let cycles = self.cycles_per_ms();
        for _ in 0..ms {
            spin(cycles);
        }
    }
}
