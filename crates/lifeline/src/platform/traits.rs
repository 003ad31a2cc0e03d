// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Platform abstraction traits.

use lifeline_abi::layout::DEFAULT_STATUS_PIN;
use lifeline_abi::{Ram1Usage, Ram2Usage};

/// Board services used once a fault has been detected.
///
/// Every method must work with interrupts disabled and the scheduler
/// suspended.
pub trait Board {
    /// Mask all interrupts the scheduler manages.
    fn disable_interrupts(&mut self);

    /// Lift the priority of an interrupt source that would otherwise
    /// deadlock against the diagnostic transport.
    ///
    /// Teensy 4.x raises USB1 above the syscall threshold so USB serial keeps
    /// draining while the report is written. Other boards do nothing.
    fn raise_conflicting_irq_priority(&mut self) {}

    /// Suspend all task switching.
    fn suspend_scheduler(&mut self);

    /// Pin driving the status indicator.
    fn status_pin(&self) -> u8 {
        DEFAULT_STATUS_PIN
    }

    /// Configure `pin` as a push-pull output.
    fn configure_output(&mut self, pin: u8);

    /// Drive `pin` high or low.
    fn write_pin(&mut self, pin: u8, high: bool);

    /// Switch the CPU clock.
    fn set_cpu_clock(&mut self, hz: u32);

    /// Free-running microsecond counter (wraps).
    fn micros(&self) -> u32;

    /// Busy-wait for `ms` milliseconds.
    ///
    /// The default spins on [`Self::micros`] and tolerates counter wrap. A
    /// board whose time base stops while interrupts are masked must override
    /// it, for example with a [`CycleDelay`](super::CycleDelay).
    fn delay_ms(&mut self, ms: u32) {
        let start = self.micros();
        let wait_us = ms.saturating_mul(1_000);
        while self.micros().wrapping_sub(start) < wait_us {
            core::hint::spin_loop();
        }
    }
}

impl<B: Board + ?Sized> Board for &mut B {
    fn disable_interrupts(&mut self) {
        (**self).disable_interrupts();
    }

    fn raise_conflicting_irq_priority(&mut self) {
        (**self).raise_conflicting_irq_priority();
    }

    fn suspend_scheduler(&mut self) {
        (**self).suspend_scheduler();
    }

    fn status_pin(&self) -> u8 {
        (**self).status_pin()
    }

    fn configure_output(&mut self, pin: u8) {
        (**self).configure_output(pin);
    }

    fn write_pin(&mut self, pin: u8, high: bool) {
        (**self).write_pin(pin, high);
    }

    fn set_cpu_clock(&mut self, hz: u32) {
        (**self).set_cpu_clock(hz);
    }

    fn micros(&self) -> u32 {
        (**self).micros()
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms);
    }
}

/// Save/disable/restore interrupt masking.
///
/// This is the only synchronization the heap uses. It never blocks, so it is
/// usable from interrupt handlers and nests correctly: `restore` puts back
/// whatever state `save_and_disable` found instead of unconditionally
/// enabling interrupts.
///
/// # Safety
///
/// Between `save_and_disable` and the matching `restore`, no other execution
/// context that can reach data guarded by this mask may run. On a single-core
/// MCU masking interrupts gives exactly that. A mask that is not `Sync` only
/// has to exclude interrupt handlers of its own thread.
pub unsafe trait InterruptMask {
    /// Saved mask state.
    type State: Copy;

    /// Record the current mask and disable interrupts.
    fn save_and_disable(&self) -> Self::State;

    /// Restore a mask recorded by [`Self::save_and_disable`].
    fn restore(&self, state: Self::State);
}

/// Read-only memory usage introspection.
pub trait MemoryStats {
    /// Current RAM1 usage.
    fn ram1_usage(&self) -> Ram1Usage;

    /// Current RAM2 usage.
    fn ram2_usage(&self) -> Ram2Usage;
}
