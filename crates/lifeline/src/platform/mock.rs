// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Mock board and interrupt controller for testing.
//!
//! [`MockBoard`] records every board interaction and stops the otherwise
//! endless blink loop by panicking with [`Halted`] once its delay budget is
//! used up; tests catch that with `std::panic::catch_unwind`.
//!
//! [`MockInterrupts`] models a single interrupt line with a mask. Interrupts
//! raised while masked are held pending and delivered when the mask is
//! restored to enabled, which is what lets tests place an interrupt inside
//! a critical section.

use super::{Board, InterruptMask, MemoryStats};
use core::cell::{Cell, RefCell};
use lifeline_abi::layout::DEFAULT_STATUS_PIN;
use lifeline_abi::{Ram1Usage, Ram2Usage};
use std::boxed::Box;
use std::collections::VecDeque;
use std::vec::Vec;

/// Panic payload used by [`MockBoard`] to leave the blink loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Halted;

/// One recorded board interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    /// `disable_interrupts`
    InterruptsDisabled,
    /// `raise_conflicting_irq_priority`
    IrqPriorityRaised,
    /// `suspend_scheduler`
    SchedulerSuspended,
    /// `configure_output(pin)`
    OutputConfigured(u8),
    /// `write_pin(pin, level)`
    Pin(u8, bool),
    /// `set_cpu_clock(hz)`
    Clock(u32),
    /// `delay_ms(ms)`
    Delay(u32),
}

/// Board that records interactions instead of touching hardware.
pub struct MockBoard {
    events: Vec<BoardEvent>,
    status_pin: u8,
    delay_budget: usize,
    delays: usize,
    now_us: Cell<u32>,
    ram1: Ram1Usage,
    ram2: Ram2Usage,
}

impl MockBoard {
    /// Default number of delays before the board halts the caller.
    pub const DEFAULT_DELAY_BUDGET: usize = 64;

    /// Create a board using the default status pin and delay budget.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            status_pin: DEFAULT_STATUS_PIN,
            delay_budget: Self::DEFAULT_DELAY_BUDGET,
            delays: 0,
            now_us: Cell::new(0),
            ram1: Ram1Usage::default(),
            ram2: Ram2Usage::default(),
        }
    }

    /// Halt (panic with [`Halted`]) on the `budget`-th delay.
    #[must_use]
    pub fn with_delay_budget(mut self, budget: usize) -> Self {
        self.delay_budget = budget;
        self
    }

    /// Use a different status pin.
    #[must_use]
    pub fn with_status_pin(mut self, pin: u8) -> Self {
        self.status_pin = pin;
        self
    }

    /// Report the given memory usage.
    #[must_use]
    pub fn with_memory(mut self, ram1: Ram1Usage, ram2: Ram2Usage) -> Self {
        self.ram1 = ram1;
        self.ram2 = ram2;
        self
    }

    /// All recorded events, in order.
    #[must_use]
    pub fn events(&self) -> &[BoardEvent] {
        &self.events
    }

    /// Number of times `pin` was driven high.
    #[must_use]
    pub fn rising_edges(&self, pin: u8) -> usize {
        self.events
            .iter()
            .filter(|event| **event == BoardEvent::Pin(pin, true))
            .count()
    }

    /// Last level written to `pin`.
    #[must_use]
    pub fn pin_level(&self, pin: u8) -> Option<bool> {
        self.events.iter().rev().find_map(|event| match *event {
            BoardEvent::Pin(p, level) if p == pin => Some(level),
            _ => None,
        })
    }

    /// Check whether `event` was recorded.
    #[must_use]
    pub fn saw(&self, event: BoardEvent) -> bool {
        self.events.contains(&event)
    }

    /// Index of the first occurrence of `event`.
    #[must_use]
    pub fn position(&self, event: BoardEvent) -> Option<usize> {
        self.events.iter().position(|e| *e == event)
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl Board for MockBoard {
    fn disable_interrupts(&mut self) {
        self.events.push(BoardEvent::InterruptsDisabled);
    }

    fn raise_conflicting_irq_priority(&mut self) {
        self.events.push(BoardEvent::IrqPriorityRaised);
    }

    fn suspend_scheduler(&mut self) {
        self.events.push(BoardEvent::SchedulerSuspended);
    }

    fn status_pin(&self) -> u8 {
        self.status_pin
    }

    fn configure_output(&mut self, pin: u8) {
        self.events.push(BoardEvent::OutputConfigured(pin));
    }

    fn write_pin(&mut self, pin: u8, high: bool) {
        self.events.push(BoardEvent::Pin(pin, high));
    }

    fn set_cpu_clock(&mut self, hz: u32) {
        self.events.push(BoardEvent::Clock(hz));
    }

    fn micros(&self) -> u32 {
        self.now_us.get()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.events.push(BoardEvent::Delay(ms));
        self.now_us
            .set(self.now_us.get().wrapping_add(ms.wrapping_mul(1_000)));
        self.delays += 1;
        if self.delays >= self.delay_budget {
            std::panic::panic_any(Halted);
        }
    }
}

impl MemoryStats for MockBoard {
    fn ram1_usage(&self) -> Ram1Usage {
        self.ram1
    }

    fn ram2_usage(&self) -> Ram2Usage {
        self.ram2
    }
}

/// Simulated interrupt handler.
type Isr = Box<dyn FnOnce()>;

/// Interrupt controller with one mask bit and a pending queue.
pub struct MockInterrupts {
    enabled: Cell<bool>,
    pending: RefCell<VecDeque<Isr>>,
    armed: RefCell<Option<Isr>>,
    masked_sections: Cell<usize>,
    delivered: Cell<usize>,
}

impl MockInterrupts {
    /// Create a controller with interrupts enabled (task context).
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: Cell::new(true),
            pending: RefCell::new(VecDeque::new()),
            armed: RefCell::new(None),
            masked_sections: Cell::new(0),
            delivered: Cell::new(0),
        }
    }

    /// Create a controller that starts masked, as inside a handler.
    #[must_use]
    pub fn masked() -> Self {
        let irq = Self::new();
        irq.enabled.set(false);
        irq
    }

    /// Check whether interrupts are currently enabled.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Enable or disable interrupts directly.
    ///
    /// Enabling delivers anything pending.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
        if enabled {
            self.deliver_pending();
        }
    }

    /// Number of `save_and_disable` calls so far.
    #[must_use]
    pub fn masked_sections(&self) -> usize {
        self.masked_sections.get()
    }

    /// Number of handlers that have run.
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.delivered.get()
    }

    /// Number of handlers waiting for the mask to clear.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Raise an interrupt now.
    ///
    /// Runs `isr` immediately when interrupts are enabled, otherwise queues
    /// it until they are.
    pub fn raise(&self, isr: impl FnOnce() + 'static) {
        self.pending.borrow_mut().push_back(Box::new(isr));
        if self.enabled.get() {
            self.deliver_pending();
        }
    }

    /// Raise `isr` right after the next `save_and_disable`.
    ///
    /// The interrupt arrives inside the critical section, so it is held
    /// pending until the section restores the mask.
    pub fn arm(&self, isr: impl FnOnce() + 'static) {
        *self.armed.borrow_mut() = Some(Box::new(isr));
    }

    fn deliver_pending(&self) {
        loop {
            let Some(isr) = self.pending.borrow_mut().pop_front() else {
                return;
            };
            // Hardware masks further interrupts of the same priority while a
            // handler runs.
            self.enabled.set(false);
            isr();
            self.delivered.set(self.delivered.get() + 1);
            self.enabled.set(true);
        }
    }
}

impl Default for MockInterrupts {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: `MockInterrupts` is not `Sync`, and every simulated handler is
// delivered from `restore` or `raise` with the mask clear.
unsafe impl InterruptMask for MockInterrupts {
    type State = bool;

    fn save_and_disable(&self) -> bool {
        let was_enabled = self.enabled.replace(false);
        self.masked_sections.set(self.masked_sections.get() + 1);
        let armed = self.armed.borrow_mut().take();
        if let Some(isr) = armed {
            self.raise(isr);
        }
        was_enabled
    }

    fn restore(&self, state: bool) {
        self.set_enabled(state);
    }
}
