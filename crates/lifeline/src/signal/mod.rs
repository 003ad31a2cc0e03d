// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Terminal failure signal.
//!
//! Once a fault has been reported the system blinks the status indicator
//! forever. The number of pulses per group names the fault class
//! ([`FailurePattern`]):
//!
//! ```text
//! pattern 2:  ▔▔▁▁▔▔▁▁▁▁▁▁▁▁▁▁▁▁▁▁▔▔▁▁▔▔▁▁▁▁ ...
//!             on off on off   pause    on ...
//! ```
//!
//! The sequence itself is a pure state machine ([`BlinkSequence`]) so it can
//! be inspected on the host; [`error_blink`] drives it on a [`Board`].


use lifeline_abi::FailurePattern;
use lifeline_abi::layout::{BLINK_OFF_MS, BLINK_ON_MS, BLINK_PAUSE_MS, SAFE_CLOCK_HZ};

use crate::platform::Board;

/// Timing of the blink loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkTiming {
    /// Indicator lit per pulse.
    pub on_ms: u32,
    /// Indicator dark after each pulse.
    pub off_ms: u32,
    /// Pause after each pulse group.
    pub pause_ms: u32,
    /// CPU clock forced before blinking.
    pub safe_clock_hz: u32,
}

impl BlinkTiming {
    /// The port's timing: 300 ms on, 300 ms off, 2 s pause at 16 MHz.
    pub const PORT: Self = Self {
        on_ms: BLINK_ON_MS,
        off_ms: BLINK_OFF_MS,
        pause_ms: BLINK_PAUSE_MS,
        safe_clock_hz: SAFE_CLOCK_HZ,
    };

    /// Duration of one full pulse group including the pause.
    #[must_use]
    pub const fn period_ms(&self, pulses: u8) -> u32 {
        (pulses as u32) * (self.on_ms + self.off_ms) + self.pause_ms
    }
}

impl Default for BlinkTiming {
    fn default() -> Self {
        Self::PORT
    }
}

/// One action of the blink loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkStep {
    /// Drive the indicator on (`true`) or off.
    Led(bool),
    /// Busy-wait for the given number of milliseconds.
    Wait(u32),
}

/// Endless blink sequence for one failure pattern.
///
/// Each group is `pulses` repetitions of `Led(true)`, `Wait(on)`,
/// `Led(false)`, `Wait(off)`, followed by `Wait(pause)`. Pattern 0 is a
/// bare pause loop. The iterator never returns `None`.
#[derive(Debug, Clone)]
pub struct BlinkSequence {
    pulses: u8,
    timing: BlinkTiming,
    position: u32,
}

impl BlinkSequence {
    /// Start the sequence for `pattern`.
    #[must_use]
    pub const fn new(pattern: FailurePattern, timing: BlinkTiming) -> Self {
        Self {
            pulses: pattern.pulses(),
            timing,
            position: 0,
        }
    }

    /// Number of steps in one pulse group.
    #[must_use]
    pub const fn group_len(&self) -> u32 {
        (self.pulses as u32) * 4 + 1
    }

    /// Produce the next step.
    pub fn next_step(&mut self) -> BlinkStep {
        let pulse_steps = u32::from(self.pulses) * 4;
        if self.position >= pulse_steps {
            self.position = 0;
            return BlinkStep::Wait(self.timing.pause_ms);
        }
        let step = match self.position % 4 {
            0 => BlinkStep::Led(true),
            1 => BlinkStep::Wait(self.timing.on_ms),
            2 => BlinkStep::Led(false),
            _ => BlinkStep::Wait(self.timing.off_ms),
        };
        self.position += 1;
        step
    }
}

impl Iterator for BlinkSequence {
    type Item = BlinkStep;

    fn next(&mut self) -> Option<BlinkStep> {
        Some(self.next_step())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

/// Signal `pattern` on the status indicator forever.
///
/// Suspends the scheduler, configures the status pin as output and forces
/// the safe CPU clock before entering the loop. Never returns.
pub fn error_blink<B: Board + ?Sized>(
    board: &mut B,
    pattern: FailurePattern,
    timing: &BlinkTiming,
) -> ! {
    board.suspend_scheduler();
    let pin = board.status_pin();
    board.configure_output(pin);
    board.set_cpu_clock(timing.safe_clock_hz);

    let mut sequence = BlinkSequence::new(pattern, *timing);
    loop {
        match sequence.next_step() {
            BlinkStep::Led(on) => board.write_pin(pin, on),
            BlinkStep::Wait(ms) => board.delay_ms(ms),
        }
    }
}
