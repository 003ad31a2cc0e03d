// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Fault classes and their blink encoding.

use core::fmt;

/// Fault class, encoded as the number of indicator pulses per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FailurePattern {
    /// Deliberate halt. No pulses, only the pause.
    Shutdown = 0,
    /// Failed assertion or panic.
    Assertion = 1,
    /// The allocator could not grow the heap.
    AllocationFailure = 2,
    /// A task overflowed its stack.
    StackOverflow = 3,
}

impl FailurePattern {
    /// All patterns, ordered by pulse count.
    pub const ALL: [Self; 4] = [
        Self::Shutdown,
        Self::Assertion,
        Self::AllocationFailure,
        Self::StackOverflow,
    ];

    /// Number of pulses per blink cycle.
    #[inline]
    #[must_use]
    pub const fn pulses(self) -> u8 {
        self as u8
    }

    /// Decode a pulse count.
    ///
    /// Returns `None` for counts outside the known fault classes.
    #[inline]
    #[must_use]
    pub const fn from_pulses(pulses: u8) -> Option<Self> {
        match pulses {
            0 => Some(Self::Shutdown),
            1 => Some(Self::Assertion),
            2 => Some(Self::AllocationFailure),
            3 => Some(Self::StackOverflow),
            _ => None,
        }
    }

    /// Short human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Shutdown => "shutdown",
            Self::Assertion => "assertion",
            Self::AllocationFailure => "allocation failure",
            Self::StackOverflow => "stack overflow",
        }
    }
}

impl fmt::Display for FailurePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} pulses)", self.name(), self.pulses())
    }
}
