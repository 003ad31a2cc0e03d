// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Fault reporter.
//!
//! The entry points the scheduler and the C library call when the system can
//! no longer continue. Each one writes what is known about the fault to the
//! diagnostic sink and then hands over to the failure signal, which never
//! returns. An assertion report looks like this:
//!
//! ```text
//!
//! ASSERT in [queue.c:1234]    xQueueSend(): pxQueue != NULL
//!
//! Stack trace:
//!         #0:     0x0000A1B0 [0x0000A180]
//!         #1:     0x0000B3C4 [0x0000B300]
//!         #2:     [Task entry point]
//!
//! ```

#[cfg(test)]
mod report_test;

use core::panic::Location;

use lifeline_abi::layout::MAX_TASK_NAME_LEN;
use lifeline_abi::{FailurePattern, TaskHandle};

use crate::exc_printf;
use crate::platform::Board;
use crate::signal::{BlinkTiming, error_blink};
use crate::sink::CharSink;
use crate::unwind::{BacktraceConfig, LinkRegisterOverride, Unwinder, print_backtrace};

/// Function name reported for Rust panics.
pub const PANIC_FUNCTION: &str = "panic";

/// Expression text reported for a panic whose message is not a plain string.
pub const FORMATTED_PANIC: &str = "<formatted message>";

/// Where an assertion failed.
///
/// Strings are byte slices so C strings can be passed through unchanged;
/// each is printed up to its first NUL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssertLocation<'a> {
    /// Source file.
    pub file: &'a [u8],
    /// Line in `file`.
    pub line: u32,
    /// Enclosing function.
    pub func: &'a [u8],
    /// Text of the failed expression.
    pub expr: &'a [u8],
}

impl<'a> AssertLocation<'a> {
    /// Create a location from Rust strings.
    #[must_use]
    pub const fn new(file: &'a str, line: u32, func: &'a str, expr: &'a str) -> Self {
        Self {
            file: file.as_bytes(),
            line,
            func: func.as_bytes(),
            expr: expr.as_bytes(),
        }
    }

    /// Describe a Rust panic as an assertion.
    ///
    /// Only a panic with a plain string message has expression text.
    #[must_use]
    pub fn from_panic(location: Option<&'a Location<'a>>, message: Option<&'a str>) -> Self {
        let (file, line) = location.map_or(("<unknown>", 0), |location| {
            (location.file(), location.line())
        });
        Self::new(file, line, PANIC_FUNCTION, message.unwrap_or(FORMATTED_PANIC))
    }
}

/// Reporter settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportConfig {
    /// Backtrace parameters for assertion reports.
    pub backtrace: BacktraceConfig,
    /// Timing of the failure signal.
    pub timing: BlinkTiming,
}

/// Writes fault reports and enters the failure signal.
///
/// Every entry point consumes the reporter and diverges.
pub struct FaultReporter<'a, B, S, U> {
    board: B,
    sink: S,
    unwinder: U,
    lr_override: &'a LinkRegisterOverride,
    config: ReportConfig,
}

impl<'a, B, S, U> FaultReporter<'a, B, S, U>
where
    B: Board,
    S: CharSink,
    U: Unwinder,
{
    /// Create a reporter with the default configuration.
    pub fn new(board: B, sink: S, unwinder: U, lr_override: &'a LinkRegisterOverride) -> Self {
        Self {
            board,
            sink,
            unwinder,
            lr_override,
            config: ReportConfig::default(),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ReportConfig) -> Self {
        self.config = config;
        self
    }

    /// Report a failed assertion with a backtrace and blink pattern 1.
    pub fn assertion(mut self, location: &AssertLocation<'_>) -> ! {
        self.board.disable_interrupts();
        self.board.raise_conflicting_irq_priority();

        exc_printf!(
            &mut self.sink,
            "\r\nASSERT in [%s:%u]\t",
            location.file,
            location.line
        );
        exc_printf!(&mut self.sink, "%s(): ", location.func);
        exc_printf!(&mut self.sink, "%s\r\n", location.expr);

        exc_printf!(&mut self.sink, "\r\nStack trace:\r\n");
        self.sink.flush();

        print_backtrace(
            &mut self.sink,
            &mut self.unwinder,
            self.lr_override,
            self.config.backtrace,
        );
        exc_printf!(&mut self.sink, "\r\n");

        error_blink(&mut self.board, FailurePattern::Assertion, &self.config.timing)
    }

    /// Report a stack overflow of `task` and blink pattern 3.
    ///
    /// The name may live on the overflowed stack, so at most
    /// `MAX_TASK_NAME_LEN` bytes of it are copied before anything else runs.
    pub fn stack_overflow(mut self, _task: TaskHandle, name: &[u8]) -> ! {
        self.board.disable_interrupts();

        let mut task_name = [0_u8; MAX_TASK_NAME_LEN + 1];
        let len = name.len().min(MAX_TASK_NAME_LEN);
        task_name[..len].copy_from_slice(&name[..len]);

        exc_printf!(&mut self.sink, "STACK OVERFLOW: %s\r\n", &task_name);
        self.sink.flush();

        error_blink(
            &mut self.board,
            FailurePattern::StackOverflow,
            &self.config.timing,
        )
    }

    /// Signal heap exhaustion with blink pattern 2.
    pub fn malloc_failed(mut self) -> ! {
        self.board.disable_interrupts();
        error_blink(
            &mut self.board,
            FailurePattern::AllocationFailure,
            &self.config.timing,
        )
    }

    /// Stop the system on request with blink pattern 0.
    pub fn shutdown(mut self) -> ! {
        self.board.disable_interrupts();
        error_blink(&mut self.board, FailurePattern::Shutdown, &self.config.timing)
    }
}
