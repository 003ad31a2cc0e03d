// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for the fault reporter.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::platform::{BoardEvent, Halted, MockBoard};
use crate::sink::MockSink;
use crate::unwind::{SyntheticFrame, SyntheticUnwinder};
use core::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use std::vec::Vec;

const TASK_EXIT: usize = 0x0000_6001;

fn config() -> ReportConfig {
    ReportConfig {
        backtrace: BacktraceConfig::new(TASK_EXIT),
        timing: BlinkTiming::default(),
    }
}

fn task_stack() -> SyntheticUnwinder {
    SyntheticUnwinder::new(&[
        SyntheticFrame::new(0x0000_A1B0, 0x0000_A180),
        SyntheticFrame::new(0x0000_B3C5, 0x0000_B300),
        SyntheticFrame::new(TASK_EXIT & !1, 0x0000_6000),
    ])
}

/// Run a diverging report until the mock board halts it.
fn until_halted(report: impl FnOnce()) {
    let payload = catch_unwind(AssertUnwindSafe(report)).expect_err("reports never return");
    assert!(payload.downcast_ref::<Halted>().is_some());
}

// =============================================================================
// Assertion
// =============================================================================

#[test]
fn assertion_report_end_to_end() {
    let mut board = MockBoard::new().with_delay_budget(5);
    let mut sink = MockSink::new();
    let mut unwinder = task_stack();
    let lr = LinkRegisterOverride::new();
    let location = AssertLocation::new("queue.c", 1234, "xQueueSend", "pxQueue != NULL");

    until_halted(|| {
        FaultReporter::new(&mut board, &mut sink, &mut unwinder, &lr)
            .with_config(config())
            .assertion(&location);
    });

    let header = "\r\nASSERT in [queue.c:1234]\txQueueSend(): pxQueue != NULL\r\n\
                  \r\nStack trace:\r\n";
    assert_eq!(
        sink.text(),
        std::format!(
            "{header}\
             \t#0:\t0x0000A1B0 [0x0000A180]\r\n\
             \t#1:\t0x0000B3C4 [0x0000B300]\r\n\
             \t#2:\t[Task entry point]\r\n\
             \r\n"
        )
    );
    // The header is flushed before the walk starts
    assert_eq!(sink.flush_marks(), &[header.len()]);

    assert_eq!(
        &board.events()[..5],
        &[
            BoardEvent::InterruptsDisabled,
            BoardEvent::IrqPriorityRaised,
            BoardEvent::SchedulerSuspended,
            BoardEvent::OutputConfigured(13),
            BoardEvent::Clock(16_000_000),
        ]
    );
    // One pulse, then the long pause: pattern 1
    assert_eq!(
        &board.events()[5..10],
        &[
            BoardEvent::Pin(13, true),
            BoardEvent::Delay(300),
            BoardEvent::Pin(13, false),
            BoardEvent::Delay(300),
            BoardEvent::Delay(2_000),
        ]
    );
    assert_eq!(board.rising_edges(13), 2);
    assert_eq!(board.pin_level(13), Some(false));
}

#[test]
fn assertion_strings_stop_at_nul() {
    let mut board = MockBoard::new().with_delay_budget(1);
    let mut sink = MockSink::new();
    let mut unwinder = SyntheticUnwinder::new(&[]);
    let lr = LinkRegisterOverride::new();
    let location = AssertLocation {
        file: b"main.c\0",
        line: 7,
        func: b"loop\0",
        expr: b"x > 0\0junk",
    };

    until_halted(|| {
        FaultReporter::new(&mut board, &mut sink, &mut unwinder, &lr).assertion(&location);
    });

    assert_eq!(
        sink.text(),
        "\r\nASSERT in [main.c:7]\tloop(): x > 0\r\n\r\nStack trace:\r\n\r\n"
    );
}

#[test]
fn assertion_consumes_staged_return_address() {
    let mut board = MockBoard::new().with_delay_budget(1);
    let mut sink = MockSink::new();
    let mut unwinder = task_stack();
    let lr = LinkRegisterOverride::new();
    lr.set(0x0000_C001);

    until_halted(|| {
        FaultReporter::new(&mut board, &mut sink, &mut unwinder, &lr)
            .with_config(config())
            .assertion(&AssertLocation::new("a.c", 1, "f", "0"));
    });

    assert!(!lr.is_staged());
    assert_eq!(unwinder.lr_writes(), &[(0, 0x0000_C001)]);
    assert!(sink.text().contains("\t#1:\t0x0000C000 [0x0000B300]\r\n"));
}

#[test]
fn panic_location() {
    let here = Location::caller();
    let location = AssertLocation::from_panic(Some(here), Some("boom"));
    assert_eq!(location.file, file!().as_bytes());
    assert_eq!(location.line, here.line());
    assert_eq!(location.func, b"panic");
    assert_eq!(location.expr, b"boom");

    let unknown = AssertLocation::from_panic(None, None);
    assert_eq!(unknown, AssertLocation::new("<unknown>", 0, PANIC_FUNCTION, FORMATTED_PANIC));
}

// =============================================================================
// Stack overflow
// =============================================================================

fn overflow_report(name: &[u8]) -> (MockBoard, MockSink) {
    let mut board = MockBoard::new().with_delay_budget(7);
    let mut sink = MockSink::new();
    let mut unwinder = SyntheticUnwinder::new(&[]);
    let lr = LinkRegisterOverride::new();

    until_halted(|| {
        FaultReporter::new(&mut board, &mut sink, &mut unwinder, &lr)
            .stack_overflow(TaskHandle::from_raw(0x2000_1000), name);
    });
    (board, sink)
}

#[test]
fn stack_overflow_names_the_task() {
    let (board, sink) = overflow_report(b"idle\0garbage");
    assert_eq!(sink.text(), "STACK OVERFLOW: idle\r\n");
    assert_eq!(sink.flushes(), 1);
    // Three pulses, then the pause
    assert_eq!(board.rising_edges(13), 3);
    assert!(board.saw(BoardEvent::Delay(2_000)));
    assert_eq!(board.position(BoardEvent::InterruptsDisabled), Some(0));
}

#[test]
fn stack_overflow_truncates_long_names() {
    let (_, sink) = overflow_report(b"sensor_task_with_a_long_name");
    assert_eq!(sink.text(), "STACK OVERFLOW: sensor_task_with\r\n");
}

#[test]
fn stack_overflow_name_without_terminator() {
    let (_, sink) = overflow_report(b"0123456789abcdef");
    assert_eq!(sink.text(), "STACK OVERFLOW: 0123456789abcdef\r\n");

    let (_, sink) = overflow_report(b"");
    assert_eq!(sink.text(), "STACK OVERFLOW: \r\n");
}

/// What happened first: interrupts masked or output written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Masked,
    Output,
}

type Steps = Rc<RefCell<Vec<Step>>>;

/// Mock board that also notes when interrupts get masked.
struct NotingBoard {
    inner: MockBoard,
    steps: Steps,
}

impl Board for NotingBoard {
    fn disable_interrupts(&mut self) {
        self.steps.borrow_mut().push(Step::Masked);
        self.inner.disable_interrupts();
    }

    fn suspend_scheduler(&mut self) {
        self.inner.suspend_scheduler();
    }

    fn configure_output(&mut self, pin: u8) {
        self.inner.configure_output(pin);
    }

    fn write_pin(&mut self, pin: u8, high: bool) {
        self.inner.write_pin(pin, high);
    }

    fn set_cpu_clock(&mut self, hz: u32) {
        self.inner.set_cpu_clock(hz);
    }

    fn micros(&self) -> u32 {
        self.inner.micros()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.inner.delay_ms(ms);
    }
}

/// Sink that notes every byte written.
struct NotingSink {
    steps: Steps,
}

impl CharSink for NotingSink {
    fn put(&mut self, _byte: u8) {
        self.steps.borrow_mut().push(Step::Output);
    }
}

#[test]
fn stack_overflow_masks_interrupts_before_writing() {
    let steps = Steps::default();
    let board = NotingBoard {
        inner: MockBoard::new().with_delay_budget(2),
        steps: Rc::clone(&steps),
    };
    let sink = NotingSink {
        steps: Rc::clone(&steps),
    };
    let mut unwinder = SyntheticUnwinder::new(&[]);
    let lr = LinkRegisterOverride::new();

    until_halted(|| {
        FaultReporter::new(board, sink, &mut unwinder, &lr)
            .stack_overflow(TaskHandle::from_raw(1), b"worker");
    });

    let steps = steps.borrow();
    assert_eq!(steps.first(), Some(&Step::Masked));
    assert!(steps[1..].iter().all(|step| *step == Step::Output));
    assert_eq!(steps.len(), 1 + "STACK OVERFLOW: worker\r\n".len());
}

#[test]
fn assertion_masks_interrupts_before_writing() {
    let steps = Steps::default();
    let board = NotingBoard {
        inner: MockBoard::new().with_delay_budget(2),
        steps: Rc::clone(&steps),
    };
    let sink = NotingSink {
        steps: Rc::clone(&steps),
    };
    let mut unwinder = task_stack();
    let lr = LinkRegisterOverride::new();
    let location = AssertLocation::new("a.c", 1, "f", "x");

    until_halted(|| {
        FaultReporter::new(board, sink, &mut unwinder, &lr)
            .with_config(config())
            .assertion(&location);
    });

    assert_eq!(steps.borrow().first(), Some(&Step::Masked));
}

// =============================================================================
// Allocation failure and shutdown
// =============================================================================

#[test]
fn malloc_failed_blinks_twice() {
    let mut board = MockBoard::new().with_delay_budget(5);
    let mut sink = MockSink::new();
    let mut unwinder = SyntheticUnwinder::new(&[]);
    let lr = LinkRegisterOverride::new();

    until_halted(|| {
        FaultReporter::new(&mut board, &mut sink, &mut unwinder, &lr).malloc_failed();
    });

    assert!(sink.output().is_empty());
    assert_eq!(board.position(BoardEvent::InterruptsDisabled), Some(0));
    assert_eq!(board.rising_edges(13), 2);
    assert_eq!(board.events().last(), Some(&BoardEvent::Delay(2_000)));
}

#[test]
fn shutdown_only_pauses() {
    let mut board = MockBoard::new().with_delay_budget(3);
    let mut sink = MockSink::new();
    let mut unwinder = SyntheticUnwinder::new(&[]);
    let lr = LinkRegisterOverride::new();

    until_halted(|| {
        FaultReporter::new(&mut board, &mut sink, &mut unwinder, &lr).shutdown();
    });

    assert!(sink.output().is_empty());
    assert_eq!(board.rising_edges(13), 0);
    assert_eq!(board.position(BoardEvent::InterruptsDisabled), Some(0));
    assert_eq!(board.position(BoardEvent::SchedulerSuspended), Some(1));
    assert_eq!(unwinder.walks(), 0);
}

#[test]
fn custom_timing_reaches_the_signal() {
    let mut board = MockBoard::new().with_delay_budget(1);
    let mut sink = MockSink::new();
    let mut unwinder = SyntheticUnwinder::new(&[]);
    let lr = LinkRegisterOverride::new();
    let config = ReportConfig {
        timing: BlinkTiming {
            on_ms: 50,
            off_ms: 50,
            pause_ms: 500,
            safe_clock_hz: 24_000_000,
        },
        ..ReportConfig::default()
    };

    until_halted(|| {
        FaultReporter::new(&mut board, &mut sink, &mut unwinder, &lr)
            .with_config(config)
            .shutdown();
    });

    assert!(board.saw(BoardEvent::Clock(24_000_000)));
    assert!(board.saw(BoardEvent::Delay(500)));
}
