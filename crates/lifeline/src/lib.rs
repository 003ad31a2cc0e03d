// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! # Lifeline
//!
//! Runtime safety net for the FreeRTOS port to Teensy boards.
//!
//! This crate provides the code that runs when normal execution can no
//! longer be trusted:
//! - An allocation-free `printf`-style formatter writing to a byte sink
//! - A backtrace walker layered on an injected stack unwinder
//! - The fault reporter for assertions, stack overflows and shutdown
//! - The terminal blink loop that signals the fault class forever
//! - The interrupt-safe monotonic heap behind the C library's `sbrk`
//! - A RAM usage report and a `log` backend on the same sink
//!
//! Hardware is reached only through the traits in [`platform`], [`sink`] and
//! [`unwind`], so everything except the target glue in `arch` runs on the
//! host against mocks.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` on the target. The `std` feature (on by default)
//! and test builds enable the mock implementations.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod fmt;
pub mod heap;
pub mod logger;
pub mod platform;
pub mod report;
pub mod signal;
pub mod sink;
pub mod unwind;
pub mod usage;

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub mod arch;

// Re-export commonly used types at crate root
pub use heap::{HeapBounds, HeapError, MonotonicHeap};
pub use lifeline_abi::{Addr, FailurePattern, TaskHandle, UnwindFrame};
pub use logger::SinkLogger;
pub use platform::{Board, InterruptMask, MemoryStats};
pub use report::{AssertLocation, FaultReporter, ReportConfig};
pub use signal::{BlinkSequence, BlinkStep, BlinkTiming, error_blink};
pub use sink::{CharSink, FnSink};
pub use unwind::{BacktraceConfig, FrameContext, LinkRegisterOverride, Unwinder, WalkControl};
pub use usage::print_ram_usage;
