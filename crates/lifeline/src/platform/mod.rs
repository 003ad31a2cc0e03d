// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Platform abstraction for the fault paths and the heap.
//!
//! This module provides the narrow interfaces the runtime consumes from the
//! board (indicator pin, clock, scheduler, interrupt mask), allowing all of
//! the runtime to be tested on the host system.



#[cfg(test)]
mod scb_test;

mod delay;
// Mock requires alloc, only available with std or test
#[cfg(any(test, feature = "std"))]
mod mock;
pub mod scb;
mod traits;

#[cfg(any(test, feature = "std"))]
pub use mock::{BoardEvent, Halted, MockBoard, MockInterrupts};

pub use delay::CycleDelay;
pub use traits::{Board, InterruptMask, MemoryStats};
