// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Target glue for Cortex-M Teensy boards.
//!
//! Binds the host-testable runtime to the hardware and to the C side of the
//! port:
//! - [`Primask`]: the interrupt mask guarding the heap
//! - [`EhabiUnwinder`]: libgcc's ARM exception-handling unwinder
//! - [`teensy`]: the board, the serial sink and the exported C entry points
//!
//! Build for the target with `default-features = false`.

mod ehabi;
mod primask;
pub mod teensy;

pub use ehabi::EhabiUnwinder;
pub use primask::Primask;
