// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Shared data types for the Lifeline fault-diagnostics runtime.
//!
//! This crate defines the pieces of the runtime that are pure data:
//! - Address and task handle newtypes
//! - Layout and timing constants of the FreeRTOS port
//! - The failure pattern encoding fault classes as blink counts
//! - Unwind frames and their call-site adjustment
//! - RAM usage records used for reporting
//!
//! # Design Principles
//!
//! - **No dependencies**: Pure data types, 100% host-testable
//! - **Word sized**: Addresses are `usize`, 32 bits on the target MCUs
//!
//! # Modules
//!
//! - [`types`]: `Addr` and `TaskHandle`
//! - [`layout`]: heap guard distance, depth cap, blink timings
//! - [`pattern`]: `FailurePattern`
//! - [`frame`]: `UnwindFrame`
//! - [`usage`]: `Ram1Usage` and `Ram2Usage`

#![cfg_attr(not(test), no_std)]


pub mod frame;
pub mod layout;
pub mod pattern;
pub mod types;
pub mod usage;

// Re-export commonly used types at crate root
pub use frame::UnwindFrame;
pub use pattern::FailurePattern;
pub use types::{Addr, TaskHandle};
pub use usage::{Ram1Usage, Ram2Usage};
