// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Layout, sizing and timing constants of the FreeRTOS port.
//!
//! The heap grows upward from the end of `.bss` toward the main stack, which
//! grows downward from `_estack`:
//!
//! ```text
//! _estack (high address)
//!   │  main stack, grows down
//!   ▼
//!   ─── limit = _estack - HEAP_GUARD_DISTANCE
//!   │  guard distance, never handed out
//!   ─── (no heap cursor may reach this line)
//!   ▲
//!   │  heap, grows up with each sbrk
//!   │
//! _ebss + HEAP_START_OFFSET  ← initial cursor
//! _ebss (low address)        ← lower bound
//! ```

/// One kilobyte in bytes.
pub const KB: usize = 1024;

// =============================================================================
// Heap
// =============================================================================

/// Bytes kept free between the highest heap address and the top of the stack.
pub const HEAP_GUARD_DISTANCE: usize = 8 * KB;

/// Offset of the initial heap cursor above the end of `.bss`.
pub const HEAP_START_OFFSET: usize = 32;

/// Value handed to the C library when `sbrk` cannot satisfy a request.
///
/// This is `(void*)-1`; the malloc family turns it into a null return.
pub const NO_MEMORY: usize = usize::MAX;

/// `errno` value reported for an exhausted heap.
pub const ENOMEM: i32 = 12;

// =============================================================================
// Backtrace
// =============================================================================

/// Hard cap on the number of frames visited by a single backtrace.
pub const MAX_BACKTRACE_DEPTH: u32 = 32;

/// Maximum task name length (`configMAX_TASK_NAME_LEN`).
pub const MAX_TASK_NAME_LEN: usize = 16;

// =============================================================================
// Failure signal
// =============================================================================

/// CPU clock forced while blinking, so busy-wait timing stays predictable.
pub const SAFE_CLOCK_HZ: u32 = 16_000_000;

/// Duration the status indicator stays lit per pulse.
pub const BLINK_ON_MS: u32 = 300;

/// Duration the status indicator stays dark after each pulse.
pub const BLINK_OFF_MS: u32 = 300;

/// Pause between two pulse groups.
pub const BLINK_PAUSE_MS: u32 = 2_000;

/// Status indicator pin when the board does not name one (`LED_BUILTIN`).
pub const DEFAULT_STATUS_PIN: u8 = 13;
