// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Monotonic heap behind the C library's `sbrk`.
//!
//! The heap is a single cursor that only moves within fixed bounds. It never
//! reclaims memory; the C allocator on top of it does its own reuse.
//!
//! Memory layout:
//! ```text
//! stack_top (high address)
//!   │  main stack, grows down
//!   ─── limit = stack_top - guard
//!   │  guard distance
//!   ▲
//!   │  cursor moves up (and down) with each sbrk
//!   │
//! initial cursor
//! start (low address)
//! ```
//!
//! The cursor is the only datum touched from several execution contexts.
//! Every access happens with interrupts masked through the heap's
//! [`InterruptMask`], and the saved mask is restored afterwards, so `sbrk` is
//! callable from tasks, from interrupt handlers and before the scheduler
//! starts.

#[cfg(test)]
mod heap_test;

use core::cell::UnsafeCell;

use lifeline_abi::Addr;
use lifeline_abi::layout::{ENOMEM, HEAP_GUARD_DISTANCE, HEAP_START_OFFSET, NO_MEMORY};
use static_assertions::{assert_eq_size, const_assert};

use crate::platform::InterruptMask;

const_assert!(HEAP_START_OFFSET < HEAP_GUARD_DISTANCE);
const_assert!(HEAP_GUARD_DISTANCE % 8 == 0);
assert_eq_size!(Addr, usize);

/// Heap errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HeapError {
    /// The request would reach into the guard distance below the stack.
    #[error("sbrk({incr}): no mem available")]
    OutOfMemory {
        /// Requested increment.
        incr: isize,
    },
    /// The request would move the cursor below the start of the heap.
    #[error("sbrk({incr}): below heap start")]
    BelowStart {
        /// Requested increment.
        incr: isize,
    },
    /// The bounds leave no room for the heap.
    #[error("invalid heap bounds")]
    InvalidBounds,
    /// `init` was called on an initialized heap.
    #[error("heap already initialized")]
    AlreadyInitialized,
}

impl HeapError {
    /// C `errno` value for this error.
    #[must_use]
    pub const fn errno(self) -> i32 {
        ENOMEM
    }
}

/// Address range a [`MonotonicHeap`] may hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapBounds {
    start: Addr,
    initial: Addr,
    limit: Addr,
}

impl HeapBounds {
    /// Bounds of an uninitialized heap. Every request fails.
    pub const EMPTY: Self = Self {
        start: Addr::null(),
        initial: Addr::null(),
        limit: Addr::null(),
    };

    /// Heap from `start` up to `guard` bytes below `stack_top`.
    ///
    /// The cursor starts at `start`.
    pub const fn new(start: Addr, stack_top: Addr, guard: usize) -> Result<Self, HeapError> {
        let Some(limit) = stack_top.checked_sub(guard) else {
            return Err(HeapError::InvalidBounds);
        };
        if start.as_usize() >= limit.as_usize() {
            return Err(HeapError::InvalidBounds);
        }
        Ok(Self {
            start,
            initial: start,
            limit,
        })
    }

    /// Heap between the end of `.bss` and the stack, as the port lays it out.
    ///
    /// Uses the default guard distance and initial offset.
    pub const fn port(ebss: Addr, estack: Addr) -> Result<Self, HeapError> {
        match Self::new(ebss, estack, HEAP_GUARD_DISTANCE) {
            Ok(bounds) => bounds.with_initial_offset(HEAP_START_OFFSET),
            Err(err) => Err(err),
        }
    }

    /// Start the cursor `offset` bytes above `start`.
    pub const fn with_initial_offset(self, offset: usize) -> Result<Self, HeapError> {
        match self.start.checked_add(offset) {
            Some(initial) if initial.as_usize() < self.limit.as_usize() => Ok(Self {
                start: self.start,
                initial,
                limit: self.limit,
            }),
            _ => Err(HeapError::InvalidBounds),
        }
    }

    /// Lowest address the cursor may take.
    #[inline]
    #[must_use]
    pub const fn start(&self) -> Addr {
        self.start
    }

    /// Cursor position after initialization.
    #[inline]
    #[must_use]
    pub const fn initial(&self) -> Addr {
        self.initial
    }

    /// First address the cursor may never reach.
    #[inline]
    #[must_use]
    pub const fn limit(&self) -> Addr {
        self.limit
    }
}

struct HeapState {
    bounds: HeapBounds,
    cursor: Addr,
    initialized: bool,
}

/// Interrupt-safe monotonic `sbrk` heap.
pub struct MonotonicHeap<M: InterruptMask> {
    mask: M,
    state: UnsafeCell<HeapState>,
    oom_hook: Option<fn()>,
}

// SAFETY: `state` is only accessed inside `with_state`, which holds the mask
// for the whole access. The `InterruptMask` contract guarantees that no other
// context reaches the heap meanwhile, and `M: Sync` makes that hold across
// threads as well.
unsafe impl<M: InterruptMask + Sync> Sync for MonotonicHeap<M> {}

impl<M: InterruptMask> MonotonicHeap<M> {
    /// Create a heap over `bounds`.
    pub const fn new(mask: M, bounds: HeapBounds) -> Self {
        Self {
            mask,
            state: UnsafeCell::new(HeapState {
                bounds,
                cursor: bounds.initial,
                initialized: true,
            }),
            oom_hook: None,
        }
    }

    /// Create a heap whose bounds are set later by [`Self::init`].
    ///
    /// Until then every request fails.
    pub const fn uninit(mask: M) -> Self {
        Self {
            mask,
            state: UnsafeCell::new(HeapState {
                bounds: HeapBounds::EMPTY,
                cursor: Addr::null(),
                initialized: false,
            }),
            oom_hook: None,
        }
    }

    /// Call `hook` whenever a request fails.
    ///
    /// The hook runs after the mask has been restored. It may diverge.
    #[must_use]
    pub const fn with_oom_hook(mut self, hook: fn()) -> Self {
        self.oom_hook = Some(hook);
        self
    }

    /// Check whether an allocation-failure hook is configured.
    #[must_use]
    pub const fn has_oom_hook(&self) -> bool {
        self.oom_hook.is_some()
    }

    /// The interrupt mask guarding this heap.
    #[must_use]
    pub const fn mask(&self) -> &M {
        &self.mask
    }

    /// Set the bounds of a heap created with [`Self::uninit`].
    pub fn init(&self, bounds: HeapBounds) -> Result<(), HeapError> {
        let result = self.with_state(|state| {
            if state.initialized {
                return Err(HeapError::AlreadyInitialized);
            }
            state.bounds = bounds;
            state.cursor = bounds.initial;
            state.initialized = true;
            Ok(())
        });
        if result.is_ok() {
            log::debug!(
                "heap {}..{} (cursor {})",
                bounds.start,
                bounds.limit,
                bounds.initial
            );
        }
        result
    }

    /// Move the cursor by `incr` bytes.
    ///
    /// Returns the cursor before the move. Fails without moving when the new
    /// cursor would reach the limit or drop below the start; in that case the
    /// allocation-failure hook runs before the error is returned.
    pub fn sbrk(&self, incr: isize) -> Result<Addr, HeapError> {
        log::trace!("sbrk({incr})");

        let result = self.with_state(|state| {
            let previous = state.cursor;
            let candidate = match previous.checked_offset(incr) {
                Some(candidate) => candidate,
                None if incr < 0 => return Err(HeapError::BelowStart { incr }),
                None => return Err(HeapError::OutOfMemory { incr }),
            };
            if candidate >= state.bounds.limit {
                return Err(HeapError::OutOfMemory { incr });
            }
            if candidate < state.bounds.start {
                return Err(HeapError::BelowStart { incr });
            }
            state.cursor = candidate;
            Ok(previous)
        });

        if let Err(err) = result {
            log::warn!("{err}");
            if let Some(hook) = self.oom_hook {
                hook();
            }
        }
        result
    }

    /// Current cursor.
    #[must_use]
    pub fn cursor(&self) -> Addr {
        self.with_state(|state| state.cursor)
    }

    /// Bytes handed out since initialization.
    #[must_use]
    pub fn used(&self) -> usize {
        self.with_state(|state| state.cursor.distance_from(state.bounds.initial))
    }

    /// Largest increment that would currently succeed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.with_state(|state| {
            state
                .bounds
                .limit
                .distance_from(state.cursor)
                .saturating_sub(1)
        })
    }

    /// Current bounds.
    #[must_use]
    pub fn bounds(&self) -> HeapBounds {
        self.with_state(|state| state.bounds)
    }

    /// Run `f` on the state with interrupts masked.
    ///
    /// `f` must not call back into the heap.
    fn with_state<R>(&self, f: impl FnOnce(&mut HeapState) -> R) -> R {
        let saved = self.mask.save_and_disable();
        // SAFETY: the mask is held, so this is the only live reference.
        let result = f(unsafe { &mut *self.state.get() });
        self.mask.restore(saved);
        result
    }
}

/// Translate an `sbrk` result into the value the C library expects.
///
/// Failures become [`NO_MEMORY`] (`(void*)-1`).
#[inline]
#[must_use]
pub const fn c_break(result: Result<Addr, HeapError>) -> usize {
    match result {
        Ok(previous) => previous.as_usize(),
        Err(_) => NO_MEMORY,
    }
}
