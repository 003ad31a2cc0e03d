// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for the monotonic heap.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::platform::MockInterrupts;
use core::cell::Cell;
use core::sync::atomic::{AtomicUsize, Ordering};
use proptest::prelude::*;
use std::rc::Rc;

const EBSS: usize = 0x2000_4000;
const ESTACK: usize = 0x2008_0000;
const LIMIT: usize = ESTACK - HEAP_GUARD_DISTANCE;

fn bounds() -> HeapBounds {
    HeapBounds::new(Addr::new(EBSS), Addr::new(ESTACK), HEAP_GUARD_DISTANCE).unwrap()
}

fn heap() -> MonotonicHeap<MockInterrupts> {
    MonotonicHeap::new(MockInterrupts::new(), bounds())
}

// =============================================================================
// Bounds
// =============================================================================

#[test]
fn bounds_place_limit_below_stack() {
    let bounds = bounds();
    assert_eq!(bounds.start(), Addr::new(EBSS));
    assert_eq!(bounds.initial(), Addr::new(EBSS));
    assert_eq!(bounds.limit(), Addr::new(LIMIT));
}

#[test]
fn port_bounds_start_above_bss() {
    let bounds = HeapBounds::port(Addr::new(EBSS), Addr::new(ESTACK)).unwrap();
    assert_eq!(bounds.start(), Addr::new(EBSS));
    assert_eq!(bounds.initial(), Addr::new(EBSS + HEAP_START_OFFSET));
    assert_eq!(bounds.limit(), Addr::new(LIMIT));
}

#[test]
fn inverted_or_tiny_bounds_are_rejected() {
    assert_eq!(
        HeapBounds::new(Addr::new(ESTACK), Addr::new(EBSS), 0),
        Err(HeapError::InvalidBounds)
    );
    assert_eq!(
        HeapBounds::new(Addr::new(0x100), Addr::new(0x1000), 0x2000),
        Err(HeapError::InvalidBounds)
    );
    // Start exactly at the limit leaves no room
    assert_eq!(
        HeapBounds::new(Addr::new(0x1000), Addr::new(0x3000), 0x2000),
        Err(HeapError::InvalidBounds)
    );
    assert_eq!(
        bounds().with_initial_offset(LIMIT - EBSS),
        Err(HeapError::InvalidBounds)
    );
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn growth_returns_previous_cursor() {
    let heap = heap();
    let old = heap.cursor();
    assert_eq!(old, Addr::new(EBSS));

    assert_eq!(heap.sbrk(1024), Ok(old));
    assert_eq!(heap.cursor(), Addr::new(EBSS + 1024));
    assert_eq!(heap.used(), 1024);
}

#[test]
fn growth_into_guard_distance_is_refused() {
    let heap = heap();
    heap.sbrk(isize::try_from(LIMIT - EBSS - 0x100).unwrap()).unwrap();
    let before = heap.cursor();

    let result = heap.sbrk(0x100);
    assert_eq!(result, Err(HeapError::OutOfMemory { incr: 0x100 }));
    assert_eq!(c_break(result), NO_MEMORY);
    assert_eq!(heap.cursor(), before);
}

#[test]
fn cursor_may_stop_one_byte_short_of_limit() {
    let heap = heap();
    let max = heap.remaining();
    assert_eq!(max, LIMIT - EBSS - 1);
    heap.sbrk(isize::try_from(max).unwrap()).unwrap();
    assert_eq!(heap.cursor(), Addr::new(LIMIT - 1));
    assert_eq!(heap.remaining(), 0);
    assert!(heap.sbrk(1).is_err());
}

#[test]
fn zero_increment_reports_cursor() {
    let heap = heap();
    heap.sbrk(64).unwrap();
    assert_eq!(heap.sbrk(0), Ok(Addr::new(EBSS + 64)));
    assert_eq!(heap.cursor(), Addr::new(EBSS + 64));
}

#[test]
fn shrinking_is_allowed_down_to_start() {
    let heap = heap();
    heap.sbrk(256).unwrap();
    assert_eq!(heap.sbrk(-256), Ok(Addr::new(EBSS + 256)));
    assert_eq!(heap.cursor(), Addr::new(EBSS));

    assert_eq!(heap.sbrk(-1), Err(HeapError::BelowStart { incr: -1 }));
    assert_eq!(heap.cursor(), Addr::new(EBSS));
}

#[test]
fn address_space_overflow_is_refused() {
    let heap = heap();
    assert_eq!(
        heap.sbrk(isize::MAX),
        Err(HeapError::OutOfMemory { incr: isize::MAX })
    );
    assert_eq!(
        heap.sbrk(isize::MIN),
        Err(HeapError::BelowStart { incr: isize::MIN })
    );
    assert_eq!(heap.cursor(), Addr::new(EBSS));
}

#[test]
fn errors_map_to_enomem() {
    assert_eq!(HeapError::OutOfMemory { incr: 1 }.errno(), ENOMEM);
    assert_eq!(HeapError::BelowStart { incr: -1 }.errno(), ENOMEM);
    assert_eq!(c_break(Ok(Addr::new(0x2000_0000))), 0x2000_0000);
}

#[test]
fn error_messages() {
    assert_eq!(
        std::format!("{}", HeapError::OutOfMemory { incr: 4096 }),
        "sbrk(4096): no mem available"
    );
    assert_eq!(
        std::format!("{}", HeapError::AlreadyInitialized),
        "heap already initialized"
    );
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn uninitialized_heap_refuses_everything() {
    let heap = MonotonicHeap::uninit(MockInterrupts::new());
    assert_eq!(heap.bounds(), HeapBounds::EMPTY);
    assert!(heap.sbrk(0).is_err());
    assert!(heap.sbrk(16).is_err());
}

#[test]
fn init_sets_bounds_once() {
    let heap = MonotonicHeap::uninit(MockInterrupts::new());
    let port = HeapBounds::port(Addr::new(EBSS), Addr::new(ESTACK)).unwrap();

    heap.init(port).unwrap();
    assert_eq!(heap.cursor(), Addr::new(EBSS + HEAP_START_OFFSET));
    assert_eq!(heap.sbrk(8), Ok(Addr::new(EBSS + HEAP_START_OFFSET)));

    assert_eq!(heap.init(bounds()), Err(HeapError::AlreadyInitialized));
    assert_eq!(heap.bounds(), port);
    assert_eq!(heap.used(), 8);
}

static HOOK_CALLS: AtomicUsize = AtomicUsize::new(0);

fn count_hook() {
    HOOK_CALLS.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn oom_hook_runs_only_on_failure() {
    let heap = heap().with_oom_hook(count_hook);
    assert!(heap.has_oom_hook());

    heap.sbrk(16).unwrap();
    assert_eq!(HOOK_CALLS.load(Ordering::SeqCst), 0);

    assert!(heap.sbrk(isize::try_from(ESTACK).unwrap()).is_err());
    assert_eq!(HOOK_CALLS.load(Ordering::SeqCst), 1);
    assert!(heap.sbrk(-0x10_0000).is_err());
    assert_eq!(HOOK_CALLS.load(Ordering::SeqCst), 2);
}

// =============================================================================
// Interrupt safety
// =============================================================================

#[test]
fn mask_is_restored_after_every_request() {
    let heap = heap();
    heap.sbrk(32).unwrap();
    assert!(heap.mask().enabled());
    assert!(heap.sbrk(isize::MAX).is_err());
    assert!(heap.mask().enabled());
}

#[test]
fn request_from_masked_context_keeps_mask() {
    let heap = MonotonicHeap::new(MockInterrupts::masked(), bounds());
    heap.sbrk(32).unwrap();
    assert!(!heap.mask().enabled());
    assert!(heap.sbrk(isize::MAX).is_err());
    assert!(!heap.mask().enabled());
}

#[test]
fn interrupt_inside_request_is_serialized() {
    let heap = Rc::new(heap());
    let isr_result = Rc::new(Cell::new(None));

    let isr_heap = Rc::clone(&heap);
    let isr_seen = Rc::clone(&isr_result);
    heap.mask().arm(move || isr_seen.set(Some(isr_heap.sbrk(64))));

    // The interrupt arrives after the mask is taken, i.e. between the
    // bounds check and the cursor update of this request
    let task_result = heap.sbrk(1024);

    assert_eq!(task_result, Ok(Addr::new(EBSS)));
    assert_eq!(isr_result.get(), Some(Ok(Addr::new(EBSS + 1024))));
    assert_eq!(heap.cursor(), Addr::new(EBSS + 1024 + 64));
    assert_eq!(heap.mask().delivered(), 1);
}

#[test]
fn interrupt_failure_inside_request_leaves_cursor_consistent() {
    let heap = Rc::new(heap());
    let isr_result = Rc::new(Cell::new(None));

    let isr_heap = Rc::clone(&heap);
    let isr_seen = Rc::clone(&isr_result);
    heap.mask().arm(move || isr_seen.set(Some(isr_heap.sbrk(0x100))));

    let task_size = LIMIT - EBSS - 0x80;
    let task_result = heap.sbrk(isize::try_from(task_size).unwrap());

    assert_eq!(task_result, Ok(Addr::new(EBSS)));
    assert_eq!(
        isr_result.get(),
        Some(Err(HeapError::OutOfMemory { incr: 0x100 }))
    );
    assert_eq!(heap.cursor(), Addr::new(EBSS + task_size));
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn cursor_stays_within_bounds(requests in proptest::collection::vec(-0x1_0000_isize..0x4_0000, 1..64)) {
        let heap = heap();
        for incr in requests {
            let before = heap.cursor();
            match heap.sbrk(incr) {
                Ok(previous) => {
                    prop_assert_eq!(previous, before);
                    prop_assert_eq!(heap.cursor(), before.checked_offset(incr).unwrap());
                    if incr > 0 {
                        prop_assert!(heap.cursor() > before);
                    }
                }
                Err(_) => prop_assert_eq!(heap.cursor(), before),
            }
            prop_assert!(heap.cursor() >= Addr::new(EBSS));
            prop_assert!(heap.cursor() < Addr::new(LIMIT));
        }
    }

    #[test]
    fn growth_only_heap_is_monotonic(requests in proptest::collection::vec(0_isize..0x8000, 1..128)) {
        let heap = heap();
        let mut last = heap.cursor();
        for incr in requests {
            let _ = heap.sbrk(incr);
            prop_assert!(heap.cursor() >= last);
            last = heap.cursor();
        }
        prop_assert_eq!(heap.used() + heap.remaining() + 1, LIMIT - EBSS);
    }
}
