// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Frame iteration through libgcc's ARM EHABI unwinder.
//!
//! Needs unwind tables in the image (`-funwind-tables` for C, the default
//! for Rust on ARM).

use core::ffi::{c_int, c_void};

use crate::unwind::{FrameContext, Unwinder, WalkControl};

/// Opaque `_Unwind_Context`.
#[repr(C)]
struct UnwindContext {
    _private: [u8; 0],
}

type UnwindReasonCode = c_int;
type TraceFn = extern "C" fn(*mut UnwindContext, *mut c_void) -> UnwindReasonCode;

const URC_NO_REASON: UnwindReasonCode = 0;
const URC_END_OF_STACK: UnwindReasonCode = 5;

/// `_UVRSC_CORE`
const REG_CLASS_CORE: c_int = 0;
/// `_UVRSD_UINT32`
const REG_REPR_UINT32: c_int = 0;

const REG_LR: u32 = 14;
const REG_PC: u32 = 15;

unsafe extern "C" {
    fn _Unwind_Backtrace(trace: TraceFn, arg: *mut c_void) -> UnwindReasonCode;
    fn _Unwind_VRS_Get(
        context: *mut UnwindContext,
        regclass: c_int,
        regno: u32,
        representation: c_int,
        value: *mut c_void,
    ) -> c_int;
    fn _Unwind_VRS_Set(
        context: *mut UnwindContext,
        regclass: c_int,
        regno: u32,
        representation: c_int,
        value: *mut c_void,
    ) -> c_int;
    fn _Unwind_GetRegionStart(context: *mut UnwindContext) -> usize;
}

type Visitor<'a> = &'a mut dyn FnMut(&mut dyn FrameContext) -> WalkControl;

/// The frame libgcc is currently looking at.
struct EhabiFrame {
    context: *mut UnwindContext,
}

impl FrameContext for EhabiFrame {
    fn ip(&self) -> usize {
        let mut pc: u32 = 0;
        // SAFETY: `context` is live for the duration of the trace callback
        // and PC is a core register readable as a 32-bit word.
        unsafe {
            _Unwind_VRS_Get(
                self.context,
                REG_CLASS_CORE,
                REG_PC,
                REG_REPR_UINT32,
                (&raw mut pc).cast(),
            );
        }
        (pc & !1) as usize
    }

    fn region_start(&self) -> usize {
        // SAFETY: `context` is live for the duration of the trace callback.
        unsafe { _Unwind_GetRegionStart(self.context) }
    }

    fn set_return_address(&mut self, value: usize) {
        let mut lr = value as u32;
        // SAFETY: as in `ip`; LR is writable and only steers the next step.
        unsafe {
            _Unwind_VRS_Set(
                self.context,
                REG_CLASS_CORE,
                REG_LR,
                REG_REPR_UINT32,
                (&raw mut lr).cast(),
            );
        }
    }
}

extern "C" fn trace_frame(context: *mut UnwindContext, arg: *mut c_void) -> UnwindReasonCode {
    // SAFETY: `arg` is the visitor passed to `_Unwind_Backtrace` below,
    // which outlives the whole walk.
    let visit = unsafe { &mut *arg.cast::<Visitor<'_>>() };
    let mut frame = EhabiFrame { context };
    match visit(&mut frame) {
        WalkControl::Continue => URC_NO_REASON,
        WalkControl::EndOfStack => URC_END_OF_STACK,
    }
}

/// Unwinder over the running call stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct EhabiUnwinder;

impl Unwinder for EhabiUnwinder {
    fn backtrace(&mut self, visit: &mut dyn FnMut(&mut dyn FrameContext) -> WalkControl) {
        let mut visit: Visitor<'_> = visit;
        // SAFETY: `trace_frame` only runs during this call, while `visit` is
        // borrowed here.
        unsafe {
            _Unwind_Backtrace(trace_frame, (&raw mut visit).cast());
        }
    }
}
