// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Teensy board support and the C entry points of the port.
//!
//! The symbols exported here replace the C implementations the FreeRTOS
//! port and newlib link against:
//!
//! | Symbol | Caller |
//! |--------|--------|
//! | `assert_blink` | `configASSERT` |
//! | `mcu_shutdown` | application shutdown |
//! | `vApplicationStackOverflowHook` | scheduler stack check |
//! | `vApplicationMallocFailedHook` | FreeRTOS heap (`malloc-failed-hook`) |
//! | `_sbrk_r`, `sbrk`, `_sbrk` | newlib malloc |
//! | `__NVIC_SetPriorityGrouping` | port startup |
//! | `lifeline_set_trace_lr` | fault handlers staging the interrupted LR |
//! | `startup_late_hook` | Teensy startup code |

use core::ffi::{CStr, c_char, c_int, c_void};
use core::ptr;

use cortex_m::register::basepri;
use lifeline_abi::layout::MAX_TASK_NAME_LEN;
use lifeline_abi::{Addr, TaskHandle};
use log::LevelFilter;

use super::{EhabiUnwinder, Primask};
use crate::heap::{HeapBounds, MonotonicHeap, c_break};
use crate::logger::{self, SinkLogger};
use crate::platform::{Board, CycleDelay, scb};
use crate::report::{AssertLocation, FaultReporter, ReportConfig};
use crate::signal::BlinkTiming;
use crate::sink::{CharSink, FnSink};
use crate::unwind::{BacktraceConfig, LinkRegisterOverride};

/// Arduino `OUTPUT` pin mode.
const PIN_MODE_OUTPUT: u8 = 1;

/// newlib's per-thread reentrancy structure; only `errno` is touched.
#[repr(C)]
pub struct Reent {
    pub errno: c_int,
}

unsafe extern "C" {
    // Teensy core
    fn pinMode(pin: u8, mode: u8);
    fn digitalWrite(pin: u8, value: u8);
    fn micros() -> u32;
    #[cfg(feature = "teensy4")]
    fn set_arm_clock(frequency: u32) -> u32;
    #[cfg(feature = "teensy4")]
    static F_CPU_ACTUAL: u32;

    // Serial transport of the port (weak C defaults)
    fn serialport_put(c: c_char);
    fn serialport_flush();

    // FreeRTOS
    fn vTaskSuspendAll();
    fn prvTaskExitError();

    // newlib
    fn init_newlib_locks();
    static _impure_ptr: *mut Reent;

    // Linker script
    static _ebss: u8;
    static _estack: u8;
}

/// Return-address override staged by fault handlers (`g_trace_lr`).
static TRACE_LR: LinkRegisterOverride = LinkRegisterOverride::new();

/// The heap behind `sbrk`.
static HEAP: MonotonicHeap<Primask> = port_heap();

static LOGGER: SinkLogger =
    SinkLogger::new(FnSink::new(serial_put, serial_flush), LevelFilter::Warn);

const fn port_heap() -> MonotonicHeap<Primask> {
    let heap = MonotonicHeap::uninit(Primask);
    #[cfg(feature = "malloc-failed-hook")]
    let heap = heap.with_oom_hook(malloc_failed);
    heap
}

// =============================================================================
// Serial sink
// =============================================================================

fn serial_put(byte: u8) {
    // SAFETY: provided by the port, callable from any context.
    unsafe { serialport_put(byte as c_char) };
}

fn serial_flush() {
    // SAFETY: as above.
    unsafe { serialport_flush() };
}

/// Diagnostic sink on the port's serial transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialSink;

impl CharSink for SerialSink {
    fn put(&mut self, byte: u8) {
        serial_put(byte);
    }

    fn flush(&mut self) {
        serial_flush();
    }
}

// =============================================================================
// Board
// =============================================================================

/// Core clock of Teensy 3.x builds.
#[cfg(not(feature = "teensy4"))]
mod clock {
    include!(concat!(env!("OUT_DIR"), "/clock.rs"));
}

/// Teensy 3.x / 4.x board running the FreeRTOS port.
///
/// Delays count core cycles: SysTick is masked while reporting, so the
/// `micros()` time base stops advancing.
#[derive(Debug, Clone, Copy)]
pub struct TeensyBoard {
    delay: CycleDelay,
}

impl TeensyBoard {
    /// Board calibrated for the clock the core runs at now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            delay: CycleDelay::new(core_hz()),
        }
    }
}

impl Default for TeensyBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "teensy4")]
fn core_hz() -> u32 {
    // SAFETY: the core keeps F_CPU_ACTUAL current across clock changes.
    unsafe { ptr::read_volatile(&raw const F_CPU_ACTUAL) }
}

#[cfg(not(feature = "teensy4"))]
const fn core_hz() -> u32 {
    clock::F_CPU
}

impl Board for TeensyBoard {
    fn disable_interrupts(&mut self) {
        // portDISABLE_INTERRUPTS: mask everything the scheduler manages and
        // leave higher priorities running
        // SAFETY: raising BASEPRI only masks interrupts.
        unsafe { basepri::write(scb::SYSCALL_MASK_PRIORITY) };
        cortex_m::asm::dsb();
        cortex_m::asm::isb();
    }

    #[cfg(feature = "teensy4")]
    fn raise_conflicting_irq_priority(&mut self) {
        let ipr = scb::nvic_ipr_address(scb::IRQ_USB1) as *mut u8;
        // SAFETY: byte-wide NVIC priority register of USB1.
        unsafe { ptr::write_volatile(ipr, scb::USB1_FAULT_PRIORITY) };
    }

    fn suspend_scheduler(&mut self) {
        // SAFETY: callable from task context with or without interrupts.
        unsafe { vTaskSuspendAll() };
    }

    fn configure_output(&mut self, pin: u8) {
        // SAFETY: plain GPIO setup.
        unsafe { pinMode(pin, PIN_MODE_OUTPUT) };
    }

    fn write_pin(&mut self, pin: u8, high: bool) {
        // SAFETY: plain GPIO write.
        unsafe { digitalWrite(pin, u8::from(high)) };
    }

    #[cfg(feature = "teensy4")]
    fn set_cpu_clock(&mut self, hz: u32) {
        // SAFETY: reprograms the ARM PLL; nothing else runs at this point.
        let actual = unsafe { set_arm_clock(hz) };
        self.delay.set_core_hz(actual);
    }

    // Teensy 3.x keeps running at F_CPU
    #[cfg(not(feature = "teensy4"))]
    fn set_cpu_clock(&mut self, _hz: u32) {}

    fn micros(&self) -> u32 {
        // SAFETY: reads the free-running time base.
        unsafe { micros() }
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms, cortex_m::asm::delay);
    }
}

// =============================================================================
// Fault entry points
// =============================================================================

fn reporter() -> FaultReporter<'static, TeensyBoard, SerialSink, EhabiUnwinder> {
    let task_entry = prvTaskExitError as unsafe extern "C" fn() as usize;
    FaultReporter::new(TeensyBoard::new(), SerialSink, EhabiUnwinder, &TRACE_LR).with_config(
        ReportConfig {
            backtrace: BacktraceConfig::new(task_entry),
            timing: BlinkTiming::PORT,
        },
    )
}

/// Bytes of a C string, empty for null.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that lives for `'a`.
unsafe fn c_bytes<'a>(ptr: *const c_char) -> &'a [u8] {
    if ptr.is_null() {
        return &[];
    }
    // SAFETY: guaranteed by the caller.
    unsafe { CStr::from_ptr(ptr) }.to_bytes()
}

/// Report a failed assertion and halt.
///
/// # Safety
///
/// The string arguments must be null or valid C strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn assert_blink(
    file: *const c_char,
    line: c_int,
    func: *const c_char,
    expr: *const c_char,
) -> ! {
    // SAFETY: guaranteed by the caller.
    let location = unsafe {
        AssertLocation {
            file: c_bytes(file),
            line: line as u32,
            func: c_bytes(func),
            expr: c_bytes(expr),
        }
    };
    reporter().assertion(&location)
}

/// Stop the system and blink the shutdown pattern.
#[unsafe(no_mangle)]
pub extern "C" fn mcu_shutdown() -> ! {
    reporter().shutdown()
}

/// Scheduler hook for a detected task stack overflow.
///
/// # Safety
///
/// `task_name` must be null or readable for `configMAX_TASK_NAME_LEN` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vApplicationStackOverflowHook(
    task: *mut c_void,
    task_name: *mut c_char,
) -> ! {
    let name: &[u8] = if task_name.is_null() {
        &[]
    } else {
        // SAFETY: guaranteed by the caller.
        unsafe { core::slice::from_raw_parts(task_name.cast::<u8>(), MAX_TASK_NAME_LEN) }
    };
    reporter().stack_overflow(TaskHandle::from_raw(task as usize), name)
}

/// FreeRTOS hook for a failed `pvPortMalloc`.
#[unsafe(no_mangle)]
pub extern "C" fn vApplicationMallocFailedHook() -> ! {
    reporter().malloc_failed()
}

#[cfg(feature = "malloc-failed-hook")]
fn malloc_failed() {
    vApplicationMallocFailedHook();
}

/// Stage the return address of the interrupted code for the next backtrace.
#[unsafe(no_mangle)]
pub extern "C" fn lifeline_set_trace_lr(lr: u32) {
    TRACE_LR.set(lr as usize);
}

#[cfg(feature = "panic-handler")]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo<'_>) -> ! {
    let location = AssertLocation::from_panic(info.location(), info.message().as_str());
    reporter().assertion(&location)
}

// =============================================================================
// Heap
// =============================================================================

/// Reentrant `sbrk` for newlib.
///
/// # Safety
///
/// `reent` must be null or point to a valid reentrancy structure.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _sbrk_r(reent: *mut Reent, incr: isize) -> *mut c_void {
    let result = HEAP.sbrk(incr);
    if let Err(err) = result {
        // SAFETY: guaranteed by the caller.
        unsafe { set_errno(reent, err.errno()) };
    }
    ptr::without_provenance_mut(c_break(result))
}

/// Store `errno` for a failed request.
///
/// With the allocation-failure hook configured the heap has already diverged
/// into it, and `errno` is left alone.
///
/// # Safety
///
/// `reent` must be null or point to a valid reentrancy structure.
#[cfg(not(feature = "malloc-failed-hook"))]
unsafe fn set_errno(reent: *mut Reent, errno: c_int) {
    // SAFETY: guaranteed by the caller.
    if let Some(reent) = unsafe { reent.as_mut() } {
        reent.errno = errno;
    }
}

#[cfg(feature = "malloc-failed-hook")]
const unsafe fn set_errno(_reent: *mut Reent, _errno: c_int) {}

/// `sbrk` for the current thread.
#[unsafe(no_mangle)]
pub extern "C" fn sbrk(incr: isize) -> *mut c_void {
    // SAFETY: newlib keeps `_impure_ptr` pointing at the running thread's
    // reentrancy structure.
    unsafe { _sbrk_r(_impure_ptr, incr) }
}

/// Alias of [`sbrk`].
#[unsafe(no_mangle)]
pub extern "C" fn _sbrk(incr: isize) -> *mut c_void {
    sbrk(incr)
}

// =============================================================================
// Startup
// =============================================================================

/// Set the NVIC priority grouping with the AIRCR write key.
#[unsafe(no_mangle)]
pub extern "C" fn __NVIC_SetPriorityGrouping(group: u32) {
    let aircr = scb::SCB_AIRCR as *mut u32;
    // SAFETY: AIRCR is a word-wide SCB register, writes need the key below.
    unsafe {
        let current = ptr::read_volatile(aircr);
        ptr::write_volatile(aircr, scb::aircr_with_priority_grouping(current, group));
    }
}

/// Late startup: newlib locks, logger and heap bounds.
///
/// If a logger is already installed it stays in place, and a warning about
/// the serial logger goes through it.
#[unsafe(no_mangle)]
#[unsafe(link_section = ".flashmem")]
#[inline(never)]
pub extern "C" fn startup_late_hook() {
    // SAFETY: runs once, before any task or allocation.
    unsafe { init_newlib_locks() };

    // An earlier logger keeps precedence and receives the heap diagnostics
    if let Err(err) = logger::init(&LOGGER) {
        log::warn!("serial logger not installed: {err}");
    }

    let ebss = Addr::new(&raw const _ebss as usize);
    let estack = Addr::new(&raw const _estack as usize);
    if let Err(err) = HeapBounds::port(ebss, estack).and_then(|bounds| HEAP.init(bounds)) {
        log::error!("heap: {err}");
    }
}
