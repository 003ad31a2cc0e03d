// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Backtrace walker.
//!
//! The actual frame iteration is an injected capability ([`Unwinder`]). On
//! the target it is libgcc's exception-handling unwinder; on the host it is
//! [`SyntheticUnwinder`]. This module layers the termination rules, the
//! depth cap and the rendering on top of it.
//!
//! Each frame is printed as soon as it is visited:
//!
//! ```text
//!         #0:     0x00001234 [0x00001200]
//!         #1:     0x00002240 [0x00002200]
//!         #2:     [Task entry point]
//! ```


#[cfg(any(test, feature = "std"))]
mod mock;

#[cfg(any(test, feature = "std"))]
pub use mock::{SyntheticFrame, SyntheticUnwinder};

use core::sync::atomic::{AtomicUsize, Ordering};

use lifeline_abi::UnwindFrame;
use lifeline_abi::layout::MAX_BACKTRACE_DEPTH;

use crate::exc_printf;
use crate::sink::CharSink;

/// Decision returned to the unwinder after each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    /// Step to the caller.
    Continue,
    /// Stop walking.
    EndOfStack,
}

/// Register state of the frame currently being visited.
pub trait FrameContext {
    /// Instruction pointer of this frame, Thumb bit cleared.
    fn ip(&self) -> usize;

    /// Start address of the function containing [`Self::ip`].
    fn region_start(&self) -> usize;

    /// Replace the return-address register (LR) of this frame.
    ///
    /// The unwinder uses it to find the caller, so this changes which frame
    /// is visited next.
    fn set_return_address(&mut self, value: usize);
}

/// Frame-iteration primitive.
pub trait Unwinder {
    /// Walk the current call stack from the innermost frame outward.
    ///
    /// `visit` is called once per frame until it returns
    /// [`WalkControl::EndOfStack`] or the unwinder runs out of frames.
    fn backtrace(&mut self, visit: &mut dyn FnMut(&mut dyn FrameContext) -> WalkControl);
}

impl<U: Unwinder + ?Sized> Unwinder for &mut U {
    fn backtrace(&mut self, visit: &mut dyn FnMut(&mut dyn FrameContext) -> WalkControl) {
        (**self).backtrace(visit);
    }
}

/// One-shot correction for the first frame's return address.
///
/// A caller that knows the real return address of the interrupted code (for
/// example a fault taken in a handler) stages it here before starting a
/// backtrace. The walker takes it exactly once, which clears it.
#[derive(Debug, Default)]
pub struct LinkRegisterOverride {
    value: AtomicUsize,
}

impl LinkRegisterOverride {
    /// Create an empty override.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            value: AtomicUsize::new(0),
        }
    }

    /// Stage a return address for the next backtrace. Zero clears it.
    pub fn set(&self, lr: usize) {
        self.value.store(lr, Ordering::Relaxed);
    }

    /// Check whether a value is staged.
    #[must_use]
    pub fn is_staged(&self) -> bool {
        self.value.load(Ordering::Relaxed) != 0
    }

    /// Read and clear the staged value.
    #[must_use]
    pub fn take(&self) -> Option<usize> {
        match self.value.swap(0, Ordering::Relaxed) {
            0 => None,
            lr => Some(lr),
        }
    }
}

/// Backtrace parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BacktraceConfig {
    /// Address of the trap every task returns into (`prvTaskExitError`).
    pub task_entry: usize,
    /// Maximum number of frames visited.
    pub max_depth: u32,
}

impl BacktraceConfig {
    /// Config with the default depth cap.
    #[must_use]
    pub const fn new(task_entry: usize) -> Self {
        Self {
            task_entry,
            max_depth: MAX_BACKTRACE_DEPTH,
        }
    }
}

impl Default for BacktraceConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Per-frame callback state of one backtrace.
pub struct Walker<'a, S: CharSink + ?Sized> {
    sink: &'a mut S,
    config: BacktraceConfig,
    lr_override: Option<usize>,
    depth: u32,
}

impl<'a, S: CharSink + ?Sized> Walker<'a, S> {
    /// Create a walker writing to `sink`.
    ///
    /// `lr_override` is applied to the first rendered frame.
    pub fn new(sink: &'a mut S, config: BacktraceConfig, lr_override: Option<usize>) -> Self {
        Self {
            sink,
            config,
            lr_override,
            depth: 0,
        }
    }

    /// Number of frames visited so far.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Render one frame and decide whether to continue.
    pub fn visit(&mut self, ctx: &mut dyn FrameContext) -> WalkControl {
        if self.depth >= self.config.max_depth {
            return WalkControl::EndOfStack;
        }

        let frame = UnwindFrame::new(self.depth, ctx.ip(), ctx.region_start());
        exc_printf!(&mut *self.sink, "\t#%d", frame.depth);

        if frame.is_task_entry(self.config.task_entry) {
            exc_printf!(&mut *self.sink, ":\t[Task entry point]\r\n");
            return WalkControl::EndOfStack;
        }

        exc_printf!(&mut *self.sink, ":\t0x%04x", frame.call_site());
        exc_printf!(&mut *self.sink, " [0x%04x]\r\n", frame.region_start);

        if let Some(lr) = self.lr_override.take() {
            ctx.set_return_address(lr);
        }

        self.depth += 1;
        if self.depth >= self.config.max_depth {
            return WalkControl::EndOfStack;
        }
        WalkControl::Continue
    }
}

/// Print a backtrace of the current call stack.
///
/// Takes the staged link-register override, if any. Returns the number of
/// frames printed with an address (the task entry line is not counted).
pub fn print_backtrace<S, U>(
    sink: &mut S,
    unwinder: &mut U,
    lr_override: &LinkRegisterOverride,
    config: BacktraceConfig,
) -> u32
where
    S: CharSink + ?Sized,
    U: Unwinder + ?Sized,
{
    let mut walker = Walker::new(sink, config, lr_override.take());
    unwinder.backtrace(&mut |ctx: &mut dyn FrameContext| walker.visit(ctx));
    walker.depth()
}
