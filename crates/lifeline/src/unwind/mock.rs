// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Synthetic unwinder for testing.
//!
//! Replays a fixed list of frames instead of reading the real stack. A
//! return address written into a frame replaces the instruction pointer of
//! the next one, the way a real unwinder finds the caller through LR.

use super::{FrameContext, Unwinder, WalkControl};
use std::vec::Vec;

/// Upper bound on frames replayed from a cyclic chain.
///
/// Only guards the test suite against a walker that never stops.
const CYCLE_LIMIT: usize = 10_000;

/// One replayed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticFrame {
    /// Instruction pointer.
    pub ip: usize,
    /// Start of the enclosing function.
    pub region_start: usize,
}

impl SyntheticFrame {
    /// Create a frame.
    #[must_use]
    pub const fn new(ip: usize, region_start: usize) -> Self {
        Self { ip, region_start }
    }
}

/// Unwinder replaying a synthetic frame chain.
pub struct SyntheticUnwinder {
    frames: Vec<SyntheticFrame>,
    cyclic: bool,
    /// Frames handed to the callback, in order.
    visited: usize,
    /// `(frame index, value)` for every return-address write.
    lr_writes: Vec<(usize, usize)>,
    walks: usize,
}

struct Cursor {
    frame: SyntheticFrame,
    new_lr: Option<usize>,
}

impl FrameContext for Cursor {
    fn ip(&self) -> usize {
        self.frame.ip
    }

    fn region_start(&self) -> usize {
        self.frame.region_start
    }

    fn set_return_address(&mut self, value: usize) {
        self.new_lr = Some(value);
    }
}

impl SyntheticUnwinder {
    /// Replay `frames` once, innermost first.
    #[must_use]
    pub fn new(frames: &[SyntheticFrame]) -> Self {
        Self {
            frames: frames.to_vec(),
            cyclic: false,
            visited: 0,
            lr_writes: Vec::new(),
            walks: 0,
        }
    }

    /// Replay `frames` over and over, like a corrupted stack whose frame
    /// chain points back into itself.
    #[must_use]
    pub fn cyclic(frames: &[SyntheticFrame]) -> Self {
        Self {
            cyclic: true,
            ..Self::new(frames)
        }
    }

    /// Number of frames handed to the callback across all walks.
    #[must_use]
    pub const fn visited(&self) -> usize {
        self.visited
    }

    /// Number of `backtrace` calls.
    #[must_use]
    pub const fn walks(&self) -> usize {
        self.walks
    }

    /// Return-address writes as `(frame index, value)`.
    #[must_use]
    pub fn lr_writes(&self) -> &[(usize, usize)] {
        &self.lr_writes
    }
}

impl Unwinder for SyntheticUnwinder {
    fn backtrace(&mut self, visit: &mut dyn FnMut(&mut dyn FrameContext) -> WalkControl) {
        self.walks += 1;
        if self.frames.is_empty() {
            return;
        }

        let limit = if self.cyclic {
            CYCLE_LIMIT
        } else {
            self.frames.len()
        };
        let mut redirected_ip = None;

        for index in 0..limit {
            let mut frame = self.frames[index % self.frames.len()];
            if let Some(ip) = redirected_ip.take() {
                frame.ip = ip;
            }

            let mut cursor = Cursor {
                frame,
                new_lr: None,
            };
            self.visited += 1;
            let control = visit(&mut cursor);

            if let Some(lr) = cursor.new_lr {
                self.lr_writes.push((index, lr));
                redirected_ip = Some(lr);
            }
            if control == WalkControl::EndOfStack {
                return;
            }
        }
    }
}
