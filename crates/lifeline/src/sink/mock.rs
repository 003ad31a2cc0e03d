// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Mock sink for testing.
//!
//! Captures every byte in memory and counts flushes, so tests can compare
//! the exact diagnostic output.

use super::CharSink;
use std::string::String;
use std::vec::Vec;

/// Sink backed by an in-memory buffer.
pub struct MockSink {
    /// Bytes written so far.
    output: Vec<u8>,
    /// Number of `flush` calls.
    flushes: usize,
    /// Output length at each flush.
    flush_marks: Vec<usize>,
}

impl MockSink {
    /// Create an empty mock sink.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            output: Vec::new(),
            flushes: 0,
            flush_marks: Vec::new(),
        }
    }

    /// Get the bytes written so far.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Get the output as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Number of flushes seen.
    #[must_use]
    pub const fn flushes(&self) -> usize {
        self.flushes
    }

    /// Output length at each flush, in order.
    #[must_use]
    pub fn flush_marks(&self) -> &[usize] {
        &self.flush_marks
    }

    /// Clear captured output and flush history.
    pub fn clear(&mut self) {
        self.output.clear();
        self.flushes = 0;
        self.flush_marks.clear();
    }
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CharSink for MockSink {
    fn put(&mut self, byte: u8) {
        self.output.push(byte);
    }

    fn flush(&mut self) {
        self.flushes += 1;
        self.flush_marks.push(self.output.len());
    }
}
