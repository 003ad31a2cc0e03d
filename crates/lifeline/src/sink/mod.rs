// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Byte sinks for diagnostic output.
//!
//! A sink accepts one byte at a time without allocating and without blocking
//! indefinitely. Fault paths write through it with interrupts disabled, so
//! implementations must not rely on interrupts for progress.


#[cfg(any(test, feature = "std"))]
mod mock;

#[cfg(any(test, feature = "std"))]
pub use mock::MockSink;

use core::fmt;

/// Destination for diagnostic bytes.
pub trait CharSink {
    /// Emit a single byte.
    fn put(&mut self, byte: u8);

    /// Emit a string as one line and flush it.
    fn puts(&mut self, s: &str) {
        for byte in s.bytes() {
            self.put(byte);
        }
        self.put(b'\r');
        self.put(b'\n');
        self.flush();
    }

    /// Push buffered bytes out to the transport.
    fn flush(&mut self) {}
}

impl<S: CharSink + ?Sized> CharSink for &mut S {
    fn put(&mut self, byte: u8) {
        (**self).put(byte);
    }

    fn puts(&mut self, s: &str) {
        (**self).puts(s);
    }

    fn flush(&mut self) {
        (**self).flush();
    }
}

/// Sink built from plain function pointers.
///
/// This is the shape the C side of the port provides (`serialport_put`,
/// `serialport_flush`), and it is `Copy` so it can live in statics.
#[derive(Clone, Copy)]
pub struct FnSink {
    put: fn(u8),
    flush: fn(),
}

impl FnSink {
    /// Create a sink from a byte writer and a flush function.
    #[must_use]
    pub const fn new(put: fn(u8), flush: fn()) -> Self {
        Self { put, flush }
    }

    /// Create a sink without a flush step.
    #[must_use]
    pub const fn unbuffered(put: fn(u8)) -> Self {
        Self { put, flush: no_flush }
    }
}

const fn no_flush() {}

impl CharSink for FnSink {
    fn put(&mut self, byte: u8) {
        (self.put)(byte);
    }

    fn flush(&mut self) {
        (self.flush)();
    }
}

/// Adapter exposing a [`CharSink`] as a [`core::fmt::Write`].
///
/// Used by the logger; the fault paths go through [`crate::fmt`] instead.
pub struct SinkWriter<'a, S: CharSink + ?Sized> {
    sink: &'a mut S,
}

impl<'a, S: CharSink + ?Sized> SinkWriter<'a, S> {
    /// Wrap a sink.
    pub fn new(sink: &'a mut S) -> Self {
        Self { sink }
    }
}

impl<S: CharSink + ?Sized> fmt::Write for SinkWriter<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            self.sink.put(byte);
        }
        Ok(())
    }
}
