// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! `log` backend writing to a [`FnSink`].
//!
//! Each record becomes one line:
//!
//! ```text
//! [WARN lifeline::heap] sbrk(4096): no mem available
//! ```
//!
//! The logger is for ordinary runtime diagnostics. Fault paths write through
//! [`crate::fmt`] directly and work whether or not a logger is installed.


use core::fmt::Write;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::sink::{CharSink, FnSink, SinkWriter};

/// Line-oriented logger over a function-pointer sink.
pub struct SinkLogger {
    sink: FnSink,
    level: LevelFilter,
}

impl SinkLogger {
    /// Create a logger emitting records up to `level`.
    #[must_use]
    pub const fn new(sink: FnSink, level: LevelFilter) -> Self {
        Self { sink, level }
    }

    /// Most verbose level this logger emits.
    #[must_use]
    pub const fn level(&self) -> LevelFilter {
        self.level
    }
}

impl Log for SinkLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut sink = self.sink;
        // The sink cannot fail; a formatting error only truncates the line
        let _ = write!(
            SinkWriter::new(&mut sink),
            "[{level} {target}] {message}\r\n",
            level = record.level(),
            target = record.target(),
            message = record.args(),
        );
    }

    fn flush(&self) {
        let mut sink = self.sink;
        sink.flush();
    }
}

/// Install `logger` as the global logger.
///
/// Fails if a logger is already installed.
pub fn init(logger: &'static SinkLogger) -> Result<(), SetLoggerError> {
    log::set_logger(logger)?;
    log::set_max_level(logger.level);
    Ok(())
}
