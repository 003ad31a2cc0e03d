// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! RAM usage report.


use lifeline_abi::layout::KB;

use crate::exc_printf;
use crate::platform::MemoryStats;
use crate::sink::CharSink;

/// Print RAM1 and RAM2 usage in kilobytes, then flush.
///
/// ```text
/// RAM1 size: 512 KB, free RAM1: 100 KB, data used: 20 KB, bss used: 30 KB, used heap: 12 KB, system free: 350 KB
/// RAM2 size: 512 KB, free RAM2: 500 KB, used RAM2: 12 KB
/// ```
pub fn print_ram_usage<M, S>(stats: &M, sink: &mut S)
where
    M: MemoryStats + ?Sized,
    S: CharSink + ?Sized,
{
    let ram1 = stats.ram1_usage();
    let ram2 = stats.ram2_usage();

    exc_printf!(
        &mut *sink,
        "RAM1 size: %u KB, free RAM1: %u KB, data used: %u KB, bss used: %u KB, used heap: %u KB, system free: %u KB\r\n",
        ram1.size / KB,
        ram1.free / KB,
        ram1.data_used / KB,
        ram1.bss_used / KB,
        ram1.heap_used / KB,
        ram1.system_free / KB
    );
    exc_printf!(
        &mut *sink,
        "RAM2 size: %u KB, free RAM2: %u KB, used RAM2: %u KB\r\n",
        ram2.size / KB,
        ram2.free / KB,
        ram2.used() / KB
    );
    exc_printf!(&mut *sink, "\r\n");
    sink.flush();
}
