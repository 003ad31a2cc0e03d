// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Cortex-M System Control Block and NVIC register arithmetic.
//!
//! Pure bit manipulation, so it is host-testable. The target glue performs
//! the actual volatile accesses.

/// Address of the Application Interrupt and Reset Control Register.
pub const SCB_AIRCR: usize = 0xE000_ED0C;

/// Base address of the NVIC interrupt priority registers (one byte per IRQ).
pub const NVIC_IPR_BASE: usize = 0xE000_E400;

/// AIRCR VECTKEY field position.
const AIRCR_VECTKEY_POS: u32 = 16;

/// AIRCR VECTKEY field mask.
const AIRCR_VECTKEY_MASK: u32 = 0xFFFF << AIRCR_VECTKEY_POS;

/// AIRCR PRIGROUP field position.
const AIRCR_PRIGROUP_POS: u32 = 8;

/// AIRCR PRIGROUP field mask.
const AIRCR_PRIGROUP_MASK: u32 = 7 << AIRCR_PRIGROUP_POS;

/// Key that must accompany every AIRCR write.
const AIRCR_WRITE_KEY: u32 = 0x05FA;

/// AIRCR value that sets the priority grouping.
///
/// Keeps the other bits of `current`, replaces VECTKEY with the write key and
/// PRIGROUP with `group`. Only `group & 7` is used.
#[must_use]
pub const fn aircr_with_priority_grouping(current: u32, group: u32) -> u32 {
    let group = group & 0x7;
    let cleared = current & !(AIRCR_VECTKEY_MASK | AIRCR_PRIGROUP_MASK);
    cleared | (AIRCR_WRITE_KEY << AIRCR_VECTKEY_POS) | (group << AIRCR_PRIGROUP_POS)
}

/// NVIC priority byte for a logical priority level.
///
/// Only the top `prio_bits` bits of the byte are implemented by the
/// hardware, so the level is shifted into them.
#[must_use]
pub const fn nvic_priority(level: u8, prio_bits: u32) -> u8 {
    if prio_bits >= 8 {
        level
    } else {
        level << (8 - prio_bits)
    }
}

/// Priority bits implemented by the NVIC of the supported MCUs.
pub const NVIC_PRIO_BITS: u32 = 4;

/// Highest logical priority from which interrupts may call the scheduler
/// (`configLIBRARY_MAX_SYSCALL_INTERRUPT_PRIORITY`).
pub const MAX_SYSCALL_PRIORITY_LEVEL: u8 = 2;

/// USB1 interrupt number on the i.MX RT1062 (Teensy 4.x).
pub const IRQ_USB1: usize = 113;

/// Priority byte given to USB1 while a fault is reported.
///
/// One level above the syscall threshold, so USB serial keeps draining with
/// scheduler interrupts masked.
pub const USB1_FAULT_PRIORITY: u8 = nvic_priority(MAX_SYSCALL_PRIORITY_LEVEL - 1, NVIC_PRIO_BITS);

/// BASEPRI value that masks every interrupt the scheduler manages.
pub const SYSCALL_MASK_PRIORITY: u8 = nvic_priority(MAX_SYSCALL_PRIORITY_LEVEL, NVIC_PRIO_BITS);

/// Address of the priority byte of `irq`.
#[must_use]
pub const fn nvic_ipr_address(irq: usize) -> usize {
    NVIC_IPR_BASE + irq
}
