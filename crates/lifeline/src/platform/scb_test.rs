// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Tests for SCB/NVIC register arithmetic.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::scb::{
    IRQ_USB1, SYSCALL_MASK_PRIORITY, USB1_FAULT_PRIORITY, aircr_with_priority_grouping,
    nvic_ipr_address, nvic_priority,
};

#[test]
fn aircr_sets_key_and_group() {
    assert_eq!(aircr_with_priority_grouping(0, 0), 0x05FA_0000);
    assert_eq!(aircr_with_priority_grouping(0, 3), 0x05FA_0300);
    assert_eq!(aircr_with_priority_grouping(0, 7), 0x05FA_0700);
}

#[test]
fn aircr_replaces_read_back_key_and_group() {
    // Reads return VECTKEYSTAT 0xFA05 in the key field
    let current = 0xFA05_0500;
    assert_eq!(aircr_with_priority_grouping(current, 2), 0x05FA_0200);
}

#[test]
fn aircr_preserves_other_bits() {
    // ENDIANNESS (bit 15) and SYSRESETREQ-style low bits survive
    let current = 0xFA05_8004;
    assert_eq!(aircr_with_priority_grouping(current, 1), 0x05FA_8104);
}

#[test]
fn aircr_uses_only_three_group_bits() {
    assert_eq!(
        aircr_with_priority_grouping(0, 0xF),
        aircr_with_priority_grouping(0, 7)
    );
    assert_eq!(
        aircr_with_priority_grouping(0, 8),
        aircr_with_priority_grouping(0, 0)
    );
}

#[test]
fn nvic_priority_shifts_into_implemented_bits() {
    assert_eq!(nvic_priority(1, 4), 0x10);
    assert_eq!(nvic_priority(15, 4), 0xF0);
    assert_eq!(nvic_priority(1, 3), 0x20);
    assert_eq!(nvic_priority(0x42, 8), 0x42);
}

#[test]
fn usb1_outranks_the_syscall_mask() {
    assert_eq!(SYSCALL_MASK_PRIORITY, 0x20);
    assert_eq!(USB1_FAULT_PRIORITY, 0x10);
    // Lower value means higher priority; BASEPRI only masks values >= itself
    assert!(USB1_FAULT_PRIORITY < SYSCALL_MASK_PRIORITY);
}

#[test]
fn usb1_priority_register() {
    assert_eq!(nvic_ipr_address(0), 0xE000_E400);
    assert_eq!(nvic_ipr_address(IRQ_USB1), 0xE000_E471);
}
