// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Core type definitions for addresses and task handles.
//!
//! These newtypes prevent accidentally mixing raw words at compile time.

mod addr;
mod task;


pub use addr::Addr;
pub use task::TaskHandle;
