// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Build script for Lifeline.
//!
//! Generates `clock.rs` with the core clock the Teensy 3.x cores are built
//! for. Those cores only know it as the `F_CPU` compiler define, so it is
//! taken from the `F_CPU` environment variable of the build.

/// Teensy 3.2 default.
const DEFAULT_F_CPU: u32 = 96_000_000;

fn main() {
    let Ok(out_dir) = std::env::var("OUT_DIR") else {
        eprintln!("error: OUT_DIR not set");
        std::process::exit(1);
    };

    let f_cpu = match std::env::var("F_CPU") {
        Ok(value) => {
            // Accept the Arduino spelling, e.g. 96000000L
            let digits = value.trim().trim_end_matches(['L', 'l', 'U', 'u']);
            let Ok(hz) = digits.parse::<u32>() else {
                eprintln!("error: F_CPU={value} is not a clock frequency in Hz");
                std::process::exit(1);
            };
            hz
        }
        Err(_) => DEFAULT_F_CPU,
    };

    let clock_path = format!("{out_dir}/clock.rs");
    let source = format!(
        "/// Core clock of Teensy 3.x builds (`F_CPU`).\npub const F_CPU: u32 = {f_cpu};\n"
    );
    if let Err(err) = std::fs::write(&clock_path, source) {
        eprintln!("error: failed to write {clock_path}: {err}");
        std::process::exit(1);
    }

    println!("cargo::rerun-if-env-changed=F_CPU");
    println!("cargo::rerun-if-changed=build.rs");
}
