// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Tobias Sarnowski

//! Allocation-free `printf`-style formatter.
//!
//! This is the only formatting used on fault paths. It needs no heap, no
//! locks and no `core::fmt` machinery, so it works with interrupts disabled,
//! with the scheduler suspended, and before the scheduler ever ran. Callers
//! that need exclusive access to the sink must arrange it themselves.
//!
//! Supported conversions:
//!
//! | Template | Output |
//! |----------|--------|
//! | `%d` | signed decimal |
//! | `%u` | unsigned decimal |
//! | `%x`, `%X` | exactly 8 upper-case hex digits |
//! | `%s` | string, up to an embedded NUL |
//! | `%c` | one byte |
//! | `%%` | `%` |
//!
//! A `-` flag, a field width and an `l` length modifier are accepted and
//! ignored, so `%04x` and `%lu` work. Any other conversion character is
//! swallowed without consuming an argument. A trailing `%`, a NUL byte in the
//! template, or running out of arguments ends the output early.
//!
//! Arguments are passed as typed [`Arg`] values. The [`exc_printf!`] macro
//! builds them with `From` and rejects, at compile time, a literal template
//! whose conversion count does not match the number of arguments.


use crate::sink::CharSink;

/// Length of the stack buffer used for decimal conversion.
///
/// Holds `u32::MAX` (10 digits) with room to spare.
pub const DECIMAL_BUF_LEN: usize = 12;

/// Number of digits emitted by a hex conversion.
pub const HEX_DIGITS: u32 = 8;

const DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// One formatter argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg<'a> {
    /// Signed integer (`int`).
    Int(i32),
    /// Unsigned integer or address (`unsigned int`).
    Uint(u32),
    /// String, read up to the first NUL byte.
    Str(&'a [u8]),
    /// Single byte.
    Char(u8),
}

impl Arg<'_> {
    /// The argument as a 32-bit machine word, `None` for strings.
    ///
    /// Signed values keep their two's complement bit pattern, the same
    /// reinterpretation a C variadic call performs.
    #[inline]
    #[must_use]
    pub const fn word(&self) -> Option<u32> {
        match *self {
            Self::Int(value) => Some(u32::from_ne_bytes(value.to_ne_bytes())),
            Self::Uint(value) => Some(value),
            Self::Char(value) => Some(value as u32),
            Self::Str(_) => None,
        }
    }
}

impl From<i32> for Arg<'_> {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Arg<'_> {
    fn from(value: u32) -> Self {
        Self::Uint(value)
    }
}

impl From<u16> for Arg<'_> {
    fn from(value: u16) -> Self {
        Self::Uint(u32::from(value))
    }
}

impl From<isize> for Arg<'_> {
    /// Truncates to 32 bits. Target pointers are 32 bits wide.
    fn from(value: isize) -> Self {
        Self::Int(value as i32)
    }
}

impl From<usize> for Arg<'_> {
    /// Truncates to 32 bits. Target pointers are 32 bits wide.
    fn from(value: usize) -> Self {
        Self::Uint(value as u32)
    }
}

impl From<char> for Arg<'_> {
    /// Non-ASCII characters are replaced by `?`.
    fn from(value: char) -> Self {
        if value.is_ascii() {
            Self::Char(value as u8)
        } else {
            Self::Char(b'?')
        }
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Self::Str(value.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for Arg<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self::Str(value)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Arg<'a> {
    fn from(value: &'a [u8; N]) -> Self {
        Self::Str(value)
    }
}

/// A parsed conversion specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// `%d`
    Signed,
    /// `%u`
    Unsigned,
    /// `%x` / `%X`
    Hex,
    /// `%s`
    Str,
    /// `%c`
    Char,
    /// `%%`
    Percent,
    /// Unknown conversion character, swallowed.
    Ignored,
}

impl Conversion {
    /// Check whether this conversion takes an argument.
    #[inline]
    #[must_use]
    pub const fn consumes_argument(self) -> bool {
        !matches!(self, Self::Percent | Self::Ignored)
    }
}

/// Parse the specifier following a `%` at `bytes[pos - 1]`.
///
/// Returns the conversion and the index just past it, or `None` when the
/// template ends (or hits NUL) before a conversion character.
#[must_use]
pub const fn parse_conversion(bytes: &[u8], mut pos: usize) -> Option<(Conversion, usize)> {
    if pos < bytes.len() && bytes[pos] == b'%' {
        return Some((Conversion::Percent, pos + 1));
    }
    if pos < bytes.len() && bytes[pos] == b'-' {
        pos += 1;
    }
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos < bytes.len() && bytes[pos] == b'l' {
        pos += 1;
    }
    if pos >= bytes.len() || bytes[pos] == 0 {
        return None;
    }
    let conversion = match bytes[pos] {
        b'd' => Conversion::Signed,
        b'u' => Conversion::Unsigned,
        b'x' | b'X' => Conversion::Hex,
        b's' => Conversion::Str,
        b'c' => Conversion::Char,
        _ => Conversion::Ignored,
    };
    Some((conversion, pos + 1))
}

/// Number of arguments a template consumes.
///
/// Evaluated at compile time by [`exc_printf!`].
#[must_use]
pub const fn argument_count(template: &str) -> usize {
    let bytes = template.as_bytes();
    let mut count = 0;
    let mut pos = 0;
    while pos < bytes.len() && bytes[pos] != 0 {
        if bytes[pos] != b'%' {
            pos += 1;
            continue;
        }
        match parse_conversion(bytes, pos + 1) {
            Some((conversion, next)) => {
                if conversion.consumes_argument() {
                    count += 1;
                }
                pos = next;
            }
            None => break,
        }
    }
    count
}

/// Format `template` with `args` into `sink`.
///
/// Never fails: degenerate input ends the output early instead.
pub fn format<S: CharSink + ?Sized>(sink: &mut S, template: &str, args: &[Arg<'_>]) {
    let bytes = template.as_bytes();
    let mut args = args.iter();
    let mut pos = 0;

    while let Some(&byte) = bytes.get(pos) {
        if byte == 0 {
            return;
        }
        if byte != b'%' {
            sink.put(byte);
            pos += 1;
            continue;
        }

        let Some((conversion, next)) = parse_conversion(bytes, pos + 1) else {
            // Trailing '%' with no conversion character
            return;
        };
        pos = next;

        match conversion {
            Conversion::Percent => sink.put(b'%'),
            Conversion::Ignored => {}
            _ => {
                let Some(arg) = args.next() else {
                    return;
                };
                put_arg(sink, conversion, arg);
            }
        }
    }
}

/// Render one argument according to its conversion.
fn put_arg<S: CharSink + ?Sized>(sink: &mut S, conversion: Conversion, arg: &Arg<'_>) {
    if let Arg::Str(text) = *arg {
        if conversion == Conversion::Str {
            put_str(sink, text);
        }
        return;
    }
    let Some(word) = arg.word() else {
        return;
    };
    match conversion {
        Conversion::Signed => put_int(sink, i32::from_ne_bytes(word.to_ne_bytes())),
        Conversion::Unsigned => put_uint(sink, word),
        Conversion::Hex => put_hex(sink, word),
        Conversion::Char => put_char(sink, word.to_le_bytes()[0]),
        Conversion::Str | Conversion::Percent | Conversion::Ignored => {}
    }
}

/// Emit an unsigned decimal number.
pub fn put_uint<S: CharSink + ?Sized>(sink: &mut S, mut num: u32) {
    let mut buf = [0u8; DECIMAL_BUF_LEN];
    let mut pos = buf.len();
    loop {
        pos -= 1;
        buf[pos] = DIGITS[(num % 10) as usize];
        num /= 10;
        if num == 0 {
            break;
        }
    }
    for &digit in &buf[pos..] {
        sink.put(digit);
    }
}

/// Emit a signed decimal number.
pub fn put_int<S: CharSink + ?Sized>(sink: &mut S, num: i32) {
    if num < 0 {
        sink.put(b'-');
    }
    put_uint(sink, num.unsigned_abs());
}

/// Emit exactly eight upper-case hex digits.
pub fn put_hex<S: CharSink + ?Sized>(sink: &mut S, num: u32) {
    for nibble in (0..HEX_DIGITS).rev() {
        sink.put(DIGITS[((num >> (nibble * 4)) & 0xF) as usize]);
    }
}

/// Emit a string up to its first NUL byte.
pub fn put_str<S: CharSink + ?Sized>(sink: &mut S, text: &[u8]) {
    for &byte in text.iter().take_while(|&&byte| byte != 0) {
        sink.put(byte);
    }
}

/// Emit a single byte.
pub fn put_char<S: CharSink + ?Sized>(sink: &mut S, byte: u8) {
    sink.put(byte);
}

/// Format into a [`CharSink`] with typed arguments.
///
/// ```
/// use lifeline::exc_printf;
/// use lifeline::sink::MockSink;
///
/// let mut sink = MockSink::new();
/// exc_printf!(&mut sink, "%s:%d 0x%x", "main.rs", 42, 0x1A_u32);
/// assert_eq!(sink.output(), b"main.rs:42 0x0000001A");
/// ```
///
/// The template must be a string literal; a mismatched argument count is a
/// compile error.
#[macro_export]
macro_rules! exc_printf {
    ($sink:expr, $template:literal $(, $arg:expr)* $(,)?) => {{
        const _: () = ::core::assert!(
            $crate::fmt::argument_count($template) == <[&str]>::len(&[$(::core::stringify!($arg)),*]),
            "argument count does not match the format template"
        );
        $crate::fmt::format($sink, $template, &[$($crate::fmt::Arg::from($arg)),*]);
    }};
}
