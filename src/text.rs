//! Fixed-capacity text used for everything that ends up on air or on screen.
//!
//! All writers here truncate instead of failing: once a buffer is full,
//! further characters are silently dropped.

use std::fmt::{self, Write};

use heapless::String;

/// Longest on-air message text, in characters.
pub const MAX_MSG_LEN: usize = 21;
/// Longest display line (log rows, status label), in characters.
pub const MAX_LINE_LEN: usize = 21;
/// Longest callsign, including portable suffixes.
pub const CALLSIGN_LEN: usize = 13;
/// Longest Maidenhead locator (6-character subsquare).
pub const LOCATOR_LEN: usize = 6;

/// Rendered transmit text.
pub type MessageText = String<MAX_MSG_LEN>;
/// Rendered display line.
pub type LineText = String<MAX_LINE_LEN>;
/// Callsign storage.
pub type Callsign = String<CALLSIGN_LEN>;
/// Grid locator storage.
pub type Locator = String<LOCATOR_LEN>;

/// `fmt::Write` adapter that drops characters past the buffer capacity.
pub struct Truncating<'a, const N: usize>(pub &'a mut String<N>);

impl<const N: usize> Write for Truncating<'_, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Copies `s` into a bounded string, truncating at capacity.
pub fn bounded<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    let _ = Truncating(&mut out).write_str(s);
    out
}

/// Copies `s` upper-cased and trimmed into a bounded string.
pub fn bounded_upper<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.trim().chars() {
        if out.push(c.to_ascii_uppercase()).is_err() {
            break;
        }
    }
    out
}

/// Formats `args` into a bounded string, truncating at capacity.
pub fn format_bounded<const N: usize>(args: fmt::Arguments<'_>) -> String<N> {
    let mut out = String::new();
    let _ = Truncating(&mut out).write_fmt(args);
    out
}

/// Appends `piece` only if it fits entirely; returns whether it was appended.
pub fn push_whole<const N: usize>(out: &mut String<N>, piece: &str) -> bool {
    out.push_str(piece).is_ok()
}
