//! Character-by-character reveal of bot replies.
//!
//! A reply is shown one step at a time. A step normally adds one character;
//! when the next character is `<` the step adds four at once, so a `<br>`
//! line break is never shown half-written.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

/// Characters taken in a single step when a `<` is reached.
pub const TAG_STRIDE: usize = 4;

/// Replace newlines with `<br>` the way bot replies are stored.
pub fn to_markup(text: &str) -> String {
    text.replace('\n', "<br>")
}

/// Inverse of [`to_markup`] for plain-text output.
pub fn from_markup(markup: &str) -> String {
    markup.replace("<br>", "\n")
}

/// Iterator over the chunks appended at each reveal step.
///
/// Concatenating every chunk yields the original text.
#[derive(Debug, Clone)]
pub struct Reveal<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Reveal<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl<'a> Iterator for Reveal<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = &self.text[self.pos..];
        let first = rest.chars().next()?;
        let stride = if first == '<' { TAG_STRIDE } else { 1 };
        let len = rest
            .char_indices()
            .nth(stride)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        self.pos += len;
        Some(&rest[..len])
    }
}

/// Print `markup` to `out` step by step, pausing `interval` between steps.
///
/// `<br>` chunks are written as newlines.
pub fn type_out<W: Write>(out: &mut W, markup: &str, interval: Duration) -> io::Result<()> {
    for chunk in Reveal::new(markup) {
        if chunk == "<br>" {
            writeln!(out)?;
        } else {
            write!(out, "{chunk}")?;
        }
        out.flush()?;
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
