//! # Common Foundation Crate
//!
//! Shared error types and the byte-cursor primitive for the glyphgrid tool.

#![forbid(unsafe_code)]

use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// ParseError
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur when parsing binary data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Tried to read past the end of the buffer.
    #[error("unexpected end of input")]
    UnexpectedEof,
    /// A parsed value is not valid in context.
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
}

// ─────────────────────────────────────────────────────────────────────────────
// GlyphError — top-level error type
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level error type that every subsystem maps into.
///
/// Every variant ends the run; nothing is retried or downgraded.
#[derive(Error, Debug)]
pub enum GlyphError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read {path}: {source}")]
    File {
        path: String,
        source: std::io::Error,
    },

    /// The legend file is not valid UTF-8.
    #[error("legend text is not valid UTF-8")]
    InvalidUtf8,

    /// Bitmap dimensions are not exact multiples of the cell dimensions.
    #[error("bitmap dimensions {width}x{height} are not divisible by the cell dimensions")]
    BadGrid { width: u32, height: u32 },

    /// The bitmap contains more non-empty cells than the legend has characters.
    #[error("more glyphs in the bitmap than chars in the legend")]
    MoreGlyphsThanChars,

    /// The legend has more characters than the bitmap has non-empty cells.
    #[error("more chars in the legend than glyphs in the bitmap")]
    MoreCharsThanGlyphs,
}

// ─────────────────────────────────────────────────────────────────────────────
// Cursor — zero-copy byte-span reader
// ─────────────────────────────────────────────────────────────────────────────

/// A zero-copy reader over a byte span.
///
/// Consuming through the cursor never disturbs the caller's slice; the
/// cursor only advances its own offset.
pub struct Cursor<'a> {
    buf: &'a [u8],
    off: usize,
}

impl<'a> Cursor<'a> {
    /// Create a new cursor at offset 0.
    #[inline]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, off: 0 }
    }

    /// Current read position (byte offset).
    #[inline]
    pub fn position(&self) -> usize {
        self.off
    }

    /// Number of bytes remaining from the current position.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.off)
    }

    /// Returns `true` if there are no more bytes to read.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Peek at the next byte without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.buf.get(self.off).copied()
    }

    /// Consume and return the next `n` bytes.
    #[inline]
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], ParseError> {
        if self.off + n > self.buf.len() {
            return Err(ParseError::UnexpectedEof);
        }
        let slice = &self.buf[self.off..self.off + n];
        self.off += n;
        Ok(slice)
    }

    /// Consume and return the next 4 bytes as a big-endian `u32`.
    #[inline]
    pub fn take_u32_be(&mut self) -> Result<u32, ParseError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// The unconsumed remainder of the span.
    #[inline]
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.off..]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_take() {
        let mut c = Cursor::new(b"abcdef");
        assert_eq!(c.take(2).unwrap(), b"ab");
        assert_eq!(c.position(), 2);
        assert_eq!(c.remaining(), 4);
        assert_eq!(c.rest(), b"cdef");
    }

    #[test]
    fn cursor_take_past_end() {
        let mut c = Cursor::new(b"ab");
        assert_eq!(c.take(3), Err(ParseError::UnexpectedEof));
        // A failed take consumes nothing.
        assert_eq!(c.take(2).unwrap(), b"ab");
        assert!(c.is_empty());
    }

    #[test]
    fn cursor_peek() {
        let mut c = Cursor::new(&[0x42]);
        assert_eq!(c.peek(), Some(0x42));
        assert_eq!(c.peek(), Some(0x42));
        c.take(1).unwrap();
        assert_eq!(c.peek(), None);
    }

    #[test]
    fn cursor_u32_be() {
        let mut c = Cursor::new(&[0x00, 0x00, 0x01, 0x02, 0xff]);
        assert_eq!(c.take_u32_be().unwrap(), 0x0102);
        assert_eq!(c.remaining(), 1);
    }

    #[test]
    fn mismatch_errors_name_the_direction() {
        assert_eq!(
            GlyphError::MoreGlyphsThanChars.to_string(),
            "more glyphs in the bitmap than chars in the legend"
        );
        assert_eq!(
            GlyphError::MoreCharsThanGlyphs.to_string(),
            "more chars in the legend than glyphs in the bitmap"
        );
    }
}
