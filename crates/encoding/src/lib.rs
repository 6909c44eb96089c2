//! # UTF-8 Decoding
//!
//! Strict whole-span validation plus a table-driven decoder.
//! Zero external dependencies.
//!
//! Validation and decoding are deliberately split: [`validate`] checks a
//! span once, then [`decode_char`] and [`CharIter`] decode it repeatedly
//! without re-checking. Decoding unvalidated input is a precondition
//! violation caught by a debug assertion only.

#![forbid(unsafe_code)]

// ─────────────────────────────────────────────────────────────────────────────
// Leading-byte table
// ─────────────────────────────────────────────────────────────────────────────

// 1 byte:  0x00 .. 0x7f
//
// (0xc0 and 0xc1 as leaders would be overlong 1-byte codes, so they are
// invalid, as is everything from 0x80 to 0xbf — those are continuations.)
// 2 bytes: 0xc2 .. 0xdf
//
// 3 bytes: 0xe0 .. 0xef
//
// (Codes greater than 0x10ffff are invalid, so leaders stop at 0xf4.)
// 4 bytes: 0xf0 .. 0xf4
pub const CHAR_SIZE: [u8; 256] = [
    // 0  1  2  3  4  5  6  7  8  9  A  B  C  D  E  F
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 0
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 1
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 2
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 3
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 4
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 5
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 6
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 7
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 8
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 9
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // A
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // B
    0, 0, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, // C
    2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, // D
    3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, // E
    4, 4, 4, 4, 4, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // F
];

/// Encoded length declared by a leading byte, or 0 for an invalid leader.
#[inline]
pub fn char_size(leader: u8) -> usize {
    CHAR_SIZE[leader as usize] as usize
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoding
// ─────────────────────────────────────────────────────────────────────────────

/// Decode one code point from the front of `bytes`, returning the code
/// point and the number of bytes consumed.
///
/// Precondition: `bytes` is a non-empty suffix of a span that passed
/// [`validate`]. This is only debug-asserted; on unvalidated input the
/// result is garbage (but never out-of-bounds).
#[inline]
pub fn decode_char(bytes: &[u8]) -> (u32, usize) {
    let size = char_size(bytes[0]);
    debug_assert!(
        size > 0 && size <= bytes.len(),
        "decode_char called on unvalidated UTF-8"
    );

    match size {
        2 => (
            ((bytes[0] & 0x1f) as u32) << 6 | (bytes[1] & 0x3f) as u32,
            2,
        ),
        3 => (
            ((bytes[0] & 0x0f) as u32) << 12
                | ((bytes[1] & 0x3f) as u32) << 6
                | (bytes[2] & 0x3f) as u32,
            3,
        ),
        4 => (
            ((bytes[0] & 0x07) as u32) << 18
                | ((bytes[1] & 0x3f) as u32) << 12
                | ((bytes[2] & 0x3f) as u32) << 6
                | (bytes[3] & 0x3f) as u32,
            4,
        ),
        _ => (bytes[0] as u32, 1),
    }
}

/// Iterator over the code points of a validated span, yielding each code
/// point together with the raw bytes that encoded it.
///
/// The iterator advances its own cursor; the caller's slice is unaffected.
pub struct CharIter<'a> {
    rest: &'a [u8],
}

impl<'a> CharIter<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { rest: bytes }
    }

    /// The undecoded remainder.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.rest
    }
}

impl<'a> Iterator for CharIter<'a> {
    type Item = (u32, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        let (code, size) = decode_char(self.rest);
        let (raw, rest) = self.rest.split_at(size);
        self.rest = rest;
        Some((code, raw))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────────────────────────────────────

/// Strictly validate a whole span as UTF-8.
///
/// Rejects invalid leaders (which covers continuation bytes and overlong
/// 1/2-byte forms structurally), truncated sequences, 3-byte sequences that
/// decode outside `[0x0800, 0xFFFF]` or into the UTF-16 surrogate range,
/// and 4-byte sequences that decode outside `[0x10000, 0x10FFFF]`.
pub fn validate(bytes: &[u8]) -> bool {
    let mut rest = bytes;
    while let Some(&leader) = rest.first() {
        let size = char_size(leader);
        if size == 0 || rest.len() < size {
            return false;
        }

        let (code, consumed) = decode_char(rest);
        rest = &rest[consumed..];

        if size == 3 {
            if !(0x0800..=0xffff).contains(&code) {
                return false;
            }
            // Reserved for UTF-16 surrogate pairs.
            if (0xd800..=0xdfff).contains(&code) {
                return false;
            }
        }
        if size == 4 && !(0x1_0000..=0x10_ffff).contains(&code) {
            return false;
        }
    }
    true
}

// ─────────────────────────────────────────────────────────────────────────────
// Whitespace
// ─────────────────────────────────────────────────────────────────────────────

/// Whitespace for legend purposes: exactly these five code points.
#[inline]
pub fn is_space(code: u32) -> bool {
    matches!(
        code,
        0x0020 // space
        | 0x0009 // character tabulation
        | 0x000a // line feed
        | 0x000c // form feed
        | 0x000d // carriage return
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
