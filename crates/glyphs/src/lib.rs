//! # Glyph Extraction
//!
//! Walks the font bitmap in cell-grid order, pairs every non-empty cell
//! positionally with the next non-whitespace code point of the legend text,
//! and materializes a 1-bit-as-32-bit bitmap per glyph.
//!
//! The pairing is the whole contract: the ordered sequence of non-empty
//! cells (row-major scan) must have exactly the same length as the ordered
//! sequence of non-whitespace legend code points. There is no explicit
//! code-point-to-cell lookup.

#![forbid(unsafe_code)]

use std::io::{self, Write};

use arena::{Arena, ByteRange};
use common::GlyphError;
use encoding::{CharIter, decode_char, is_space};
use image_decode::Image;

/// Fixed cell dimensions of the font grid.
pub const CELL_WIDTH: u32 = 8;
pub const CELL_HEIGHT: u32 = 8;

/// Bitmap pixel values: fully-opaque black for ink, fully transparent for
/// background.
const INK: u32 = 0xff00_0000;
const BACKGROUND: u32 = 0x0000_0000;

// ─────────────────────────────────────────────────────────────────────────────
// Glyph
// ─────────────────────────────────────────────────────────────────────────────

/// One extracted glyph. `text` and `bitmap` are arena allocations; a glyph
/// is immutable once extracted and lives until the arena is torn down.
#[derive(Clone, Copy, Debug)]
pub struct Glyph {
    pub char_code: u32,
    /// Raw UTF-8 bytes of the code point plus a NUL terminator.
    text: ByteRange,
    /// 8×8 little-endian `u32` values, row-major: [`INK`] or [`BACKGROUND`].
    bitmap: ByteRange,
}

impl Glyph {
    /// The display string for this glyph.
    pub fn text<'a>(&self, arena: &'a Arena) -> &'a str {
        let bytes = arena.get(self.text);
        // Validated before extraction; the terminator is stripped.
        std::str::from_utf8(&bytes[..bytes.len() - 1]).unwrap_or("\u{fffd}")
    }

    /// The bitmap value at (x, y) within the cell.
    pub fn pixel(&self, arena: &Arena, x: u32, y: u32) -> u32 {
        let at = ((y * CELL_WIDTH + x) * 4) as usize;
        let bytes = arena.get(self.bitmap);
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    /// True if the bitmap has ink at (x, y).
    pub fn is_ink(&self, arena: &Arena, x: u32, y: u32) -> bool {
        (self.pixel(arena, x, y) >> 24) & 0xff != 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Legend stream
// ─────────────────────────────────────────────────────────────────────────────

/// Count the non-whitespace code points of a validated legend span.
pub fn count_chars(legend: &[u8]) -> usize {
    CharIter::new(legend).filter(|&(code, _)| !is_space(code)).count()
}

/// Cursor over the legend's code points, addressed by arena range so the
/// extractor can allocate from the arena between pulls.
struct LegendCursor {
    range: ByteRange,
    pos: usize,
}

impl LegendCursor {
    fn new(range: ByteRange) -> Self {
        Self { range, pos: 0 }
    }

    /// Pull the next non-whitespace code point and the range of its raw
    /// encoded bytes, skipping whitespace lazily one code point at a time.
    fn next_glyph_char(&mut self, arena: &Arena) -> Option<(u32, ByteRange)> {
        let legend = arena.get(self.range);
        while self.pos < legend.len() {
            let (code, size) = decode_char(&legend[self.pos..]);
            let raw = ByteRange { offset: self.range.offset + self.pos, len: size };
            self.pos += size;
            if !is_space(code) {
                return Some((code, raw));
            }
        }
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cell scanning
// ─────────────────────────────────────────────────────────────────────────────

/// A pixel is ink when its first channel byte is zero (color-key
/// convention), so a cell is non-empty when any pixel in it has a zero
/// first channel. Short-circuits on the first hit.
fn cell_has_ink(image: &Image, cell_x: u32, cell_y: u32) -> bool {
    for y in cell_y..cell_y + CELL_HEIGHT {
        for x in cell_x..cell_x + CELL_WIDTH {
            if image.pixel(x, y)[0] == 0x00 {
                return true;
            }
        }
    }
    false
}

/// Re-derive the cell's 8×8 bitmap from the raw pixels with the same color
/// key used by [`cell_has_ink`].
fn expand_cell(image: &Image, cell_x: u32, cell_y: u32, arena: &mut Arena) -> ByteRange {
    let range = arena.alloc((CELL_WIDTH * CELL_HEIGHT) as usize * 4, 4);

    for y in 0..CELL_HEIGHT {
        for x in 0..CELL_WIDTH {
            let value = if image.pixel(cell_x + x, cell_y + y)[0] == 0x00 {
                INK
            } else {
                BACKGROUND
            };
            let at = ((y * CELL_WIDTH + x) * 4) as usize;
            arena.get_mut(range)[at..at + 4].copy_from_slice(&value.to_le_bytes());
        }
    }

    range
}

// ─────────────────────────────────────────────────────────────────────────────
// Extraction
// ─────────────────────────────────────────────────────────────────────────────

/// Extract the glyph table from a font bitmap and its legend.
///
/// `legend` is an arena range holding validated UTF-8. Glyph order is
/// strictly the bitmap's cell-scan order (row-major, top-to-bottom,
/// left-to-right). Fails if the non-empty cell count and the
/// non-whitespace code point count differ in either direction.
pub fn extract(
    image: &Image,
    legend: ByteRange,
    arena: &mut Arena,
) -> Result<Vec<Glyph>, GlyphError> {
    if image.width % CELL_WIDTH != 0 || image.height % CELL_HEIGHT != 0 {
        return Err(GlyphError::BadGrid { width: image.width, height: image.height });
    }

    let expected = count_chars(arena.get(legend));
    let mut glyphs = Vec::with_capacity(expected);
    let mut chars = LegendCursor::new(legend);

    for cell_y in (0..image.height).step_by(CELL_HEIGHT as usize) {
        for cell_x in (0..image.width).step_by(CELL_WIDTH as usize) {
            if !cell_has_ink(image, cell_x, cell_y) {
                continue;
            }
            if glyphs.len() == expected {
                return Err(GlyphError::MoreGlyphsThanChars);
            }

            // Cannot run dry: at most `expected` pulls ever happen.
            let (char_code, raw) = chars
                .next_glyph_char(arena)
                .ok_or(GlyphError::MoreGlyphsThanChars)?;

            let text = arena.alloc(raw.len + 1, 1);
            arena.copy_within(raw, text);
            arena.get_mut(text)[raw.len] = 0;

            let bitmap = expand_cell(image, cell_x, cell_y, arena);
            glyphs.push(Glyph { char_code, text, bitmap });
        }
    }

    // Leftover legend characters are only detectable after the full scan;
    // nothing bounds how many remain until the grid is exhausted.
    if glyphs.len() != expected {
        return Err(GlyphError::MoreCharsThanGlyphs);
    }

    Ok(glyphs)
}

// ─────────────────────────────────────────────────────────────────────────────
// Dump
// ─────────────────────────────────────────────────────────────────────────────

/// Write the human-readable glyph table: display string, code point, and an
/// 8×8 ASCII-art rendering (`@` for ink, space for background). Read-only
/// traversal.
pub fn dump<W: Write>(glyphs: &[Glyph], arena: &Arena, out: &mut W) -> io::Result<()> {
    for glyph in glyphs {
        writeln!(out, "'{}' (U+{:x})", glyph.text(arena), glyph.char_code)?;
        for y in 0..CELL_HEIGHT {
            for x in 0..CELL_WIDTH {
                write!(out, "{} ", if glyph.is_ink(arena, x, y) { '@' } else { ' ' })?;
            }
            writeln!(out)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// [`dump`] to standard output.
pub fn print(glyphs: &[Glyph], arena: &Arena) -> io::Result<()> {
    dump(glyphs, arena, &mut io::stdout().lock())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
