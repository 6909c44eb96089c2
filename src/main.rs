//! glyphgrid — rips 8×8 glyph bitmaps out of a font strip image and pairs
//! them with the characters listed in a legend text file, then dumps the
//! resulting table to stdout.
//!
//! Exit code 0 on success, 1 on any failure. No flags, no configuration:
//! the two resource paths are fixed.

use std::fs::File;
use std::io::Read;
use std::process::ExitCode;

use arena::{Arena, ArenaBuf};
use common::GlyphError;
use tracing::error;

/// Fixed upfront memory budget for the whole run.
const ARENA_CAPACITY: usize = 64 * 1024 * 1024;

const LEGEND_PATH: &str = "res/font8x8.txt";
const BITMAP_PATH: &str = "res/font8x8.png";

/// Read a whole file into an arena-backed buffer.
fn read_file_to_buf(path: &str, buf: &mut ArenaBuf, arena: &mut Arena) -> std::io::Result<()> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len() as usize;
    buf.reserve(arena, size);
    file.read_exact(&mut buf.spare_capacity_mut(arena)[..size])?;
    buf.advance(size);
    Ok(())
}

fn run() -> Result<(), GlyphError> {
    let mut arena = Arena::with_capacity(ARENA_CAPACITY);

    // Legend text: read, then validate once so every later decode can be
    // unchecked.
    let mut legend = ArenaBuf::new();
    read_file_to_buf(LEGEND_PATH, &mut legend, &mut arena)
        .map_err(|source| GlyphError::File { path: LEGEND_PATH.into(), source })?;
    if !encoding::validate(legend.as_slice(&arena)) {
        return Err(GlyphError::InvalidUtf8);
    }

    // Font bitmap.
    let mut raw_image = ArenaBuf::new();
    read_file_to_buf(BITMAP_PATH, &mut raw_image, &mut arena)
        .map_err(|source| GlyphError::File { path: BITMAP_PATH.into(), source })?;
    let image = image_decode::png::decode(raw_image.as_slice(&arena))?;

    let table = glyphs::extract(&image, legend.filled(), &mut arena)?;
    glyphs::print(&table, &arena)?;

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_target(false).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn read_file_fills_arena_buf() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"ABC\n").unwrap();

        let mut arena = Arena::with_capacity(4096);
        let mut buf = ArenaBuf::new();
        let path = file.path().to_str().unwrap();
        read_file_to_buf(path, &mut buf, &mut arena).unwrap();
        assert_eq!(buf.as_slice(&arena), b"ABC\n");
    }

    #[test]
    fn read_file_appends_to_existing_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"tail").unwrap();

        let mut arena = Arena::with_capacity(4096);
        let mut buf = ArenaBuf::new();
        buf.extend_from_slice(&mut arena, b"head ");
        let path = file.path().to_str().unwrap();
        read_file_to_buf(path, &mut buf, &mut arena).unwrap();
        assert_eq!(buf.as_slice(&arena), b"head tail");
    }

    #[test]
    fn read_missing_file_is_an_error() {
        let mut arena = Arena::with_capacity(4096);
        let mut buf = ArenaBuf::new();
        assert!(read_file_to_buf("res/does-not-exist.txt", &mut buf, &mut arena).is_err());
    }
}
