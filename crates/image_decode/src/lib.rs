//! # Image Decode
//!
//! PNG decoder producing a packed pixel buffer in the image's native
//! channel layout (1..4 bytes per pixel).

#![forbid(unsafe_code)]

pub mod deflate;
pub mod png;

// ─────────────────────────────────────────────────────────────────────────────
// Image — decoded pixel buffer
// ─────────────────────────────────────────────────────────────────────────────

/// A decoded image: packed pixels, row-major, `bytes_per_pixel` bytes each.
///
/// Consumers index it by `pixel_index * bytes_per_pixel`; the first byte of
/// a pixel is its first color channel.
#[derive(Clone, Debug)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub bytes_per_pixel: usize,
    /// Length = width × height × bytes_per_pixel.
    pub data: Vec<u8>,
}

impl Image {
    /// The packed pixel at (x, y).
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let idx = (y * self.width + x) as usize * self.bytes_per_pixel;
        &self.data[idx..idx + self.bytes_per_pixel]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_indexing_respects_bpp() {
        let img = Image {
            width: 2,
            height: 2,
            bytes_per_pixel: 3,
            data: vec![
                1, 2, 3, 4, 5, 6, //
                7, 8, 9, 10, 11, 12,
            ],
        };
        assert_eq!(img.pixel(0, 0), &[1, 2, 3]);
        assert_eq!(img.pixel(1, 0), &[4, 5, 6]);
        assert_eq!(img.pixel(0, 1), &[7, 8, 9]);
        assert_eq!(img.pixel(1, 1), &[10, 11, 12]);
    }
}
