//! PNG decoder.
//!
//! Parses PNG chunks (IHDR, PLTE, IDAT, IEND), decompresses IDAT with
//! DEFLATE, applies scanline filter reconstruction, and emits the pixels in
//! the image's native channel layout (grayscale 1 bpp, gray+alpha 2, RGB 3,
//! RGBA 4; palette entries are expanded to RGB).

use crate::Image;
use crate::deflate;
use common::{Cursor, ParseError};

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

// Color types from the PNG spec.
const COLOR_GRAYSCALE: u8 = 0;
const COLOR_RGB: u8 = 2;
const COLOR_INDEXED: u8 = 3;
const COLOR_GRAYSCALE_ALPHA: u8 = 4;
const COLOR_RGBA: u8 = 6;

// ─────────────────────────────────────────────────────────────────────────────
// Header
// ─────────────────────────────────────────────────────────────────────────────

/// Parsed IHDR chunk.
#[derive(Clone, Copy, Debug)]
struct Header {
    width: u32,
    height: u32,
    bit_depth: u8,
    color_type: u8,
    interlace: u8,
}

impl Header {
    fn parse(data: &[u8]) -> Result<Self, ParseError> {
        let mut cur = Cursor::new(data);
        let width = cur.take_u32_be()?;
        let height = cur.take_u32_be()?;
        let rest = cur.take(5)?;
        let (bit_depth, color_type) = (rest[0], rest[1]);
        let (compression, filter_method, interlace) = (rest[2], rest[3], rest[4]);

        if width == 0 || height == 0 {
            return Err(ParseError::InvalidValue("PNG: zero dimension"));
        }
        if compression != 0 {
            return Err(ParseError::InvalidValue("PNG: unknown compression method"));
        }
        if filter_method != 0 {
            return Err(ParseError::InvalidValue("PNG: unknown filter method"));
        }

        Ok(Self { width, height, bit_depth, color_type, interlace })
    }

    /// Packed bytes per pixel in the native channel layout.
    fn bytes_per_pixel(&self) -> Result<usize, ParseError> {
        match self.color_type {
            COLOR_GRAYSCALE | COLOR_INDEXED => Ok(1),
            COLOR_GRAYSCALE_ALPHA => Ok(2),
            COLOR_RGB => Ok(3),
            COLOR_RGBA => Ok(4),
            _ => Err(ParseError::InvalidValue("PNG: unsupported color type")),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Chunk walk
// ─────────────────────────────────────────────────────────────────────────────

struct Chunk<'a> {
    kind: [u8; 4],
    data: &'a [u8],
}

/// Read one chunk: length, type, data, CRC (skipped, not verified).
fn next_chunk<'a>(cur: &mut Cursor<'a>) -> Result<Chunk<'a>, ParseError> {
    let length = cur.take_u32_be()? as usize;
    let kind_bytes = cur.take(4)?;
    let kind = [kind_bytes[0], kind_bytes[1], kind_bytes[2], kind_bytes[3]];
    let data = cur.take(length)?;
    cur.take(4)?; // CRC
    Ok(Chunk { kind, data })
}

// ─────────────────────────────────────────────────────────────────────────────
// Filter reconstruction
// ─────────────────────────────────────────────────────────────────────────────

/// Paeth predictor.
fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let (a, b, c) = (a as i32, b as i32, c as i32);
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();
    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}

/// Undo per-scanline filtering. `raw` holds `filter byte + scanline` per
/// row; the result is the packed pixel rows.
fn unfilter(raw: &[u8], width: u32, height: u32, bpp: usize) -> Result<Vec<u8>, ParseError> {
    let stride = width as usize * bpp;
    if raw.len() < (stride + 1) * height as usize {
        return Err(ParseError::UnexpectedEof);
    }

    let mut out = vec![0u8; stride * height as usize];

    for y in 0..height as usize {
        let filter = raw[y * (stride + 1)];
        let row = &raw[y * (stride + 1) + 1..y * (stride + 1) + 1 + stride];
        let out_row = y * stride;

        for x in 0..stride {
            // a = left, b = above, c = above-left (0 outside the image)
            let a = if x >= bpp { out[out_row + x - bpp] } else { 0 };
            let b = if y > 0 { out[out_row - stride + x] } else { 0 };
            let c = if y > 0 && x >= bpp { out[out_row - stride + x - bpp] } else { 0 };

            out[out_row + x] = match filter {
                0 => row[x],
                1 => row[x].wrapping_add(a),
                2 => row[x].wrapping_add(b),
                3 => row[x].wrapping_add(((a as u16 + b as u16) / 2) as u8),
                4 => row[x].wrapping_add(paeth(a, b, c)),
                _ => return Err(ParseError::InvalidValue("PNG: unknown filter type")),
            };
        }
    }

    Ok(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// Channel expansion
// ─────────────────────────────────────────────────────────────────────────────

/// Expand palette indices to RGB; every other color type is already in its
/// native packed layout.
fn expand(
    pixels: Vec<u8>,
    header: &Header,
    palette: &[[u8; 3]],
) -> Result<(Vec<u8>, usize), ParseError> {
    if header.color_type != COLOR_INDEXED {
        return Ok((pixels, header.bytes_per_pixel()?));
    }

    let mut rgb = Vec::with_capacity(pixels.len() * 3);
    for &index in &pixels {
        let entry = palette
            .get(index as usize)
            .ok_or(ParseError::InvalidValue("PNG: palette index out of range"))?;
        rgb.extend_from_slice(entry);
    }
    Ok((rgb, 3))
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Decode a PNG image from a byte buffer.
pub fn decode(data: &[u8]) -> Result<Image, ParseError> {
    if data.len() < 8 || data[..8] != PNG_SIGNATURE {
        return Err(ParseError::InvalidValue("not a PNG file"));
    }

    let mut cur = Cursor::new(&data[8..]);
    let mut header: Option<Header> = None;
    let mut palette: Vec<[u8; 3]> = Vec::new();
    let mut idat: Vec<u8> = Vec::new();

    while !cur.is_empty() {
        let chunk = next_chunk(&mut cur)?;
        match &chunk.kind {
            b"IHDR" => header = Some(Header::parse(chunk.data)?),
            b"PLTE" => {
                if chunk.data.len() % 3 != 0 {
                    return Err(ParseError::InvalidValue("PNG: invalid PLTE length"));
                }
                palette.extend(chunk.data.chunks_exact(3).map(|rgb| [rgb[0], rgb[1], rgb[2]]));
            }
            b"IDAT" => idat.extend_from_slice(chunk.data),
            b"IEND" => break,
            _ => {} // ancillary chunks are skipped
        }
    }

    let header = header.ok_or(ParseError::InvalidValue("PNG: missing IHDR"))?;
    if header.bit_depth != 8 {
        return Err(ParseError::InvalidValue("PNG: only 8-bit depth is supported"));
    }
    if header.interlace != 0 {
        return Err(ParseError::InvalidValue("PNG: interlaced PNGs are not supported"));
    }
    if idat.is_empty() {
        return Err(ParseError::InvalidValue("PNG: no IDAT data"));
    }

    // IDAT is zlib-wrapped DEFLATE: CMF, FLG, data, ADLER32. The checksum
    // is not verified.
    if idat.len() < 6 {
        return Err(ParseError::InvalidValue("PNG: IDAT too short for zlib"));
    }
    if idat[0] & 0x0f != 8 {
        return Err(ParseError::InvalidValue("PNG: zlib compression method must be DEFLATE"));
    }
    if idat[1] & 0x20 != 0 {
        return Err(ParseError::InvalidValue("PNG: zlib preset dictionary not allowed"));
    }
    let decompressed = deflate::inflate(&idat[2..idat.len() - 4])?;

    let bpp = header.bytes_per_pixel()?;
    let pixels = unfilter(&decompressed, header.width, header.height, bpp)?;
    let (data, bytes_per_pixel) = expand(pixels, &header, &palette)?;

    Ok(Image {
        width: header.width,
        height: header.height,
        bytes_per_pixel,
        data,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
