//! DEFLATE decompression (RFC 1951): stored blocks, fixed and dynamic
//! Huffman codes, LZ77 back-references.

use common::ParseError;

/// Maximum bits in a Huffman code.
const MAX_BITS: usize = 15;

// ─────────────────────────────────────────────────────────────────────────────
// LZ77 tables (RFC 1951 §3.2.5)
// ─────────────────────────────────────────────────────────────────────────────

/// Base lengths for length codes 257..285.
const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31,
    35, 43, 51, 59, 67, 83, 99, 115, 131, 163, 195, 227, 258,
];

/// Extra bits for length codes 257..285.
const LENGTH_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2,
    3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// Base distances for distance codes 0..29.
const DIST_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193,
    257, 385, 513, 769, 1025, 1537, 2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Extra bits for distance codes 0..29.
const DIST_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6,
    7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13, 13,
];

/// Order in which code-length code lengths appear in a dynamic header.
const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

// ─────────────────────────────────────────────────────────────────────────────
// BitReader
// ─────────────────────────────────────────────────────────────────────────────

/// LSB-first bit reader over a byte slice. Reading past the end is an
/// error, not zero-fill.
struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    bit_buf: u32,
    bit_count: u32,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, bit_buf: 0, bit_count: 0 }
    }

    /// Read `n` bits (n <= 16), LSB first.
    fn bits(&mut self, n: u32) -> Result<u32, ParseError> {
        while self.bit_count < n {
            let byte = *self.data.get(self.pos).ok_or(ParseError::UnexpectedEof)?;
            self.pos += 1;
            self.bit_buf |= (byte as u32) << self.bit_count;
            self.bit_count += 8;
        }
        let value = self.bit_buf & ((1u32 << n) - 1);
        self.bit_buf >>= n;
        self.bit_count -= n;
        Ok(value)
    }

    /// Discard bits up to the next byte boundary.
    fn align_to_byte(&mut self) {
        let discard = self.bit_count % 8;
        self.bit_buf >>= discard;
        self.bit_count -= discard;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Huffman — canonical code decoding
// ─────────────────────────────────────────────────────────────────────────────

/// A canonical Huffman code: per-length symbol counts plus the symbols
/// sorted by (length, symbol order).
struct Huffman {
    count: [u16; MAX_BITS + 1],
    symbol: Vec<u16>,
}

impl Huffman {
    /// Build from per-symbol code lengths (0 = symbol unused).
    fn from_lengths(lengths: &[u8]) -> Result<Self, ParseError> {
        let mut count = [0u16; MAX_BITS + 1];
        for &len in lengths {
            if len as usize > MAX_BITS {
                return Err(ParseError::InvalidValue("huffman code length > 15"));
            }
            count[len as usize] += 1;
        }
        count[0] = 0;

        // First symbol-table index for each code length.
        let mut offs = [0u16; MAX_BITS + 1];
        for len in 1..MAX_BITS {
            offs[len + 1] = offs[len] + count[len];
        }

        let mut symbol = vec![0u16; (offs[MAX_BITS] + count[MAX_BITS]) as usize];
        for (sym, &len) in lengths.iter().enumerate() {
            if len != 0 {
                symbol[offs[len as usize] as usize] = sym as u16;
                offs[len as usize] += 1;
            }
        }

        Ok(Self { count, symbol })
    }

    /// Decode one symbol, reading the code bit by bit.
    fn decode(&self, reader: &mut BitReader<'_>) -> Result<u16, ParseError> {
        let mut code = 0u32; // code of `len` bits being examined
        let mut first = 0u32; // first code of this length
        let mut index = 0u32; // symbol-table index of the first code
        for len in 1..=MAX_BITS {
            code |= reader.bits(1)?;
            let count = self.count[len] as u32;
            if code < first + count {
                return Ok(self.symbol[(index + code - first) as usize]);
            }
            index += count;
            first = (first + count) << 1;
            code <<= 1;
        }
        Err(ParseError::InvalidValue("invalid huffman code"))
    }
}

/// Fixed literal/length code (RFC 1951 §3.2.6).
fn fixed_literal_code() -> Huffman {
    let mut lengths = [8u8; 288];
    lengths[144..256].fill(9);
    lengths[256..280].fill(7);
    // Infallible: every length is <= 15.
    Huffman::from_lengths(&lengths).unwrap()
}

/// Fixed distance code: all 30 usable codes (plus 2 reserved) are 5 bits.
fn fixed_distance_code() -> Huffman {
    Huffman::from_lengths(&[5u8; 32]).unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// inflate
// ─────────────────────────────────────────────────────────────────────────────

/// Decompress a raw DEFLATE stream.
pub fn inflate(compressed: &[u8]) -> Result<Vec<u8>, ParseError> {
    let mut reader = BitReader::new(compressed);
    let mut out = Vec::new();

    loop {
        let last = reader.bits(1)? == 1;
        match reader.bits(2)? {
            0 => stored_block(&mut reader, &mut out)?,
            1 => {
                let literals = fixed_literal_code();
                let distances = fixed_distance_code();
                coded_block(&mut reader, &literals, &distances, &mut out)?;
            }
            2 => {
                let (literals, distances) = dynamic_codes(&mut reader)?;
                coded_block(&mut reader, &literals, &distances, &mut out)?;
            }
            _ => return Err(ParseError::InvalidValue("deflate reserved block type")),
        }
        if last {
            break;
        }
    }

    Ok(out)
}

/// Copy a stored (uncompressed) block.
fn stored_block(reader: &mut BitReader<'_>, out: &mut Vec<u8>) -> Result<(), ParseError> {
    reader.align_to_byte();
    let len = reader.bits(16)?;
    let nlen = reader.bits(16)?;
    if len != nlen ^ 0xffff {
        return Err(ParseError::InvalidValue("deflate stored block length mismatch"));
    }
    out.reserve(len as usize);
    for _ in 0..len {
        out.push(reader.bits(8)? as u8);
    }
    Ok(())
}

/// Decompress one Huffman-coded block.
fn coded_block(
    reader: &mut BitReader<'_>,
    literals: &Huffman,
    distances: &Huffman,
    out: &mut Vec<u8>,
) -> Result<(), ParseError> {
    loop {
        let sym = literals.decode(reader)?;

        if sym < 256 {
            out.push(sym as u8);
            continue;
        }
        if sym == 256 {
            // end of block
            return Ok(());
        }

        let len_idx = (sym - 257) as usize;
        if len_idx >= LENGTH_BASE.len() {
            return Err(ParseError::InvalidValue("invalid deflate length code"));
        }
        let length = LENGTH_BASE[len_idx] as usize
            + reader.bits(LENGTH_EXTRA[len_idx] as u32)? as usize;

        let dist_idx = distances.decode(reader)? as usize;
        if dist_idx >= DIST_BASE.len() {
            return Err(ParseError::InvalidValue("invalid deflate distance code"));
        }
        let distance = DIST_BASE[dist_idx] as usize
            + reader.bits(DIST_EXTRA[dist_idx] as u32)? as usize;

        if distance > out.len() {
            return Err(ParseError::InvalidValue("deflate distance exceeds output"));
        }

        // Byte-by-byte so overlapping references repeat the pattern.
        let start = out.len() - distance;
        for i in 0..length {
            let byte = out[start + i];
            out.push(byte);
        }
    }
}

/// Read the dynamic Huffman header and build both codes.
fn dynamic_codes(reader: &mut BitReader<'_>) -> Result<(Huffman, Huffman), ParseError> {
    let hlit = reader.bits(5)? as usize + 257;
    let hdist = reader.bits(5)? as usize + 1;
    let hclen = reader.bits(4)? as usize + 4;

    let mut cl_lengths = [0u8; 19];
    for &slot in CODE_LENGTH_ORDER.iter().take(hclen) {
        cl_lengths[slot] = reader.bits(3)? as u8;
    }
    let cl_code = Huffman::from_lengths(&cl_lengths)?;

    let total = hlit + hdist;
    let mut lengths = Vec::with_capacity(total);
    while lengths.len() < total {
        let sym = cl_code.decode(reader)?;
        let (value, repeat) = match sym {
            0..=15 => (sym as u8, 1),
            16 => {
                let prev = *lengths
                    .last()
                    .ok_or(ParseError::InvalidValue("deflate repeat with no previous length"))?;
                (prev, reader.bits(2)? as usize + 3)
            }
            17 => (0, reader.bits(3)? as usize + 3),
            18 => (0, reader.bits(7)? as usize + 11),
            _ => return Err(ParseError::InvalidValue("invalid code length symbol")),
        };
        if lengths.len() + repeat > total {
            return Err(ParseError::InvalidValue("deflate code lengths overflow header"));
        }
        for _ in 0..repeat {
            lengths.push(value);
        }
    }

    let literals = Huffman::from_lengths(&lengths[..hlit])?;
    let distances = Huffman::from_lengths(&lengths[hlit..])?;
    Ok((literals, distances))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(payload: &[u8], last: bool) -> Vec<u8> {
        let mut data = vec![if last { 0x01 } else { 0x00 }];
        let len = payload.len() as u16;
        data.extend_from_slice(&len.to_le_bytes());
        data.extend_from_slice(&(!len).to_le_bytes());
        data.extend_from_slice(payload);
        data
    }

    #[test]
    fn bit_reader_lsb_first() {
        let mut r = BitReader::new(&[0b1011_0100]);
        assert_eq!(r.bits(3).unwrap(), 0b100);
        assert_eq!(r.bits(5).unwrap(), 0b10110);
        assert_eq!(r.bits(1), Err(ParseError::UnexpectedEof));
    }

    #[test]
    fn bit_reader_across_bytes() {
        let mut r = BitReader::new(&[0xff, 0x00, 0x0f]);
        assert_eq!(r.bits(12).unwrap(), 0x0ff);
        assert_eq!(r.bits(12).unwrap(), 0x0f0);
    }

    #[test]
    fn huffman_two_symbols() {
        // Symbols 0 and 1, both one bit: codes 0 and 1.
        let code = Huffman::from_lengths(&[1, 1]).unwrap();
        let mut r = BitReader::new(&[0b0000_0010]);
        assert_eq!(code.decode(&mut r).unwrap(), 0);
        assert_eq!(code.decode(&mut r).unwrap(), 1);
    }

    #[test]
    fn huffman_skewed_lengths() {
        // lengths: a=1, b=2, c=2 → canonical codes a=0, b=10, c=11.
        let code = Huffman::from_lengths(&[1, 2, 2]).unwrap();
        // Bit stream (LSB first per bit read): a, b, c = 0, 1 0, 1 1
        let mut r = BitReader::new(&[0b0001_1010]);
        assert_eq!(code.decode(&mut r).unwrap(), 0);
        assert_eq!(code.decode(&mut r).unwrap(), 1);
        assert_eq!(code.decode(&mut r).unwrap(), 2);
    }

    #[test]
    fn inflate_stored_block() {
        assert_eq!(inflate(&stored(b"hello", true)).unwrap(), b"hello");
    }

    #[test]
    fn inflate_empty_stored_block() {
        assert!(inflate(&stored(b"", true)).unwrap().is_empty());
    }

    #[test]
    fn inflate_chained_stored_blocks() {
        let mut data = stored(b"ab", false);
        data.extend_from_slice(&stored(b"cd", true));
        assert_eq!(inflate(&data).unwrap(), b"abcd");
    }

    #[test]
    fn inflate_rejects_bad_stored_length() {
        let mut data = vec![0x01, 0x02, 0x00, 0x00, 0x00];
        data.extend_from_slice(b"xy");
        assert!(inflate(&data).is_err());
    }

    #[test]
    fn inflate_rejects_truncated_input() {
        assert_eq!(inflate(&[]), Err(ParseError::UnexpectedEof));
        assert!(inflate(&stored(b"hello", true)[..4].to_vec()).is_err());
    }

    #[test]
    fn inflate_fixed_huffman_literals() {
        // BFINAL=1, BTYPE=01, literal 'a' (8-bit fixed code), end-of-block
        // (7-bit fixed code 0000000). 'a' = 97 → code 0x30 + 97 = 0x91,
        // written MSB first: 1001 0001.
        // Bit stream: 1, 1,0 | 1,0,0,1,0,0,0,1 | 0000000 → packed LSB
        // first: 0x4b, 0x04, 0x00.
        let data = [0x4b, 0x04, 0x00];
        assert_eq!(inflate(&data).unwrap(), b"a");
    }

    #[test]
    fn inflate_dynamic_huffman_block() {
        // BFINAL=1, BTYPE=10. HLIT=0 (257 literal codes), HDIST=0 (1
        // distance code), HCLEN=14 (18 code-length lengths, covering
        // symbols 18 and 1 in CODE_LENGTH_ORDER).
        //
        // Code-length code: symbols 1 and 18, one bit each (1 → 0, 18 → 1).
        // The 258 lengths are sent as: 18+86 (97 zeros), 1 (= 'a'), 18+127
        // (138 zeros), 18+9 (20 zeros), 1 (= end of block), 1 (distance 0).
        // Literal code: 'a' → 0, 256 → 1. Data: 'a', 'a', end of block.
        //
        // Bit stream packed LSB first:
        let data = [
            0x05, 0xc0, 0x81, 0x00, 0x00, 0x00, 0x00, 0x00, 0x90, 0x56,
            0xff, 0x13, 0x10,
        ];
        assert_eq!(inflate(&data).unwrap(), b"aa");
    }

    #[test]
    fn back_reference_repeats_pattern() {
        // Stored block "ab" followed by a fixed-Huffman block encoding a
        // length-4 distance-2 match → "abab".
        // Fixed block bits: BFINAL=1, BTYPE=01, length code 258 (=len 4):
        // 7-bit code 0000010, distance code 1 (=dist 2): 5-bit code 00001,
        // end of block 0000000.
        let mut data = stored(b"ab", false);
        // Bit stream: 1, 1,0 | 0,0,0,0,0,1,0 | 0,0,0,0,1 | 0000000 →
        // packed LSB first: 0x03, 0x41, 0x00.
        data.extend_from_slice(&[0x03, 0x41, 0x00]);
        assert_eq!(inflate(&data).unwrap(), b"abab");
    }
}
