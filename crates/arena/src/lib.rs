//! # Bump Arena
//!
//! A bump allocator over a single pre-sized memory block. Allocations carve
//! byte ranges off a monotonic cursor; nothing is freed individually and the
//! whole block is reclaimed when the arena is dropped (or `reset`).
//! Zero external dependencies.
//!
//! Handles are byte offsets into the block (`ByteRange`), not pointers, so
//! the arena stays entirely in safe Rust while keeping the bump-pointer
//! invariants: the cursor only moves forward, and growing the most recent
//! allocation is O(1) and in place.
//!
//! Running out of space is a fatal condition. The capacity is a fixed
//! upfront budget, so exhaustion panics instead of returning an error.

#![forbid(unsafe_code)]

/// Alignment used by [`Arena::alloc_default`]. Large enough for the
/// primitive arrays and structs stored here.
pub const DEFAULT_ALIGNMENT: usize = 16;

// ─────────────────────────────────────────────────────────────────────────────
// ByteRange
// ─────────────────────────────────────────────────────────────────────────────

/// A handle to an allocation: a byte range inside the arena's block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: usize,
    pub len: usize,
}

impl ByteRange {
    pub const EMPTY: Self = Self { offset: 0, len: 0 };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the last byte of the range.
    #[inline]
    fn end(&self) -> usize {
        self.offset + self.len
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Arena
// ─────────────────────────────────────────────────────────────────────────────

/// Bump allocator over a fixed-capacity block.
pub struct Arena {
    block: Vec<u8>,
    cursor: usize,
}

impl Arena {
    /// Create an arena with a fixed byte capacity. This is the only real
    /// allocation the arena ever performs.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            block: vec![0u8; capacity],
            cursor: 0,
        }
    }

    /// Allocate `size` bytes at the given alignment.
    ///
    /// `align` must be a power of two. A `size` of zero returns an empty
    /// range without consuming space.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `padding + size` bytes remain. The capacity is
    /// a fixed budget; exceeding it is unrecoverable.
    pub fn alloc(&mut self, size: usize, align: usize) -> ByteRange {
        debug_assert!(align > 0 && align.is_power_of_two());

        if size == 0 {
            return ByteRange { offset: self.cursor, len: 0 };
        }

        let padding = self.cursor.wrapping_neg() & (align - 1);
        let left = self.block.len() - self.cursor;
        if left < padding + size {
            panic!("arena overflow: {size} bytes requested, {left} left");
        }

        let offset = self.cursor + padding;
        self.cursor = offset + size;
        ByteRange { offset, len: size }
    }

    /// Allocate with [`DEFAULT_ALIGNMENT`].
    pub fn alloc_default(&mut self, size: usize) -> ByteRange {
        self.alloc(size, DEFAULT_ALIGNMENT)
    }

    /// Grow (or keep) an allocation.
    ///
    /// Shrinking or keeping the size returns `range` unchanged; the arena
    /// never reclaims the tail. Growing the most recent allocation extends
    /// it in place, keeping its offset. Growing anything else allocates
    /// fresh space and copies the old bytes forward; the old region becomes
    /// unreclaimable slack.
    pub fn grow(&mut self, range: ByteRange, new_size: usize) -> ByteRange {
        if new_size <= range.len {
            return range;
        }

        if !range.is_empty() && range.end() == self.cursor {
            // The range sits at the allocation frontier: rewind and extend.
            let left = self.block.len() - range.offset;
            if left < new_size {
                panic!("arena overflow: {new_size} bytes requested, {left} left");
            }
            self.cursor = range.offset + new_size;
            return ByteRange { offset: range.offset, len: new_size };
        }

        let grown = self.alloc_default(new_size);
        self.block.copy_within(range.offset..range.end(), grown.offset);
        grown
    }

    /// Copy the bytes of `src` to the start of `dst`. Both must be
    /// allocations in this arena and `dst` must be at least as long.
    pub fn copy_within(&mut self, src: ByteRange, dst: ByteRange) {
        debug_assert!(src.len <= dst.len);
        self.block.copy_within(src.offset..src.end(), dst.offset);
    }

    /// Borrow the bytes of an allocation.
    #[inline]
    pub fn get(&self, range: ByteRange) -> &[u8] {
        &self.block[range.offset..range.end()]
    }

    /// Mutably borrow the bytes of an allocation.
    #[inline]
    pub fn get_mut(&mut self, range: ByteRange) -> &mut [u8] {
        &mut self.block[range.offset..range.end()]
    }

    /// Bytes still available for allocation.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.block.len() - self.cursor
    }

    /// Total capacity of the block.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.block.len()
    }

    /// Rewind the cursor to the start, invalidating every range handed out
    /// so far. The backing block is kept.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ArenaBuf — growable buffer on top of the arena
// ─────────────────────────────────────────────────────────────────────────────

/// A growable owned buffer backed by arena allocations.
///
/// `len` counts the filled prefix of `range`; `range.len` is the capacity.
/// Used for variable-size accumulation such as whole-file contents.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArenaBuf {
    range: ByteRange,
    len: usize,
}

impl ArenaBuf {
    pub fn new() -> Self {
        Self { range: ByteRange::EMPTY, len: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.range.len
    }

    /// Ensure room for `additional` more bytes, growing via the arena.
    pub fn reserve(&mut self, arena: &mut Arena, additional: usize) {
        let needed = self.len + additional;
        if needed > self.range.len {
            self.range = arena.grow(self.range, needed);
        }
    }

    /// Append bytes to the filled prefix.
    pub fn extend_from_slice(&mut self, arena: &mut Arena, bytes: &[u8]) {
        self.reserve(arena, bytes.len());
        let dst = arena.get_mut(self.range);
        dst[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
    }

    /// Mutable view of the reserved-but-unfilled suffix.
    pub fn spare_capacity_mut<'a>(&self, arena: &'a mut Arena) -> &'a mut [u8] {
        let range = self.range;
        let len = self.len;
        &mut arena.get_mut(range)[len..]
    }

    /// Mark `n` more bytes of the spare capacity as filled.
    pub fn advance(&mut self, n: usize) {
        assert!(self.len + n <= self.range.len);
        self.len += n;
    }

    /// The filled prefix as a slice.
    pub fn as_slice<'a>(&self, arena: &'a Arena) -> &'a [u8] {
        &arena.get(self.range)[..self.len]
    }

    /// The filled prefix as a range handle, for callers that must not hold
    /// a borrow of the arena.
    pub fn filled(&self) -> ByteRange {
        ByteRange { offset: self.range.offset, len: self.len }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_consumes_at_least_size() {
        let mut arena = Arena::with_capacity(1024);
        let before = arena.remaining();
        arena.alloc(100, 1);
        arena.alloc(28, 1);
        assert!(before - arena.remaining() >= 128);
    }

    #[test]
    fn alloc_zero_size_consumes_nothing() {
        let mut arena = Arena::with_capacity(64);
        let range = arena.alloc(0, 16);
        assert!(range.is_empty());
        assert_eq!(arena.remaining(), 64);
    }

    #[test]
    fn alloc_respects_alignment() {
        let mut arena = Arena::with_capacity(256);
        arena.alloc(3, 1);
        let range = arena.alloc(8, 16);
        assert_eq!(range.offset % 16, 0);
        let range = arena.alloc(4, 4);
        assert_eq!(range.offset % 4, 0);
    }

    #[test]
    #[should_panic(expected = "arena overflow")]
    fn alloc_past_capacity_panics() {
        let mut arena = Arena::with_capacity(16);
        arena.alloc(17, 1);
    }

    #[test]
    #[should_panic(expected = "arena overflow")]
    fn padding_counts_against_capacity() {
        let mut arena = Arena::with_capacity(20);
        arena.alloc(1, 1);
        // 15 bytes of padding + 8 > 19 left.
        arena.alloc(8, 16);
    }

    #[test]
    fn grow_in_place_keeps_offset_and_bytes() {
        let mut arena = Arena::with_capacity(256);
        let range = arena.alloc_default(4);
        arena.get_mut(range).copy_from_slice(b"abcd");

        let grown = arena.grow(range, 32);
        assert_eq!(grown.offset, range.offset);
        assert_eq!(grown.len, 32);
        assert_eq!(&arena.get(grown)[..4], b"abcd");
    }

    #[test]
    fn grow_after_intervening_alloc_copies() {
        let mut arena = Arena::with_capacity(256);
        let range = arena.alloc_default(4);
        arena.get_mut(range).copy_from_slice(b"abcd");
        let _other = arena.alloc_default(8);

        let grown = arena.grow(range, 16);
        assert_ne!(grown.offset, range.offset);
        assert_eq!(&arena.get(grown)[..4], b"abcd");
    }

    #[test]
    fn grow_shrink_or_equal_is_identity() {
        let mut arena = Arena::with_capacity(64);
        let range = arena.alloc_default(8);
        assert_eq!(arena.grow(range, 8), range);
        assert_eq!(arena.grow(range, 2), range);
    }

    #[test]
    fn reset_rewinds_cursor() {
        let mut arena = Arena::with_capacity(64);
        arena.alloc(40, 1);
        arena.reset();
        assert_eq!(arena.remaining(), 64);
        let range = arena.alloc(40, 1);
        assert_eq!(range.offset, 0);
    }

    #[test]
    fn arena_buf_accumulates_across_growth() {
        let mut arena = Arena::with_capacity(1024);
        let mut buf = ArenaBuf::new();
        buf.extend_from_slice(&mut arena, b"hello ");
        // Force the copy path with an intervening allocation.
        arena.alloc_default(16);
        buf.extend_from_slice(&mut arena, b"world");
        assert_eq!(buf.as_slice(&arena), b"hello world");
        assert_eq!(buf.len(), 11);
    }

    #[test]
    fn arena_buf_spare_capacity_fill() {
        let mut arena = Arena::with_capacity(128);
        let mut buf = ArenaBuf::new();
        buf.reserve(&mut arena, 5);
        buf.spare_capacity_mut(&mut arena)[..5].copy_from_slice(b"fonts");
        buf.advance(5);
        assert_eq!(buf.as_slice(&arena), b"fonts");
        assert_eq!(buf.filled().len, 5);
    }
}
