//! Backward bit reader for entropy-coded streams.

use unzst_core::{Error, Result};

use super::low_mask;

/// Reads a bitstream from its end toward its start.
///
/// The stream is a little-endian bit sequence whose highest set bit, in the
/// final byte, is an end marker. Each read returns the `n` bits just below
/// the current position, with the higher-positioned bits most significant.
///
/// Reads that run past the first bit yield zeros and leave the reader
/// overflowed; callers treat overflow as truncation or as an end condition.
#[derive(Debug, Clone)]
pub struct BackwardBitReader<'a> {
    data: &'a [u8],
    /// Unread bits. Negative once a read has run past the start.
    bits_remaining: isize,
}

impl<'a> BackwardBitReader<'a> {
    /// Create a reader positioned just below the end marker.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let last = match data.last() {
            Some(&byte) => byte,
            None => return Err(Error::invalid("empty bitstream")),
        };
        if last == 0 {
            return Err(Error::invalid("bitstream missing end marker"));
        }
        let padding = last.leading_zeros() as usize + 1;
        Ok(Self {
            data,
            bits_remaining: (data.len() * 8 - padding) as isize,
        })
    }

    /// Read `n` bits (`n <= 56`) and advance.
    #[inline]
    pub fn read_bits(&mut self, n: u32) -> u64 {
        let value = self.peek_bits(n);
        self.bits_remaining -= n as isize;
        value
    }

    /// Return the next `n` bits (`n <= 56`) without advancing.
    ///
    /// Bits below the start of the stream read as zero.
    #[inline]
    pub fn peek_bits(&self, n: u32) -> u64 {
        debug_assert!(n <= 56);
        if n == 0 || self.bits_remaining <= 0 {
            return 0;
        }
        let top = self.bits_remaining as usize;
        let start = self.bits_remaining - n as isize;
        let (from, pad) = if start < 0 {
            (0usize, (-start) as u32)
        } else {
            (start as usize, 0)
        };
        let count = (top - from) as u32;

        let first = from / 8;
        let shift = from % 8;
        let last = (top + 7) / 8;
        let mut acc = 0u64;
        for (i, &byte) in self.data[first..last].iter().enumerate() {
            acc |= u64::from(byte) << (8 * i);
        }
        ((acc >> shift) & low_mask(count)) << pad
    }

    /// Advance by `n` bits.
    #[inline]
    pub fn consume(&mut self, n: u32) {
        self.bits_remaining -= n as isize;
    }

    /// Unread bits, negative after overflow.
    pub fn bits_remaining(&self) -> isize {
        self.bits_remaining
    }

    /// Whether a read has run past the start of the stream.
    pub fn is_overflowed(&self) -> bool {
        self.bits_remaining < 0
    }

    /// Whether every bit was consumed exactly.
    pub fn is_finished(&self) -> bool {
        self.bits_remaining == 0
    }
}
