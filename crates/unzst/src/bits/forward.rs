//! Forward LSB-first bit reader.

use unzst_core::{Error, Result};

use super::low_mask;

/// Reads bits from a byte slice starting at the first byte, LSB first.
#[derive(Debug, Clone)]
pub struct ForwardBitReader<'a> {
    data: &'a [u8],
    /// Bits consumed from the start of `data`.
    bit_pos: usize,
}

impl<'a> ForwardBitReader<'a> {
    /// Create a reader positioned at the first bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Read `n` bits (`n <= 32`).
    ///
    /// Reading past the end of the slice is an error.
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        debug_assert!(n <= 32);
        if n == 0 {
            return Ok(0);
        }
        let end = self.bit_pos + n as usize;
        if end > self.data.len() * 8 {
            return Err(Error::invalid("bit header extends past its section"));
        }

        let first = self.bit_pos / 8;
        let shift = self.bit_pos % 8;
        let last = (end + 7) / 8;
        let mut acc = 0u64;
        for (i, &byte) in self.data[first..last].iter().enumerate() {
            acc |= u64::from(byte) << (8 * i);
        }
        self.bit_pos = end;
        Ok(((acc >> shift) & low_mask(n)) as u32)
    }

    /// Bits consumed so far.
    pub fn bits_consumed(&self) -> usize {
        self.bit_pos
    }

    /// Whole bytes touched so far, counting a partially read byte.
    pub fn bytes_consumed(&self) -> usize {
        (self.bit_pos + 7) / 8
    }
}
