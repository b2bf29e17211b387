//! Core trait for decoders.

use std::io::Read;

use crate::error::Result;
use crate::stats::DecodeStats;

/// One-shot decompression over a byte source.
pub trait Decompressor {
    /// Decode the whole of `input`, appending produced bytes to `output`.
    ///
    /// On error, bytes produced before the failure stay in `output`.
    fn decompress_into<R: Read>(&mut self, input: R, output: &mut Vec<u8>) -> Result<()>;

    /// Decode a complete in-memory input.
    fn decompress(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.decompress_into(input, &mut output)?;
        Ok(output)
    }

    /// Get decompression statistics after operation.
    fn stats(&self) -> Option<DecodeStats> {
        None
    }
}
