//! Block headers.
//!
//! Every block opens with 3 little-endian bytes: the last-block flag, a
//! 2-bit type and a 21-bit size.

use unzst_core::{Error, Result};

use super::header::read_le_uint;

/// The 2-bit block type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    /// Stored bytes, copied verbatim.
    Raw,
    /// One byte repeated `block_size` times.
    Rle,
    /// Literals and sequences sections.
    Compressed,
    /// Reserved - never valid.
    Reserved,
}

impl BlockType {
    /// Map the 2-bit type field.
    pub fn from_field(field: u8) -> Self {
        match field & 0x03 {
            0 => BlockType::Raw,
            1 => BlockType::Rle,
            2 => BlockType::Compressed,
            _ => BlockType::Reserved,
        }
    }
}

/// Parsed block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Set on the final block of a frame.
    pub last_block: bool,
    /// Block type.
    pub block_type: BlockType,
    /// The 21-bit size field: stored length for raw and compressed blocks,
    /// regenerated length for RLE blocks.
    pub block_size: u32,
}

impl BlockHeader {
    /// Encoded header length.
    pub const SIZE: usize = 3;

    /// Absolute maximum block size (128 KiB).
    pub const MAX_BLOCK_SIZE: u32 = 1 << 17;

    /// Split the 24-bit little-endian header into its fields.
    ///
    /// ```text
    /// bit 0      last block
    /// bits 1-2   block type
    /// bits 3-23  block size
    /// ```
    pub fn parse(data: [u8; Self::SIZE]) -> Result<Self> {
        let header = read_le_uint(&data) as u32;
        let block_type = BlockType::from_field((header >> 1) as u8);
        if block_type == BlockType::Reserved {
            return Err(Error::invalid("reserved block type"));
        }
        Ok(Self {
            last_block: (header & 0x01) != 0,
            block_type,
            block_size: header >> 3,
        })
    }

    /// Largest block size a frame with `window_size` allows.
    pub fn max_size_for_window(window_size: u64) -> u32 {
        window_size.min(u64::from(Self::MAX_BLOCK_SIZE)) as u32
    }

    /// Reject a declared size above `min(window_size, 128 KiB)`.
    pub fn check_size(&self, window_size: u64) -> Result<()> {
        let limit = Self::max_size_for_window(window_size);
        if self.block_size > limit {
            return Err(Error::invalid(format!(
                "block size {} exceeds maximum {}",
                self.block_size, limit
            )));
        }
        Ok(())
    }
}
