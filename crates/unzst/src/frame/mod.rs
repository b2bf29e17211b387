//! Frame-level structures and the input source.
//!
//! ```text
//! magic (4) | frame header (2-14) | blocks ... | checksum (0 or 4)
//! ```
//!
//! Skippable frames carry a magic in `0x184D2A50..=0x184D2A5F`, a 4-byte
//! little-endian size, then that many bytes of user data.
//!
//! ## References
//!
//! - [RFC 8878 Section 3.1](https://datatracker.ietf.org/doc/html/rfc8878#section-3.1)

mod block;
mod checksum;
mod header;
mod source;

pub use block::{BlockHeader, BlockType};
pub use checksum::{xxhash64, ContentHash};
pub use header::{decode_window_size, FrameDescriptor, FrameHeader, MAX_FRAME_HEADER_SIZE};
pub use source::ByteSource;

/// Content frame magic, stored little-endian as `28 B5 2F FD`.
pub const ZSTD_MAGIC: u32 = 0xFD2FB528;

/// Skippable frames use any magic from `SKIPPABLE_MAGIC_LOW` to `SKIPPABLE_MAGIC_HIGH`.
pub const SKIPPABLE_MAGIC_LOW: u32 = 0x184D2A50;
pub const SKIPPABLE_MAGIC_HIGH: u32 = 0x184D2A5F;

/// Whether `magic` opens a skippable frame.
#[inline]
pub fn is_skippable_magic(magic: u32) -> bool {
    (SKIPPABLE_MAGIC_LOW..=SKIPPABLE_MAGIC_HIGH).contains(&magic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_constants() {
        assert_eq!(ZSTD_MAGIC.to_le_bytes(), [0x28, 0xB5, 0x2F, 0xFD]);
        assert_eq!(SKIPPABLE_MAGIC_LOW, 0x184D2A50);
        assert_eq!(SKIPPABLE_MAGIC_HIGH, 0x184D2A5F);
    }

    #[test]
    fn test_skippable_magic_range() {
        for i in 0..16 {
            assert!(is_skippable_magic(SKIPPABLE_MAGIC_LOW + i));
        }
        assert!(!is_skippable_magic(SKIPPABLE_MAGIC_LOW - 1));
        assert!(!is_skippable_magic(SKIPPABLE_MAGIC_HIGH + 1));
        assert!(!is_skippable_magic(ZSTD_MAGIC));
    }
}
