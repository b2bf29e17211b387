//! Bit-level cursors.
//!
//! Zstandard uses two bit orders:
//!
//! - **Forward, LSB-first**: FSE normalized-count headers are read from the
//!   first byte onward, least significant bit first.
//! - **Backward**: entropy-coded payloads (FSE sequences, Huffman literals,
//!   FSE-compressed Huffman weights) are written so that the last byte is read
//!   first. A `1` marker bit in the final byte locates the true end.
//!
//! ## References
//!
//! - [RFC 8878 Section 4.1](https://datatracker.ietf.org/doc/html/rfc8878#section-4.1)

mod backward;
mod forward;

pub use backward::BackwardBitReader;
pub use forward::ForwardBitReader;

/// Mask with the low `n` bits set, `n <= 64`.
#[inline]
pub(crate) fn low_mask(n: u32) -> u64 {
    if n >= 64 {
        u64::MAX
    } else {
        (1u64 << n) - 1
    }
}

/// Index of the highest set bit. `value` must be non-zero.
#[inline]
pub(crate) fn highest_bit(value: u32) -> u32 {
    31 - value.leading_zeros()
}
