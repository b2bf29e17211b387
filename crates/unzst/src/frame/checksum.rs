//! Frame content checksum.
//!
//! The optional 4-byte trailer holds the low 32 bits of XXH64 (seed 0) over
//! the frame's decoded content.

use xxhash_rust::xxh64::{xxh64, Xxh64};

/// Streaming 64-bit content hash.
pub struct ContentHash {
    state: Xxh64,
}

impl ContentHash {
    /// Start a hash with seed 0.
    pub fn new() -> Self {
        Self {
            state: Xxh64::new(0),
        }
    }

    /// Feed decoded bytes.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.state.update(data);
    }

    /// Full 64-bit digest of everything fed so far.
    pub fn digest(&self) -> u64 {
        self.state.digest()
    }

    /// Low 32 bits of the digest, as stored in the frame trailer.
    pub fn checksum(&self) -> u32 {
        (self.digest() & 0xFFFF_FFFF) as u32
    }
}

impl Default for ContentHash {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentHash")
            .field("digest", &format_args!("0x{:016x}", self.digest()))
            .finish()
    }
}

/// One-shot XXH64.
#[inline]
pub fn xxhash64(data: &[u8], seed: u64) -> u64 {
    xxh64(data, seed)
}
