//! Statistics for decode operations.

/// Counters accumulated while decoding one or more inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Content frames decoded.
    pub frames: u64,

    /// Skippable frames passed over.
    pub skippable_frames: u64,

    /// Raw blocks decoded.
    pub raw_blocks: u64,

    /// RLE blocks decoded.
    pub rle_blocks: u64,

    /// Compressed blocks decoded.
    pub compressed_blocks: u64,

    /// Input bytes consumed.
    pub bytes_in: u64,

    /// Output bytes produced.
    pub bytes_out: u64,

    /// Largest scratch footprint observed, in bytes.
    pub peak_scratch: usize,
}

impl DecodeStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total blocks of any kind.
    pub fn blocks(&self) -> u64 {
        self.raw_blocks + self.rle_blocks + self.compressed_blocks
    }

    /// Output bytes per input byte.
    pub fn expansion_ratio(&self) -> f64 {
        if self.bytes_in == 0 {
            return 0.0;
        }
        self.bytes_out as f64 / self.bytes_in as f64
    }

    /// Merge stats from another operation.
    pub fn merge(&mut self, other: &DecodeStats) {
        self.frames += other.frames;
        self.skippable_frames += other.skippable_frames;
        self.raw_blocks += other.raw_blocks;
        self.rle_blocks += other.rle_blocks;
        self.compressed_blocks += other.compressed_blocks;
        self.bytes_in += other.bytes_in;
        self.bytes_out += other.bytes_out;
        self.peak_scratch = self.peak_scratch.max(other.peak_scratch);
    }
}
