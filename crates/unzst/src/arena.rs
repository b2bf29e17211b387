//! Scratch buffers for per-block temporary data.
//!
//! Compressed block payloads, decoded literals and decoded sequences live
//! only for the duration of one block. They are kept in a reusable pool that
//! is separate from the caller's output buffer, so short-lived allocations
//! never interleave with the growing output.
//!
//! ## Usage
//!
//! ```ignore
//! let mut scratch = ScratchArena::new();
//!
//! let block = scratch.begin_block();
//! // fill block.payload, block.literals, block.sequences
//! scratch.end_block();
//! ```

use unzst_core::{Error, Result};

use crate::block::Sequence;
use crate::frame::BlockHeader;

/// Default scratch capacity: one maximum-size block.
pub const DEFAULT_SCRATCH_CAPACITY: usize = BlockHeader::MAX_BLOCK_SIZE as usize;

/// Reusable pool of block-scoped buffers.
#[derive(Debug, Default)]
pub struct ScratchArena {
    payload: Vec<u8>,
    literals: Vec<u8>,
    sequences: Vec<Sequence>,
    /// Highest footprint of a single block, in bytes.
    peak_usage: usize,
}

/// Buffers lent out for one block. All start empty.
#[derive(Debug)]
pub struct BlockScratch<'a> {
    /// Compressed block payload as read from the input.
    pub payload: &'a mut Vec<u8>,
    /// Decoded literals section.
    pub literals: &'a mut Vec<u8>,
    /// Decoded sequences.
    pub sequences: &'a mut Vec<Sequence>,
}

impl ScratchArena {
    /// Create an empty arena. Buffers grow on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an arena with room for blocks of `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut arena = Self::new();
        try_reserve(&mut arena.payload, capacity)?;
        try_reserve(&mut arena.literals, capacity)?;
        Ok(arena)
    }

    /// Lend out cleared buffers for the next block.
    pub fn begin_block(&mut self) -> BlockScratch<'_> {
        self.payload.clear();
        self.literals.clear();
        self.sequences.clear();
        BlockScratch {
            payload: &mut self.payload,
            literals: &mut self.literals,
            sequences: &mut self.sequences,
        }
    }

    /// Record the finished block's footprint and release its contents.
    ///
    /// Capacity is retained for the next block.
    pub fn end_block(&mut self) {
        self.peak_usage = self.peak_usage.max(self.usage());
        self.payload.clear();
        self.literals.clear();
        self.sequences.clear();
    }

    /// Bytes currently held by lent-out buffers.
    pub fn usage(&self) -> usize {
        self.payload.len()
            + self.literals.len()
            + self.sequences.len() * std::mem::size_of::<Sequence>()
    }

    /// Bytes of reserved capacity.
    pub fn capacity(&self) -> usize {
        self.payload.capacity()
            + self.literals.capacity()
            + self.sequences.capacity() * std::mem::size_of::<Sequence>()
    }

    /// Highest footprint seen for a single block.
    pub fn peak_usage(&self) -> usize {
        self.peak_usage.max(self.usage())
    }

    /// Drop reserved capacity above `limit` bytes per buffer.
    pub fn shrink_to(&mut self, limit: usize) {
        self.payload.shrink_to(limit);
        self.literals.shrink_to(limit);
        self.sequences
            .shrink_to(limit / std::mem::size_of::<Sequence>().max(1));
    }
}

/// Reserve `additional` elements, reporting failure as an error.
pub(crate) fn try_reserve<T>(buffer: &mut Vec<T>, additional: usize) -> Result<()> {
    buffer.try_reserve(additional).map_err(|_| {
        let bytes = (additional as u64).saturating_mul(std::mem::size_of::<T>() as u64);
        Error::allocation_failed(bytes)
    })
}
