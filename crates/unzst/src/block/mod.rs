//! Zstd block decoding.
//!
//! This module implements the decoding of Zstd blocks, including the literals
//! and sequences sections of compressed blocks.
//!
//! ## Block Structure
//!
//! A compressed block contains:
//! 1. Literals Section - raw byte data
//! 2. Sequences Section - LZ77 commands (literal length, match length, offset)
//!
//! Executing the sequences against the literals produces the block's output.
//!
//! ## References
//!
//! - [RFC 8878 Section 3.1.1.2](https://datatracker.ietf.org/doc/html/rfc8878#section-3.1.1.2)

mod execute;
mod literals;
mod sequences;

pub use execute::execute_sequences;
pub use literals::{decode_literals, JumpTable, LiteralsBlockType, LiteralsSection, StreamCount};
pub use sequences::{
    decode_sequences, parse_sequence_count, RepeatOffsets, Sequence, SequencesHeader, SymbolMode,
    LITERAL_LENGTH_CODES, MATCH_LENGTH_CODES, MAX_LL_SYMBOL, MAX_ML_SYMBOL, MAX_OF_SYMBOL,
    MIN_MATCH,
};

use std::io::Read;

use tracing::trace;
use unzst_core::{DecodeStats, Result};

use crate::arena::{try_reserve, ScratchArena};
use crate::context::FrameContext;
use crate::frame::{BlockHeader, BlockType, ByteSource};

/// Decode one block from `source`, appending its bytes to `output`.
///
/// Returns `true` if another block follows in this frame.
pub fn decode_block<R: Read>(
    source: &mut ByteSource<R>,
    ctx: &mut FrameContext,
    output: &mut Vec<u8>,
    scratch: &mut ScratchArena,
    stats: &mut DecodeStats,
) -> Result<bool> {
    let mut raw_header = [0u8; BlockHeader::SIZE];
    source.read_exact(&mut raw_header)?;
    let header = BlockHeader::parse(raw_header)?;
    header.check_size(ctx.window_size)?;

    let size = header.block_size as usize;
    match header.block_type {
        BlockType::Raw => {
            source.read_into(output, size)?;
            stats.raw_blocks += 1;
        }
        BlockType::Rle => {
            let byte = source.read_u8()?;
            try_reserve(output, size)?;
            output.resize(output.len() + size, byte);
            stats.rle_blocks += 1;
        }
        BlockType::Compressed => {
            let block = scratch.begin_block();
            source.read_into(block.payload, size)?;
            decode_compressed_block(block.payload, ctx, output, block.literals, block.sequences)?;
            scratch.end_block();
            stats.compressed_blocks += 1;
            stats.peak_scratch = stats.peak_scratch.max(scratch.peak_usage());
        }
        // Rejected by BlockHeader::parse
        BlockType::Reserved => {}
    }

    trace!(
        block_type = ?header.block_type,
        size = header.block_size,
        last = header.last_block,
        "decoded block"
    );
    Ok(!header.last_block)
}

/// Decode a compressed block payload.
///
/// `literals` and `sequences` are scratch buffers and must start empty.
pub fn decode_compressed_block(
    data: &[u8],
    ctx: &mut FrameContext,
    output: &mut Vec<u8>,
    literals: &mut Vec<u8>,
    sequences: &mut Vec<Sequence>,
) -> Result<()> {
    let consumed = decode_literals(data, &mut ctx.huffman, literals)?;
    decode_sequences(&data[consumed..], ctx, sequences)?;
    execute_sequences(sequences, literals, output, ctx.frame_start, ctx.window_size)
}

// =============================================================================
// Tests
// =============================================================================
