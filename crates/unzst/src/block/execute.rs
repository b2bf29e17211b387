//! Sequence execution.
//!
//! Interleaves literal runs with back-reference copies from earlier output
//! of the same frame.

use unzst_core::{Error, Result};

use super::sequences::Sequence;
use crate::arena::try_reserve;
use crate::frame::BlockHeader;

/// Execute decoded sequences, appending the block's bytes to `output`.
///
/// `frame_start` is where the current frame's output begins; matches may not
/// reach before it or further back than `window_size`.
pub fn execute_sequences(
    sequences: &[Sequence],
    literals: &[u8],
    output: &mut Vec<u8>,
    frame_start: usize,
    window_size: u64,
) -> Result<()> {
    let mut literal_total = 0u64;
    let mut match_total = 0u64;
    for seq in sequences {
        literal_total += u64::from(seq.literal_length);
        match_total += seq.match_bytes() as u64;
    }
    if literal_total > literals.len() as u64 {
        return Err(Error::invalid(format!(
            "sequences consume {} literals, section has {}",
            literal_total,
            literals.len()
        )));
    }
    let block_total = literals.len() as u64 + match_total;
    if block_total > u64::from(BlockHeader::MAX_BLOCK_SIZE) {
        return Err(Error::invalid(format!(
            "block decodes to {} bytes, maximum is {}",
            block_total,
            BlockHeader::MAX_BLOCK_SIZE
        )));
    }
    try_reserve(output, block_total as usize)?;

    let mut literal_pos = 0;
    for seq in sequences {
        let literal_end = literal_pos + seq.literal_length as usize;
        output.extend_from_slice(&literals[literal_pos..literal_end]);
        literal_pos = literal_end;

        let offset = seq.offset as usize;
        let produced = output.len() - frame_start;
        if offset == 0 || offset > produced || seq.offset as u64 > window_size {
            return Err(Error::invalid(format!(
                "match offset {} exceeds {} bytes available (window {})",
                seq.offset, produced, window_size
            )));
        }

        let length = seq.match_bytes();
        let start = output.len() - offset;
        if offset >= length {
            output.extend_from_within(start..start + length);
        } else {
            // Overlapping copy: each byte exists before it is read
            for i in 0..length {
                let byte = output[start + i];
                output.push(byte);
            }
        }
    }

    output.extend_from_slice(&literals[literal_pos..]);
    Ok(())
}
