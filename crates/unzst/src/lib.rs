//! # Unzst
//!
//! Native Rust decoder for the Zstandard container format (RFC 8878).
//!
//! The decoder reads from any [`std::io::Read`] source, accepts
//! concatenations of content and skippable frames, and appends the decoded
//! bytes to a caller-owned buffer.
//!
//! ## Features
//!
//! - **Pure Rust**: No C dependencies
//! - **Streaming input**: Frames are pulled from the source block by block;
//!   skippable frames are discarded without buffering
//! - **Complete entropy decoding**: Huffman literals (1 and 4 streams,
//!   direct and FSE-compressed weights) and all four FSE table modes
//! - **Checked**: Every structural violation is an error, never a panic
//!
//! ## Quick Start
//!
//! ```rust
//! use unzst::{decode, ScratchArena};
//!
//! // Single-segment frame holding one raw block
//! let frame = [0x28, 0xB5, 0x2F, 0xFD, 0x20, 0x05, 0x29, 0x00, 0x00, b'H', b'e', b'l', b'l', b'o'];
//!
//! let mut output = Vec::new();
//! let mut scratch = ScratchArena::new();
//! decode(&frame[..], &mut output, &mut scratch).unwrap();
//! assert_eq!(output, b"Hello");
//! ```
//!
//! With a reusable decoder:
//!
//! ```rust
//! use unzst::ZstdDecoder;
//! use unzst_core::{DecoderConfig, Decompressor};
//!
//! let frame = [0x28, 0xB5, 0x2F, 0xFD, 0x20, 0x04, 0x23, 0x00, 0x00, b'X'];
//! let mut decoder = ZstdDecoder::with_config(DecoderConfig::new().with_verify_checksum(false));
//! assert_eq!(decoder.decompress(&frame).unwrap(), b"XXXX");
//! assert_eq!(decoder.stats().unwrap().rle_blocks, 1);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                           unzst                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  decompress.rs      │  context.rs        │  arena.rs        │
//! │  (frame loop,       │  (repeat offsets,  │  (block scratch) │
//! │   container scan)   │   previous tables) │                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  block/             │  frame/                               │
//! │  ├── literals.rs    │  ├── header.rs                        │
//! │  ├── sequences.rs   │  ├── block.rs                         │
//! │  └── execute.rs     │  ├── checksum.rs                      │
//! │                     │  └── source.rs                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  huffman/           │  fse/               │  bits/          │
//! │  ├── decoder.rs     │  ├── decoder.rs     │  ├── forward.rs │
//! │  └── table.rs       │  └── table.rs       │  └── backward.rs│
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Known Limitations
//!
//! 1. **Dictionaries**: Frames naming a dictionary are decoded without it;
//!    blocks that reference dictionary content fail with `InvalidFormat`
//! 2. **Output**: The whole output is kept in memory, nothing is evicted
//!    mid-frame
//!
//! ## References
//!
//! - [RFC 8878 - Zstandard Compression](https://datatracker.ietf.org/doc/html/rfc8878)
//! - [Zstd Format Specification](https://github.com/facebook/zstd/blob/dev/doc/zstd_compression_format.md)
//! - [FSE Educational Decoder](https://github.com/facebook/zstd/blob/dev/doc/educational_decoder.md)

pub mod arena;
pub mod bits;
pub mod block;
pub mod context;
pub mod decompress;
pub mod frame;
pub mod fse;
pub mod huffman;

use std::io::Read;

pub use arena::{ScratchArena, DEFAULT_SCRATCH_CAPACITY};
pub use frame::{FrameHeader, ZSTD_MAGIC};

use unzst_core::{DecodeStats, DecoderConfig, Decompressor, Error, Result};

// =============================================================================
// Entry Points
// =============================================================================

/// Decode every frame in `input`, appending content bytes to `output`.
///
/// `scratch` holds block-scoped buffers and may be reused across calls.
pub fn decode<R: Read>(input: R, output: &mut Vec<u8>, scratch: &mut ScratchArena) -> Result<()> {
    decode_with_config(input, output, scratch, &DecoderConfig::default()).map(|_| ())
}

/// [`decode`] with explicit configuration. Returns the counters of this call.
pub fn decode_with_config<R: Read>(
    input: R,
    output: &mut Vec<u8>,
    scratch: &mut ScratchArena,
    config: &DecoderConfig,
) -> Result<DecodeStats> {
    decompress::decode_stream(input, output, scratch, config)
}

/// Decode a complete in-memory input.
pub fn decode_all(input: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let mut scratch = ScratchArena::new();
    decode(input, &mut output, &mut scratch)?;
    Ok(output)
}

/// Parse the header of the frame at the start of `input` without decoding it.
///
/// `input` starts with the magic number.
pub fn read_frame_header(input: &[u8]) -> Result<FrameHeader> {
    if input.len() < 4 {
        return Err(Error::unexpected_eof(input.len() as u64));
    }
    let magic = u32::from_le_bytes([input[0], input[1], input[2], input[3]]);
    if magic != ZSTD_MAGIC {
        return Err(Error::BadMagicNumber { magic });
    }
    FrameHeader::parse(&input[4..])
}

// =============================================================================
// Decoder Implementation
// =============================================================================

/// Reusable Zstandard decoder.
///
/// Keeps its scratch buffers between calls and accumulates statistics.
#[derive(Debug, Default)]
pub struct ZstdDecoder {
    config: DecoderConfig,
    scratch: ScratchArena,
    stats: DecodeStats,
}

impl ZstdDecoder {
    /// Create a decoder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder with the given configuration.
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            scratch: ScratchArena::new(),
            stats: DecodeStats::new(),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Clear statistics and release scratch capacity beyond one block.
    pub fn reset(&mut self) {
        self.stats = DecodeStats::new();
        self.scratch.shrink_to(DEFAULT_SCRATCH_CAPACITY);
    }
}

impl Decompressor for ZstdDecoder {
    fn decompress_into<R: Read>(&mut self, input: R, output: &mut Vec<u8>) -> Result<()> {
        let stats = decode_with_config(input, output, &mut self.scratch, &self.config)?;
        self.stats.merge(&stats);
        Ok(())
    }

    fn stats(&self) -> Option<DecodeStats> {
        Some(self.stats.clone())
    }
}

// =============================================================================
// Tests
// =============================================================================
