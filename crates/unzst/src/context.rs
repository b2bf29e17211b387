//! Per-frame decoding state.
//!
//! Repeat offsets and the previous Huffman and FSE tables are carried from
//! block to block within one frame, never across frames.

use std::borrow::Cow;

use crate::block::RepeatOffsets;
use crate::fse::FseTable;
use crate::huffman::HuffmanTable;

/// State shared by the blocks of one frame.
#[derive(Debug)]
pub struct FrameContext {
    /// Maximum back-reference distance.
    pub window_size: u64,
    /// Output length when the frame began.
    pub frame_start: usize,
    /// Three most recent offsets.
    pub repeat_offsets: RepeatOffsets,
    /// Table of the most recent compressed literals section.
    pub huffman: Option<HuffmanTable>,
    /// Literal length table of the most recent sequence section.
    pub literal_lengths: Option<Cow<'static, FseTable>>,
    /// Offset table of the most recent sequence section.
    pub offsets: Option<Cow<'static, FseTable>>,
    /// Match length table of the most recent sequence section.
    pub match_lengths: Option<Cow<'static, FseTable>>,
}

impl FrameContext {
    /// Fresh state for a frame whose output starts at `frame_start`.
    pub fn new(window_size: u64, frame_start: usize) -> Self {
        Self {
            window_size,
            frame_start,
            repeat_offsets: RepeatOffsets::new(),
            huffman: None,
            literal_lengths: None,
            offsets: None,
            match_lengths: None,
        }
    }

    /// Bytes produced by this frame so far.
    #[inline]
    pub fn produced(&self, output: &[u8]) -> usize {
        output.len() - self.frame_start
    }
}
