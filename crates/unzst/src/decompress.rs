//! Full Zstd decompression pipeline.
//!
//! [`decode_frame`] drives the block decoder across one content frame;
//! [`decode_stream`] walks a concatenation of content and skippable frames.

use std::io::Read;

use tracing::{debug, warn};
use unzst_core::{DecodeStats, DecoderConfig, Error, Result};

use crate::arena::{try_reserve, ScratchArena};
use crate::block::decode_block;
use crate::context::FrameContext;
use crate::frame::{
    is_skippable_magic, ByteSource, ContentHash, FrameDescriptor, FrameHeader,
    MAX_FRAME_HEADER_SIZE, ZSTD_MAGIC,
};

/// Decode one content frame whose magic number was already consumed.
///
/// The frame's bytes are appended to `output`. On error, bytes of the
/// partially decoded frame stay in `output`.
pub fn decode_frame<R: Read>(
    source: &mut ByteSource<R>,
    output: &mut Vec<u8>,
    scratch: &mut ScratchArena,
    config: &DecoderConfig,
    stats: &mut DecodeStats,
) -> Result<FrameHeader> {
    let frame_offset = source.position().saturating_sub(4);

    let mut raw_header = [0u8; MAX_FRAME_HEADER_SIZE];
    raw_header[0] = source.read_u8()?;
    let header_size = FrameDescriptor::new(raw_header[0])?.header_size();
    source.read_exact(&mut raw_header[1..header_size])?;
    let header = FrameHeader::parse(&raw_header[..header_size])?;

    if header.window_size > config.max_window_size {
        return Err(Error::invalid_at(
            format!(
                "window size {} exceeds limit {}",
                header.window_size, config.max_window_size
            ),
            frame_offset,
        ));
    }
    if header.dictionary_id != 0 {
        warn!(
            dictionary_id = header.dictionary_id,
            "frame names a dictionary; decoding without it"
        );
    }
    debug!(
        offset = frame_offset,
        window_size = header.window_size,
        content_size = ?header.content_size,
        checksum = header.has_checksum,
        "frame start"
    );

    let frame_start = output.len();
    if let Some(size) = header.content_size {
        let reserve = size.min(config.output_reserve_limit as u64) as usize;
        try_reserve(output, reserve)?;
    }

    let mut ctx = FrameContext::new(header.window_size, frame_start);
    let mut hash = (header.has_checksum && config.verify_checksum).then(ContentHash::new);
    loop {
        let block_start = output.len();
        let more = decode_block(source, &mut ctx, output, scratch, stats)?;
        if let Some(hash) = hash.as_mut() {
            hash.update(&output[block_start..]);
        }
        if !more {
            break;
        }
    }

    let produced = ctx.produced(output) as u64;
    stats.frames += 1;
    stats.bytes_out += produced;

    if let Some(expected) = header.content_size {
        if config.verify_content_size && produced != expected {
            return Err(Error::invalid_at(
                format!(
                    "frame declares {} bytes but decoded {}",
                    expected, produced
                ),
                frame_offset,
            ));
        }
    }

    if header.has_checksum {
        let expected = source.read_u32_le()?;
        if let Some(hash) = hash {
            let actual = hash.checksum();
            if actual != expected {
                return Err(Error::bad_checksum(expected, actual));
            }
        }
    }

    debug!(bytes = produced, "frame complete");
    Ok(header)
}

/// Decode every frame in `input`, appending content to `output`.
///
/// Skippable frames are passed over. Returns the counters of this call.
pub fn decode_stream<R: Read>(
    input: R,
    output: &mut Vec<u8>,
    scratch: &mut ScratchArena,
    config: &DecoderConfig,
) -> Result<DecodeStats> {
    let mut source = ByteSource::new(input);
    let mut stats = DecodeStats::new();

    loop {
        let mut magic = [0u8; 4];
        match source.read_up_to(&mut magic)? {
            0 => break,
            4 => {}
            _ => return Err(Error::unexpected_eof(source.position())),
        }

        let magic = u32::from_le_bytes(magic);
        if magic == ZSTD_MAGIC {
            decode_frame(&mut source, output, scratch, config, &mut stats)?;
        } else if is_skippable_magic(magic) {
            let size = source.read_u32_le()?;
            source.skip(u64::from(size))?;
            stats.skippable_frames += 1;
            debug!(magic, size, "skippable frame");
        } else {
            return Err(Error::BadMagicNumber { magic });
        }
    }

    stats.bytes_in = source.position();
    Ok(stats)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::xxhash64;

    const MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

    /// Single-segment frame with a 1-byte content size and one raw block.
    fn raw_frame(data: &[u8], descriptor: u8) -> Vec<u8> {
        let mut frame = MAGIC.to_vec();
        frame.push(descriptor);
        frame.push(data.len() as u8);
        let block = ((data.len() as u32) << 3) | 1;
        frame.extend_from_slice(&block.to_le_bytes()[..3]);
        frame.extend_from_slice(data);
        frame
    }

    fn run(input: &[u8]) -> Result<Vec<u8>> {
        run_with(input, &DecoderConfig::default()).map(|(output, _)| output)
    }

    fn run_with(input: &[u8], config: &DecoderConfig) -> Result<(Vec<u8>, DecodeStats)> {
        let mut output = Vec::new();
        let mut scratch = ScratchArena::new();
        let stats = decode_stream(input, &mut output, &mut scratch, config)?;
        Ok((output, stats))
    }

    #[test]
    fn test_simple_raw_frame() {
        let frame = raw_frame(b"Hello", 0x20);
        assert_eq!(
            frame,
            [0x28, 0xB5, 0x2F, 0xFD, 0x20, 0x05, 0x29, 0x00, 0x00, b'H', b'e', b'l', b'l', b'o']
        );
        assert_eq!(run(&frame).unwrap(), b"Hello");
    }

    #[test]
    fn test_rle_frame() {
        let mut frame = MAGIC.to_vec();
        frame.extend_from_slice(&[0x20, 10]);
        // Block header: last=1, type=RLE(1), size=10
        frame.extend_from_slice(&[0x53, 0x00, 0x00, b'X']);
        assert_eq!(run(&frame).unwrap(), vec![b'X'; 10]);
    }

    #[test]
    fn test_multi_block_frame() {
        let mut frame = MAGIC.to_vec();
        frame.extend_from_slice(&[0x20, 8]);
        frame.extend_from_slice(&[0x28, 0x00, 0x00]);
        frame.extend_from_slice(b"Hello");
        frame.extend_from_slice(&[0x19, 0x00, 0x00]);
        frame.extend_from_slice(b"!!!");
        assert_eq!(run(&frame).unwrap(), b"Hello!!!");
    }

    #[test]
    fn test_window_descriptor_frame() {
        // No content size, 1 KiB window
        let mut frame = MAGIC.to_vec();
        frame.extend_from_slice(&[0x00, 0x00, 0x29, 0x00, 0x00]);
        frame.extend_from_slice(b"Hello");
        assert_eq!(run(&frame).unwrap(), b"Hello");
    }

    #[test]
    fn test_content_size_mismatch() {
        let mut frame = raw_frame(b"Hello", 0x20);
        frame[5] = 10;
        // Window 10 still admits the 5-byte block
        assert!(matches!(run(&frame), Err(Error::InvalidFormat { .. })));

        let config = DecoderConfig::new().with_verify_content_size(false);
        assert_eq!(run_with(&frame, &config).unwrap().0, b"Hello");
    }

    #[test]
    fn test_frame_with_checksum() {
        let mut frame = raw_frame(b"Hello", 0x24);
        let checksum = xxhash64(b"Hello", 0) as u32;
        frame.extend_from_slice(&checksum.to_le_bytes());
        assert_eq!(run(&frame).unwrap(), b"Hello");
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut frame = raw_frame(b"Hello", 0x24);
        frame.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let mut output = Vec::new();
        let mut scratch = ScratchArena::new();
        let result = decode_stream(&frame[..], &mut output, &mut scratch, &DecoderConfig::default());
        match result {
            Err(Error::BadChecksum { expected, actual }) => {
                assert_eq!(expected, 0);
                assert_eq!(actual, xxhash64(b"Hello", 0) as u32);
            }
            other => panic!("expected checksum error, got {:?}", other),
        }
        assert_eq!(output, b"Hello");

        let config = DecoderConfig::new().with_verify_checksum(false);
        assert_eq!(run_with(&frame, &config).unwrap().0, b"Hello");
    }

    #[test]
    fn test_missing_checksum_trailer() {
        let frame = raw_frame(b"Hello", 0x24);
        assert!(matches!(run(&frame), Err(Error::UnexpectedEof { .. })));
    }

    #[test]
    fn test_reserved_descriptor_bit() {
        let frame = raw_frame(b"Hello", 0x28);
        assert!(matches!(run(&frame), Err(Error::InvalidFormat { .. })));
    }

    #[test]
    fn test_window_too_large() {
        let mut frame = MAGIC.to_vec();
        frame.extend_from_slice(&[0x00, 0xF8, 0x29, 0x00, 0x00]);
        frame.extend_from_slice(b"Hello");
        assert!(matches!(run(&frame), Err(Error::InvalidFormat { .. })));

        let config = DecoderConfig::new().with_max_window_size(u64::MAX);
        assert_eq!(run_with(&frame, &config).unwrap().0, b"Hello");
    }

    #[test]
    fn test_dictionary_id_frame_decodes() {
        let mut frame = MAGIC.to_vec();
        // Single segment, 1-byte dictionary id, 1-byte content size
        frame.extend_from_slice(&[0x21, 0x07, 0x05, 0x29, 0x00, 0x00]);
        frame.extend_from_slice(b"Hello");
        assert_eq!(run(&frame).unwrap(), b"Hello");
    }

    #[test]
    fn test_truncated_frame_header() {
        let mut frame = MAGIC.to_vec();
        frame.push(0x20);
        assert!(matches!(run(&frame), Err(Error::UnexpectedEof { .. })));
    }

    #[test]
    fn test_empty_input() {
        let (output, stats) = run_with(&[], &DecoderConfig::default()).unwrap();
        assert!(output.is_empty());
        assert_eq!(stats, DecodeStats::new());
    }

    #[test]
    fn test_short_input() {
        for len in 1..4 {
            assert!(matches!(
                run(&MAGIC[..len]),
                Err(Error::UnexpectedEof { .. })
            ));
        }
    }

    #[test]
    fn test_bad_magic() {
        assert!(matches!(
            run(&[0x01, 0x02, 0x03, 0x04]),
            Err(Error::BadMagicNumber { magic: 0x04030201 })
        ));
    }

    #[test]
    fn test_skippable_frame() {
        let mut input = 0x184D2A53u32.to_le_bytes().to_vec();
        input.extend_from_slice(&3u32.to_le_bytes());
        input.extend_from_slice(b"zzz");
        input.extend(raw_frame(b"Hello", 0x20));

        let (output, stats) = run_with(&input, &DecoderConfig::default()).unwrap();
        assert_eq!(output, b"Hello");
        assert_eq!(stats.skippable_frames, 1);
        assert_eq!(stats.frames, 1);
        assert_eq!(stats.bytes_in, input.len() as u64);
    }

    #[test]
    fn test_truncated_skippable_frame() {
        let mut input = 0x184D2A50u32.to_le_bytes().to_vec();
        input.extend_from_slice(&10u32.to_le_bytes());
        input.extend_from_slice(b"short");
        assert!(matches!(run(&input), Err(Error::UnexpectedEof { .. })));
    }

    #[test]
    fn test_concatenated_frames() {
        let mut input = raw_frame(b"Hello", 0x20);
        input.extend(raw_frame(b", World", 0x20));

        let (output, stats) = run_with(&input, &DecoderConfig::default()).unwrap();
        assert_eq!(output, b"Hello, World");
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.raw_blocks, 2);
        assert_eq!(stats.bytes_out, 12);
    }

    #[test]
    fn test_decode_frame_returns_header() {
        let frame = raw_frame(b"Hello", 0x20);
        let mut source = ByteSource::new(&frame[4..]);
        let mut output = Vec::new();
        let mut scratch = ScratchArena::new();
        let mut stats = DecodeStats::new();
        let header = decode_frame(
            &mut source,
            &mut output,
            &mut scratch,
            &DecoderConfig::default(),
            &mut stats,
        )
        .unwrap();
        assert_eq!(header.content_size, Some(5));
        assert!(header.single_segment);
        assert_eq!(output, b"Hello");
    }
}
