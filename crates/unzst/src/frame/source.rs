//! Forward byte reader over the compressed input.

use std::io::{self, Read};

use unzst_core::{Error, Result};

/// Pull-based byte source that tracks its position.
///
/// End of input mid-structure surfaces as [`Error::UnexpectedEof`].
#[derive(Debug)]
pub struct ByteSource<R> {
    inner: R,
    position: u64,
}

impl<R: Read> ByteSource<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Fill as much of `buf` as the input provides.
    ///
    /// A short count means the input is exhausted.
    pub fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.position += filled as u64;
        Ok(filled)
    }

    /// Fill `buf` completely.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.read_up_to(buf)? < buf.len() {
            return Err(Error::unexpected_eof(self.position));
        }
        Ok(())
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Read a little-endian `u32`.
    pub fn read_u32_le(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Append exactly `len` bytes to `out`.
    pub fn read_into(&mut self, out: &mut Vec<u8>, len: usize) -> Result<()> {
        out.try_reserve(len)
            .map_err(|_| Error::allocation_failed(len as u64))?;
        let read = (&mut self.inner).take(len as u64).read_to_end(out)?;
        self.position += read as u64;
        if read < len {
            return Err(Error::unexpected_eof(self.position));
        }
        Ok(())
    }

    /// Discard exactly `len` bytes without buffering them.
    pub fn skip(&mut self, len: u64) -> Result<()> {
        let skipped = io::copy(&mut (&mut self.inner).take(len), &mut io::sink())?;
        self.position += skipped;
        if skipped < len {
            return Err(Error::unexpected_eof(self.position));
        }
        Ok(())
    }
}
