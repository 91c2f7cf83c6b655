//! Bounds-checked input stream shared by every decoder.
//!
//! The Mac formats handled here are big-endian, so every `read_*` method is
//! big-endian. A failed read leaves the cursor where it was; it is the
//! caller's job to seek to a well-defined position afterwards.

use thiserror::Error;
use zerocopy::{BE, FromBytes, I16, I32, U16, U32};

/// Low-level stream failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// Not enough bytes left to satisfy a read.
    #[error("insufficient data at offset {offset}: need {needed}, have {available}")]
    InsufficientData {
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// A seek outside of the buffer.
    #[error("seek out of range: {target} > {len}")]
    SeekOutOfRange { target: usize, len: usize },
    /// An integer width the reader does not support.
    #[error("unsupported integer width {0}")]
    BadWidth(usize),
}

/// Result type for stream operations
pub type StreamResult<T> = Result<T, StreamError>;

/// A cursor over a byte buffer.
#[derive(Debug, Clone)]
pub struct InputStream<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> InputStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// The whole underlying buffer.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Returns true when `pos` is a valid cursor position (the end included).
    ///
    /// Decoders call this with the computed end of a record before reading
    /// its body, so a lying length field is caught before anything is read.
    #[inline]
    pub fn check_position(&self, pos: usize) -> bool {
        pos <= self.data.len()
    }

    pub fn seek(&mut self, pos: usize) -> StreamResult<()> {
        if !self.check_position(pos) {
            return Err(StreamError::SeekOutOfRange {
                target: pos,
                len: self.data.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> StreamResult<()> {
        self.seek(self.pos.saturating_add(n))
    }

    /// Runs `f` and restores the cursor afterwards, whatever `f` returned.
    pub fn with_peek<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.pos;
        let result = f(self);
        self.pos = saved;
        result
    }

    #[inline]
    fn require(&self, n: usize) -> StreamResult<()> {
        if self.remaining() < n {
            return Err(StreamError::InsufficientData {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    pub fn read_block(&mut self, n: usize) -> StreamResult<&'a [u8]> {
        self.require(n)?;
        let block = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(block)
    }

    pub fn read_u8(&mut self) -> StreamResult<u8> {
        self.require(1)?;
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    pub fn read_i8(&mut self) -> StreamResult<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> StreamResult<u16> {
        let bytes = self.read_block(2)?;
        Ok(U16::<BE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or_default())
    }

    pub fn read_i16(&mut self) -> StreamResult<i16> {
        let bytes = self.read_block(2)?;
        Ok(I16::<BE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or_default())
    }

    pub fn read_u32(&mut self) -> StreamResult<u32> {
        let bytes = self.read_block(4)?;
        Ok(U32::<BE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or_default())
    }

    pub fn read_i32(&mut self) -> StreamResult<i32> {
        let bytes = self.read_block(4)?;
        Ok(I32::<BE>::read_from_bytes(bytes).map(|v| v.get()).unwrap_or_default())
    }

    /// Reads an unsigned big-endian integer of 1, 2 or 4 bytes.
    pub fn read_uint(&mut self, width: usize) -> StreamResult<u32> {
        match width {
            1 => self.read_u8().map(u32::from),
            2 => self.read_u16().map(u32::from),
            4 => self.read_u32(),
            _ => Err(StreamError::BadWidth(width)),
        }
    }

    /// Reads a signed big-endian integer of 1, 2 or 4 bytes.
    pub fn read_sint(&mut self, width: usize) -> StreamResult<i32> {
        match width {
            1 => self.read_i8().map(i32::from),
            2 => self.read_i16().map(i32::from),
            4 => self.read_i32(),
            _ => Err(StreamError::BadWidth(width)),
        }
    }
}
