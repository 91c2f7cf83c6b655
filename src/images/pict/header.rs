// PICT file header
//
// picSize (2 bytes) + picFrame (8 bytes), then the version opcode. Files
// coming from disk may carry an extra 512-byte application header first.

use log::debug;

use crate::common::error::{Error, Result};
use crate::common::geometry::Box2i;
use crate::common::stream::InputStream;

use super::region::read_rect;

const APPLICATION_HEADER_SIZE: usize = 512;
/// Resolution of pictures without an extended header.
pub const DEFAULT_RESOLUTION: f32 = 72.0;

/// PICT file version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictVersion {
    /// Version 1, one-byte opcodes
    V1,
    /// Version 2, two-byte word-aligned opcodes
    V2,
}

/// PICT file header
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PictHeader {
    /// Version of the PICT file
    pub version: PictVersion,
    /// Picture frame
    pub frame: Box2i,
    /// Whether this file has the 512-byte header
    pub has_512_header: bool,
    /// Horizontal and vertical resolution, from an extended `HeaderOp`
    pub resolution: (f32, f32),
    /// Offset of the first opcode following the version opcode
    pub data_start: usize,
}

impl PictHeader {
    /// Parse PICT header from data.
    ///
    /// The header is tried at offset 0 first, then after a 512-byte
    /// application header. Failing both is the one fatal decode error.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut input = InputStream::new(data);
        for offset in [0, APPLICATION_HEADER_SIZE] {
            if let Some(header) = Self::parse_at(&mut input, offset) {
                return Ok(header);
            }
        }
        Err(Error::InvalidFormat(format!(
            "no PICT version opcode found in {} bytes",
            data.len()
        )))
    }

    fn parse_at(input: &mut InputStream<'_>, offset: usize) -> Option<Self> {
        input.seek(offset).ok()?;
        let _pic_size = input.read_u16().ok()?;
        let frame = read_rect(input).ok()?;
        if frame.width() <= 0 || frame.height() <= 0 {
            return None;
        }

        let version = match input.with_peek(|s| s.read_u16()).ok()? {
            0x1101 => {
                input.skip(2).ok()?;
                PictVersion::V1
            },
            0x0011 => {
                input.skip(2).ok()?;
                if input.read_u16().ok()? != 0x02FF {
                    return None;
                }
                PictVersion::V2
            },
            _ => return None,
        };

        let mut header = Self {
            version,
            frame,
            has_512_header: offset == APPLICATION_HEADER_SIZE,
            resolution: (DEFAULT_RESOLUTION, DEFAULT_RESOLUTION),
            data_start: input.tell(),
        };
        if version == PictVersion::V2 {
            header.read_header_op(input);
        }
        Some(header)
    }

    /// Looks ahead for a `HeaderOp`. The extended form (version -2) holds
    /// the native resolution and source rectangle; the opcode itself is left
    /// in the stream for the decode loop to skip.
    fn read_header_op(&mut self, input: &mut InputStream<'_>) {
        let found = input.with_peek(|s| -> Option<(f32, f32, Box2i)> {
            if s.read_u16().ok()? != 0x0C00 || s.read_i16().ok()? != -2 {
                return None;
            }
            let _reserved = s.read_u16().ok()?;
            let h_res = s.read_u32().ok()? as f32 / 65536.0;
            let v_res = s.read_u32().ok()? as f32 / 65536.0;
            let src = read_rect(s).ok()?;
            Some((h_res, v_res, src))
        });
        if let Some((h_res, v_res, src)) = found {
            debug!("pict: extended header, {}x{} dpi, source {}", h_res, v_res, src);
            if h_res > 0.0 && v_res > 0.0 {
                self.resolution = (h_res, v_res);
            }
            if src.width() > 0 && src.height() > 0 {
                self.frame = src;
            }
        }
    }

    /// Get width of the picture
    pub fn width(&self) -> i32 {
        self.frame.width()
    }

    /// Get height of the picture
    pub fn height(&self) -> i32 {
        self.frame.height()
    }
}
