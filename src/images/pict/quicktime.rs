//! QuickTime images embedded with opcodes `0x8200` and `0x8201`.
//!
//! A compressed QuickTime record carries a transformation matrix, an
//! optional matte, an optional mask region and an image description
//! followed by the compressed bytes. Well-known codecs are handed to the
//! listener as they are.

use log::debug;

use super::region::read_rect;
use crate::common::error::{Error, Result};
use crate::common::geometry::{Box2f, Box2i, Point2f};
use crate::common::stream::InputStream;
use crate::listener::Picture;

/// Offset of `dataSize` inside an image description.
const DATA_SIZE_OFFSET: usize = 44;

/// An embedded QuickTime image.
#[derive(Debug, Clone, PartialEq)]
pub struct QuickTimeImage {
    /// Destination box: the source rectangle moved by the matrix.
    pub position: Box2f,
    /// Codec four-character code.
    pub codec: [u8; 4],
    /// Present when the codec is one the listener can take as is.
    pub picture: Option<Picture>,
}

/// Mime type of a QuickTime codec.
pub fn codec_mime_type(codec: &[u8; 4]) -> Option<&'static str> {
    match codec {
        b"jpeg" => Some("image/jpeg"),
        b"png " => Some("image/png"),
        b"tiff" => Some("image/tiff"),
        _ => None,
    }
}

/// A 3x3 QuickTime matrix reduced to its affine part.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    tx: f32,
    ty: f32,
}

impl Matrix {
    fn read(input: &mut InputStream<'_>) -> Result<Self> {
        let mut values = [0f32; 9];
        for (i, v) in values.iter_mut().enumerate() {
            let raw = input.read_i32()? as f32;
            // the third column is 2.30 fixed point, the rest 16.16
            *v = if i % 3 == 2 { raw / (1u32 << 30) as f32 } else { raw / 65536.0 };
        }
        Ok(Self {
            a: values[0],
            b: values[1],
            c: values[3],
            d: values[4],
            tx: values[6],
            ty: values[7],
        })
    }

    fn apply(&self, bbox: &Box2i) -> Box2f {
        let corners = [
            (bbox.min.x, bbox.min.y),
            (bbox.max.x, bbox.min.y),
            (bbox.min.x, bbox.max.y),
            (bbox.max.x, bbox.max.y),
        ]
        .map(|(x, y)| {
            let (x, y) = (x as f32, y as f32);
            Point2f::new(self.a * x + self.c * y + self.tx, self.b * x + self.d * y + self.ty)
        });
        Box2f::bounding(&corners).unwrap_or_else(|| bbox.to_f32())
    }
}

/// Reads the body of a QuickTime opcode, ending at `end`.
///
/// `compressed` selects `0x8200`; the uncompressed form has no source
/// rectangle nor image description, only the matrix and matte.
pub fn read_quicktime(
    input: &mut InputStream<'_>,
    end: usize,
    compressed: bool,
) -> Result<Option<QuickTimeImage>> {
    let _version = input.read_u16()?;
    let matrix = Matrix::read(input)?;
    let matte_size = input.read_u32()? as usize;
    let _matte_rect = read_rect(input)?;
    if !compressed {
        return Ok(None);
    }
    let _mode = input.read_u16()?;
    let src_rect = read_rect(input)?;
    let _accuracy = input.read_u32()?;
    let mask_size = input.read_u32()? as usize;
    input.skip(matte_size)?;
    input.skip(mask_size)?;

    let desc_start = input.tell();
    let desc_size = input.read_u32()? as usize;
    let mut codec = [0u8; 4];
    codec.copy_from_slice(input.read_block(4)?);
    if desc_size < DATA_SIZE_OFFSET + 4 || desc_start + desc_size > end {
        return Err(Error::CorruptedFile(format!(
            "image description of {} bytes does not fit",
            desc_size
        )));
    }
    input.seek(desc_start + DATA_SIZE_OFFSET)?;
    let data_size = input.read_u32()? as usize;
    input.seek(desc_start + desc_size)?;
    let data_size = data_size.min(end.saturating_sub(input.tell()));

    let position = matrix.apply(&src_rect);
    let picture = match codec_mime_type(&codec) {
        Some(mime) => Some(Picture::new(input.read_block(data_size)?.to_vec(), mime)),
        None => {
            debug!("quicktime: unhandled codec {:?}", String::from_utf8_lossy(&codec));
            None
        },
    };
    Ok(Some(QuickTimeImage {
        position,
        codec,
        picture,
    }))
}
