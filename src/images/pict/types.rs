//! Raster records built by the bitmap and pixmap opcodes.
//!
//! Records are immutable once decoded: the drawing step only reads them.

use crate::common::geometry::Box2i;
use crate::common::style::RgbColor;

use super::region::Region;

/// A color lookup table. Entries are kept in stream order, the index value
/// stored next to each entry is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColorTable {
    pub flags: u16,
    pub colors: Vec<RgbColor>,
}

impl ColorTable {
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<RgbColor> {
        self.colors.get(index as usize).copied()
    }
}

/// A 1-bit monochrome raster.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub row_bytes: usize,
    pub bounds: Box2i,
    pub src_rect: Box2i,
    pub dst_rect: Box2i,
    pub mode: u16,
    pub region: Option<Region>,
    /// Unpacked rows, `row_bytes` bytes each, bit 7 first.
    pub pixels: Vec<u8>,
}

impl Bitmap {
    #[inline]
    pub fn width(&self) -> i32 {
        self.bounds.width()
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.bounds.height()
    }

    /// Is the pixel at `(x, y)` (relative to `bounds`) set?
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.pixels
            .get(y * self.row_bytes + x / 8)
            .is_some_and(|b| b & (0x80 >> (x % 8)) != 0)
    }
}

/// Decoded pixels of a pixmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelData {
    /// Palette indices, one per pixel, row-major.
    Indices(Vec<u32>),
    /// Direct colors, one per pixel, row-major.
    Colors(Vec<RgbColor>),
}

impl PixelData {
    pub fn len(&self) -> usize {
        match self {
            PixelData::Indices(v) => v.len(),
            PixelData::Colors(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The fixed part of a PixMap record.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixmapHeader {
    pub row_bytes: usize,
    pub bounds: Box2i,
    pub version: u16,
    pub pack_type: u16,
    pub pack_size: u32,
    pub resolution: (f32, f32),
    pub pixel_type: u16,
    pub pixel_size: u16,
    pub comp_count: u16,
    pub comp_size: u16,
}

impl PixmapHeader {
    #[inline]
    pub fn width(&self) -> i32 {
        self.bounds.width()
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.bounds.height()
    }

    /// True for direct-color pixmaps, which carry no color table.
    #[inline]
    pub fn is_direct(&self) -> bool {
        self.pixel_size >= 16
    }
}

/// An indexed or direct color raster.
#[derive(Debug, Clone)]
pub struct Pixmap {
    pub header: PixmapHeader,
    pub src_rect: Box2i,
    pub dst_rect: Box2i,
    pub mode: u16,
    pub region: Option<Region>,
    /// Absent only for direct color pixmaps.
    pub color_table: Option<ColorTable>,
    /// `None` when the pixel size is not one QuickDraw defines.
    pub pixels: Option<PixelData>,
}

impl Pixmap {
    #[inline]
    pub fn width(&self) -> i32 {
        self.header.width()
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.header.height()
    }

    /// Color of the pixel at `(x, y)` relative to the pixmap bounds.
    pub fn color_at(&self, x: usize, y: usize) -> Option<RgbColor> {
        let idx = y * self.width().max(0) as usize + x;
        match self.pixels.as_ref()? {
            PixelData::Colors(colors) => colors.get(idx).copied(),
            PixelData::Indices(indices) => {
                let index = *indices.get(idx)?;
                self.color_table.as_ref()?.get(index)
            },
        }
    }
}
