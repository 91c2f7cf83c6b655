//! Bitmap and pixmap decoding.
//!
//! Reads the PixMap/BitMap headers, color tables and scanlines of the
//! `BitsRect`, `PackBitsRect` and `DirectBitsRect` families, then splits the
//! unpacked rows into palette indices or direct colors.

use log::{debug, warn};

use super::data::unpack_bits;
use super::options::PaletteFallback;
use super::region::{Region, read_rect, read_region};
use super::state::PenPattern;
use super::types::{Bitmap, ColorTable, PixelData, Pixmap, PixmapHeader};
use crate::common::error::{Error, Result};
use crate::common::geometry::Box2i;
use crate::common::stream::InputStream;
use crate::common::style::{Pattern, RgbColor};

/// Largest color table QuickDraw can describe (16-bit indices).
const MAX_COLOR_TABLE_SIZE: usize = 1 << 16;

/// Reads a color table: seed, flags, `size` (entry count - 1), entries.
pub fn read_color_table(input: &mut InputStream<'_>) -> Result<ColorTable> {
    let start = input.tell();
    let _seed = input.read_u32()?;
    let flags = input.read_u16()?;
    let size = input.read_i16()?;
    let count = (size as i32 + 1).max(0) as usize;
    if count > MAX_COLOR_TABLE_SIZE || !input.check_position(input.tell() + count * 8) {
        return Err(Error::CorruptedFile(format!(
            "color table of {} entries at offset {} does not fit",
            count, start
        )));
    }
    let mut colors = Vec::with_capacity(count);
    for _ in 0..count {
        let _value = input.read_u16()?;
        let r = input.read_u16()?;
        let g = input.read_u16()?;
        let b = input.read_u16()?;
        colors.push(RgbColor::from_rgb16(r, g, b));
    }
    Ok(ColorTable { flags, colors })
}

/// Reads a PixMap header, `rowBytes` included (50 bytes).
pub fn read_pixmap_header(input: &mut InputStream<'_>) -> Result<PixmapHeader> {
    let row_bytes = (input.read_u16()? & 0x3FFF) as usize;
    let bounds = read_rect(input)?;
    let version = input.read_u16()?;
    let pack_type = input.read_u16()?;
    let pack_size = input.read_u32()?;
    let h_res = input.read_u32()? as f32 / 65536.0;
    let v_res = input.read_u32()? as f32 / 65536.0;
    let pixel_type = input.read_u16()?;
    let pixel_size = input.read_u16()?;
    let comp_count = input.read_u16()?;
    let comp_size = input.read_u16()?;
    let _plane_bytes = input.read_u32()?;
    let _table = input.read_u32()?;
    let _reserved = input.read_u32()?;

    if bounds.width() < 0 || bounds.height() < 0 {
        return Err(Error::CorruptedFile(format!("pixmap bounds {} are inverted", bounds)));
    }
    Ok(PixmapHeader {
        row_bytes,
        bounds,
        version,
        pack_type,
        pack_size,
        resolution: (h_res, v_res),
        pixel_type,
        pixel_size,
        comp_count,
        comp_size,
    })
}

/// How the scanlines of a raster are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RowLayout {
    /// Rows carry a byte count and are PackBits compressed.
    pub packed: bool,
    /// PackBits unit: 2 for 16-bit pixels, 1 otherwise.
    pub unit: usize,
    /// Length of one unpacked row.
    pub row_len: usize,
    /// 32-bit rows stored as separate R, G, B planes.
    pub planar: bool,
}

pub(crate) fn row_layout(header: &PixmapHeader, packed_opcode: bool) -> RowLayout {
    let width = header.width().max(0) as usize;
    let rb = header.row_bytes;
    let packed = packed_opcode && rb >= 8 && header.pack_type != 1 && header.pack_type != 2;
    match header.pixel_size {
        16 => RowLayout {
            packed,
            unit: 2,
            row_len: rb,
            planar: false,
        },
        32 if header.pack_type == 2 => RowLayout {
            packed: false,
            unit: 1,
            row_len: 3 * width,
            planar: false,
        },
        32 if packed => {
            let comps = if header.comp_count == 4 { 4 } else { 3 };
            RowLayout {
                packed,
                unit: 1,
                row_len: comps * width,
                planar: comps == 3,
            }
        },
        _ => RowLayout {
            packed,
            unit: 1,
            row_len: rb,
            planar: false,
        },
    }
}

/// Reads `height` scanlines.
///
/// A row that fails to unpack does not stop the reading: the byte counts of
/// the following rows are still honored so the stream stays aligned, and
/// `Ok(None)` is returned at the end.
pub(crate) fn read_rows(
    input: &mut InputStream<'_>,
    row_bytes: usize,
    height: usize,
    layout: RowLayout,
) -> Result<Option<Vec<u8>>> {
    if !layout.packed {
        let data = input.read_block(layout.row_len * height)?;
        return Ok(Some(data.to_vec()));
    }

    let mut out = Vec::with_capacity((layout.row_len * height).min(1 << 20));
    let mut valid = true;
    for y in 0..height {
        let count = if row_bytes > 250 {
            input.read_u16()? as usize
        } else {
            input.read_u8()? as usize
        };
        let block = input.read_block(count)?;
        if !valid {
            continue;
        }
        match unpack_bits(block, layout.row_len, layout.unit) {
            Ok(row) => out.extend_from_slice(&row),
            Err(err) => {
                warn!("row {} at offset {}: {}", y, input.tell(), err);
                valid = false;
            },
        }
    }
    Ok(valid.then_some(out))
}

/// Splits unpacked rows into pixels. Returns the pixels and the largest
/// palette index seen (0 for direct colors).
pub(crate) fn decode_pixels(
    header: &PixmapHeader,
    data: &[u8],
    layout: RowLayout,
) -> Option<(PixelData, u32)> {
    let width = header.width().max(0) as usize;
    let height = header.height().max(0) as usize;
    let row_len = layout.row_len;
    if data.len() < row_len * height {
        return None;
    }
    let rows = (0..height).map(|y| &data[y * row_len..(y + 1) * row_len]);

    match header.pixel_size {
        size @ (1 | 2 | 4 | 8) => {
            let bits = size as usize;
            if row_len * 8 < width * bits {
                debug!("pixmap: {} row bytes cannot hold {} pixels", row_len, width);
                return None;
            }
            let mask = (1u32 << bits) - 1;
            let mut indices = Vec::with_capacity(width * height);
            let mut max_index = 0;
            for row in rows {
                for x in 0..width {
                    let bit = x * bits;
                    let shift = 8 - bits - bit % 8;
                    let index = (row[bit / 8] as u32 >> shift) & mask;
                    max_index = max_index.max(index);
                    indices.push(index);
                }
            }
            Some((PixelData::Indices(indices), max_index))
        },
        16 => {
            if row_len < 2 * width {
                return None;
            }
            let mut colors = Vec::with_capacity(width * height);
            for row in rows {
                for x in 0..width {
                    let val = u16::from_be_bytes([row[2 * x], row[2 * x + 1]]);
                    colors.push(RgbColor::new(
                        ((val >> 7) & 0xF8) as u8,
                        ((val >> 2) & 0xF8) as u8,
                        ((val << 3) & 0xF8) as u8,
                    ));
                }
            }
            Some((PixelData::Colors(colors), 0))
        },
        24 | 32 => {
            let mut colors = Vec::with_capacity(width * height);
            if layout.planar {
                if row_len < 3 * width {
                    return None;
                }
                for row in rows {
                    for x in 0..width {
                        colors.push(RgbColor::new(row[x], row[width + x], row[2 * width + x]));
                    }
                }
            } else {
                let stride = if row_len >= 4 * width { 4 } else { 3 };
                if row_len < stride * width {
                    return None;
                }
                let has_alpha = stride == 4 && header.comp_count == 4;
                for row in rows {
                    for x in 0..width {
                        let p = x * stride;
                        colors.push(match stride {
                            4 if has_alpha => {
                                RgbColor::with_alpha(row[p + 1], row[p + 2], row[p + 3], 255 - row[p])
                            },
                            4 => RgbColor::new(row[p + 1], row[p + 2], row[p + 3]),
                            _ => RgbColor::new(row[p], row[p + 1], row[p + 2]),
                        });
                    }
                }
            }
            Some((PixelData::Colors(colors), 0))
        },
        other => {
            warn!("pixmap: unknown pixel size {}", other);
            None
        },
    }
}

/// Makes every index up to `max_index` resolvable.
///
/// Pixel patterns sometimes ship a partial palette and rely on the
/// foreground/background convention for the rest (index 0 white, last index
/// black). This is a heuristic, see [`PaletteFallback`].
pub(crate) fn complete_palette(
    table: &mut ColorTable,
    indices: &mut [u32],
    max_index: u32,
    pixel_size: u16,
    fallback: PaletteFallback,
) {
    let len = table.len();
    if (max_index as usize) < len {
        return;
    }
    debug!("palette: index {} used with {} colors", max_index, len);
    if fallback == PaletteFallback::ClampToLast && len > 0 {
        let last = (len - 1) as u32;
        for index in indices.iter_mut() {
            *index = (*index).min(last);
        }
        return;
    }
    let top = ((1u32 << pixel_size.min(16)) - 1).max(max_index).max(1);
    for index in len as u32..=max_index {
        let level = 255 - (255 * index / top);
        table.colors.push(RgbColor::gray(level as u8));
    }
}

/// Reads a 1-bit BitMap record whose `rowBytes` has its high bit cleared.
pub fn read_bitmap(
    input: &mut InputStream<'_>,
    packed_opcode: bool,
    has_region: bool,
) -> Result<Option<Bitmap>> {
    let row_bytes = (input.read_u16()? & 0x7FFF) as usize;
    let bounds = read_rect(input)?;
    let src_rect = read_rect(input)?;
    let dst_rect = read_rect(input)?;
    let mode = input.read_u16()?;
    let region = if has_region { Some(read_region(input)?) } else { None };

    let (width, height) = (bounds.width(), bounds.height());
    if width < 0 || height < 0 || row_bytes * 8 < width as usize {
        return Err(Error::CorruptedFile(format!(
            "bitmap {} does not fit {} row bytes",
            bounds, row_bytes
        )));
    }
    let layout = RowLayout {
        packed: packed_opcode && row_bytes >= 8,
        unit: 1,
        row_len: row_bytes,
        planar: false,
    };
    let Some(pixels) = read_rows(input, row_bytes, height as usize, layout)? else {
        return Ok(None);
    };
    Ok(Some(Bitmap {
        row_bytes,
        bounds,
        src_rect,
        dst_rect,
        mode,
        region,
        pixels,
    }))
}

/// Reads the pixels following a pixmap header, completing the palette of
/// indexed data. `Ok(None)` means the scanlines could not be unpacked.
fn read_pixel_data(
    input: &mut InputStream<'_>,
    header: &PixmapHeader,
    packed_opcode: bool,
    color_table: &mut Option<ColorTable>,
    fallback: PaletteFallback,
) -> Result<Option<Option<PixelData>>> {
    let layout = row_layout(header, packed_opcode);
    let height = header.height().max(0) as usize;
    let Some(raw) = read_rows(input, header.row_bytes, height, layout)? else {
        return Ok(None);
    };
    let Some((mut pixels, max_index)) = decode_pixels(header, &raw, layout) else {
        return Ok(Some(None));
    };
    if let PixelData::Indices(indices) = &mut pixels {
        let table = color_table.get_or_insert_with(ColorTable::default);
        complete_palette(table, indices, max_index, header.pixel_size, fallback);
    }
    Ok(Some(Some(pixels)))
}

/// Reads a PixMap record (after an optional base address).
pub fn read_pixmap(
    input: &mut InputStream<'_>,
    direct: bool,
    packed_opcode: bool,
    has_region: bool,
    fallback: PaletteFallback,
) -> Result<Option<Pixmap>> {
    let header = read_pixmap_header(input)?;
    let mut color_table = if direct {
        None
    } else {
        Some(read_color_table(input)?)
    };
    let src_rect = read_rect(input)?;
    let dst_rect = read_rect(input)?;
    let mode = input.read_u16()?;
    let region = if has_region { Some(read_region(input)?) } else { None };

    let Some(pixels) = read_pixel_data(input, &header, packed_opcode, &mut color_table, fallback)? else {
        return Ok(None);
    };
    Ok(Some(Pixmap {
        header,
        src_rect,
        dst_rect,
        mode,
        region,
        color_table,
        pixels,
    }))
}

/// Reads a `PixPat` record used by `BkPixPat`, `PnPixPat` and `FillPixPat`.
///
/// Type 1 patterns carry a full pixmap, reduced here to a two color pattern
/// masked by the old-style 8x8 pattern; type 2 is a dithered RGB color.
pub fn read_pixel_pattern(
    input: &mut InputStream<'_>,
    fallback: PaletteFallback,
) -> Result<PenPattern> {
    let pat_type = input.read_u16()?;
    let mut bits = [0u8; 8];
    bits.copy_from_slice(input.read_block(8)?);
    match pat_type {
        1 => {
            let header = read_pixmap_header(input)?;
            let mut color_table = Some(read_color_table(input)?);
            let pixels = read_pixel_data(input, &header, true, &mut color_table, fallback)?.flatten();
            let pixmap = Pixmap {
                header,
                src_rect: header.bounds,
                dst_rect: header.bounds,
                mode: 0,
                region: None,
                color_table,
                pixels,
            };
            Ok(reduce_pixel_pattern(&pixmap, bits))
        },
        2 => {
            let r = input.read_u16()?;
            let g = input.read_u16()?;
            let b = input.read_u16()?;
            Ok(PenPattern::Pixel(Pattern::solid(RgbColor::from_rgb16(r, g, b))))
        },
        other => Err(Error::CorruptedFile(format!("unknown pixel pattern type {}", other))),
    }
}

/// Averages the pixmap colors under the set and cleared bits of `bits`.
fn reduce_pixel_pattern(pixmap: &Pixmap, bits: [u8; 8]) -> PenPattern {
    let mask = Pattern::new(bits, RgbColor::black(), RgbColor::white());
    let (width, height) = (pixmap.width().max(0) as usize, pixmap.height().max(0) as usize);
    let mut fore = Vec::new();
    let mut back = Vec::new();
    for y in 0..height {
        for x in 0..width {
            if let Some(color) = pixmap.color_at(x, y) {
                if mask.is_set(x, y) {
                    fore.push(color);
                } else {
                    back.push(color);
                }
            }
        }
    }
    let all = RgbColor::average(fore.iter().chain(back.iter()));
    let Some(all) = all else {
        // nothing decodable, keep the monochrome pattern
        return PenPattern::Bits(bits);
    };
    let fore = RgbColor::average(&fore).unwrap_or(all);
    let back = RgbColor::average(&back).unwrap_or(all);
    PenPattern::Pixel(Pattern::new(bits, fore, back))
}

/// Describes where a raster record lands, for logging.
pub(crate) fn describe(bounds: &Box2i, region: Option<&Region>) -> String {
    match region {
        Some(r) => format!("{} clipped by {}", bounds, r.bbox),
        None => bounds.to_string(),
    }
}
