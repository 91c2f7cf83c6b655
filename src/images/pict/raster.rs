// Bitmap/pixmap to PNG conversion
//
// Decoded rasters reach the listener as opaque `image/png` pictures. Only the
// source rectangle is kept; pixels outside a clip region are transparent.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

use super::region::Region;
use super::types::{Bitmap, Pixmap};
use crate::common::error::Result;
use crate::common::geometry::{Box2i, Point2i};
use crate::common::style::RgbColor;
use crate::listener::Picture;

/// Largest raster converted, in pixels.
const MAX_PIXELS: u64 = 1 << 26;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// `src` clipped to `bounds`: left/top offsets relative to `bounds`, width
/// and height.
fn source_window(bounds: &Box2i, src: &Box2i) -> Option<(usize, usize, u32, u32)> {
    let left = src.min.x.max(bounds.min.x);
    let top = src.min.y.max(bounds.min.y);
    let right = src.max.x.min(bounds.max.x);
    let bottom = src.max.y.min(bounds.max.y);
    if right <= left || bottom <= top {
        return None;
    }
    let (width, height) = ((right - left) as u32, (bottom - top) as u32);
    if width as u64 * height as u64 > MAX_PIXELS {
        return None;
    }
    Some((
        (left - bounds.min.x) as usize,
        (top - bounds.min.y) as usize,
        width,
        height,
    ))
}

fn render(
    bounds: &Box2i,
    src: &Box2i,
    dst: &Box2i,
    region: Option<&Region>,
    color_at: impl Fn(usize, usize) -> Option<RgbColor>,
) -> Option<RgbaImage> {
    let (x0, y0, width, height) = source_window(bounds, src)?;
    let mut mask = region.map(Region::mask);
    let scale_x = dst.width() as f32 / width as f32;
    let scale_y = dst.height() as f32 / height as f32;

    let mut image = RgbaImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        if let Some(mask) = &mut mask {
            let at = Point2i::new(
                dst.min.x + (x as f32 * scale_x) as i32,
                dst.min.y + (y as f32 * scale_y) as i32,
            );
            if !mask.contains(at) {
                *pixel = TRANSPARENT;
                continue;
            }
        }
        *pixel = match color_at(x0 + x as usize, y0 + y as usize) {
            Some(c) => Rgba([c.r, c.g, c.b, c.a]),
            None => TRANSPARENT,
        };
    }
    Some(image)
}

/// Encodes an RGBA raster as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Converts a monochrome bitmap, set bits drawn with `fore`, cleared bits
/// with `back`.
pub fn bitmap_image(bitmap: &Bitmap, fore: RgbColor, back: RgbColor) -> Option<RgbaImage> {
    render(
        &bitmap.bounds,
        &bitmap.src_rect,
        &bitmap.dst_rect,
        bitmap.region.as_ref(),
        |x, y| Some(if bitmap.is_set(x, y) { fore } else { back }),
    )
}

pub fn pixmap_image(pixmap: &Pixmap) -> Option<RgbaImage> {
    pixmap.pixels.as_ref()?;
    render(
        &pixmap.header.bounds,
        &pixmap.src_rect,
        &pixmap.dst_rect,
        pixmap.region.as_ref(),
        |x, y| pixmap.color_at(x, y),
    )
}

/// PNG picture of a raster, `Ok(None)` when there is nothing to show.
pub fn png_picture(image: Option<RgbaImage>) -> Result<Option<Picture>> {
    match image {
        Some(image) => Ok(Some(Picture::new(encode_png(&image)?, "image/png"))),
        None => Ok(None),
    }
}
