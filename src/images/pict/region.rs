//! QuickDraw region and polygon records.
//!
//! A region is stored as a size, a bounding box and, for non rectangular
//! regions, a token list: a `y` value followed by the `x` inversion points
//! of that scanline, closed by `0x7FFF`, the whole list being closed by a
//! final `0x7FFF`.

use log::debug;

use crate::common::error::{Error, Result};
use crate::common::geometry::{Box2i, Point2i};
use crate::common::stream::InputStream;

const END_MARKER: i16 = 0x7FFF;

/// A decoded region.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Region {
    pub bbox: Box2i,
    /// Inversion points, grouped by scanline in stream order.
    pub points: Vec<Point2i>,
    /// Set when a token fell outside of `bbox` and decoding stopped early.
    pub has_extra_data: bool,
}

impl Region {
    /// A plain rectangular region.
    pub fn rectangle(bbox: Box2i) -> Self {
        Self {
            bbox,
            points: Vec::new(),
            has_extra_data: false,
        }
    }

    pub fn is_rectangular(&self) -> bool {
        self.points.is_empty()
    }

    /// Inside/outside cursor over the region.
    ///
    /// Each scanline record flips the spans `[x0, x1)`, `[x2, x3)`... of the
    /// running row state, which then applies to every following row.
    pub fn mask(&self) -> RegionMask<'_> {
        RegionMask {
            region: self,
            next: 0,
            row_y: i32::MIN,
            edges: Vec::new(),
        }
    }
}

/// Scanline cursor answering inside/outside queries for a region.
///
/// Only the inversion edges of the current row are kept, so memory grows
/// with the token count and not with the bounding box. Queries in
/// increasing `y` order never replay the token list.
#[derive(Debug, Clone)]
pub struct RegionMask<'r> {
    region: &'r Region,
    next: usize,
    row_y: i32,
    /// Sorted x positions where the inside state flips.
    edges: Vec<i32>,
}

impl RegionMask<'_> {
    fn advance_to(&mut self, y: i32) {
        if y < self.row_y {
            self.next = 0;
            self.edges.clear();
        }
        self.row_y = y;
        let points = &self.region.points;
        while let Some(point) = points.get(self.next).filter(|p| p.y <= y) {
            toggle_edge(&mut self.edges, point.x);
            self.next += 1;
        }
    }

    pub fn contains(&mut self, pt: Point2i) -> bool {
        let bbox = &self.region.bbox;
        if pt.x < bbox.min.x || pt.y < bbox.min.y || pt.x >= bbox.max.x || pt.y >= bbox.max.y {
            return false;
        }
        if self.region.is_rectangular() {
            return true;
        }
        self.advance_to(pt.y);
        self.edges.partition_point(|&e| e <= pt.x) % 2 == 1
    }
}

fn toggle_edge(edges: &mut Vec<i32>, x: i32) {
    match edges.binary_search(&x) {
        Ok(i) => {
            edges.remove(i);
        },
        Err(i) => edges.insert(i, x),
    }
}

pub(crate) fn read_rect(input: &mut InputStream<'_>) -> Result<Box2i> {
    let top = input.read_i16()? as i32;
    let left = input.read_i16()? as i32;
    let bottom = input.read_i16()? as i32;
    let right = input.read_i16()? as i32;
    Ok(Box2i::from_tlbr(top, left, bottom, right))
}

pub(crate) fn read_point(input: &mut InputStream<'_>) -> Result<Point2i> {
    let v = input.read_i16()? as i32;
    let h = input.read_i16()? as i32;
    Ok(Point2i::new(h, v))
}

/// Decodes the scanline tokens of a region up to `end`.
///
/// Stops at the first token outside of `bbox`; the points read so far are
/// kept and the second value is `false`.
pub fn decode_region(
    input: &mut InputStream<'_>,
    bbox: &Box2i,
    end: usize,
) -> (Vec<Point2i>, bool) {
    let mut points = Vec::new();
    loop {
        if input.tell() + 2 > end {
            return (points, false);
        }
        let Ok(y) = input.read_i16() else {
            return (points, false);
        };
        if y == END_MARKER {
            return (points, true);
        }
        let y = y as i32;
        if y < bbox.min.y || y > bbox.max.y {
            debug!("region: y={} outside of {}", y, bbox);
            return (points, false);
        }
        loop {
            if input.tell() + 2 > end {
                return (points, false);
            }
            let Ok(x) = input.read_i16() else {
                return (points, false);
            };
            if x == END_MARKER {
                break;
            }
            let x = x as i32;
            if x < bbox.min.x || x > bbox.max.x {
                debug!("region: x={} outside of {}", x, bbox);
                return (points, false);
            }
            points.push(Point2i::new(x, y));
        }
    }
}

/// Reads a size-prefixed region record and leaves the cursor at its end.
pub fn read_region(input: &mut InputStream<'_>) -> Result<Region> {
    let start = input.tell();
    let size = input.read_u16()? as usize;
    let end = start + size;
    if size < 10 || !input.check_position(end) {
        return Err(Error::CorruptedFile(format!(
            "region size {} invalid at offset {}",
            size, start
        )));
    }
    let bbox = read_rect(input)?;
    let mut region = Region::rectangle(bbox);
    if size > 10 {
        let (points, complete) = decode_region(input, &bbox, end);
        region.points = points;
        region.has_extra_data = !complete || input.tell() != end;
    }
    input.seek(end)?;
    Ok(region)
}

/// Reads a size-prefixed polygon record: bounding box then `(v, h)` points.
pub fn read_polygon(input: &mut InputStream<'_>) -> Result<Vec<Point2i>> {
    let start = input.tell();
    let size = input.read_u16()? as usize;
    let end = start + size;
    if size < 10 || (size - 10) % 4 != 0 || !input.check_position(end) {
        return Err(Error::CorruptedFile(format!(
            "polygon size {} invalid at offset {}",
            size, start
        )));
    }
    let _bbox = read_rect(input)?;
    let count = (size - 10) / 4;
    let mut points = Vec::with_capacity(count);
    for _ in 0..count {
        points.push(read_point(input)?);
    }
    input.seek(end)?;
    Ok(points)
}
