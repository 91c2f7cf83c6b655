//! Geometry value types.
//!
//! QuickDraw works on 16-bit integer coordinates, so the decoder state uses
//! [`Point2i`]/[`Box2i`]. Geometry sent to a listener is floating point
//! ([`Point2f`]/[`Box2f`]) because arc bounding boxes are fractional.

use std::fmt;

/// Integer point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point2i {
    pub x: i32,
    pub y: i32,
}

impl Point2i {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    #[inline]
    pub fn to_f32(self) -> Point2f {
        Point2f::new(self.x as f32, self.y as f32)
    }
}

impl fmt::Display for Point2i {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

/// Integer size or offset (pen size, oval corner size).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vec2i {
    pub x: i32,
    pub y: i32,
}

impl Vec2i {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Integer axis-aligned box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Box2i {
    pub min: Point2i,
    pub max: Point2i,
}

impl Box2i {
    #[inline]
    pub const fn new(min: Point2i, max: Point2i) -> Self {
        Self { min, max }
    }

    /// Builds a box from QuickDraw's `top, left, bottom, right` order.
    #[inline]
    pub const fn from_tlbr(top: i32, left: i32, bottom: i32, right: i32) -> Self {
        Self::new(Point2i::new(left, top), Point2i::new(right, bottom))
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    /// True when the point lies inside the box, edges included.
    #[inline]
    pub fn contains(&self, pt: Point2i) -> bool {
        pt.x >= self.min.x && pt.x <= self.max.x && pt.y >= self.min.y && pt.y <= self.max.y
    }

    pub fn to_f32(self) -> Box2f {
        Box2f::new(self.min.to_f32(), self.max.to_f32())
    }
}

impl fmt::Display for Box2i {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}<->{})", self.min, self.max)
    }
}

/// Floating point point.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point2f {
    pub x: f32,
    pub y: f32,
}

impl Point2f {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Floating point axis-aligned box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Box2f {
    pub min: Point2f,
    pub max: Point2f,
}

impl Box2f {
    #[inline]
    pub const fn new(min: Point2f, max: Point2f) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Point2f {
        Point2f::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Smallest box holding every point, or `None` for an empty slice.
    pub fn bounding(points: &[Point2f]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = Self::new(*first, *first);
        for pt in &points[1..] {
            bbox.min.x = bbox.min.x.min(pt.x);
            bbox.min.y = bbox.min.y.min(pt.y);
            bbox.max.x = bbox.max.x.max(pt.x);
            bbox.max.y = bbox.max.y.max(pt.y);
        }
        Some(bbox)
    }
}
