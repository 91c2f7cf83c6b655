//! The QuickDraw graphics port state mutated by the opcode stream.

use std::collections::HashMap;

use crate::common::geometry::{Box2i, Point2i, Vec2i};
use crate::common::style::{FontDescriptor, Pattern, RgbColor, TextFace};

use super::region::Region;

/// Transfer mode used by encoders for PostScript passthrough drawing; shapes
/// drawn with it duplicate data already present in picture comments.
pub const MODE_PASSTHROUGH: u16 = 23;

/// A pen, fill or background pattern as stored in the port.
///
/// Old-style patterns are bare bits colored with the current fore and back
/// colors at draw time; pixel patterns carry their own colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenPattern {
    Bits([u8; 8]),
    Pixel(Pattern),
}

impl PenPattern {
    pub const BLACK: PenPattern = PenPattern::Bits([0xFF; 8]);
    pub const WHITE: PenPattern = PenPattern::Bits([0; 8]);

    /// The colored pattern drawn with the given fore and back colors.
    pub fn resolve(&self, fore: RgbColor, back: RgbColor) -> Pattern {
        match self {
            PenPattern::Bits(bits) => Pattern::new(*bits, fore, back),
            PenPattern::Pixel(pattern) => *pattern,
        }
    }
}

/// Text attributes of the port.
#[derive(Debug, Clone, PartialEq)]
pub struct TextState {
    pub font_id: i32,
    pub size: i32,
    pub face: TextFace,
    pub mode: u16,
    /// `SpExtra`, fixed point converted to points.
    pub space_extra: f32,
    /// `ChExtra`, extra width per character in whole points.
    pub char_extra: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_id: 0,
            size: 12,
            face: TextFace::empty(),
            mode: 0,
            space_extra: 0.0,
            char_extra: 0.0,
        }
    }
}

/// Everything the opcodes read or write between two drawing calls.
///
/// Owned by the decode loop and passed down by mutable reference; shape
/// records stored here are replaced, never edited.
#[derive(Debug, Clone)]
pub struct GraphicsState {
    pub pen_position: Point2i,
    pub text_position: Point2i,
    /// Shift applied by the `Origin` opcode.
    pub origin: Vec2i,
    pub pen_size: Vec2i,
    pub oval_size: Vec2i,
    pub pen_mode: u16,
    pub text: TextState,

    pub fore_color: RgbColor,
    pub back_color: RgbColor,
    pub hilite_color: RgbColor,
    pub op_color: RgbColor,

    pub pen_pattern: PenPattern,
    pub fill_pattern: PenPattern,
    pub back_pattern: PenPattern,

    /// Font names declared by `FontName`, keyed by font id.
    pub font_names: HashMap<i32, String>,
    pub clip: Option<Region>,

    pub last_rect: Option<Box2i>,
    pub last_round_rect: Option<Box2i>,
    pub last_oval: Option<Box2i>,
    pub last_arc: Option<Box2i>,
    pub last_polygon: Option<Vec<Point2i>>,
    pub last_region: Option<Region>,

    /// Parse the next bitmap or pixmap without drawing it.
    pub skip_next_raster: bool,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            pen_position: Point2i::default(),
            text_position: Point2i::default(),
            origin: Vec2i::default(),
            pen_size: Vec2i::new(1, 1),
            oval_size: Vec2i::default(),
            pen_mode: 0,
            text: TextState::default(),
            fore_color: RgbColor::black(),
            back_color: RgbColor::white(),
            hilite_color: RgbColor::black(),
            op_color: RgbColor::black(),
            pen_pattern: PenPattern::BLACK,
            fill_pattern: PenPattern::BLACK,
            back_pattern: PenPattern::WHITE,
            font_names: HashMap::new(),
            clip: None,
            last_rect: None,
            last_round_rect: None,
            last_oval: None,
            last_arc: None,
            last_polygon: None,
            last_region: None,
            skip_next_raster: false,
        }
    }
}

impl GraphicsState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Font descriptor for the current text attributes.
    pub fn font(&self) -> FontDescriptor {
        FontDescriptor {
            id: self.text.font_id,
            name: self.font_names.get(&self.text.font_id).cloned(),
            size: self.text.size as f32,
            face: self.text.face,
            letter_spacing: self.text.char_extra,
            color: self.fore_color,
        }
    }

    /// Moves the pen, returning the previous position.
    pub fn move_pen(&mut self, to: Point2i) -> Point2i {
        std::mem::replace(&mut self.pen_position, to)
    }
}
