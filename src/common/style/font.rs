//! Character formatting.

use bitflags::bitflags;

use super::color::RgbColor;

bitflags! {
    /// QuickDraw text face (`TxFace`) bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct TextFace: u8 {
        const BOLD = 0x01;
        const ITALIC = 0x02;
        const UNDERLINE = 0x04;
        const OUTLINE = 0x08;
        const SHADOW = 0x10;
        const CONDENSE = 0x20;
        const EXTEND = 0x40;
    }
}

/// Font selection sent with `set_font`.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDescriptor {
    /// Font family id as stored in the file.
    pub id: i32,
    /// Family name when the file declared one.
    pub name: Option<String>,
    /// Size in points.
    pub size: f32,
    pub face: TextFace,
    /// Extra spacing between characters, in points.
    pub letter_spacing: f32,
    pub color: RgbColor,
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self {
            id: 0,
            name: None,
            size: 12.0,
            face: TextFace::empty(),
            letter_spacing: 0.0,
            color: RgbColor::black(),
        }
    }
}
