//! PICT opcode table.
//!
//! Version 1 pictures use one-byte opcodes, version 2 pictures two-byte
//! opcodes; both map onto the same [`Opcode`] values. Opcodes Apple reserved
//! for later use are still decodable: their payload size follows from the
//! range they belong to, see [`Skip`].

use std::fmt;

/// Drawing verb of a shape opcode, `opcode & 7` in the shape families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Frame,
    Paint,
    Erase,
    Invert,
    Fill,
    /// Text opcodes, not part of the shape families.
    Text,
}

impl Verb {
    fn from_low_bits(bits: u16) -> Option<Verb> {
        match bits {
            0 => Some(Verb::Frame),
            1 => Some(Verb::Paint),
            2 => Some(Verb::Erase),
            3 => Some(Verb::Invert),
            4 => Some(Verb::Fill),
            _ => None,
        }
    }
}

/// Geometry family of a shape opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Rect,
    RoundRect,
    Oval,
    Arc,
    Polygon,
    Region,
}

impl ShapeKind {
    const ALL: [ShapeKind; 6] = [
        ShapeKind::Rect,
        ShapeKind::RoundRect,
        ShapeKind::Oval,
        ShapeKind::Arc,
        ShapeKind::Polygon,
        ShapeKind::Region,
    ];

    /// Payload size of an explicit shape opcode, `None` when size-prefixed.
    fn explicit_size(self) -> Option<usize> {
        match self {
            ShapeKind::Rect | ShapeKind::RoundRect | ShapeKind::Oval => Some(8),
            ShapeKind::Arc => Some(12),
            ShapeKind::Polygon | ShapeKind::Region => None,
        }
    }
}

/// How to step over the payload of an opcode without interpreting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// A payload of known size.
    Fixed(usize),
    /// A 16-bit length followed by that many bytes.
    Length16,
    /// A 32-bit length followed by that many bytes.
    Length32,
    /// A polygon or region record whose leading 16-bit size counts itself.
    SizePrefixed,
}

/// A decoded opcode tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Nop,
    Clip,
    BkPat,
    TxFont,
    TxFace,
    TxMode,
    SpExtra,
    PnSize,
    PnMode,
    PnPat,
    FillPat,
    OvSize,
    Origin,
    TxSize,
    FgColor,
    BkColor,
    TxRatio,
    Version,
    BkPixPat,
    PnPixPat,
    FillPixPat,
    PnLocHFrac,
    ChExtra,
    RgbFgCol,
    RgbBkCol,
    HiliteMode,
    HiliteColor,
    DefHilite,
    OpColor,
    Line,
    LineFrom,
    ShortLine,
    ShortLineFrom,
    LongText,
    DhText,
    DvText,
    DhDvText,
    FontName,
    LineJustify,
    GlyphState,
    /// A shape family opcode; `same` opcodes reuse the last geometry.
    Shape {
        kind: ShapeKind,
        verb: Verb,
        same: bool,
    },
    /// `BitsRect`, `BitsRgn`, `PackBitsRect`, `PackBitsRgn`,
    /// `DirectBitsRect` and `DirectBitsRgn`.
    Raster {
        packed: bool,
        direct: bool,
        region: bool,
    },
    ShortComment,
    LongComment,
    EndPic,
    HeaderOp,
    CompressedQuickTime,
    UncompressedQuickTime,
    /// An opcode with no defined meaning.
    Reserved(u16, Skip),
}

impl Opcode {
    pub fn from_code(code: u16) -> Opcode {
        match code {
            0x00 => Opcode::Nop,
            0x01 => Opcode::Clip,
            0x02 => Opcode::BkPat,
            0x03 => Opcode::TxFont,
            0x04 => Opcode::TxFace,
            0x05 => Opcode::TxMode,
            0x06 => Opcode::SpExtra,
            0x07 => Opcode::PnSize,
            0x08 => Opcode::PnMode,
            0x09 => Opcode::PnPat,
            0x0A => Opcode::FillPat,
            0x0B => Opcode::OvSize,
            0x0C => Opcode::Origin,
            0x0D => Opcode::TxSize,
            0x0E => Opcode::FgColor,
            0x0F => Opcode::BkColor,
            0x10 => Opcode::TxRatio,
            0x11 => Opcode::Version,
            0x12 => Opcode::BkPixPat,
            0x13 => Opcode::PnPixPat,
            0x14 => Opcode::FillPixPat,
            0x15 => Opcode::PnLocHFrac,
            0x16 => Opcode::ChExtra,
            0x1A => Opcode::RgbFgCol,
            0x1B => Opcode::RgbBkCol,
            0x1C => Opcode::HiliteMode,
            0x1D => Opcode::HiliteColor,
            0x1E => Opcode::DefHilite,
            0x1F => Opcode::OpColor,
            0x20 => Opcode::Line,
            0x21 => Opcode::LineFrom,
            0x22 => Opcode::ShortLine,
            0x23 => Opcode::ShortLineFrom,
            0x28 => Opcode::LongText,
            0x29 => Opcode::DhText,
            0x2A => Opcode::DvText,
            0x2B => Opcode::DhDvText,
            0x2C => Opcode::FontName,
            0x2D => Opcode::LineJustify,
            0x2E => Opcode::GlyphState,
            0x30..=0x8F => Self::shape_family(code),
            0x90 | 0x91 | 0x98 | 0x99 | 0x9A | 0x9B => Opcode::Raster {
                packed: code >= 0x98,
                direct: code >= 0x9A,
                region: code & 1 == 1,
            },
            0xA0 => Opcode::ShortComment,
            0xA1 => Opcode::LongComment,
            0xFF => Opcode::EndPic,
            0x0C00 => Opcode::HeaderOp,
            0x8200 => Opcode::CompressedQuickTime,
            0x8201 => Opcode::UncompressedQuickTime,
            _ => Opcode::Reserved(code, Self::reserved_skip(code)),
        }
    }

    /// Decodes the `0x30..=0x8F` shape families: six families of sixteen
    /// opcodes, the upper eight of each being the "same shape" variants.
    fn shape_family(code: u16) -> Opcode {
        let kind = ShapeKind::ALL[((code - 0x30) >> 4) as usize];
        let same = code & 0x08 != 0;
        match Verb::from_low_bits(code & 7) {
            Some(verb) => Opcode::Shape { kind, verb, same },
            None if same && kind == ShapeKind::Arc => Opcode::Reserved(code, Skip::Fixed(4)),
            None if same => Opcode::Reserved(code, Skip::Fixed(0)),
            None => Opcode::Reserved(
                code,
                kind.explicit_size().map_or(Skip::SizePrefixed, Skip::Fixed),
            ),
        }
    }

    fn reserved_skip(code: u16) -> Skip {
        match code {
            0x17..=0x19 => Skip::Fixed(0),
            0x24..=0x27 | 0x2F => Skip::Length16,
            0x92..=0x97 | 0x9C..=0x9F | 0xA2..=0xAF => Skip::Length16,
            0xB0..=0xCF => Skip::Fixed(0),
            0xD0..=0xFE => Skip::Length32,
            0x0100..=0x7FFF => Skip::Fixed(((code >> 8) as usize) * 2),
            0x8000..=0x80FF => Skip::Fixed(0),
            _ => Skip::Length32,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Shape { kind, verb, same } => {
                write!(f, "{:?}{}{:?}", verb, if *same { "Same" } else { "" }, kind)
            },
            Opcode::Raster { packed, direct, region } => {
                let prefix = if *direct {
                    "DirectBits"
                } else if *packed {
                    "PackBits"
                } else {
                    "Bits"
                };
                write!(f, "{}{}", prefix, if *region { "Rgn" } else { "Rect" })
            },
            Opcode::Reserved(code, _) => write!(f, "Reserved({:#06x})", code),
            other => write!(f, "{:?}", other),
        }
    }
}
