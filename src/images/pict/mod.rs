// Macintosh PICT decoder
//
// PICT is the QuickDraw metafile format of Mac OS Classic: a header followed
// by a stream of opcodes, each one changing the graphics port or drawing
// into it. This module replays the stream into a `DocumentListener`. There
// are two versions: PICT 1 (one-byte opcodes) and PICT 2 (two-byte,
// word-aligned opcodes, color and pixel patterns).
//
// References:
// - Inside Macintosh: Imaging With QuickDraw, Appendix A
// - Apple Technical Note TN1023: Understanding the PICT Format

pub mod decoder;
pub mod header;
pub mod opcode;
pub mod options;
pub mod pixmap;
pub mod raster;
pub mod region;
pub mod state;

mod draw;
mod quicktime;
mod text;

/// Raster records
mod types;

/// Scanline decompression
mod data;

#[cfg(test)]
mod tests;

pub use data::unpack_bits;
pub use decoder::{Diagnostic, PictDecoder, PictSummary, decode_pict};
pub use draw::{arc_angles, arc_bbox, is_visible, resolve_style};
pub use header::{PictHeader, PictVersion};
pub use opcode::{Opcode, ShapeKind, Skip, Verb};
pub use options::{PaletteFallback, PictOptions};
pub use quicktime::{QuickTimeImage, codec_mime_type};
pub use region::{Region, RegionMask, decode_region};
pub use state::{GraphicsState, PenPattern, TextState};
pub use text::TextRun;
pub use types::{Bitmap, ColorTable, PixelData, Pixmap, PixmapHeader};
