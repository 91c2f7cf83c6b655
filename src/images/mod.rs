// Picture decoding
//
// - `pict`: Macintosh PICT (QuickDraw) pictures
pub mod pict;

pub use pict::{PictOptions, PictSummary, decode_pict};
