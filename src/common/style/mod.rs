//! Common style and formatting types.
//!
//! Colors, patterns, line/surface styles and fonts shared by the decoders
//! and the listener interface.

// Submodule declarations
pub mod color;
pub mod font;
pub mod graphic;
pub mod pattern;

// Re-exports
pub use color::RgbColor;
pub use font::{FontDescriptor, TextFace};
pub use graphic::{GraphicStyle, Surface};
pub use pattern::Pattern;
