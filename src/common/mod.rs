//! Common types, traits, and utilities shared across formats.
//!
//! The stream reader, geometry and style value types, and the error type
//! used by both the picture interpreter and the cluster resolver.

// Submodule declarations
pub mod error;
pub mod geometry;
pub mod stream;
pub mod style;

// Re-exports for convenience
pub use error::{Error, Result};
pub use geometry::{Box2f, Box2i, Point2f, Point2i, Vec2i};
pub use stream::{InputStream, StreamError, StreamResult};
pub use style::{FontDescriptor, GraphicStyle, Pattern, RgbColor, Surface, TextFace};
