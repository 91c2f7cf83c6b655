//! Configuration types for PICT decoding.

/// How palette holes are filled when a raster uses indices its color table
/// does not define.
///
/// Pixel patterns sometimes ship only part of their palette and rely on the
/// implicit convention "index 0 is the background, the last index the
/// foreground". Neither choice is guaranteed by the format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaletteFallback {
    /// Append a gray ramp going from white (index 0) to black (last index).
    #[default]
    GrayRamp,
    /// Map every out-of-range index to the last color of the table.
    ClampToLast,
}

/// Options controlling how a PICT stream is decoded.
///
/// # Examples
///
/// ```rust
/// use macpict::images::pict::{PaletteFallback, PictOptions};
///
/// // Create with defaults
/// let options = PictOptions::default();
///
/// // Or customize
/// let options = PictOptions::new()
///     .with_quicktime_preview(true)
///     .with_palette_fallback(PaletteFallback::ClampToLast)
///     .with_max_opcodes(Some(100_000));
/// ```
#[derive(Debug, Clone)]
pub struct PictOptions {
    /// Draw the bitmap that follows a QuickTime opcode. Encoders emit it as a
    /// low resolution copy of the QuickTime image.
    pub draw_quicktime_preview: bool,
    /// Palette completion strategy for indexed rasters.
    pub palette_fallback: PaletteFallback,
    /// Open and close groups on `picLParen`/`picRParen` comments.
    pub send_picture_comments: bool,
    /// Stop after this many opcodes.
    pub max_opcodes: Option<usize>,
}

impl Default for PictOptions {
    fn default() -> Self {
        Self {
            draw_quicktime_preview: false,
            palette_fallback: PaletteFallback::GrayRamp,
            send_picture_comments: true,
            max_opcodes: None,
        }
    }
}

impl PictOptions {
    /// Create a new `PictOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the preview bitmap following QuickTime data is drawn.
    #[inline]
    pub fn with_quicktime_preview(mut self, draw: bool) -> Self {
        self.draw_quicktime_preview = draw;
        self
    }

    #[inline]
    pub fn with_palette_fallback(mut self, fallback: PaletteFallback) -> Self {
        self.palette_fallback = fallback;
        self
    }

    /// Set whether picture comments open and close groups.
    #[inline]
    pub fn with_picture_comments(mut self, send: bool) -> Self {
        self.send_picture_comments = send;
        self
    }

    /// Set the opcode cap, `None` for no limit.
    #[inline]
    pub fn with_max_opcodes(mut self, max: Option<usize>) -> Self {
        self.max_opcodes = max;
        self
    }
}
