//! Resolved drawing style handed to a listener.

use super::color::RgbColor;
use super::pattern::Pattern;

/// How the inside of a shape is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Surface {
    /// Not painted.
    #[default]
    None,
    /// Flat color.
    Color(RgbColor),
    /// Patterned texture.
    Pattern(Pattern),
}

impl Surface {
    #[inline]
    pub fn has_surface(&self) -> bool {
        !matches!(self, Surface::None)
    }
}

/// Line and surface style of a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphicStyle {
    /// Stroke width in points, 0 means no stroke.
    pub line_width: f32,
    pub line_color: RgbColor,
    pub surface: Surface,
}

impl Default for GraphicStyle {
    fn default() -> Self {
        Self {
            line_width: 1.0,
            line_color: RgbColor::black(),
            surface: Surface::None,
        }
    }
}

impl GraphicStyle {
    /// A style drawing nothing but the surface.
    pub fn surface_only(surface: Surface) -> Self {
        Self {
            line_width: 0.0,
            line_color: RgbColor::black(),
            surface,
        }
    }

    #[inline]
    pub fn has_line(&self) -> bool {
        self.line_width > 0.0
    }
}
