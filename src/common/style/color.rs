use std::fmt;

/// RGBA color representation.
///
/// Each component is in the range 0-255; `a` is opacity (255 = opaque).
///
/// # Examples
///
/// ```rust
/// use macpict::common::RgbColor;
///
/// let red = RgbColor::new(255, 0, 0);
/// assert_eq!(red.to_hex(), "FF0000");
///
/// // QuickDraw stores 16-bit channels, only the high byte is kept
/// let gray = RgbColor::from_rgb16(0x8080, 0x8080, 0x8080);
/// assert_eq!(gray, RgbColor::new(0x80, 0x80, 0x80));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbColor {
    /// Red component (0-255)
    pub r: u8,
    /// Green component (0-255)
    pub g: u8,
    /// Blue component (0-255)
    pub b: u8,
    /// Alpha component (0-255)
    pub a: u8,
}

impl Default for RgbColor {
    fn default() -> Self {
        Self::black()
    }
}

impl RgbColor {
    /// Create a new opaque color.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[inline]
    pub const fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Build a color from QuickDraw 16-bit channels.
    #[inline]
    pub const fn from_rgb16(r: u16, g: u16, b: u16) -> Self {
        Self::new((r >> 8) as u8, (g >> 8) as u8, (b >> 8) as u8)
    }

    /// Gray level `v`.
    #[inline]
    pub const fn gray(v: u8) -> Self {
        Self::new(v, v, v)
    }

    /// Map an old-style QuickDraw color constant (`FgColor`/`BkColor`).
    ///
    /// Returns `None` for codes outside the eight planar colors.
    pub fn from_quickdraw_code(code: u32) -> Option<Self> {
        let color = match code {
            33 => Self::black(),
            30 => Self::white(),
            69 => Self::new(255, 255, 0),
            137 => Self::new(255, 0, 255),
            205 => Self::new(255, 0, 0),
            273 => Self::new(0, 255, 255),
            341 => Self::new(0, 255, 0),
            409 => Self::new(0, 0, 255),
            _ => return None,
        };
        Some(color)
    }

    /// Weighted mix: `weight` of `self` and `1 - weight` of `other`.
    pub fn barycenter(weight: f32, color: Self, other: Self) -> Self {
        let w = weight.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (w * a as f32 + (1.0 - w) * b as f32).round() as u8;
        Self::with_alpha(
            mix(color.r, other.r),
            mix(color.g, other.g),
            mix(color.b, other.b),
            mix(color.a, other.a),
        )
    }

    /// Average of a set of colors, `None` when empty.
    pub fn average<'a>(colors: impl IntoIterator<Item = &'a Self>) -> Option<Self> {
        let mut sum = [0u64; 4];
        let mut count = 0u64;
        for c in colors {
            sum[0] += c.r as u64;
            sum[1] += c.g as u64;
            sum[2] += c.b as u64;
            sum[3] += c.a as u64;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let avg = |s: u64| ((s + count / 2) / count) as u8;
        Some(Self::with_alpha(avg(sum[0]), avg(sum[1]), avg(sum[2]), avg(sum[3])))
    }

    #[inline]
    pub fn is_black(&self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    #[inline]
    pub fn is_white(&self) -> bool {
        self.r == 255 && self.g == 255 && self.b == 255
    }

    /// Convert to hex string (without # prefix, alpha ignored).
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())?;
        if self.a != 255 {
            write!(f, "[{}]", self.a)?;
        }
        Ok(())
    }
}
