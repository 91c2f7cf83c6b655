//! 8x8 monochrome patterns.

use super::color::RgbColor;

/// An 8x8 one-bit tile drawn with two colors.
///
/// A set bit is painted with `colors[0]`, a cleared bit with `colors[1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub bits: [u8; 8],
    pub colors: [RgbColor; 2],
}

impl Pattern {
    pub const fn new(bits: [u8; 8], fore: RgbColor, back: RgbColor) -> Self {
        Self {
            bits,
            colors: [fore, back],
        }
    }

    /// A pattern made only of set bits.
    pub const fn solid(color: RgbColor) -> Self {
        Self::new([0xFF; 8], color, color)
    }

    /// Fraction of set bits, between 0 and 1.
    pub fn coverage(&self) -> f32 {
        let set: u32 = self.bits.iter().map(|b| b.count_ones()).sum();
        set as f32 / 64.0
    }

    /// The single color this pattern reduces to, if any.
    pub fn unique_color(&self) -> Option<RgbColor> {
        if self.colors[0] == self.colors[1] || self.bits.iter().all(|&b| b == 0xFF) {
            return Some(self.colors[0]);
        }
        if self.bits.iter().all(|&b| b == 0) {
            return Some(self.colors[1]);
        }
        None
    }

    /// The color an observer sees from afar.
    pub fn average_color(&self) -> RgbColor {
        self.unique_color().unwrap_or_else(|| {
            RgbColor::barycenter(self.coverage(), self.colors[0], self.colors[1])
        })
    }

    /// Is the bit at `(x, y)` set (coordinates taken modulo 8)?
    #[inline]
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.bits[y % 8] & (0x80 >> (x % 8)) != 0
    }
}
