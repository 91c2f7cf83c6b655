//! Text runs drawn by the `LongText`/`DHText`/`DVText`/`DHDVText` opcodes.

use encoding_rs::MACINTOSH;

use crate::common::geometry::{Box2f, Point2f};
use crate::common::style::FontDescriptor;
use crate::listener::{DocumentListener, SubDocument};

/// Average glyph advance, as a fraction of the font size, used to guess the
/// width of a text box.
const ADVANCE_RATIO: f32 = 0.6;

/// One run of Mac Roman text with the font it was drawn with.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub font: FontDescriptor,
    pub text: String,
}

impl TextRun {
    pub fn new(font: FontDescriptor, bytes: &[u8]) -> Self {
        let (text, _) = MACINTOSH.decode_without_bom_handling(bytes);
        Self {
            font,
            text: text.into_owned(),
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Estimated box of the run drawn with its baseline origin at `origin`.
    pub fn bounds(&self, origin: Point2f) -> Box2f {
        let size = self.font.size;
        let width = ADVANCE_RATIO * size * self.char_count() as f32;
        Box2f::new(
            Point2f::new(origin.x, origin.y - size),
            Point2f::new(origin.x + width, origin.y + 0.25 * size),
        )
    }
}

impl SubDocument for TextRun {
    fn send(&self, listener: &mut dyn DocumentListener) {
        listener.set_font(&self.font);
        for c in self.text.chars() {
            match c {
                '\t' => listener.insert_tab(),
                '\r' | '\n' => listener.insert_eol(),
                c if c.is_control() => {},
                c => listener.insert_character(c),
            }
        }
    }
}
