//! Document construction interface.
//!
//! Decoders never build a document themselves: they push resolved geometry,
//! styles, pictures and text through a [`DocumentListener`]. The listener
//! decides what to do with them (build a drawing, export to another format,
//! or just record the calls, see [`RecordingListener`]).

mod recording;

pub use recording::{ListenerEvent, RecordingListener};

use crate::common::geometry::{Box2f, Point2f};
use crate::common::style::{FontDescriptor, GraphicStyle};

/// Size of the page a picture is drawn on, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Picture frame in picture coordinates.
    pub frame: Box2f,
    /// Horizontal and vertical resolution in dots per inch.
    pub resolution: (f32, f32),
}

impl PageGeometry {
    pub fn width(&self) -> f32 {
        self.frame.width()
    }

    pub fn height(&self) -> f32 {
        self.frame.height()
    }
}

/// Geometry of a shape.
///
/// Arc angles are in degrees, counter-clockwise, 0 pointing east, with
/// `angles[0] < angles[1]`.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Line {
        from: Point2f,
        to: Point2f,
    },
    /// `corner` holds the corner oval width and height, zero for a plain
    /// rectangle.
    Rectangle {
        bbox: Box2f,
        corner: Point2f,
    },
    Circle {
        bbox: Box2f,
    },
    /// An open arc on the ellipse inscribed in `ellipse`.
    Arc {
        ellipse: Box2f,
        bbox: Box2f,
        angles: [f32; 2],
    },
    /// A closed wedge on the ellipse inscribed in `ellipse`.
    Pie {
        ellipse: Box2f,
        bbox: Box2f,
        angles: [f32; 2],
    },
    Polygon {
        points: Vec<Point2f>,
    },
}

impl Shape {
    /// Bounding box of the drawn geometry.
    pub fn bbox(&self) -> Box2f {
        match self {
            Shape::Line { from, to } => Box2f::bounding(&[*from, *to]).unwrap_or_default(),
            Shape::Rectangle { bbox, .. } | Shape::Circle { bbox } => *bbox,
            Shape::Arc { bbox, .. } | Shape::Pie { bbox, .. } => *bbox,
            Shape::Polygon { points } => Box2f::bounding(points).unwrap_or_default(),
        }
    }
}

/// An embedded raster or foreign picture, handed over as opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl Picture {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }
}

/// Content the listener pulls when it is ready to place it (the text of a
/// text box).
pub trait SubDocument {
    fn send(&self, listener: &mut dyn DocumentListener);
}

/// The sink decoders feed.
pub trait DocumentListener {
    fn start_document(&mut self, page: &PageGeometry);
    fn end_document(&mut self);

    fn insert_shape(&mut self, position: &Box2f, shape: &Shape, style: &GraphicStyle);
    fn insert_picture(&mut self, position: &Box2f, picture: &Picture);
    fn insert_text_box(&mut self, position: &Box2f, content: &dyn SubDocument, style: &GraphicStyle);

    fn set_font(&mut self, font: &FontDescriptor);
    fn insert_character(&mut self, c: char);
    fn insert_tab(&mut self);
    fn insert_eol(&mut self);

    fn open_group(&mut self, position: &Box2f);
    fn close_group(&mut self);
}
