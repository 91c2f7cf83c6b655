//! A listener that keeps every call as a flat event list.
//!
//! Useful as a minimal document model and for inspecting what a decoder
//! produced.

use super::{DocumentListener, PageGeometry, Picture, Shape, SubDocument};
use crate::common::geometry::Box2f;
use crate::common::style::{FontDescriptor, GraphicStyle};

/// One recorded listener call.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerEvent {
    StartDocument(PageGeometry),
    EndDocument,
    Shape {
        position: Box2f,
        shape: Shape,
        style: GraphicStyle,
    },
    Picture {
        position: Box2f,
        picture: Picture,
    },
    /// The text box content is replayed immediately into `content`.
    TextBox {
        position: Box2f,
        style: GraphicStyle,
        content: Vec<ListenerEvent>,
    },
    Font(FontDescriptor),
    Character(char),
    Tab,
    Eol,
    OpenGroup(Box2f),
    CloseGroup,
}

#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Vec<ListenerEvent>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ListenerEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<ListenerEvent> {
        self.events
    }

    /// Every recorded shape with its style, in order.
    pub fn shapes(&self) -> Vec<(&Shape, &GraphicStyle)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ListenerEvent::Shape { shape, style, .. } => Some((shape, style)),
                _ => None,
            })
            .collect()
    }

    pub fn pictures(&self) -> Vec<&Picture> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ListenerEvent::Picture { picture, .. } => Some(picture),
                _ => None,
            })
            .collect()
    }

    /// Concatenated characters of every text box (tabs as `\t`, line ends
    /// as `\n`).
    pub fn text(&self) -> String {
        fn collect(events: &[ListenerEvent], out: &mut String) {
            for e in events {
                match e {
                    ListenerEvent::Character(c) => out.push(*c),
                    ListenerEvent::Tab => out.push('\t'),
                    ListenerEvent::Eol => out.push('\n'),
                    ListenerEvent::TextBox { content, .. } => collect(content, out),
                    _ => {},
                }
            }
        }
        let mut out = String::new();
        collect(&self.events, &mut out);
        out
    }
}

impl DocumentListener for RecordingListener {
    fn start_document(&mut self, page: &PageGeometry) {
        self.events.push(ListenerEvent::StartDocument(*page));
    }

    fn end_document(&mut self) {
        self.events.push(ListenerEvent::EndDocument);
    }

    fn insert_shape(&mut self, position: &Box2f, shape: &Shape, style: &GraphicStyle) {
        self.events.push(ListenerEvent::Shape {
            position: *position,
            shape: shape.clone(),
            style: *style,
        });
    }

    fn insert_picture(&mut self, position: &Box2f, picture: &Picture) {
        self.events.push(ListenerEvent::Picture {
            position: *position,
            picture: picture.clone(),
        });
    }

    fn insert_text_box(&mut self, position: &Box2f, content: &dyn SubDocument, style: &GraphicStyle) {
        let mut inner = RecordingListener::new();
        content.send(&mut inner);
        self.events.push(ListenerEvent::TextBox {
            position: *position,
            style: *style,
            content: inner.into_events(),
        });
    }

    fn set_font(&mut self, font: &FontDescriptor) {
        self.events.push(ListenerEvent::Font(font.clone()));
    }

    fn insert_character(&mut self, c: char) {
        self.events.push(ListenerEvent::Character(c));
    }

    fn insert_tab(&mut self) {
        self.events.push(ListenerEvent::Tab);
    }

    fn insert_eol(&mut self) {
        self.events.push(ListenerEvent::Eol);
    }

    fn open_group(&mut self, position: &Box2f) {
        self.events.push(ListenerEvent::OpenGroup(*position));
    }

    fn close_group(&mut self) {
        self.events.push(ListenerEvent::CloseGroup);
    }
}
