//! Tests for the PICT opcode interpreter

use super::*;
use crate::common::geometry::{Box2f, Point2f};
use crate::common::style::{RgbColor, Surface};
use crate::listener::{ListenerEvent, RecordingListener, Shape};

fn words(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

/// Builds opcode streams.
struct PictBuilder {
    data: Vec<u8>,
    version: PictVersion,
}

impl PictBuilder {
    fn v2(top: i16, left: i16, bottom: i16, right: i16) -> Self {
        let mut data = vec![0, 0];
        data.extend(words(&[top, left, bottom, right]));
        data.extend([0x00, 0x11, 0x02, 0xFF]);
        // HeaderOp, version -1
        data.extend([0x0C, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]);
        data.extend([0; 20]);
        Self {
            data,
            version: PictVersion::V2,
        }
    }

    fn v1(top: i16, left: i16, bottom: i16, right: i16) -> Self {
        let mut data = vec![0, 0];
        data.extend(words(&[top, left, bottom, right]));
        data.extend([0x11, 0x01]);
        Self {
            data,
            version: PictVersion::V1,
        }
    }

    fn op(mut self, code: u16, payload: &[u8]) -> Self {
        match self.version {
            PictVersion::V1 => self.data.push(code as u8),
            PictVersion::V2 => self.data.extend(code.to_be_bytes()),
        }
        self.data.extend_from_slice(payload);
        if self.version == PictVersion::V2 && payload.len() % 2 == 1 {
            self.data.push(0);
        }
        self
    }

    fn end(self) -> Vec<u8> {
        self.op(0x00FF, &[]).data
    }

    fn unterminated(self) -> Vec<u8> {
        self.data
    }
}

fn decode(data: &[u8]) -> (Vec<ListenerEvent>, PictSummary) {
    decode_with(data, PictOptions::default())
}

fn decode_with(data: &[u8], options: PictOptions) -> (Vec<ListenerEvent>, PictSummary) {
    let mut listener = RecordingListener::new();
    let summary = decode_pict(data, &mut listener, options).unwrap();
    (listener.into_events(), summary)
}

fn shapes(events: &[ListenerEvent]) -> Vec<(Shape, crate::common::style::GraphicStyle)> {
    events
        .iter()
        .filter_map(|e| match e {
            ListenerEvent::Shape { shape, style, .. } => Some((shape.clone(), *style)),
            _ => None,
        })
        .collect()
}

fn rect_payload(top: i16, left: i16, bottom: i16, right: i16) -> Vec<u8> {
    words(&[top, left, bottom, right])
}

#[test]
fn test_single_line_scenario() {
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x0007, &words(&[2, 2]))
        .op(0x001A, &[0; 6])
        .op(0x0020, &words(&[10, 10, 10, 50]))
        .end();
    let (events, summary) = decode(&data);

    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], ListenerEvent::StartDocument(_)));
    match &events[1] {
        ListenerEvent::Shape { shape, style, .. } => {
            assert_eq!(
                shape,
                &Shape::Line {
                    from: Point2f::new(10.0, 10.0),
                    to: Point2f::new(50.0, 10.0)
                }
            );
            assert_eq!(style.line_width, 2.0);
            assert_eq!(style.line_color, RgbColor::black());
        },
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(events[2], ListenerEvent::EndDocument);
    assert_eq!(summary.shapes, 1);
    assert!(!summary.ended_early);
    assert!(summary.diagnostics.is_empty());
}

#[test]
fn test_page_geometry_from_header() {
    let data = PictBuilder::v2(0, 0, 100, 200).end();
    let (events, summary) = decode(&data);
    match &events[0] {
        ListenerEvent::StartDocument(page) => {
            assert_eq!(page.width(), 200.0);
            assert_eq!(page.height(), 100.0);
            assert_eq!(page.resolution, (72.0, 72.0));
        },
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(summary.version, PictVersion::V2);
}

#[test]
fn test_same_shape_repeats_last_geometry() {
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x0030, &rect_payload(5, 6, 25, 36))
        .op(0x0038, &[])
        .end();
    let (events, _) = decode(&data);
    let drawn = shapes(&events);
    assert_eq!(drawn.len(), 2);
    assert_eq!(drawn[0], drawn[1]);
    assert_eq!(
        drawn[0].0,
        Shape::Rectangle {
            bbox: Box2f::new(Point2f::new(6.0, 5.0), Point2f::new(36.0, 25.0)),
            corner: Point2f::default()
        }
    );
}

#[test]
fn test_same_shape_without_previous_one() {
    let data = PictBuilder::v2(0, 0, 100, 100).op(0x0058, &[]).end();
    let (events, summary) = decode(&data);
    assert!(shapes(&events).is_empty());
    assert_eq!(summary.diagnostics.len(), 1);
    assert!(!summary.ended_early);
}

#[test]
fn test_passthrough_pen_mode_hides_shapes() {
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x0008, &words(&[23]))
        .op(0x0031, &rect_payload(0, 0, 10, 10))
        .op(0x0030, &rect_payload(0, 0, 10, 10))
        .op(0x0020, &words(&[1, 1, 5, 5]))
        .end();
    let (events, summary) = decode(&data);
    assert!(shapes(&events).is_empty());
    assert_eq!(summary.shapes, 0);
}

#[test]
fn test_invert_and_empty_pen_are_hidden() {
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x0053, &rect_payload(0, 0, 10, 10))
        .op(0x0007, &words(&[0, 3]))
        .op(0x0030, &rect_payload(0, 0, 10, 10))
        .op(0x0039, &[])
        .end();
    let (events, _) = decode(&data);
    let drawn = shapes(&events);
    assert_eq!(drawn.len(), 1);
    assert_eq!(drawn[0].1.surface, Surface::Color(RgbColor::black()));
}

#[test]
fn test_round_rect_corner_and_oval() {
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x000B, &words(&[4, 6]))
        .op(0x0040, &rect_payload(0, 0, 20, 20))
        .op(0x0051, &rect_payload(10, 10, 30, 50))
        .end();
    let (events, _) = decode(&data);
    let drawn = shapes(&events);
    assert_eq!(drawn.len(), 2);
    assert!(matches!(drawn[0].0, Shape::Rectangle { corner, .. } if corner == Point2f::new(6.0, 4.0)));
    assert!(matches!(drawn[1].0, Shape::Circle { .. }));
}

#[test]
fn test_arc_and_pie() {
    let mut arc = rect_payload(0, 0, 100, 100);
    arc.extend(words(&[0, 90]));
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x0060, &arc)
        .op(0x0069, &words(&[90, 90]))
        .end();
    let (events, _) = decode(&data);
    let drawn = shapes(&events);
    assert_eq!(drawn.len(), 2);
    match &drawn[0].0 {
        Shape::Arc { angles, bbox, .. } => {
            assert_eq!(*angles, [0.0, 90.0]);
            assert!((bbox.min.x - 50.0).abs() < 1e-3);
        },
        other => panic!("unexpected shape {:?}", other),
    }
    match &drawn[1].0 {
        Shape::Pie { angles, .. } => assert_eq!(*angles, [270.0, 360.0]),
        other => panic!("unexpected shape {:?}", other),
    }
}

#[test]
fn test_polygon_and_same_polygon() {
    let poly = words(&[18, 0, 0, 10, 10, 1, 2, 8, 9]);
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x0070, &poly)
        .op(0x0078, &[])
        .end();
    let (events, _) = decode(&data);
    let drawn = shapes(&events);
    assert_eq!(drawn.len(), 2);
    assert_eq!(
        drawn[0].0,
        Shape::Polygon {
            points: vec![Point2f::new(2.0, 1.0), Point2f::new(9.0, 8.0)]
        }
    );
    assert_eq!(drawn[0], drawn[1]);
}

#[test]
fn test_region_is_drawn_as_its_box() {
    let region = words(&[10, 2, 3, 12, 13]);
    let data = PictBuilder::v2(0, 0, 100, 100).op(0x0081, &region).end();
    let (events, _) = decode(&data);
    let drawn = shapes(&events);
    assert_eq!(drawn.len(), 1);
    assert_eq!(drawn[0].0.bbox(), Box2f::new(Point2f::new(3.0, 2.0), Point2f::new(13.0, 12.0)));
}

#[test]
fn test_origin_shift() {
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x000C, &words(&[10, 5]))
        .op(0x0031, &rect_payload(0, 0, 10, 10))
        .end();
    let (events, _) = decode(&data);
    let drawn = shapes(&events);
    assert_eq!(drawn[0].0.bbox().min, Point2f::new(-10.0, -5.0));
}

#[test]
fn test_old_style_colors() {
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x000E, &205u32.to_be_bytes())
        .op(0x0031, &rect_payload(0, 0, 10, 10))
        .op(0x000E, &7u32.to_be_bytes())
        .op(0x0039, &[])
        .end();
    let (events, summary) = decode(&data);
    let drawn = shapes(&events);
    assert_eq!(drawn[0].1.surface, Surface::Color(RgbColor::new(255, 0, 0)));
    assert_eq!(drawn[1].1.surface, Surface::Color(RgbColor::black()));
    assert_eq!(summary.diagnostics.len(), 1);
}

#[test]
fn test_version_1_picture() {
    let data = PictBuilder::v1(0, 0, 50, 50)
        .op(0x07, &words(&[3, 3]))
        .op(0x31, &rect_payload(1, 2, 3, 4))
        .op(0x38, &[])
        .end();
    let (events, summary) = decode(&data);
    let drawn = shapes(&events);
    assert_eq!(summary.version, PictVersion::V1);
    assert_eq!(drawn.len(), 2);
    assert_eq!(drawn[1].1.line_width, 3.0);
}

#[test]
fn test_reserved_opcodes_are_skipped() {
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x0024, &[0, 3, 1, 2, 3])
        .op(0x00B5, &[])
        .op(0x00D0, &[0, 0, 0, 2, 9, 9])
        .op(0x0150, &[7, 7])
        .op(0x8123, &[0, 0, 0, 0])
        .op(0x0030, &rect_payload(0, 0, 10, 10))
        .end();
    let (events, summary) = decode(&data);
    assert_eq!(shapes(&events).len(), 1);
    assert_eq!(summary.opcodes, 8);
    assert!(!summary.ended_early);
}

#[test]
fn test_reserved_same_arc_skips_angles() {
    // 0x006D carries a start and sweep angle; 0x00FF must not be read as EndPic
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x006D, &words(&[0x00FF, 90]))
        .op(0x0030, &rect_payload(1, 2, 3, 4))
        .end();
    let (events, summary) = decode(&data);
    assert_eq!(shapes(&events).len(), 1);
    assert_eq!(summary.opcodes, 4);
    assert!(!summary.ended_early);
}

#[test]
fn test_truncated_stream_keeps_prefix() {
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x0030, &rect_payload(0, 0, 10, 10))
        .op(0x0031, &words(&[0, 0]))
        .unterminated();
    let (events, summary) = decode(&data);
    assert_eq!(shapes(&events).len(), 1);
    assert!(summary.ended_early);
    assert_eq!(events.last(), Some(&ListenerEvent::EndDocument));
}

#[test]
fn test_missing_end_pic() {
    let data = PictBuilder::v2(0, 0, 100, 100).unterminated();
    let (_, summary) = decode(&data);
    assert!(summary.ended_early);
    assert_eq!(summary.diagnostics.len(), 1);
}

#[test]
fn test_max_opcodes_cap() {
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x0030, &rect_payload(0, 0, 10, 10))
        .op(0x0038, &[])
        .op(0x0038, &[])
        .end();
    let options = PictOptions::new().with_max_opcodes(Some(3));
    let (events, summary) = decode_with(&data, options);
    // HeaderOp counts as the first opcode
    assert_eq!(shapes(&events).len(), 2);
    assert!(summary.ended_early);
}

#[test]
fn test_bad_header_is_fatal() {
    let mut listener = RecordingListener::new();
    assert!(decode_pict(&[0; 16], &mut listener, PictOptions::default()).is_err());
    assert!(listener.events().is_empty());
}

#[test]
fn test_text_runs() {
    let mut long_text = words(&[30, 5]);
    long_text.push(2);
    long_text.extend(b"hi");
    let mut font_name = words(&[9, 3]);
    font_name.push(6);
    font_name.extend(b"Geneva");
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x002C, &font_name)
        .op(0x0003, &words(&[3]))
        .op(0x000D, &words(&[10]))
        .op(0x0028, &long_text)
        .op(0x0029, &[4, 1, b'!'])
        .end();
    let (events, summary) = decode(&data);
    assert_eq!(summary.text_boxes, 2);

    let boxes: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ListenerEvent::TextBox { position, content, .. } => Some((position, content)),
            _ => None,
        })
        .collect();
    assert_eq!(boxes[0].0.min, Point2f::new(5.0, 20.0));
    match &boxes[0].1[0] {
        ListenerEvent::Font(font) => {
            assert_eq!(font.name.as_deref(), Some("Geneva"));
            assert_eq!(font.size, 10.0);
        },
        other => panic!("unexpected event {:?}", other),
    }
    // DHText moves the text origin by 4 points
    assert_eq!(boxes[1].0.min.x, 9.0);

    let mut listener = RecordingListener::new();
    decode_pict(&data, &mut listener, PictOptions::default()).unwrap();
    assert_eq!(listener.text(), "hi!");
}

#[test]
fn test_char_extra_is_whole_points() {
    let mut long_text = words(&[30, 5]);
    long_text.push(1);
    long_text.push(b'a');
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x0016, &words(&[2]))
        .op(0x0028, &long_text)
        .end();
    let (events, _) = decode(&data);
    let font = events.iter().find_map(|e| match e {
        ListenerEvent::TextBox { content, .. } => content.iter().find_map(|c| match c {
            ListenerEvent::Font(font) => Some(font.clone()),
            _ => None,
        }),
        _ => None,
    });
    assert_eq!(font.map(|f| f.letter_spacing), Some(2.0));
}

#[test]
fn test_passthrough_text_mode() {
    let mut long_text = words(&[30, 5]);
    long_text.push(1);
    long_text.push(b'x');
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x0005, &words(&[23]))
        .op(0x0028, &long_text)
        .op(0x0031, &rect_payload(0, 0, 10, 10))
        .end();
    let (events, summary) = decode(&data);
    assert_eq!(summary.text_boxes, 0);
    assert_eq!(shapes(&events).len(), 1);
}

#[test]
fn test_comments_open_and_close_groups() {
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x00A0, &words(&[0]))
        .op(0x0031, &rect_payload(0, 0, 10, 10))
        .op(0x00A1, &[0, 1, 0, 3, 1, 2, 3])
        .op(0x00A0, &words(&[0]))
        .end();
    let (events, _) = decode(&data);
    assert!(matches!(events[1], ListenerEvent::OpenGroup(_)));
    assert!(matches!(events[2], ListenerEvent::Shape { .. }));
    assert_eq!(events[3], ListenerEvent::CloseGroup);
    assert!(matches!(events[4], ListenerEvent::OpenGroup(_)));
    // the unclosed group is closed before the document ends
    assert_eq!(events[5], ListenerEvent::CloseGroup);
    assert_eq!(events[6], ListenerEvent::EndDocument);

    let options = PictOptions::new().with_picture_comments(false);
    let (events, _) = decode_with(&data, options);
    assert_eq!(events.len(), 3);
}

fn bits_rect() -> Vec<u8> {
    let mut payload = words(&[2]);
    payload.extend(rect_payload(0, 0, 2, 8));
    payload.extend(rect_payload(0, 0, 2, 8));
    payload.extend(rect_payload(20, 20, 22, 28));
    payload.extend(words(&[0]));
    payload.extend([0xF0, 0, 0x0F, 0]);
    payload
}

/// A packed bitmap of one 64 pixel row: 31 bytes, so followed by a pad byte.
fn pack_bits_rect() -> Vec<u8> {
    let mut payload = words(&[8]);
    payload.extend(rect_payload(0, 0, 1, 64));
    payload.extend(rect_payload(0, 0, 1, 64));
    payload.extend(rect_payload(0, 0, 1, 64));
    payload.extend(words(&[0]));
    payload.extend([2, 0xF9, 0xAA]);
    payload
}

#[test]
fn test_bitmap_becomes_png_picture() {
    let data = PictBuilder::v2(0, 0, 100, 100).op(0x0090, &bits_rect()).end();
    let (events, summary) = decode(&data);
    assert_eq!(summary.pictures, 1);
    match &events[1] {
        ListenerEvent::Picture { position, picture } => {
            assert_eq!(picture.mime_type, "image/png");
            assert_eq!(position.min, Point2f::new(20.0, 20.0));
        },
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_full_plane_clip_region_on_small_bitmap() {
    let mut payload = words(&[2]);
    payload.extend(rect_payload(0, 0, 1, 1));
    payload.extend(rect_payload(0, 0, 1, 1));
    payload.extend(rect_payload(5, 5, 6, 6));
    payload.extend(words(&[0]));
    payload.extend(words(&[10, -32768, -32768, 32767, 32767]));
    payload.extend([0x80, 0]);
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x0091, &payload)
        .op(0x0030, &rect_payload(0, 0, 10, 10))
        .end();
    let (events, summary) = decode(&data);
    assert_eq!(summary.pictures, 1);
    assert_eq!(shapes(&events).len(), 1);
    assert!(!summary.ended_early);
}

#[test]
fn test_packed_bitmap_keeps_alignment() {
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x0098, &pack_bits_rect())
        .op(0x0030, &rect_payload(0, 0, 10, 10))
        .end();
    let (events, summary) = decode(&data);
    assert_eq!(summary.pictures, 1);
    assert_eq!(shapes(&events).len(), 1);
    assert!(!summary.ended_early);
}

#[test]
fn test_bad_packbits_row_skips_only_the_bitmap() {
    let mut payload = pack_bits_rect();
    let len = payload.len();
    // a run of 9 bytes in an 8 byte row
    payload[len - 2] = 0xF8;
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x0098, &payload)
        .op(0x0030, &rect_payload(0, 0, 10, 10))
        .end();
    let (events, summary) = decode(&data);
    assert_eq!(summary.pictures, 0);
    assert_eq!(shapes(&events).len(), 1);
    assert_eq!(summary.diagnostics.len(), 1);
}

fn uncompressed_quicktime() -> Vec<u8> {
    let mut body = vec![0, 0];
    body.extend([0; 36]);
    body.extend([0; 4]);
    body.extend([0; 8]);
    let mut payload = (body.len() as u32).to_be_bytes().to_vec();
    payload.extend(body);
    payload
}

#[test]
fn test_quicktime_preview_is_not_drawn() {
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x8201, &uncompressed_quicktime())
        .op(0x0098, &pack_bits_rect())
        .op(0x0090, &bits_rect())
        .end();
    let (events, summary) = decode(&data);
    // only the second bitmap reaches the listener
    assert_eq!(summary.pictures, 1);
    assert!(events.iter().any(|e| matches!(
        e,
        ListenerEvent::Picture { position, .. } if position.min == Point2f::new(20.0, 20.0)
    )));

    let options = PictOptions::new().with_quicktime_preview(true);
    let (_, summary) = decode_with(&data, options);
    assert_eq!(summary.pictures, 2);
}

#[test]
fn test_direct_bits_pixmap() {
    let mut payload = vec![0, 0, 0, 0xFF];
    payload.extend(words(&[0x8000u16 as i16 | 8]));
    payload.extend(rect_payload(0, 0, 1, 2));
    payload.extend(words(&[0, 1])); // version, pack type
    payload.extend([0, 0, 0, 0]); // pack size
    payload.extend([0, 72, 0, 0, 0, 72, 0, 0]);
    payload.extend(words(&[16, 32, 3, 8]));
    payload.extend([0; 12]);
    payload.extend(rect_payload(0, 0, 1, 2));
    payload.extend(rect_payload(0, 0, 1, 2));
    payload.extend(words(&[0]));
    payload.extend([0, 255, 0, 0, 0, 0, 0, 255]);
    let data = PictBuilder::v2(0, 0, 100, 100).op(0x009A, &payload).end();
    let (events, summary) = decode(&data);
    assert_eq!(summary.pictures, 1);
    assert!(summary.diagnostics.is_empty());
    assert!(matches!(&events[1], ListenerEvent::Picture { picture, .. } if picture.mime_type == "image/png"));
}

#[test]
fn test_pixel_pattern_type_2() {
    let mut pattern = words(&[2]);
    pattern.extend([0xAA; 8]);
    pattern.extend(words(&[0, -1, 0]));
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x0014, &pattern)
        .op(0x0034, &rect_payload(0, 0, 10, 10))
        .end();
    let (events, _) = decode(&data);
    let drawn = shapes(&events);
    assert_eq!(drawn[0].1.surface, Surface::Color(RgbColor::new(0, 255, 0)));
}

#[test]
fn test_decode_step_by_step() {
    let data = PictBuilder::v2(0, 0, 100, 100)
        .op(0x0007, &words(&[4, 4]))
        .end();
    let mut decoder = PictDecoder::new(&data, PictOptions::default()).unwrap();
    let mut listener = RecordingListener::new();
    assert!(decoder.decode_next_opcode(&mut listener));
    assert!(decoder.decode_next_opcode(&mut listener));
    assert_eq!(decoder.state().pen_size.x, 4);
    assert!(!decoder.decode_next_opcode(&mut listener));
    assert!(!decoder.decode_next_opcode(&mut listener));
    assert!(!decoder.summary().ended_early);
}
