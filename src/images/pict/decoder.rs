//! The QuickDraw opcode interpreter.
//!
//! [`PictDecoder`] pulls one opcode at a time, lets it update the
//! [`GraphicsState`] and forwards whatever it draws to a
//! [`DocumentListener`]. Only a missing header is fatal: an opcode whose
//! payload cannot be read stops the loop, and everything drawn before it is
//! kept.

use log::{debug, warn};

use super::draw::{arc_angles, arc_bbox, is_visible, resolve_style};
use super::header::{PictHeader, PictVersion};
use super::opcode::{Opcode, ShapeKind, Skip, Verb};
use super::options::PictOptions;
use super::pixmap::{describe, read_bitmap, read_pixel_pattern, read_pixmap};
use super::quicktime::read_quicktime;
use super::raster::{bitmap_image, pixmap_image, png_picture};
use super::region::{read_point, read_polygon, read_rect, read_region};
use super::state::{GraphicsState, PenPattern};
use super::text::TextRun;
use crate::common::error::{Error, Result};
use crate::common::geometry::{Box2f, Box2i, Point2f, Point2i, Vec2i};
use crate::common::stream::InputStream;
use crate::common::style::{RgbColor, TextFace};
use crate::listener::{DocumentListener, PageGeometry, Picture, Shape};

/// Picture comment kinds opening and closing a group.
const COMMENT_LPAREN: u16 = 0;
const COMMENT_RPAREN: u16 = 1;

/// A recovered anomaly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Offset of the opcode being decoded.
    pub offset: usize,
    pub message: String,
}

/// What a decode produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PictSummary {
    pub version: PictVersion,
    pub frame: Box2i,
    pub opcodes: usize,
    pub shapes: usize,
    pub pictures: usize,
    pub text_boxes: usize,
    /// The loop stopped before an `EndPic` opcode.
    pub ended_early: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Decoder over one PICT picture.
pub struct PictDecoder<'a> {
    input: InputStream<'a>,
    header: PictHeader,
    state: GraphicsState,
    options: PictOptions,
    summary: PictSummary,
    /// Offset of the opcode being decoded.
    op_start: usize,
    open_groups: usize,
    done: bool,
}

impl<'a> PictDecoder<'a> {
    /// Reads the picture header; an unreadable header is the only error.
    pub fn new(data: &'a [u8], options: PictOptions) -> Result<Self> {
        let header = PictHeader::parse(data)?;
        let mut input = InputStream::new(data);
        input.seek(header.data_start)?;
        Ok(Self {
            input,
            header,
            state: GraphicsState::new(),
            options,
            summary: PictSummary {
                version: header.version,
                frame: header.frame,
                opcodes: 0,
                shapes: 0,
                pictures: 0,
                text_boxes: 0,
                ended_early: false,
                diagnostics: Vec::new(),
            },
            op_start: header.data_start,
            open_groups: 0,
            done: false,
        })
    }

    pub fn header(&self) -> &PictHeader {
        &self.header
    }

    pub fn state(&self) -> &GraphicsState {
        &self.state
    }

    pub fn summary(&self) -> &PictSummary {
        &self.summary
    }

    /// Decodes the whole picture into `listener`.
    pub fn decode(mut self, listener: &mut dyn DocumentListener) -> PictSummary {
        listener.start_document(&PageGeometry {
            frame: self.header.frame.to_f32(),
            resolution: self.header.resolution,
        });
        while self.decode_next_opcode(listener) {
            if let Some(max) = self.options.max_opcodes
                && self.summary.opcodes >= max
            {
                self.diagnose(format!("stopped after {} opcodes", max));
                self.summary.ended_early = true;
                break;
            }
        }
        for _ in 0..self.open_groups {
            listener.close_group();
        }
        self.open_groups = 0;
        listener.end_document();
        self.summary
    }

    /// Decodes one opcode. Returns `false` once the picture is finished,
    /// either by `EndPic` or because the stream cannot be read further.
    pub fn decode_next_opcode(&mut self, listener: &mut dyn DocumentListener) -> bool {
        if self.done {
            return false;
        }
        self.op_start = self.input.tell();
        let code = match self.header.version {
            PictVersion::V1 => self.input.read_u8().map(u16::from),
            PictVersion::V2 => self.input.read_u16(),
        };
        let Ok(code) = code else {
            self.diagnose("picture ends without EndPic".to_string());
            self.summary.ended_early = true;
            self.done = true;
            return false;
        };

        let op = Opcode::from_code(code);
        self.summary.opcodes += 1;
        match self.apply(op, listener) {
            Ok(true) => {},
            Ok(false) => {
                self.done = true;
                return false;
            },
            Err(err) => {
                warn!("pict: {} at offset {}: {}", op, self.op_start, err);
                self.diagnose(format!("{}: {}", op, err));
                self.summary.ended_early = true;
                self.done = true;
                return false;
            },
        }

        if self.header.version == PictVersion::V2 && self.input.tell() % 2 == 1 && !self.input.is_end() {
            // v2 opcodes are word aligned; the picture starts at an even offset
            let _ = self.input.skip(1);
        }
        true
    }

    fn diagnose(&mut self, message: String) {
        debug!("pict: {} (offset {})", message, self.op_start);
        self.summary.diagnostics.push(Diagnostic {
            offset: self.op_start,
            message,
        });
    }

    /// Undoes the `Origin` shift.
    fn to_page_f(&self, pt: Point2f) -> Point2f {
        Point2f::new(
            pt.x - self.state.origin.x as f32,
            pt.y - self.state.origin.y as f32,
        )
    }

    fn to_page(&self, pt: Point2i) -> Point2f {
        self.to_page_f(pt.to_f32())
    }

    fn to_page_box(&self, bbox: &Box2i) -> Box2f {
        Box2f::new(self.to_page(bbox.min), self.to_page(bbox.max))
    }

    fn read_pattern(&mut self) -> Result<[u8; 8]> {
        let mut bits = [0u8; 8];
        bits.copy_from_slice(self.input.read_block(8)?);
        Ok(bits)
    }

    fn read_rgb(&mut self) -> Result<RgbColor> {
        let r = self.input.read_u16()?;
        let g = self.input.read_u16()?;
        let b = self.input.read_u16()?;
        Ok(RgbColor::from_rgb16(r, g, b))
    }

    fn read_color_code(&mut self) -> Result<RgbColor> {
        let code = self.input.read_u32()?;
        Ok(RgbColor::from_quickdraw_code(code).unwrap_or_else(|| {
            self.diagnose(format!("unknown color code {}", code));
            RgbColor::black()
        }))
    }

    /// Runs one opcode. `Ok(false)` ends the picture.
    fn apply(&mut self, op: Opcode, listener: &mut dyn DocumentListener) -> Result<bool> {
        match op {
            Opcode::Nop | Opcode::HiliteMode | Opcode::DefHilite => {},
            Opcode::Clip => {
                let region = read_region(&mut self.input)?;
                if region.has_extra_data {
                    self.diagnose(format!("clip region {} has bad tokens", region.bbox));
                }
                self.state.clip = Some(region);
            },
            Opcode::BkPat => self.state.back_pattern = PenPattern::Bits(self.read_pattern()?),
            Opcode::PnPat => self.state.pen_pattern = PenPattern::Bits(self.read_pattern()?),
            Opcode::FillPat => self.state.fill_pattern = PenPattern::Bits(self.read_pattern()?),
            Opcode::TxFont => self.state.text.font_id = self.input.read_i16()? as i32,
            Opcode::TxFace => {
                self.state.text.face = TextFace::from_bits_truncate(self.input.read_u8()?)
            },
            Opcode::TxMode => self.state.text.mode = self.input.read_u16()?,
            Opcode::SpExtra => {
                self.state.text.space_extra = self.input.read_i32()? as f32 / 65536.0
            },
            Opcode::PnSize => {
                let size = read_point(&mut self.input)?;
                self.state.pen_size = Vec2i::new(size.x, size.y);
            },
            Opcode::PnMode => self.state.pen_mode = self.input.read_u16()?,
            Opcode::OvSize => {
                let size = read_point(&mut self.input)?;
                self.state.oval_size = Vec2i::new(size.x, size.y);
            },
            Opcode::Origin => {
                let dh = self.input.read_i16()? as i32;
                let dv = self.input.read_i16()? as i32;
                self.state.origin = Vec2i::new(self.state.origin.x + dh, self.state.origin.y + dv);
            },
            Opcode::TxSize => self.state.text.size = self.input.read_i16()? as i32,
            Opcode::FgColor => self.state.fore_color = self.read_color_code()?,
            Opcode::BkColor => self.state.back_color = self.read_color_code()?,
            Opcode::TxRatio => self.input.skip(8)?,
            Opcode::Version => match self.header.version {
                PictVersion::V1 => self.input.skip(1)?,
                PictVersion::V2 => self.input.skip(2)?,
            },
            Opcode::BkPixPat | Opcode::PnPixPat | Opcode::FillPixPat => {
                let pattern = read_pixel_pattern(&mut self.input, self.options.palette_fallback)?;
                match op {
                    Opcode::BkPixPat => self.state.back_pattern = pattern,
                    Opcode::PnPixPat => self.state.pen_pattern = pattern,
                    _ => self.state.fill_pattern = pattern,
                }
            },
            Opcode::PnLocHFrac => self.input.skip(2)?,
            Opcode::ChExtra => self.state.text.char_extra = self.input.read_i16()? as f32,
            Opcode::RgbFgCol => self.state.fore_color = self.read_rgb()?,
            Opcode::RgbBkCol => self.state.back_color = self.read_rgb()?,
            Opcode::HiliteColor => self.state.hilite_color = self.read_rgb()?,
            Opcode::OpColor => self.state.op_color = self.read_rgb()?,

            Opcode::Line => {
                let from = read_point(&mut self.input)?;
                let to = read_point(&mut self.input)?;
                self.draw_line(from, to, listener);
            },
            Opcode::LineFrom => {
                let to = read_point(&mut self.input)?;
                self.draw_line(self.state.pen_position, to, listener);
            },
            Opcode::ShortLine => {
                let from = read_point(&mut self.input)?;
                let dh = self.input.read_i8()? as i32;
                let dv = self.input.read_i8()? as i32;
                self.draw_line(from, from.offset(dh, dv), listener);
            },
            Opcode::ShortLineFrom => {
                let dh = self.input.read_i8()? as i32;
                let dv = self.input.read_i8()? as i32;
                let from = self.state.pen_position;
                self.draw_line(from, from.offset(dh, dv), listener);
            },

            Opcode::LongText => {
                self.state.text_position = read_point(&mut self.input)?;
                self.draw_text(listener)?;
            },
            Opcode::DhText => {
                let dh = self.input.read_u8()? as i32;
                self.state.text_position = self.state.text_position.offset(dh, 0);
                self.draw_text(listener)?;
            },
            Opcode::DvText => {
                let dv = self.input.read_u8()? as i32;
                self.state.text_position = self.state.text_position.offset(0, dv);
                self.draw_text(listener)?;
            },
            Opcode::DhDvText => {
                let dh = self.input.read_u8()? as i32;
                let dv = self.input.read_u8()? as i32;
                self.state.text_position = self.state.text_position.offset(dh, dv);
                self.draw_text(listener)?;
            },
            Opcode::FontName => self.read_font_name()?,
            Opcode::LineJustify | Opcode::GlyphState => self.skip_payload(Skip::Length16)?,

            Opcode::Shape { kind, verb, same } => self.shape_op(kind, verb, same, listener)?,
            Opcode::Raster {
                packed,
                direct,
                region,
            } => self.raster_op(packed, direct, region, listener)?,

            Opcode::ShortComment => {
                let kind = self.input.read_u16()?;
                self.comment(kind, listener);
            },
            Opcode::LongComment => {
                let kind = self.input.read_u16()?;
                let size = self.input.read_u16()? as usize;
                self.input.skip(size)?;
                self.comment(kind, listener);
            },
            Opcode::EndPic => return Ok(false),
            Opcode::HeaderOp => self.input.skip(24)?,
            Opcode::CompressedQuickTime | Opcode::UncompressedQuickTime => {
                self.quicktime_op(op == Opcode::CompressedQuickTime, listener)?
            },
            Opcode::Reserved(code, skip) => {
                debug!("pict: skipping reserved opcode {:#06x}", code);
                self.skip_payload(skip)?;
            },
        }
        Ok(true)
    }

    fn skip_payload(&mut self, skip: Skip) -> Result<()> {
        match skip {
            Skip::Fixed(n) => self.input.skip(n)?,
            Skip::Length16 => {
                let len = self.input.read_u16()? as usize;
                self.input.skip(len)?;
            },
            Skip::Length32 => {
                let len = self.input.read_u32()? as usize;
                self.input.skip(len)?;
            },
            Skip::SizePrefixed => {
                let start = self.input.tell();
                let size = self.input.read_u16()? as usize;
                if size < 2 {
                    return Err(Error::CorruptedFile(format!("record size {}", size)));
                }
                self.input.seek(start + size)?;
            },
        }
        Ok(())
    }

    fn read_font_name(&mut self) -> Result<()> {
        let len = self.input.read_u16()? as usize;
        let end = self.input.tell() + len;
        if !self.input.check_position(end) {
            return Err(Error::CorruptedFile(format!("font name of {} bytes", len)));
        }
        let id = self.input.read_i16()? as i32;
        let name_len = self.input.read_u8()? as usize;
        if self.input.tell() + name_len <= end {
            let bytes = self.input.read_block(name_len)?;
            let (name, _) = encoding_rs::MACINTOSH.decode_without_bom_handling(bytes);
            self.state.font_names.insert(id, name.into_owned());
        } else {
            self.diagnose(format!("font name for {} overflows its record", id));
        }
        self.input.seek(end)?;
        Ok(())
    }

    fn send_shape(
        &mut self,
        verb: Verb,
        position: Box2f,
        shape: Shape,
        listener: &mut dyn DocumentListener,
    ) {
        if !is_visible(verb, &self.state) {
            return;
        }
        let style = resolve_style(verb, &self.state);
        listener.insert_shape(&position, &shape, &style);
        self.summary.shapes += 1;
    }

    fn draw_line(&mut self, from: Point2i, to: Point2i, listener: &mut dyn DocumentListener) {
        self.state.move_pen(to);
        let shape = Shape::Line {
            from: self.to_page(from),
            to: self.to_page(to),
        };
        self.send_shape(Verb::Frame, shape.bbox(), shape, listener);
    }

    fn draw_text(&mut self, listener: &mut dyn DocumentListener) -> Result<()> {
        let count = self.input.read_u8()? as usize;
        let bytes = self.input.read_block(count)?;
        if !is_visible(Verb::Text, &self.state) {
            return Ok(());
        }
        let run = TextRun::new(self.state.font(), bytes);
        let position = run.bounds(self.to_page(self.state.text_position));
        let style = resolve_style(Verb::Text, &self.state);
        listener.insert_text_box(&position, &run, &style);
        self.summary.text_boxes += 1;
        Ok(())
    }

    /// Reads the geometry of a shape opcode, or takes the stored one for the
    /// "same" variants, then draws it.
    fn shape_op(
        &mut self,
        kind: ShapeKind,
        verb: Verb,
        same: bool,
        listener: &mut dyn DocumentListener,
    ) -> Result<()> {
        let shape = match kind {
            ShapeKind::Rect | ShapeKind::RoundRect | ShapeKind::Oval => {
                let bbox = if same {
                    self.last_box(kind)
                } else {
                    let bbox = read_rect(&mut self.input)?;
                    *self.last_box_mut(kind) = Some(bbox);
                    Some(bbox)
                };
                let Some(bbox) = bbox else {
                    self.diagnose(format!("no previous {:?} to draw", kind));
                    return Ok(());
                };
                let bbox = self.to_page_box(&bbox);
                match kind {
                    ShapeKind::Oval => Shape::Circle { bbox },
                    ShapeKind::RoundRect => Shape::Rectangle {
                        bbox,
                        corner: Point2f::new(
                            self.state.oval_size.x as f32,
                            self.state.oval_size.y as f32,
                        ),
                    },
                    _ => Shape::Rectangle {
                        bbox,
                        corner: Point2f::default(),
                    },
                }
            },
            ShapeKind::Arc => {
                let bbox = if same {
                    self.state.last_arc
                } else {
                    let bbox = read_rect(&mut self.input)?;
                    self.state.last_arc = Some(bbox);
                    Some(bbox)
                };
                let start = self.input.read_i16()? as i32;
                let sweep = self.input.read_i16()? as i32;
                let Some(bbox) = bbox else {
                    self.diagnose("no previous arc to draw".to_string());
                    return Ok(());
                };
                let ellipse = self.to_page_box(&bbox);
                let angles = arc_angles(start, sweep);
                if verb == Verb::Frame {
                    Shape::Arc {
                        ellipse,
                        bbox: arc_bbox(&ellipse, angles, false),
                        angles,
                    }
                } else {
                    Shape::Pie {
                        ellipse,
                        bbox: arc_bbox(&ellipse, angles, true),
                        angles,
                    }
                }
            },
            ShapeKind::Polygon => {
                if !same {
                    self.state.last_polygon = Some(read_polygon(&mut self.input)?);
                }
                let points = self
                    .state
                    .last_polygon
                    .as_ref()
                    .map(|pts| pts.iter().map(|p| self.to_page(*p)).collect::<Vec<_>>());
                let Some(points) = points else {
                    self.diagnose("no previous polygon to draw".to_string());
                    return Ok(());
                };
                Shape::Polygon { points }
            },
            ShapeKind::Region => {
                if !same {
                    let region = read_region(&mut self.input)?;
                    if region.has_extra_data {
                        self.diagnose(format!("region {} has bad tokens", region.bbox));
                    }
                    self.state.last_region = Some(region);
                }
                let Some(bbox) = self.state.last_region.as_ref().map(|r| r.bbox) else {
                    self.diagnose("no previous region to draw".to_string());
                    return Ok(());
                };
                Shape::Rectangle {
                    bbox: self.to_page_box(&bbox),
                    corner: Point2f::default(),
                }
            },
        };
        self.send_shape(verb, shape.bbox(), shape, listener);
        Ok(())
    }

    fn last_box(&self, kind: ShapeKind) -> Option<Box2i> {
        match kind {
            ShapeKind::RoundRect => self.state.last_round_rect,
            ShapeKind::Oval => self.state.last_oval,
            _ => self.state.last_rect,
        }
    }

    fn last_box_mut(&mut self, kind: ShapeKind) -> &mut Option<Box2i> {
        match kind {
            ShapeKind::RoundRect => &mut self.state.last_round_rect,
            ShapeKind::Oval => &mut self.state.last_oval,
            _ => &mut self.state.last_rect,
        }
    }

    /// Bitmap and pixmap opcodes. A bitmap is told from a pixmap by the high
    /// bit of `rowBytes`, peeked without consuming it.
    fn raster_op(
        &mut self,
        packed: bool,
        direct: bool,
        has_region: bool,
        listener: &mut dyn DocumentListener,
    ) -> Result<()> {
        if direct {
            let _base_address = self.input.read_u32()?;
        }
        let is_pixmap = direct || self.input.with_peek(|s| s.read_u16())? & 0x8000 != 0;
        let preview = std::mem::take(&mut self.state.skip_next_raster);
        let hidden = preview && !self.options.draw_quicktime_preview;

        let (dst_rect, image) = if is_pixmap {
            let Some(pixmap) = read_pixmap(
                &mut self.input,
                direct,
                packed,
                has_region,
                self.options.palette_fallback,
            )?
            else {
                self.diagnose("pixmap rows could not be unpacked".to_string());
                return Ok(());
            };
            if hidden {
                debug!("pict: QuickTime preview {} not drawn", describe(&pixmap.dst_rect, None));
                return Ok(());
            }
            if pixmap.pixels.is_none() {
                self.diagnose(format!("pixel size {} is not supported", pixmap.header.pixel_size));
            }
            (pixmap.dst_rect, pixmap_image(&pixmap))
        } else {
            let Some(bitmap) = read_bitmap(&mut self.input, packed, has_region)? else {
                self.diagnose("bitmap rows could not be unpacked".to_string());
                return Ok(());
            };
            if hidden {
                debug!("pict: QuickTime preview {} not drawn", describe(&bitmap.dst_rect, None));
                return Ok(());
            }
            let image = bitmap_image(&bitmap, self.state.fore_color, self.state.back_color);
            debug!(
                "pict: bitmap {}",
                describe(&bitmap.dst_rect, bitmap.region.as_ref())
            );
            (bitmap.dst_rect, image)
        };

        match png_picture(image) {
            Ok(Some(picture)) => {
                let position = self.to_page_box(&dst_rect);
                self.send_picture(&position, &picture, listener);
            },
            Ok(None) => {},
            Err(err) => self.diagnose(format!("raster not exported: {}", err)),
        }
        Ok(())
    }

    fn send_picture(&mut self, position: &Box2f, picture: &Picture, listener: &mut dyn DocumentListener) {
        listener.insert_picture(position, picture);
        self.summary.pictures += 1;
    }

    fn quicktime_op(&mut self, compressed: bool, listener: &mut dyn DocumentListener) -> Result<()> {
        let len = self.input.read_u32()? as usize;
        let end = self.input.tell() + len;
        if !self.input.check_position(end) {
            return Err(Error::CorruptedFile(format!("QuickTime record of {} bytes", len)));
        }
        match read_quicktime(&mut self.input, end, compressed) {
            Ok(Some(image)) => match image.picture {
                Some(picture) => {
                    let position = Box2f::new(
                        self.to_page_f(image.position.min),
                        self.to_page_f(image.position.max),
                    );
                    self.send_picture(&position, &picture, listener);
                },
                None => self.diagnose(format!(
                    "QuickTime codec {} not exported",
                    String::from_utf8_lossy(&image.codec)
                )),
            },
            Ok(None) => {},
            Err(err) => self.diagnose(format!("QuickTime record: {}", err)),
        }
        self.state.skip_next_raster = true;
        self.input.seek(end)?;
        Ok(())
    }

    fn comment(&mut self, kind: u16, listener: &mut dyn DocumentListener) {
        if !self.options.send_picture_comments {
            return;
        }
        match kind {
            COMMENT_LPAREN => {
                listener.open_group(&self.header.frame.to_f32());
                self.open_groups += 1;
            },
            COMMENT_RPAREN if self.open_groups > 0 => {
                listener.close_group();
                self.open_groups -= 1;
            },
            COMMENT_RPAREN => self.diagnose("unbalanced group close".to_string()),
            other => debug!("pict: comment {}", other),
        }
    }
}

/// Decodes a PICT picture into `listener`.
///
/// # Example
/// ```no_run
/// use macpict::images::pict::{decode_pict, PictOptions};
/// use macpict::listener::RecordingListener;
///
/// let data = std::fs::read("image.pict")?;
/// let mut listener = RecordingListener::new();
/// let summary = decode_pict(&data, &mut listener, PictOptions::default())?;
/// println!("{} shapes", summary.shapes);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn decode_pict(
    data: &[u8],
    listener: &mut dyn DocumentListener,
    options: PictOptions,
) -> Result<PictSummary> {
    Ok(PictDecoder::new(data, options)?.decode(listener))
}
