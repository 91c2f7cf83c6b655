//! Shape visibility, style resolution and arc geometry.
//!
//! Styles are computed from the port right before each listener call, so a
//! "same shape" opcode drawn after a color change picks up the new color.

use crate::common::geometry::{Box2f, Point2f};
use crate::common::style::{GraphicStyle, Pattern, Surface};

use super::opcode::Verb;
use super::state::{GraphicsState, MODE_PASSTHROUGH, PenPattern};

/// Does drawing with `verb` reach the listener?
///
/// Inverted shapes and PostScript passthrough drawing are never sent, and a
/// frame needs a pen with a non-zero width and height.
pub fn is_visible(verb: Verb, state: &GraphicsState) -> bool {
    match verb {
        Verb::Invert => false,
        Verb::Text => state.text.mode != MODE_PASSTHROUGH,
        _ if state.pen_mode == MODE_PASSTHROUGH => false,
        Verb::Frame => state.pen_size.x != 0 && state.pen_size.y != 0,
        _ => true,
    }
}

fn surface_of(pattern: &PenPattern, state: &GraphicsState) -> Surface {
    let pattern: Pattern = pattern.resolve(state.fore_color, state.back_color);
    match pattern.unique_color() {
        Some(color) => Surface::Color(color),
        None => Surface::Pattern(pattern),
    }
}

/// Style of a shape drawn with `verb` in the current port.
pub fn resolve_style(verb: Verb, state: &GraphicsState) -> GraphicStyle {
    match verb {
        Verb::Frame | Verb::Text => {
            let pen = state.pen_pattern.resolve(state.fore_color, state.back_color);
            let line_width = if verb == Verb::Frame {
                (state.pen_size.x + state.pen_size.y) as f32 / 2.0
            } else {
                0.0
            };
            GraphicStyle {
                line_width,
                line_color: pen.average_color(),
                surface: Surface::None,
            }
        },
        Verb::Paint => GraphicStyle::surface_only(surface_of(&state.pen_pattern, state)),
        Verb::Fill => GraphicStyle::surface_only(surface_of(&state.fill_pattern, state)),
        Verb::Erase => GraphicStyle::surface_only(surface_of(&state.back_pattern, state)),
        Verb::Invert => GraphicStyle::surface_only(Surface::None),
    }
}

/// Converts QuickDraw arc angles to listener angles.
///
/// QuickDraw measures `start` clockwise from 12 o'clock and `sweep` clockwise
/// too; the listener wants counter-clockwise degrees from east. The leading
/// edge is `90 - start - sweep`. The result satisfies
/// `0 <= angles[0] < 360` and `angles[0] <= angles[1]`.
pub fn arc_angles(start: i32, sweep: i32) -> [f32; 2] {
    if sweep.abs() >= 360 {
        return [0.0, 360.0];
    }
    let first = if sweep < 0 { 90 - start } else { 90 - start - sweep };
    let first = first.rem_euclid(360);
    [first as f32, (first + sweep.abs()) as f32]
}

fn point_on_ellipse(ellipse: &Box2f, degrees: f32) -> Point2f {
    let center = ellipse.center();
    let (rx, ry) = (ellipse.width() / 2.0, ellipse.height() / 2.0);
    let rad = degrees.to_radians();
    Point2f::new(center.x + rx * rad.cos(), center.y - ry * rad.sin())
}

/// Bounding box of the arc (or pie wedge when `pie`) of `ellipse` between
/// `angles`.
pub fn arc_bbox(ellipse: &Box2f, angles: [f32; 2], pie: bool) -> Box2f {
    if angles[1] - angles[0] >= 360.0 {
        return *ellipse;
    }
    let mut points = vec![
        point_on_ellipse(ellipse, angles[0]),
        point_on_ellipse(ellipse, angles[1]),
    ];
    let first_axis = (angles[0] / 90.0).ceil() as i32;
    let last_axis = (angles[1] / 90.0).floor() as i32;
    for axis in first_axis..=last_axis {
        points.push(point_on_ellipse(ellipse, (axis * 90) as f32));
    }
    if pie {
        points.push(ellipse.center());
    }
    Box2f::bounding(&points).unwrap_or(*ellipse)
}
