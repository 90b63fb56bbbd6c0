//! # Layers
//!
//! The placeable units of a composition. All geometry is in canvas units.

use super::transform::Frame;
use crate::color::Color;

pub type LayerID = crate::DarkroomID<Layer>;

/// Width of a text layout box per character, as a fraction of the font size.
pub const TEXT_ADVANCE_EM: f32 = 0.6;
/// Height of a text layout box, as a fraction of the font size.
pub const TEXT_LINE_EM: f32 = 1.2;
/// Extra slop around thin strokes, so they can be grabbed at all.
const STROKE_HIT_SLOP: f32 = 4.0;

#[derive(Clone, Debug)]
pub struct Layer {
    pub id: LayerID,
    pub kind: LayerKind,
}

#[derive(Clone, Debug, strum::AsRefStr)]
pub enum LayerKind {
    Image(ImageLayer),
    Stroke(StrokeLayer),
    Text(TextLayer),
}

/// Placement of an image layer's box. See [`Frame`] for how these compose.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rotation_degrees: f32,
    pub scale: f32,
    /// Clamped to `[0, 1]`.
    pub opacity: f32,
}
impl Placement {
    /// Unrotated, unscaled, opaque box.
    #[must_use]
    pub fn new([x, y]: [f32; 2], [width, height]: [f32; 2]) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation_degrees: 0.0,
            scale: 1.0,
            opacity: 1.0,
        }
    }
    #[must_use]
    pub fn frame(&self) -> Frame {
        Frame {
            origin: [self.x, self.y],
            size: [self.width, self.height],
            scale: self.scale,
            rotation_degrees: self.rotation_degrees,
        }
    }
    pub(crate) fn is_finite(&self) -> bool {
        [
            self.x,
            self.y,
            self.width,
            self.height,
            self.rotation_degrees,
            self.scale,
            self.opacity,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// A set of placement fields to merge into a layer. `None` leaves the field as-is.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PartialPlacement {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub rotation_degrees: Option<f32>,
    pub scale: Option<f32>,
    pub opacity: Option<f32>,
}
impl PartialPlacement {
    #[must_use]
    pub fn position([x, y]: [f32; 2]) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
    pub(crate) fn is_finite(&self) -> bool {
        [
            self.x,
            self.y,
            self.width,
            self.height,
            self.rotation_degrees,
            self.scale,
            self.opacity,
        ]
        .iter()
        .flatten()
        .all(|v| v.is_finite())
    }
    /// True if anything other than position is set.
    pub(crate) fn has_shape_fields(&self) -> bool {
        self.width.is_some()
            || self.height.is_some()
            || self.rotation_degrees.is_some()
            || self.scale.is_some()
            || self.opacity.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct ImageLayer {
    pub bitmap: std::sync::Arc<crate::ingest::Bitmap>,
    pub placement: Placement,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StrokeLayer {
    /// Canvas-space points, in drawing order. Never rewritten once captured.
    pub points: Vec<[f32; 2]>,
    pub color: Color,
    pub stroke_width: f32,
    /// Translation applied on top of `points` when the stroke has been dragged.
    pub offset: [f32; 2],
}
impl StrokeLayer {
    /// Points with the drag offset applied.
    pub fn placed_points(&self) -> impl Iterator<Item = [f32; 2]> + '_ {
        let [dx, dy] = self.offset;
        self.points.iter().map(move |&[x, y]| [x + dx, y + dy])
    }
    /// Axis-aligned bounds of the placed points, grown by half the stroke width.
    #[must_use]
    pub fn bounds(&self) -> Frame {
        let mut min = [f32::INFINITY; 2];
        let mut max = [f32::NEG_INFINITY; 2];
        for [x, y] in self.placed_points() {
            min = [min[0].min(x), min[1].min(y)];
            max = [max[0].max(x), max[1].max(y)];
        }
        if self.points.is_empty() {
            min = self.offset;
            max = self.offset;
        }
        let pad = self.stroke_width / 2.0;
        Frame {
            origin: [min[0] - pad, min[1] - pad],
            size: [max[0] - min[0] + 2.0 * pad, max[1] - min[1] + 2.0 * pad],
            scale: 1.0,
            rotation_degrees: 0.0,
        }
    }
    #[must_use]
    pub fn hit(&self, point: [f32; 2]) -> bool {
        let reach = self.stroke_width / 2.0 + STROKE_HIT_SLOP;
        let mut placed = self.placed_points();
        let Some(first) = placed.next() else {
            return false;
        };
        if distance_to_segment(point, first, first) <= reach {
            return true;
        }
        let mut prev = first;
        placed.any(|next| {
            let hit = distance_to_segment(point, prev, next) <= reach;
            prev = next;
            hit
        })
    }
}

fn distance_to_segment(p: [f32; 2], a: [f32; 2], b: [f32; 2]) -> f32 {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let ap = [p[0] - a[0], p[1] - a[1]];
    let len_sq = ab[0] * ab[0] + ab[1] * ab[1];
    let t = if len_sq > 0.0 {
        ((ap[0] * ab[0] + ap[1] * ab[1]) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let closest = [a[0] + ab[0] * t, a[1] + ab[1] * t];
    (p[0] - closest[0]).hypot(p[1] - closest[1])
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextLayer {
    pub content: String,
    /// Top-left of the unscaled layout box.
    pub x: f32,
    pub y: f32,
    pub rotation_degrees: f32,
    pub scale: f32,
    pub color: Color,
    pub font_size: f32,
}
impl TextLayer {
    /// Size of the unscaled layout box. Depends only on character count and font size, so that
    /// selection and hit testing behave the same whether or not a font is available.
    #[must_use]
    pub fn layout_size(&self) -> [f32; 2] {
        let chars = self.content.chars().count().max(1);
        [
            chars as f32 * self.font_size * TEXT_ADVANCE_EM,
            self.font_size * TEXT_LINE_EM,
        ]
    }
    #[must_use]
    pub fn frame(&self) -> Frame {
        Frame {
            origin: [self.x, self.y],
            size: self.layout_size(),
            scale: self.scale,
            rotation_degrees: self.rotation_degrees,
        }
    }
}

impl LayerKind {
    /// Box used for selection and hit testing.
    #[must_use]
    pub fn frame(&self) -> Frame {
        match self {
            Self::Image(image) => image.placement.frame(),
            Self::Stroke(stroke) => stroke.bounds(),
            Self::Text(text) => text.frame(),
        }
    }
    /// The value a drag moves: top-left for images and text, offset for strokes.
    #[must_use]
    pub fn position(&self) -> [f32; 2] {
        match self {
            Self::Image(image) => [image.placement.x, image.placement.y],
            Self::Stroke(stroke) => stroke.offset,
            Self::Text(text) => [text.x, text.y],
        }
    }
    /// Whether scale, rotation, and resize apply. Strokes can only be moved.
    #[must_use]
    pub fn is_shapeable(&self) -> bool {
        !matches!(self, Self::Stroke(_))
    }
    /// Rotation-aware hit test.
    #[must_use]
    pub fn hit(&self, point: [f32; 2]) -> bool {
        match self {
            Self::Stroke(stroke) => stroke.hit(point),
            Self::Image(_) | Self::Text(_) => self.frame().contains(point),
        }
    }
    /// Move by a canvas-space delta, used for paste offsets.
    pub(crate) fn translate(&mut self, [dx, dy]: [f32; 2]) {
        match self {
            Self::Image(image) => {
                image.placement.x += dx;
                image.placement.y += dy;
            }
            Self::Stroke(stroke) => {
                stroke.offset[0] += dx;
                stroke.offset[1] += dy;
            }
            Self::Text(text) => {
                text.x += dx;
                text.y += dy;
            }
        }
    }
}
impl Layer {
    #[must_use]
    pub fn frame(&self) -> Frame {
        self.kind.frame()
    }
    #[must_use]
    pub fn hit(&self, point: [f32; 2]) -> bool {
        self.kind.hit(point)
    }
}
