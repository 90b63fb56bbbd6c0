//! # Gizmos
//!
//! The selection overlay drawn over the canvas: an outline around the selected layer, corner
//! handles to resize it, and a handle to rotate it. Overlay geometry is sized in display
//! pixels so handles stay grabbable at any zoom, and is never part of an export.

use darkroom_core::state::transform::{Corner, Frame};
use darkroom_core::state::Layer;
use ultraviolet::Vec2;

use crate::view_transform::ViewTransform;

/// Radius of a drawn handle, in display pixels.
pub const HANDLE_RADIUS: f32 = 6.0;
/// Handles can be grabbed a little outside of where they're drawn.
pub const HANDLE_HIT_RADIUS: f32 = 12.0;
/// Distance from the top edge to the rotation handle, in display pixels.
pub const ROTATE_HANDLE_DISTANCE: f32 = 32.0;

/// The shape of a gizmo's hit window, in local coordinates.
#[derive(Copy, Clone, Debug)]
pub enum GizmoShape {
    /// Hollow ring - can be used for circles when inner=0
    Ring { inner: f32, outer: f32 },
    Rectangle { min: [f32; 2], max: [f32; 2] },
    None,
}
impl GizmoShape {
    #[must_use]
    pub fn hit(&self, local: [f32; 2]) -> bool {
        match self {
            Self::None => false,
            Self::Rectangle {
                min: [x0, y0],
                max: [x1, y1],
            } => (local[0] > *x0 && local[0] < *x1) && (local[1] > *y0 && local[1] < *y1),
            Self::Ring { inner, outer } => {
                let dist_sq = local[0] * local[0] + local[1] * local[1];

                dist_sq >= inner * inner && dist_sq <= outer * outer
            }
        }
    }
}

/// Something on the selection overlay that can be grabbed.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Handle {
    Corner(Corner),
    Rotate,
}

/// A grabbable point of the overlay, in display space.
#[derive(Copy, Clone, Debug)]
pub struct HandleGizmo {
    pub handle: Handle,
    pub position: Vec2,
    pub hit_shape: GizmoShape,
}

/// Overlay for the selected layer, in display space.
#[derive(Clone, Debug)]
pub struct SelectionGizmo {
    /// Corners of the selection box, in [`Corner::ALL`] order.
    pub outline: [Vec2; 4],
    /// Empty for layers that can only be moved.
    pub handles: smallvec::SmallVec<[HandleGizmo; 5]>,
    /// The stem joining the top edge to the rotation handle, if any.
    pub rotate_stem: Option<[Vec2; 2]>,
}
impl SelectionGizmo {
    #[must_use]
    pub fn for_layer(layer: &Layer, view: &ViewTransform) -> Self {
        let frame = layer.frame();
        let project = |[x, y]: [f32; 2]| view.project(Vec2 { x, y });
        let outline = frame.corners().map(project);
        if !layer.kind.is_shapeable() {
            return Self {
                outline,
                handles: smallvec::SmallVec::new(),
                rotate_stem: None,
            };
        }
        let ring = GizmoShape::Ring {
            inner: 0.0,
            outer: HANDLE_HIT_RADIUS,
        };
        let mut handles: smallvec::SmallVec<[HandleGizmo; 5]> = Corner::ALL
            .iter()
            .zip(outline)
            .map(|(&corner, position)| HandleGizmo {
                handle: Handle::Corner(corner),
                position,
                hit_shape: ring,
            })
            .collect();

        let (stem_base, stem_tip) = rotate_stem(&frame, &outline);
        handles.push(HandleGizmo {
            handle: Handle::Rotate,
            position: stem_tip,
            hit_shape: ring,
        });
        Self {
            outline,
            handles,
            rotate_stem: Some([stem_base, stem_tip]),
        }
    }
    /// Topmost handle under a display-space point. The rotation handle wins over corners.
    #[must_use]
    pub fn hit(&self, display: Vec2) -> Option<Handle> {
        self.handles
            .iter()
            .rev()
            .find(|gizmo| {
                let local = display - gizmo.position;
                gizmo.hit_shape.hit([local.x, local.y])
            })
            .map(|gizmo| gizmo.handle)
    }
}

/// Midpoint of the top edge, and the point a fixed display distance out from it along the
/// box's own "up".
fn rotate_stem(frame: &Frame, outline: &[Vec2; 4]) -> (Vec2, Vec2) {
    let base = (outline[0] + outline[1]) / 2.0;
    let (sin, cos) = frame.rotation_degrees.to_radians().sin_cos();
    // Local -Y, rotated clockwise on screen.
    let up = Vec2 { x: sin, y: -cos };
    (base, base + up * ROTATE_HANDLE_DISTANCE)
}
