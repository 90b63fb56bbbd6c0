//! # Transform controller
//!
//! Moves, resizes, rotates, and pinches the layers under the user's pointers.
//!
//! The target of a gesture can be deleted out from under it at any time (a clear, a delete
//! button, ...). Its existence is checked before every update, and a gesture whose target is
//! gone quietly returns to [`Gesture::Idle`].

use darkroom_core::error::ErrorKind;
use darkroom_core::state::transform::Corner;
use darkroom_core::state::{LayerID, LayerKind, LayerStore, PartialPlacement};
use ultraviolet::Vec2;

use super::ToolContext;
use crate::gizmos::{Handle, SelectionGizmo};
use crate::pointer_events::{PointerEvent, PointerPhase};

#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging {
        target: LayerID,
        pointer: u64,
        /// Canvas position where the pointer took hold.
        grab: Vec2,
        /// Layer position when the pointer took hold.
        start: [f32; 2],
    },
    /// Dragging a corner handle, with the opposite corner held in place.
    Resizing {
        target: LayerID,
        pointer: u64,
        corner: Corner,
    },
    Rotating {
        target: LayerID,
        pointer: u64,
        /// Angle of the pointer about the layer center when it took hold.
        grab_angle: f32,
        start_rotation: f32,
    },
    /// Two pointers scaling and rotating the selected layer.
    ///
    /// Changes are measured against the pointers and the layer as they were when the second
    /// pointer came down, so a clamped update doesn't skew the rest of the gesture.
    PinchRotateScale {
        target: LayerID,
        pointers: [u64; 2],
        /// Distance between the pointers when the pinch began.
        start_distance: f32,
        /// Angle of the line between the pointers when the pinch began, degrees.
        start_angle: f32,
        start_scale: f32,
        start_rotation: f32,
    },
}
impl Gesture {
    #[must_use]
    pub fn target(&self) -> Option<LayerID> {
        match self {
            Self::Idle => None,
            Self::Dragging { target, .. }
            | Self::Resizing { target, .. }
            | Self::Rotating { target, .. }
            | Self::PinchRotateScale { target, .. } => Some(*target),
        }
    }
    /// The single pointer driving this gesture, if it's a one-pointer gesture.
    fn pointer(&self) -> Option<u64> {
        match self {
            Self::Dragging { pointer, .. }
            | Self::Resizing { pointer, .. }
            | Self::Rotating { pointer, .. } => Some(*pointer),
            Self::Idle | Self::PinchRotateScale { .. } => None,
        }
    }
}

#[derive(Default)]
pub struct TransformController {
    gesture: Gesture,
    /// Canvas positions of every pointer currently down.
    down: smallvec::SmallVec<[(u64, Vec2); 2]>,
}

impl super::PenTool for TransformController {
    fn event(&mut self, context: &mut ToolContext<'_>, event: &PointerEvent) {
        let Some(pos) = context.canvas_pos(event) else {
            return;
        };
        match event.phase {
            PointerPhase::Down => {
                self.set_pointer(event.pointer, pos);
                self.pointer_down(context, event, pos);
            }
            PointerPhase::Move => {
                if self.position_of(event.pointer).is_none() {
                    // Hovering.
                    return;
                }
                self.set_pointer(event.pointer, pos);
                self.pointer_move(context.store, event.pointer);
            }
            PointerPhase::Up | PointerPhase::Leave | PointerPhase::Cancel => {
                self.down.retain(|(pointer, _)| *pointer != event.pointer);
                self.pointer_up(context.store, event.pointer);
            }
        }
    }
    fn exit(&mut self, _store: &mut LayerStore) {
        self.gesture = Gesture::Idle;
        self.down.clear();
    }
}

impl TransformController {
    #[must_use]
    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }
    fn position_of(&self, pointer: u64) -> Option<Vec2> {
        self.down
            .iter()
            .find(|(id, _)| *id == pointer)
            .map(|(_, pos)| *pos)
    }
    fn set_pointer(&mut self, pointer: u64, pos: Vec2) {
        match self.down.iter_mut().find(|(id, _)| *id == pointer) {
            Some((_, old)) => *old = pos,
            None => self.down.push((pointer, pos)),
        }
    }
    fn pointer_down(&mut self, context: &mut ToolContext<'_>, event: &PointerEvent, pos: Vec2) {
        // Any second finger turns into a pinch of the selected layer.
        if !matches!(self.gesture, Gesture::PinchRotateScale { .. }) {
            if let Some(pinch) = self.try_pinch(context.store, event.pointer) {
                self.gesture = pinch;
                return;
            }
        }
        if matches!(self.gesture, Gesture::Idle) {
            self.gesture = begin(context, event.pointer, event.pos, pos);
        }
    }
    /// Start pinching the selected layer with `new` and whichever pointer is already down.
    fn try_pinch(&self, store: &LayerStore, new: u64) -> Option<Gesture> {
        let layer = store.selected_layer()?;
        if !layer.kind.is_shapeable() {
            return None;
        }
        // The pointer already holding the layer, else any other that's down.
        let other = self.gesture.pointer().or_else(|| {
            self.down
                .iter()
                .map(|(id, _)| *id)
                .find(|id| *id != new)
        })?;
        let a = self.position_of(other)?;
        let b = self.position_of(new)?;
        log::trace!("Pinching {} with {other} and {new}", layer.id);
        let frame = layer.frame();
        Some(Gesture::PinchRotateScale {
            target: layer.id,
            pointers: [other, new],
            start_distance: (b - a).mag(),
            start_angle: angle_degrees(b - a),
            start_scale: frame.scale,
            start_rotation: frame.rotation_degrees,
        })
    }
    fn pointer_move(&mut self, store: &mut LayerStore, pointer: u64) {
        let Some(target) = self.gesture.target() else {
            return;
        };
        if !store.contains(target) {
            log::debug!("{target} was removed mid-gesture");
            self.gesture = Gesture::Idle;
            return;
        }
        let Some(pos) = self.position_of(pointer) else {
            return;
        };
        let gesture = self.gesture;
        let result = match gesture {
            Gesture::Idle => Ok(()),
            Gesture::Dragging {
                pointer: holding,
                grab,
                start,
                ..
            } if holding == pointer => {
                let delta = pos - grab;
                store.update_transform(
                    target,
                    PartialPlacement::position([start[0] + delta.x, start[1] + delta.y]),
                )
            }
            Gesture::Resizing {
                pointer: holding,
                corner,
                ..
            } if holding == pointer => resize(store, target, corner, pos),
            Gesture::Rotating {
                pointer: holding,
                grab_angle,
                start_rotation,
                ..
            } if holding == pointer => {
                let rotation = store.get(target).map(|layer| {
                    let [cx, cy] = layer.frame().center();
                    start_rotation + angle_degrees(pos - Vec2::new(cx, cy)) - grab_angle
                });
                match rotation {
                    Some(rotation) => store.update_transform(
                        target,
                        PartialPlacement {
                            rotation_degrees: Some(rotation),
                            ..Default::default()
                        },
                    ),
                    None => Ok(()),
                }
            }
            Gesture::PinchRotateScale {
                pointers,
                start_distance,
                start_angle,
                start_scale,
                start_rotation,
                ..
            } if pointers.contains(&pointer) => {
                let (Some(a), Some(b)) =
                    (self.position_of(pointers[0]), self.position_of(pointers[1]))
                else {
                    return;
                };
                let distance = (b - a).mag();
                // Fingers on top of each other give no usable ratio.
                if start_distance <= f32::EPSILON || distance <= f32::EPSILON {
                    return;
                }
                store.update_transform(
                    target,
                    PartialPlacement {
                        scale: Some(start_scale * distance / start_distance),
                        rotation_degrees: Some(
                            start_rotation + wrap_degrees(angle_degrees(b - a) - start_angle),
                        ),
                        ..Default::default()
                    },
                )
            }
            // Some other pointer moved.
            _ => Ok(()),
        };
        if let Err(e) = result {
            if e.kind() == ErrorKind::InvalidLayer {
                log::debug!("Abandoning gesture: {e}");
                self.gesture = Gesture::Idle;
            } else {
                log::warn!("Transform rejected: {e}");
            }
        }
    }
    fn pointer_up(&mut self, store: &LayerStore, pointer: u64) {
        let gesture = self.gesture;
        match gesture {
            Gesture::PinchRotateScale {
                target, pointers, ..
            } if pointers.contains(&pointer) => {
                let remaining = if pointers[0] == pointer {
                    pointers[1]
                } else {
                    pointers[0]
                };
                // Carry on dragging with the finger left behind.
                self.gesture = match (self.position_of(remaining), store.get(target)) {
                    (Some(grab), Some(layer)) => Gesture::Dragging {
                        target,
                        pointer: remaining,
                        grab,
                        start: layer.kind.position(),
                    },
                    _ => Gesture::Idle,
                };
            }
            _ if gesture.pointer() == Some(pointer) => self.gesture = Gesture::Idle,
            _ => (),
        }
    }
}

/// Choose a gesture for a fresh press: a handle of the selection, else the topmost layer
/// under the pointer, else nothing (and the selection is cleared).
fn begin(context: &mut ToolContext<'_>, pointer: u64, display: Vec2, pos: Vec2) -> Gesture {
    let store = &mut *context.store;
    if let Some(layer) = store.selected_layer() {
        let gizmo = SelectionGizmo::for_layer(layer, context.view);
        if let Some(handle) = gizmo.hit(display) {
            let frame = layer.frame();
            let target = layer.id;
            return match handle {
                Handle::Corner(corner) => Gesture::Resizing {
                    target,
                    pointer,
                    corner,
                },
                Handle::Rotate => {
                    let [cx, cy] = frame.center();
                    Gesture::Rotating {
                        target,
                        pointer,
                        grab_angle: angle_degrees(pos - Vec2::new(cx, cy)),
                        start_rotation: frame.rotation_degrees,
                    }
                }
            };
        }
    }
    match store.hit_test([pos.x, pos.y]) {
        Some(target) => {
            if let Err(e) = store.select(Some(target)) {
                log::warn!("Failed to select: {e}");
                return Gesture::Idle;
            }
            let start = store
                .get(target)
                .map_or([pos.x, pos.y], |layer| layer.kind.position());
            Gesture::Dragging {
                target,
                pointer,
                grab: pos,
                start,
            }
        }
        None => {
            if store.selected().is_some() {
                // Deselecting can't fail.
                let _ = store.select(None);
            }
            Gesture::Idle
        }
    }
}

/// Resize so the dragged corner follows the pointer while the opposite corner stays put,
/// in the layer's own rotated frame. Never smaller than the minimum size.
fn resize(
    store: &mut LayerStore,
    target: LayerID,
    corner: Corner,
    pos: Vec2,
) -> darkroom_core::error::Result<()> {
    let Some(layer) = store.get(target) else {
        return Ok(());
    };
    let frame = layer.frame();
    let anchor = {
        let [x, y] = frame.corner(corner.opposite());
        Vec2::new(x, y)
    };
    let (sin, cos) = frame.rotation_degrees.to_radians().sin_cos();
    // Into the unrotated frame.
    let rel = pos - anchor;
    let local = Vec2::new(rel.x * cos + rel.y * sin, -rel.x * sin + rel.y * cos);
    let [out_x, out_y] = corner.outward();
    let min = store.limits().min_size;
    let wanted = [(local.x * out_x).max(min), (local.y * out_y).max(min)];

    let update = match &layer.kind {
        LayerKind::Image(_) => PartialPlacement {
            width: Some(wanted[0] / frame.scale),
            height: Some(wanted[1] / frame.scale),
            ..Default::default()
        },
        LayerKind::Text(_) => {
            // Text keeps its aspect; follow whichever axis was pulled further.
            let [w, h] = frame.effective_size();
            let ratio = (wanted[0] / w).max(wanted[1] / h);
            PartialPlacement {
                scale: Some(frame.scale * ratio),
                ..Default::default()
            }
        }
        LayerKind::Stroke(_) => return Ok(()),
    };
    store.update_transform(target, update)?;

    // Place the box by its actual new size, which may have been clamped.
    let Some(frame) = store.get(target).map(|layer| layer.frame()) else {
        return Ok(());
    };
    let [eff_w, eff_h] = frame.effective_size();
    let half = Vec2::new(out_x * eff_w / 2.0, out_y * eff_h / 2.0);
    let center = anchor + Vec2::new(half.x * cos - half.y * sin, half.x * sin + half.y * cos);
    store.update_transform(
        target,
        PartialPlacement::position([
            center.x - frame.size[0] / 2.0,
            center.y - frame.size[1] / 2.0,
        ]),
    )
}

/// Direction of a vector, degrees clockwise from +X in a y-down space.
fn angle_degrees(v: Vec2) -> f32 {
    v.y.atan2(v.x).to_degrees()
}

/// Bring an angle difference into (-180, 180].
fn wrap_degrees(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}
