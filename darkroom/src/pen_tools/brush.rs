//! Free-hand drawing. One stroke at a time, drawn by the first pointer to go down.

use darkroom_core::state::{LayerID, LayerStore};

use super::ToolContext;
use crate::pointer_events::{PointerEvent, PointerPhase};

#[derive(Default)]
pub struct Brush {
    /// Pointer drawing, the stroke it draws, and the last point appended.
    stroke: Option<(u64, LayerID, [f32; 2])>,
}

impl super::PenTool for Brush {
    fn event(&mut self, context: &mut ToolContext<'_>, event: &PointerEvent) {
        match (event.phase, self.stroke) {
            (PointerPhase::Down, None) => {
                let Some(point) = clamped(context, event) else {
                    return;
                };
                let brush = context.brush;
                match context.store.begin_stroke(brush.color, brush.width, point) {
                    Ok(id) => self.stroke = Some((event.pointer, id, point)),
                    Err(e) => log::warn!("Failed to begin stroke: {e}"),
                }
            }
            (PointerPhase::Move, Some((pointer, id, last))) if pointer == event.pointer => {
                let Some(point) = clamped(context, event) else {
                    return;
                };
                if point == last {
                    return;
                }
                match context.store.append_stroke_point(id, point) {
                    Ok(()) => self.stroke = Some((pointer, id, point)),
                    Err(e) => {
                        // Deleted or cleared out from under us.
                        log::debug!("Stroke {id} ended early: {e}");
                        self.stroke = None;
                    }
                }
            }
            (phase, Some((pointer, ..))) if phase.is_release() && pointer == event.pointer => {
                self.finish(context.store);
            }
            // Extra fingers, hovering.
            _ => (),
        }
    }
    fn exit(&mut self, store: &mut LayerStore) {
        self.finish(store);
    }
}

impl Brush {
    fn finish(&mut self, store: &mut LayerStore) {
        let Some((_, id, _)) = self.stroke.take() else {
            return;
        };
        if store.active_stroke() == Some(id) {
            if let Err(e) = store.end_stroke(id) {
                log::warn!("Failed to end stroke: {e}");
            }
        }
    }
}

/// Canvas position of the event, held within the canvas bounds.
fn clamped(context: &ToolContext<'_>, event: &PointerEvent) -> Option<[f32; 2]> {
    let pos = context.canvas_pos(event)?;
    let [w, h] = context.canvas_size;
    Some([pos.x.clamp(0.0, w), pos.y.clamp(0.0, h)])
}
