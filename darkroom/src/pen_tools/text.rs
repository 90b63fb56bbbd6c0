//! Tap to place the pending text.

use super::ToolContext;
use crate::pointer_events::{PointerEvent, PointerPhase};

pub struct TextTool;

impl super::PenTool for TextTool {
    fn event(&mut self, context: &mut ToolContext<'_>, event: &PointerEvent) {
        if event.phase != PointerPhase::Down || context.text.content.is_empty() {
            return;
        }
        let Some(pos) = context.canvas_pos(event) else {
            return;
        };
        let placed = context.store.add_text_layer(
            context.text.content.clone(),
            [pos.x, pos.y],
            context.brush.color,
            context.text.font_size,
        );
        let selected = placed.and_then(|id| context.store.select(Some(id)));
        if let Err(e) = selected {
            log::warn!("Failed to place text: {e}");
        }
    }
}
