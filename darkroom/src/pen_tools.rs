//! # Pen Tools
//!
//! Pen tools are the way the user's pointer interacts with the layers. Moving and reshaping
//! layers, drawing strokes, and placing text are all pen tools.
//!
//! Implemented as a statemachine, with one tool active at a time according to the session's
//! [`Tool`]. A tool is told when it is being switched away from, so it can finish any gesture
//! in progress.

mod brush;
mod text;
pub mod transform;

use darkroom_core::options::{BrushSettings, TextSettings};
use darkroom_core::state::{EditorSession, LayerStore, Tool};

use crate::pointer_events::PointerEvent;
use crate::view_transform::ViewTransform;

/// What a tool may see and touch while handling an event.
pub struct ToolContext<'a> {
    pub store: &'a mut LayerStore,
    pub view: &'a ViewTransform,
    /// Brush as set when the frame began.
    pub brush: &'a BrushSettings,
    pub text: &'a TextSettings,
    pub canvas_size: [f32; 2],
}
impl ToolContext<'_> {
    /// Display-space event position in canvas space.
    /// `None` if the view is degenerate, in which case nothing can be done with the event.
    #[must_use]
    pub fn canvas_pos(&self, event: &PointerEvent) -> Option<ultraviolet::Vec2> {
        self.view.unproject(event.pos).ok()
    }
}

trait PenTool {
    fn event(&mut self, context: &mut ToolContext<'_>, event: &PointerEvent);
    /// Called when the state is transitioning away from this tool.
    fn exit(&mut self, _store: &mut LayerStore) {}
}

pub struct ToolState {
    current: Tool,
    transform: transform::TransformController,
    brush: brush::Brush,
    text: text::TextTool,
}
impl Default for ToolState {
    fn default() -> Self {
        Self {
            current: Tool::default(),
            transform: transform::TransformController::default(),
            brush: brush::Brush::default(),
            text: text::TextTool,
        }
    }
}
impl ToolState {
    /// Feed a frame of pointer events to the session's current tool.
    ///
    /// Every store mutation made during the frame reaches observers as one change.
    pub fn process(
        &mut self,
        session: &mut EditorSession,
        view: &ViewTransform,
        frame: &[PointerEvent],
    ) {
        self.sync_tool(session);
        if frame.is_empty() {
            return;
        }
        let brush = *session.brush();
        let text = session.text_settings().clone();
        let canvas_size = session.canvas_size();
        let tool = self.tool_for_state(self.current);
        session.store_mut().write_with(|store| {
            let mut context = ToolContext {
                store,
                view,
                brush: &brush,
                text: &text,
                canvas_size,
            };
            for event in frame {
                log::trace!("{} {} at {:?}", event.phase.as_ref(), event.pointer, event.pos);
                tool.event(&mut context, event);
            }
        });
    }
    /// Follow the session's tool selection, telling the outgoing tool to wrap up.
    fn sync_tool(&mut self, session: &mut EditorSession) {
        let wanted = session.tool();
        if wanted == self.current {
            return;
        }
        log::debug!("Tool {} -> {}", self.current.as_ref(), wanted.as_ref());
        self.tool_for_state(self.current).exit(session.store_mut());
        self.current = wanted;
    }
    /// Abandon whatever gesture is in progress.
    pub fn cancel(&mut self, session: &mut EditorSession) {
        self.tool_for_state(self.current).exit(session.store_mut());
    }
    #[must_use]
    pub fn transform(&self) -> &transform::TransformController {
        &self.transform
    }
    fn tool_for_state(&mut self, state: Tool) -> &mut dyn PenTool {
        match state {
            Tool::Move => &mut self.transform,
            Tool::Brush => &mut self.brush,
            Tool::Text => &mut self.text,
        }
    }
}
