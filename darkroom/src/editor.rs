//! # Editor
//!
//! One shopper's editor, wired together: the session, the pen tools reading pointer input into
//! it, and the renderer drawing it. Hosts feed it pointer frames and display resizes, and redraw
//! whenever [`Editor::needs_redraw`] says so.

use std::cell::Cell;
use std::rc::Rc;

use darkroom_core::error::Result;
use darkroom_core::ingest::Upload;
use darkroom_core::options::{BrushSettings, EditorOptions, OptionsError};
use darkroom_core::state::store::ObserverID;
use darkroom_core::state::{EditorSession, LayerID, Restack, Side, Tool};

use crate::pen_tools::ToolState;
use crate::pointer_events::PointerEvent;
use crate::renderer::{RenderError, Renderer};
use crate::upload::{DecodedUpload, PendingUpload};
use crate::view_transform::ViewTransform;

pub struct Editor {
    session: EditorSession,
    tools: ToolState,
    renderer: Renderer,
    display_size: [u32; 2],
    view: ViewTransform,
    /// Set by the store observer on every change, cleared on redraw.
    dirty: Rc<Cell<bool>>,
    observer: ObserverID,
}

impl Editor {
    /// # Errors
    /// If the options are unusable.
    pub fn new(
        options: EditorOptions,
        renderer: Renderer,
        display_size: [u32; 2],
    ) -> std::result::Result<Self, OptionsError> {
        let mut session = EditorSession::new(options)?;
        let dirty = Rc::new(Cell::new(true));
        let observer = {
            let dirty = dirty.clone();
            session.store_mut().subscribe(move |change| {
                log::trace!("{change:?}");
                dirty.set(true);
            })
        };
        let view = fit(&session, display_size);
        Ok(Self {
            session,
            tools: ToolState::default(),
            renderer,
            display_size,
            view,
            dirty,
            observer,
        })
    }
    #[must_use]
    pub fn session(&self) -> &EditorSession {
        &self.session
    }
    #[must_use]
    pub fn view(&self) -> &ViewTransform {
        &self.view
    }
    #[must_use]
    pub fn tools(&self) -> &ToolState {
        &self.tools
    }
    /// The display surface changed size. Gestures in progress are abandoned, as their
    /// display-space anchors no longer mean anything.
    pub fn resize(&mut self, display_size: [u32; 2]) {
        if display_size == self.display_size {
            return;
        }
        self.tools.cancel(&mut self.session);
        self.display_size = display_size;
        self.view = fit(&self.session, display_size);
        self.dirty.set(true);
    }
    /// Handle one frame of pointer input with the current tool.
    pub fn pointer_frame(&mut self, frame: &[PointerEvent]) {
        self.tools.process(&mut self.session, &self.view, frame);
    }
    /// # Errors
    /// If the tool isn't enabled.
    pub fn set_tool(&mut self, tool: Tool) -> Result<()> {
        self.session.set_tool(tool)
    }
    pub fn set_side(&mut self, side: Side) {
        if side != self.session.side() {
            self.session.set_side(side);
            self.dirty.set(true);
        }
    }
    /// # Errors
    /// If no mockup names the variant.
    pub fn set_variant(&mut self, variant: Option<&str>) -> Result<()> {
        self.session.set_variant(variant)?;
        self.dirty.set(true);
        Ok(())
    }
    /// Start bringing an upload onto the canvas. See [`crate::upload`].
    ///
    /// # Errors
    /// If the file isn't an accepted image type.
    pub fn begin_upload(&self, upload: Upload) -> Result<PendingUpload> {
        crate::upload::begin(self.session.store(), upload)
    }
    /// Add a finished upload at its default placement, and select it.
    ///
    /// # Errors
    /// Never for uploads from [`Self::begin_upload`].
    pub fn place_upload(&mut self, upload: DecodedUpload) -> Result<Option<LayerID>> {
        self.session.store_mut().write_with(|store| {
            let Some(id) = upload.place(store, None)? else {
                return Ok(None);
            };
            store.select(Some(id))?;
            Ok(Some(id))
        })
    }
    /// Remove the selected layer, if any.
    pub fn delete_selected(&mut self) -> Option<LayerID> {
        let id = self.session.store().selected()?;
        self.session.store_mut().remove_layer(id);
        Some(id)
    }
    /// # Errors
    /// Never in practice, the selection always exists.
    pub fn restack_selected(&mut self, to: Restack) -> Result<()> {
        match self.session.store().selected() {
            Some(id) => self.session.store_mut().restack(id, to),
            None => Ok(()),
        }
    }
    pub fn copy(&mut self) -> bool {
        self.session.copy_selected()
    }
    /// # Errors
    /// Never in practice.
    pub fn paste(&mut self) -> Result<Option<LayerID>> {
        self.session.paste()
    }
    /// Remove everything from the canvas, and drop any uploads still on their way.
    pub fn clear(&mut self) {
        self.tools.cancel(&mut self.session);
        self.session.clear();
    }
    /// Brush for strokes from now on. Strokes already drawn keep theirs.
    ///
    /// # Errors
    /// If the width isn't a positive number.
    pub fn set_brush(&mut self, brush: BrushSettings) -> Result<()> {
        self.session.set_brush(brush)
    }
    /// Size of text placed from now on.
    ///
    /// # Errors
    /// If the size isn't a positive number.
    pub fn set_font_size(&mut self, font_size: f32) -> Result<()> {
        self.session.set_font_size(font_size)
    }
    /// Change the pending text for the text tool.
    pub fn set_pending_text(&mut self, content: impl Into<String>) {
        self.session.set_pending_text(content);
    }
    #[must_use]
    pub fn needs_redraw(&self) -> bool {
        self.dirty.get()
    }
    /// Draw a frame if anything changed since the last.
    ///
    /// # Errors
    /// If the display surface can't be allocated.
    pub fn redraw(&mut self) -> std::result::Result<Option<tiny_skia::Pixmap>, RenderError> {
        if !self.dirty.replace(false) {
            return Ok(None);
        }
        match self.renderer.render_frame(&self.session, self.display_size) {
            Ok(frame) => Ok(Some(frame)),
            Err(e) => {
                self.dirty.set(true);
                Err(e)
            }
        }
    }
    /// See [`Renderer::flatten`].
    pub fn flatten(
        &mut self,
    ) -> impl std::future::Future<Output = Result<Vec<u8>>> + 'static {
        self.renderer.flatten(&self.session)
    }
}
impl Drop for Editor {
    fn drop(&mut self) {
        self.session.store_mut().unsubscribe(self.observer);
    }
}

fn fit(session: &EditorSession, [w, h]: [u32; 2]) -> ViewTransform {
    ViewTransform::fit(session.canvas_size(), [w as f32, h as f32]).unwrap_or_else(|| {
        log::warn!("Display {w}x{h} can't show the canvas");
        ViewTransform::IDENTITY
    })
}

#[cfg(test)]
mod test {
    use super::Editor;
    use crate::assets::{MemoryAssets, MockupLibrary};
    use crate::pointer_events::{PointerEvent, PointerPhase};
    use crate::renderer::Renderer;
    use darkroom_core::ingest::Upload;
    use darkroom_core::color::Color;
    use darkroom_core::options::{BrushSettings, EditorOptions};
    use darkroom_core::state::{LayerKind, Side, Tool};

    fn editor() -> Editor {
        let renderer = Renderer::new(MockupLibrary::new(MemoryAssets::default()), None);
        Editor::new(EditorOptions::default(), renderer, [985, 1271]).unwrap()
    }

    #[tokio::test]
    async fn upload_drag_and_redraw() {
        let mut editor = editor();
        assert!(editor.redraw().unwrap().is_some());
        assert!(editor.redraw().unwrap().is_none());

        let upload = Upload::from_bytes("a.png", crate::assets::test::png(100, 100, [255; 4]));
        let pending = editor.begin_upload(upload).unwrap();
        let decoded = pending.decode().await.unwrap();
        let id = editor.place_upload(decoded).unwrap().unwrap();
        assert_eq!(editor.session().store().selected(), Some(id));
        assert!(editor.needs_redraw());
        assert!(editor.redraw().unwrap().is_some());

        let start = editor.session().store().get(id).unwrap().kind.position();
        editor.pointer_frame(&[
            PointerEvent::new(1, PointerPhase::Down, [492.5, 635.5]),
            PointerEvent::new(1, PointerPhase::Move, [502.5, 645.5]),
            PointerEvent::new(1, PointerPhase::Up, [502.5, 645.5]),
        ]);
        let end = editor.session().store().get(id).unwrap().kind.position();
        assert_eq!([end[0] - start[0], end[1] - start[1]], [10.0, 10.0]);
        assert!(editor.needs_redraw());
    }
    #[test]
    fn side_switch_redraws_and_keeps_layers() {
        let mut editor = editor();
        editor.set_tool(Tool::Text).unwrap();
        editor.set_pending_text("Hi");
        editor.pointer_frame(&[PointerEvent::new(1, PointerPhase::Down, [100.0, 100.0])]);
        assert_eq!(editor.session().store().len(), 1);
        editor.redraw().unwrap();

        editor.set_side(Side::Back);
        assert!(editor.needs_redraw());
        let layer = &editor.session().store().layers()[0];
        let LayerKind::Text(text) = &layer.kind else {
            panic!("not text");
        };
        assert_eq!((text.x, text.y), (100.0, 100.0));
    }
    #[test]
    fn delete_and_restack_need_selection() {
        let mut editor = editor();
        assert_eq!(editor.delete_selected(), None);
        editor
            .restack_selected(darkroom_core::state::Restack::Top)
            .unwrap();
        editor.set_tool(Tool::Brush).unwrap();
        editor.pointer_frame(&[
            PointerEvent::new(1, PointerPhase::Down, [10.0, 10.0]),
            PointerEvent::new(1, PointerPhase::Move, [20.0, 20.0]),
            PointerEvent::new(1, PointerPhase::Up, [20.0, 20.0]),
        ]);
        let id = editor.session().store().layers()[0].id;
        editor.set_tool(Tool::Move).unwrap();
        editor.pointer_frame(&[PointerEvent::new(1, PointerPhase::Down, [15.0, 15.0])]);
        assert_eq!(editor.session().store().selected(), Some(id));
        assert_eq!(editor.delete_selected(), Some(id));
        assert!(editor.session().store().is_empty());
    }
    #[test]
    fn brush_and_font_size_apply_to_new_layers() {
        let mut editor = editor();
        editor.set_tool(Tool::Brush).unwrap();
        let stroke = |editor: &mut Editor, y: f32| {
            editor.pointer_frame(&[
                PointerEvent::new(1, PointerPhase::Down, [10.0, y]),
                PointerEvent::new(1, PointerPhase::Move, [60.0, y]),
                PointerEvent::new(1, PointerPhase::Up, [60.0, y]),
            ]);
        };
        stroke(&mut editor, 10.0);
        let red = BrushSettings {
            color: Color::rgb(255, 0, 0),
            width: 12.0,
        };
        editor.set_brush(red).unwrap();
        stroke(&mut editor, 50.0);
        let strokes: Vec<_> = editor
            .session()
            .store()
            .layers()
            .iter()
            .map(|layer| match &layer.kind {
                LayerKind::Stroke(stroke) => (stroke.color, stroke.stroke_width),
                _ => panic!("not a stroke"),
            })
            .collect();
        assert_eq!(strokes, [(Color::WHITE, 4.0), (red.color, 12.0)]);
        assert!(editor
            .set_brush(BrushSettings {
                width: f32::NAN,
                ..red
            })
            .is_err());
        assert_eq!(*editor.session().brush(), red);

        editor.set_font_size(72.0).unwrap();
        editor.set_tool(Tool::Text).unwrap();
        editor.set_pending_text("Hi");
        editor.pointer_frame(&[PointerEvent::new(1, PointerPhase::Down, [200.0, 200.0])]);
        let LayerKind::Text(text) = &editor.session().store().layers()[2].kind else {
            panic!("not text");
        };
        assert_eq!(text.font_size, 72.0);
        assert!(editor.set_font_size(0.0).is_err());
    }
}
