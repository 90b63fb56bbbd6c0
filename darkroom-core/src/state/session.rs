//! # Editor session
//!
//! Everything one shopper's editor holds for the lifetime of the page: the layers, the garment
//! side and variant being shown, the tool in hand, and an in-memory clipboard.
//!
//! Nothing here is global. Dropping the session releases every bitmap it references.

use super::layer::{LayerID, LayerKind};
use super::mockup::{self, MockupAsset, Side};
use super::store::LayerStore;
use crate::error::{EditorError, Result};
use crate::options::{BrushSettings, EditorOptions, EnabledTools, OptionsError, TextSettings};

/// How far a pasted copy is moved from its original, in canvas units.
pub const PASTE_OFFSET: f32 = 20.0;

/// What pointer input does on the canvas.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Default,
    strum::AsRefStr,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum Tool {
    /// Select, drag, resize, and rotate layers.
    #[default]
    Move,
    /// Draw free-hand strokes.
    Brush,
    /// Place text.
    Text,
}
impl Tool {
    #[must_use]
    pub fn flag(self) -> EnabledTools {
        match self {
            Self::Move => EnabledTools::MOVE,
            Self::Brush => EnabledTools::BRUSH,
            Self::Text => EnabledTools::TEXT,
        }
    }
}

pub struct EditorSession {
    options: EditorOptions,
    side: Side,
    variant: Option<String>,
    store: LayerStore,
    tool: Tool,
    brush: BrushSettings,
    text: TextSettings,
    /// A detached copy of the last copied layer. Bitmaps are shared with the original.
    clipboard: Option<LayerKind>,
}
impl EditorSession {
    /// Create an empty session on the front side.
    ///
    /// # Errors
    /// If the options are unusable.
    pub fn new(options: EditorOptions) -> std::result::Result<Self, OptionsError> {
        options.validate()?;
        // First enabled tool, preferring Move.
        let tool = <Tool as strum::IntoEnumIterator>::iter()
            .find(|tool| options.tools.contains(tool.flag()))
            .unwrap_or_default();
        Ok(Self {
            store: LayerStore::new(options.store_limits()),
            side: Side::default(),
            variant: None,
            tool,
            brush: options.brush,
            text: options.text.clone(),
            clipboard: None,
            options,
        })
    }
    #[must_use]
    pub fn options(&self) -> &EditorOptions {
        &self.options
    }
    #[must_use]
    pub fn canvas_size(&self) -> [f32; 2] {
        self.options.canvas_size_f32()
    }
    #[must_use]
    pub fn store(&self) -> &LayerStore {
        &self.store
    }
    pub fn store_mut(&mut self) -> &mut LayerStore {
        &mut self.store
    }
    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }
    /// Show the other face of the garment. Layers are untouched.
    pub fn set_side(&mut self, side: Side) {
        if self.side != side {
            log::debug!("Side {} -> {}", self.side.as_ref(), side.as_ref());
        }
        self.side = side;
    }
    #[must_use]
    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }
    /// Pick a garment variant's mockups, or `None` for the default set. Layers are untouched.
    ///
    /// # Errors
    /// [`EditorError::UnknownVariant`] if no mockup names the variant. The session is unchanged.
    pub fn set_variant(&mut self, variant: Option<&str>) -> Result<()> {
        if let Some(variant) = variant {
            if !mockup::has_variant(&self.options.mockups, variant) {
                return Err(EditorError::UnknownVariant(variant.to_owned()));
            }
        }
        self.variant = variant.map(str::to_owned);
        Ok(())
    }
    /// The background for the current side and variant, if any.
    #[must_use]
    pub fn current_mockup(&self) -> Option<&MockupAsset> {
        mockup::lookup(&self.options.mockups, self.side, self.variant.as_deref())
    }
    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }
    /// Switch tools. Leaving the brush closes any stroke still being drawn.
    ///
    /// # Errors
    /// [`EditorError::ToolDisabled`] if the options don't offer the tool.
    pub fn set_tool(&mut self, tool: Tool) -> Result<()> {
        if !self.options.tools.contains(tool.flag()) {
            return Err(EditorError::ToolDisabled(tool.into()));
        }
        if tool != Tool::Brush {
            if let Some(stroke) = self.store.active_stroke() {
                self.store.end_stroke(stroke)?;
            }
        }
        self.tool = tool;
        Ok(())
    }
    #[must_use]
    pub fn brush(&self) -> &BrushSettings {
        &self.brush
    }
    /// Takes effect from the next stroke. Strokes already drawn keep their settings.
    ///
    /// # Errors
    /// [`EditorError::NonFiniteTransform`] for a non-finite or non-positive width.
    pub fn set_brush(&mut self, brush: BrushSettings) -> Result<()> {
        if !(brush.width.is_finite() && brush.width > 0.0) {
            return Err(EditorError::NonFiniteTransform);
        }
        self.brush = brush;
        Ok(())
    }
    #[must_use]
    pub fn text_settings(&self) -> &TextSettings {
        &self.text
    }
    pub fn set_pending_text(&mut self, content: impl Into<String>) {
        self.text.content = content.into();
    }
    /// # Errors
    /// [`EditorError::NonFiniteTransform`] for a non-finite or non-positive size.
    pub fn set_font_size(&mut self, font_size: f32) -> Result<()> {
        if !(font_size.is_finite() && font_size > 0.0) {
            return Err(EditorError::NonFiniteTransform);
        }
        self.text.font_size = font_size;
        Ok(())
    }
    /// Copy the selected layer to the clipboard. Returns whether anything was selected.
    pub fn copy_selected(&mut self) -> bool {
        let Some(layer) = self.store.selected_layer() else {
            return false;
        };
        log::debug!("Copied {}", layer.id);
        self.clipboard = Some(layer.kind.clone());
        true
    }
    #[must_use]
    pub fn has_clipboard(&self) -> bool {
        self.clipboard.is_some()
    }
    /// Insert the clipboard contents as a new, selected layer, offset from where it was copied.
    ///
    /// Pasting repeatedly cascades the copies.
    ///
    /// # Errors
    /// Never in practice, the new layer always exists when selected.
    pub fn paste(&mut self) -> Result<Option<LayerID>> {
        let Some(clipboard) = &mut self.clipboard else {
            return Ok(None);
        };
        clipboard.translate([PASTE_OFFSET, PASTE_OFFSET]);
        let kind = clipboard.clone();
        self.store.write_with(|store| {
            let id = store.insert(kind);
            store.select(Some(id))?;
            Ok(Some(id))
        })
    }
    /// Release every layer and the clipboard.
    pub fn clear(&mut self) {
        self.clipboard = None;
        self.store.clear_all();
    }
}
