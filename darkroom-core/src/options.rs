//! # Options
//!
//! Everything that parameterizes an editor: canvas and export geometry, which tools are
//! offered, starting brush, and the mockups to show. Serializable, so hosts can keep them in a
//! config file.

use crate::color::Color;
use crate::state::mockup::MockupAsset;
use crate::units::Resolution;

bitflags::bitflags! {
    /// Tool modes a host lets the shopper use.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub struct EnabledTools: u8 {
        const MOVE = 0b001;
        const BRUSH = 0b010;
        const TEXT = 0b100;
    }
}
impl Default for EnabledTools {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BrushSettings {
    pub color: Color,
    /// Stroke width in canvas units.
    pub width: f32,
}
impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            width: 4.0,
        }
    }
}

/// What the text tool places on a tap.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TextSettings {
    pub content: String,
    pub font_size: f32,
}
impl Default for TextSettings {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_size: 48.0,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OptionsError {
    #[error("{0} must have a nonzero width and height")]
    EmptySize(&'static str),
    #[error("min_size must be a positive number, got {0}")]
    MinSize(f32),
    #[error("default_fit must be within (0, 1], got {0}")]
    DefaultFit(f32),
    #[error("brush width must be a positive number, got {0}")]
    BrushWidth(f32),
    #[error("font size must be a positive number, got {0}")]
    FontSize(f32),
    #[error("no tools are enabled")]
    NoTools,
}

/// Configuration of one editor.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EditorOptions {
    /// Logical canvas size, in canvas units.
    pub canvas_size: [u32; 2],
    /// Pixel size of the flattened export.
    pub export_size: [u32; 2],
    /// Physical resolution recorded in the exported file.
    pub export_resolution: Resolution,
    /// Smallest effective width or height of an image or text box.
    pub min_size: f32,
    /// Fraction of the canvas a new upload may cover on each axis.
    pub default_fit: f32,
    pub tools: EnabledTools,
    pub brush: BrushSettings,
    pub text: TextSettings,
    /// Background images, in lookup order.
    pub mockups: Vec<MockupAsset>,
    /// Font used to draw text layers. Text cannot be exported without one.
    pub font_path: Option<std::path::PathBuf>,
}
impl Default for EditorOptions {
    fn default() -> Self {
        const CANVAS: [u32; 2] = [985, 1271];
        Self {
            canvas_size: CANVAS,
            export_size: [CANVAS[0] * 2, CANVAS[1] * 2],
            export_resolution: Resolution::default(),
            min_size: 20.0,
            default_fit: 0.5,
            tools: EnabledTools::default(),
            brush: BrushSettings::default(),
            text: TextSettings::default(),
            mockups: Vec::new(),
            font_path: None,
        }
    }
}
impl EditorOptions {
    /// # Errors
    /// Reports the first setting that can't be used.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.canvas_size.contains(&0) {
            return Err(OptionsError::EmptySize("canvas_size"));
        }
        if self.export_size.contains(&0) {
            return Err(OptionsError::EmptySize("export_size"));
        }
        if !(self.min_size.is_finite() && self.min_size > 0.0) {
            return Err(OptionsError::MinSize(self.min_size));
        }
        if !(self.default_fit > 0.0 && self.default_fit <= 1.0) {
            return Err(OptionsError::DefaultFit(self.default_fit));
        }
        if !(self.brush.width.is_finite() && self.brush.width > 0.0) {
            return Err(OptionsError::BrushWidth(self.brush.width));
        }
        if !(self.text.font_size.is_finite() && self.text.font_size > 0.0) {
            return Err(OptionsError::FontSize(self.text.font_size));
        }
        if self.tools.is_empty() {
            return Err(OptionsError::NoTools);
        }
        Ok(())
    }
    #[must_use]
    pub fn canvas_size_f32(&self) -> [f32; 2] {
        [self.canvas_size[0] as f32, self.canvas_size[1] as f32]
    }
    #[must_use]
    pub fn store_limits(&self) -> crate::state::store::StoreLimits {
        crate::state::store::StoreLimits {
            canvas_size: self.canvas_size_f32(),
            min_size: self.min_size,
            default_fit: self.default_fit,
        }
    }
}
