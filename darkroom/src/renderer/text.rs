//! # Text rasterization
//!
//! Text layers are drawn with `ab_glyph` into a coverage buffer the size of the layer's layout
//! box at the resolution it will be shown, then composited like any other raster through the
//! layer's frame. Glyphs are laid out on one line, left to right, with kerning, vertically
//! centered within the box's line height.

use ab_glyph::{Font as _, ScaleFont as _};
use az::SaturatingAs;
use darkroom_core::state::layer::TextLayer;

/// Largest side of a text raster. Larger requests draw at a lower scale, and are stretched.
const MAX_RASTER_SIDE: f32 = 8192.0;

#[derive(thiserror::Error, Debug)]
pub enum FontError {
    #[error("failed to read font: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a usable font: {0}")]
    Invalid(#[from] ab_glyph::InvalidFont),
}

/// Read a TrueType or OpenType font from disk.
///
/// # Errors
/// If the file can't be read or isn't a font.
pub fn load_font(path: &std::path::Path) -> Result<ab_glyph::FontArc, FontError> {
    let bytes = std::fs::read(path)?;
    let font = ab_glyph::FontArc::try_from_vec(bytes)?;
    log::info!("Loaded font {}", path.display());
    Ok(font)
}

/// Rasterize a text layer's content at `scale` pixels per layout unit.
///
/// Returns the raster and the scale it was actually drawn at, which can be lower than asked for
/// very large text. `None` if there is nothing to draw.
pub(super) fn rasterize(
    font: &ab_glyph::FontArc,
    layer: &TextLayer,
    scale: f32,
) -> Option<(tiny_skia::Pixmap, f32)> {
    if layer.content.is_empty() || !(scale.is_finite() && scale > 0.0) {
        return None;
    }
    let [layout_w, layout_h] = layer.layout_size();
    let scale = scale.min(MAX_RASTER_SIDE / layout_w.max(layout_h));
    let side = |length: f32| {
        (length * scale)
            .ceil()
            .min(MAX_RASTER_SIDE)
            .saturating_as::<u32>()
            .max(1)
    };
    let (width, height) = (side(layout_w), side(layout_h));

    let mut coverage = vec![0.0f32; width as usize * height as usize];
    let px_size = layer.font_size * scale;
    let scaled = font.as_scaled(px_size);
    let line_height = layout_h * scale;
    let baseline = (line_height - (scaled.ascent() - scaled.descent())) / 2.0 + scaled.ascent();

    let mut caret = 0.0f32;
    let mut previous = None;
    for c in layer.content.chars() {
        let id = scaled.glyph_id(c);
        if let Some(previous) = previous {
            caret += scaled.kern(previous, id);
        }
        previous = Some(id);
        let glyph = id.with_scale_and_position(px_size, ab_glyph::point(caret, baseline));
        caret += scaled.h_advance(id);

        let Some(outlined) = font.outline_glyph(glyph) else {
            // Whitespace.
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, c| {
            let x = bounds.min.x as i64 + i64::from(gx);
            let y = bounds.min.y as i64 + i64::from(gy);
            if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
                return;
            }
            let cell = &mut coverage[y as usize * width as usize + x as usize];
            *cell = (*cell + c).min(1.0);
        });
    }

    let mut pixmap = tiny_skia::Pixmap::new(width, height)?;
    let [r, g, b, a] = layer.color.as_array();
    for (dst, c) in pixmap.data_mut().chunks_exact_mut(4).zip(coverage) {
        let alpha = c * f32::from(a) / 255.0;
        let premultiply = |v: u8| (f32::from(v) * alpha).round().saturating_as::<u8>();
        dst.copy_from_slice(&[
            premultiply(r),
            premultiply(g),
            premultiply(b),
            (alpha * 255.0).round().saturating_as::<u8>(),
        ]);
    }
    Some((pixmap, scale))
}

#[cfg(test)]
pub(crate) mod test {
    use super::load_font;
    use darkroom_core::color::Color;
    use darkroom_core::state::layer::TextLayer;

    /// DejaVu Sans Mono, for drawing text in tests.
    pub(crate) fn font() -> ab_glyph::FontArc {
        ab_glyph::FontArc::try_from_slice(include_bytes!("../../test-data/DejaVuSansMono.ttf"))
            .unwrap()
    }
    fn text(content: &str, font_size: f32) -> TextLayer {
        TextLayer {
            content: content.to_owned(),
            x: 0.0,
            y: 0.0,
            rotation_degrees: 0.0,
            scale: 1.0,
            color: Color::BLACK,
            font_size,
        }
    }

    #[test]
    fn rasterizes_at_requested_scale() {
        let layer = text("Hi", 20.0);
        let (pixmap, scale) = super::rasterize(&font(), &layer, 2.0).unwrap();
        assert_eq!(scale, 2.0);
        // 2 chars * 0.6em by 1.2em, doubled.
        assert!((48..=49).contains(&pixmap.width()));
        assert!((48..=49).contains(&pixmap.height()));
        assert!(pixmap.pixels().iter().any(|p| p.alpha() > 128));
        assert!(super::rasterize(&font(), &text("", 20.0), 2.0).is_none());
    }
    #[test]
    fn huge_text_is_drawn_smaller() {
        let layer = text(&"H".repeat(40), 10.0);
        // 240 units wide, so 24000 pixels were asked for.
        let (pixmap, scale) = super::rasterize(&font(), &layer, 100.0).unwrap();
        assert!(scale < 100.0);
        assert!(pixmap.width() <= 8192);
        assert!((pixmap.width() as f32 - 240.0 * scale).abs() <= 1.0);
        assert!(pixmap.pixels().iter().any(|p| p.alpha() > 128));
    }
    #[test]
    fn bad_fonts_are_errors() {
        let dir = std::env::temp_dir().join(format!("darkroom-font-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("not-a-font.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();
        assert!(matches!(load_font(&path), Err(super::FontError::Invalid(_))));
        assert!(matches!(
            load_font(&dir.join("missing.ttf")),
            Err(super::FontError::Io(_))
        ));
        let _ = std::fs::remove_dir_all(dir);
    }
}
