//! # Renderer
//!
//! Composites a session on the CPU with `tiny-skia`. The canvas is drawn white, then the
//! mockup for the current side stretched over the whole canvas, then every layer bottom-up.
//!
//! Live frames are drawn at display resolution through the [`ViewTransform`], with the selection
//! overlay on top. Exports are drawn at the configured export size, never show the overlay, and
//! are encoded as PNG. Both go through the same scene drawing, so what the shopper sees is what
//! is printed.

mod export;
mod text;

pub use export::encode_png;
pub use text::load_font;

use std::sync::Arc;

use az::SaturatingAs;
use darkroom_core::error::EditorError;
use darkroom_core::ingest::{Bitmap, BitmapID};
use darkroom_core::state::layer::{StrokeLayer, TextLayer};
use darkroom_core::state::transform::Matrix;
use darkroom_core::state::{EditorSession, LayerID, LayerKind, Placement};
use tiny_skia::{Pixmap, Transform};

use crate::assets::{AssetError, MockupLibrary};
use crate::gizmos::{SelectionGizmo, HANDLE_RADIUS};
use crate::view_transform::ViewTransform;

/// Display area outside the canvas.
const LETTERBOX: [u8; 4] = [48, 48, 48, 255];
const SELECTION: [u8; 4] = [0, 122, 255, 255];

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("cannot allocate a {0}x{1} surface")]
    Allocation(u32, u32),
    #[error("image layer {0} cannot be converted for drawing")]
    Raster(LayerID),
    #[error("mockup unavailable: {0}")]
    Mockup(#[from] AssetError),
    #[error("text layer {0} needs a font, and none is loaded")]
    NoFont(LayerID),
    #[error("png encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
}

/// Convert straight-alpha RGBA into a premultiplied pixmap. `None` if the image is empty or too
/// large for `tiny-skia`.
#[must_use]
pub fn pixmap_from_rgba(image: &image::RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap
        .data_mut()
        .chunks_exact_mut(4)
        .zip(image.as_raw().chunks_exact(4))
    {
        let alpha = u16::from(src[3]);
        let premultiply = |c: u8| ((u16::from(c) * alpha + 127) / 255).saturating_as::<u8>();
        dst.copy_from_slice(&[
            premultiply(src[0]),
            premultiply(src[1]),
            premultiply(src[2]),
            src[3],
        ]);
    }
    Some(pixmap)
}

fn skia_transform(matrix: Matrix) -> Transform {
    let [[a, b], [c, d], [tx, ty]] = matrix.elements;
    Transform::from_row(a, b, c, d, tx, ty)
}

/// A layer, ready to draw.
enum Drawable {
    Image {
        raster: Arc<Pixmap>,
        placement: Placement,
    },
    Stroke(StrokeLayer),
    Text(TextLayer),
}

/// Everything needed to draw a composition, detached from the session it came from.
struct Scene {
    canvas_size: [f32; 2],
    mockup: Option<Arc<Pixmap>>,
    /// Bottom-most first.
    drawables: Vec<Drawable>,
    font: Option<ab_glyph::FontArc>,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Purpose {
    /// Problems are logged and the affected parts skipped.
    Frame,
    /// Any problem fails the whole export.
    Export,
}

pub struct Renderer {
    mockups: MockupLibrary,
    font: Option<ab_glyph::FontArc>,
    /// Premultiplied copies of layer bitmaps.
    rasters: hashbrown::HashMap<BitmapID, Arc<Pixmap>>,
}
impl Renderer {
    #[must_use]
    pub fn new(mockups: MockupLibrary, font: Option<ab_glyph::FontArc>) -> Self {
        Self {
            mockups,
            font,
            rasters: hashbrown::HashMap::new(),
        }
    }
    fn raster(&mut self, bitmap: &Bitmap) -> Option<Arc<Pixmap>> {
        if let Some(raster) = self.rasters.get(&bitmap.id()) {
            return Some(raster.clone());
        }
        let raster = Arc::new(pixmap_from_rgba(bitmap.pixels())?);
        self.rasters.insert(bitmap.id(), raster.clone());
        Some(raster)
    }
    /// Forget rasters of bitmaps no longer on the canvas.
    fn prune(&mut self, session: &EditorSession) {
        let live: hashbrown::HashSet<BitmapID> = session
            .store()
            .layers()
            .iter()
            .filter_map(|layer| match &layer.kind {
                LayerKind::Image(image) => Some(image.bitmap.id()),
                _ => None,
            })
            .collect();
        self.rasters.retain(|id, _| live.contains(id));
    }
    fn scene(&mut self, session: &EditorSession, purpose: Purpose) -> Result<Scene, RenderError> {
        let mockup = match session.current_mockup() {
            None => None,
            Some(record) => match self.mockups.get(&record.image_url) {
                Ok(pixmap) => Some(pixmap),
                Err(e) if purpose == Purpose::Frame => {
                    log::warn!("Drawing without mockup: {e}");
                    None
                }
                Err(e) => return Err(e.into()),
            },
        };
        let layers = session.store().layers();
        let mut drawables = Vec::with_capacity(layers.len());
        for layer in layers {
            let drawable = match &layer.kind {
                LayerKind::Image(image) => match self.raster(&image.bitmap) {
                    Some(raster) => Drawable::Image {
                        raster,
                        placement: image.placement,
                    },
                    None if purpose == Purpose::Frame => {
                        log::warn!("Skipping undrawable image {}", layer.id);
                        continue;
                    }
                    None => return Err(RenderError::Raster(layer.id)),
                },
                LayerKind::Stroke(stroke) => Drawable::Stroke(stroke.clone()),
                LayerKind::Text(text) => {
                    if self.font.is_none() && purpose == Purpose::Export {
                        return Err(RenderError::NoFont(layer.id));
                    }
                    Drawable::Text(text.clone())
                }
            };
            drawables.push(drawable);
        }
        Ok(Scene {
            canvas_size: session.canvas_size(),
            mockup,
            drawables,
            font: self.font.clone(),
        })
    }
    /// Draw the session for display on a surface of `display_size` pixels.
    ///
    /// The canvas is fit within the surface and centered. The selected layer gets its outline
    /// and handles.
    ///
    /// # Errors
    /// If the surface can't be allocated. Unavailable mockups and undrawable layers are logged
    /// and left out.
    pub fn render_frame(
        &mut self,
        session: &EditorSession,
        display_size: [u32; 2],
    ) -> Result<Pixmap, RenderError> {
        let [width, height] = display_size;
        let allocation = || RenderError::Allocation(width, height);
        let view = ViewTransform::fit(
            session.canvas_size(),
            [width as f32, height as f32],
        )
        .ok_or_else(allocation)?;
        let mut pixmap = Pixmap::new(width, height).ok_or_else(allocation)?;
        let [r, g, b, a] = LETTERBOX;
        pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));

        self.prune(session);
        let scene = self.scene(session, Purpose::Frame)?;
        let clip = canvas_clip(&scene, view, display_size);
        draw_scene(&scene, &mut pixmap, view.into(), view.scale, clip.as_ref());

        if let Some(layer) = session.store().selected_layer() {
            draw_selection(&mut pixmap, &SelectionGizmo::for_layer(layer, &view));
        }
        Ok(pixmap)
    }
    /// Produce the print file: the composition at the export size as PNG bytes, with the
    /// export resolution recorded.
    ///
    /// What is drawn is decided now. Changes to the session after this call don't affect the
    /// result, and the session is free to be dropped before the future completes.
    ///
    /// Fails with [`EditorError::ExportFailed`] rather than produce a partial image: when the
    /// mockup can't be loaded, an image can't be converted, or there is text but no font.
    pub fn flatten(
        &mut self,
        session: &EditorSession,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, EditorError>> + 'static {
        self.prune(session);
        let scene = self.scene(session, Purpose::Export);
        let options = session.options();
        let (size, resolution) = (options.export_size, options.export_resolution);
        async move {
            let export_failed = |e: RenderError| EditorError::ExportFailed(e.to_string());
            let scene = scene.map_err(export_failed)?;
            log::info!(
                "Exporting {} layers at {}x{} {resolution}",
                scene.drawables.len(),
                size[0],
                size[1],
            );
            let pixmap = export::render(&scene, size).map_err(export_failed)?;
            encode_png(&pixmap, resolution).map_err(export_failed)
        }
    }
}

/// Mask of the canvas area on a display surface, so layers hanging off the canvas aren't drawn
/// over the letterbox.
fn canvas_clip(scene: &Scene, view: ViewTransform, [w, h]: [u32; 2]) -> Option<tiny_skia::Mask> {
    let [cw, ch] = scene.canvas_size;
    let rect = tiny_skia::Rect::from_xywh(0.0, 0.0, cw, ch)?;
    let path = tiny_skia::PathBuilder::from_rect(rect);
    let mut mask = tiny_skia::Mask::new(w, h)?;
    mask.fill_path(&path, tiny_skia::FillRule::Winding, true, view.into());
    Some(mask)
}

/// Draw a scene through `outer`, which takes canvas space to pixmap space. `raster_scale` is the
/// pixels per canvas unit, for text that has to be rasterized at a fixed size.
fn draw_scene(
    scene: &Scene,
    pixmap: &mut Pixmap,
    outer: Transform,
    raster_scale: f32,
    clip: Option<&tiny_skia::Mask>,
) {
    let [cw, ch] = scene.canvas_size;
    if let Some(rect) = tiny_skia::Rect::from_xywh(0.0, 0.0, cw, ch) {
        let mut white = tiny_skia::Paint::default();
        white.set_color(tiny_skia::Color::WHITE);
        pixmap.fill_rect(rect, &white, outer, clip);
    }
    if let Some(mockup) = &scene.mockup {
        let stretch = outer.pre_scale(
            cw / mockup.width() as f32,
            ch / mockup.height() as f32,
        );
        pixmap.draw_pixmap(0, 0, Pixmap::as_ref(mockup), &pixmap_paint(1.0), stretch, clip);
    }
    for drawable in &scene.drawables {
        match drawable {
            Drawable::Image { raster, placement } => {
                let transform = outer
                    .pre_concat(skia_transform(placement.frame().local_to_canvas()))
                    .pre_scale(
                        placement.width / raster.width() as f32,
                        placement.height / raster.height() as f32,
                    );
                pixmap.draw_pixmap(
                    0,
                    0,
                    Pixmap::as_ref(raster),
                    &pixmap_paint(placement.opacity),
                    transform,
                    clip,
                );
            }
            Drawable::Stroke(stroke) => draw_stroke(pixmap, stroke, outer, clip),
            Drawable::Text(layer) => {
                let Some(font) = &scene.font else {
                    log::trace!("No font, text not drawn");
                    continue;
                };
                let scale = layer.scale * raster_scale;
                let Some((glyphs, scale)) = text::rasterize(font, layer, scale) else {
                    continue;
                };
                let transform = outer
                    .pre_concat(skia_transform(layer.frame().local_to_canvas()))
                    .pre_scale(scale.recip(), scale.recip());
                pixmap.draw_pixmap(0, 0, glyphs.as_ref(), &pixmap_paint(1.0), transform, clip);
            }
        }
    }
}

fn pixmap_paint(opacity: f32) -> tiny_skia::PixmapPaint {
    tiny_skia::PixmapPaint {
        opacity,
        quality: tiny_skia::FilterQuality::Bilinear,
        blend_mode: tiny_skia::BlendMode::SourceOver,
    }
}

fn color_paint([r, g, b, a]: [u8; 4]) -> tiny_skia::Paint<'static> {
    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

fn draw_stroke(
    pixmap: &mut Pixmap,
    stroke: &StrokeLayer,
    outer: Transform,
    clip: Option<&tiny_skia::Mask>,
) {
    if stroke.stroke_width <= 0.0 {
        return;
    }
    let paint = color_paint(stroke.color.as_array());
    let mut points = stroke.placed_points();
    let Some([x0, y0]) = points.next() else {
        return;
    };
    let mut builder = tiny_skia::PathBuilder::new();
    builder.move_to(x0, y0);
    let mut segments = 0;
    for [x, y] in points {
        builder.line_to(x, y);
        segments += 1;
    }
    if segments == 0 {
        // A tap: a round dot the width of the brush.
        if let Some(dot) = tiny_skia::PathBuilder::from_circle(x0, y0, stroke.stroke_width / 2.0) {
            pixmap.fill_path(&dot, &paint, tiny_skia::FillRule::Winding, outer, clip);
        }
        return;
    }
    let Some(path) = builder.finish() else {
        return;
    };
    let line = tiny_skia::Stroke {
        width: stroke.stroke_width,
        line_cap: tiny_skia::LineCap::Round,
        line_join: tiny_skia::LineJoin::Round,
        ..Default::default()
    };
    pixmap.stroke_path(&path, &paint, &line, outer, clip);
}

/// The selection outline and its handles, already in display space.
fn draw_selection(pixmap: &mut Pixmap, gizmo: &SelectionGizmo) {
    let outline_paint = color_paint(SELECTION);
    let line = tiny_skia::Stroke {
        width: 1.5,
        ..Default::default()
    };
    let mut builder = tiny_skia::PathBuilder::new();
    let [first, rest @ ..] = gizmo.outline;
    builder.move_to(first.x, first.y);
    for corner in rest {
        builder.line_to(corner.x, corner.y);
    }
    builder.close();
    if let Some([base, tip]) = gizmo.rotate_stem {
        builder.move_to(base.x, base.y);
        builder.line_to(tip.x, tip.y);
    }
    if let Some(path) = builder.finish() {
        pixmap.stroke_path(&path, &outline_paint, &line, Transform::identity(), None);
    }

    let fill = color_paint([255, 255, 255, 255]);
    for handle in &gizmo.handles {
        let Some(circle) =
            tiny_skia::PathBuilder::from_circle(handle.position.x, handle.position.y, HANDLE_RADIUS)
        else {
            continue;
        };
        pixmap.fill_path(
            &circle,
            &fill,
            tiny_skia::FillRule::Winding,
            Transform::identity(),
            None,
        );
        pixmap.stroke_path(&circle, &outline_paint, &line, Transform::identity(), None);
    }
}

#[cfg(test)]
mod test {
    use super::{Renderer, LETTERBOX};
    use crate::assets::{test::png, MemoryAssets, MockupLibrary};
    use darkroom_core::color::Color;
    use darkroom_core::ingest::Bitmap;
    use darkroom_core::options::EditorOptions;
    use darkroom_core::state::{EditorSession, MockupAsset, PartialPlacement, Placement, Side};

    fn renderer() -> Renderer {
        let mut assets = MemoryAssets::default();
        assets.insert("front.png", png(10, 10, [0, 0, 255, 255]));
        Renderer::new(MockupLibrary::new(assets), None)
    }
    fn session(mockup: Option<&str>) -> EditorSession {
        EditorSession::new(EditorOptions {
            canvas_size: [100, 100],
            export_size: [200, 200],
            mockups: mockup
                .map(|url| MockupAsset {
                    side: Side::Front,
                    variant_id: None,
                    image_url: url.to_owned(),
                })
                .into_iter()
                .collect(),
            ..Default::default()
        })
        .unwrap()
    }
    fn solid(rgba: [u8; 4]) -> std::sync::Arc<Bitmap> {
        Bitmap::from_rgba(image::RgbaImage::from_pixel(10, 10, image::Rgba(rgba))).unwrap()
    }
    fn pixel(pixmap: &tiny_skia::Pixmap, x: u32, y: u32) -> [u8; 4] {
        let color = pixmap.pixel(x, y).unwrap().demultiply();
        [color.red(), color.green(), color.blue(), color.alpha()]
    }

    #[test]
    fn empty_canvas_is_white_in_letterbox() {
        let mut renderer = renderer();
        let session = session(None);
        // Twice as wide as the canvas: bars left and right.
        let frame = renderer.render_frame(&session, [200, 100]).unwrap();
        assert_eq!(pixel(&frame, 10, 50), LETTERBOX);
        assert_eq!(pixel(&frame, 100, 50), [255, 255, 255, 255]);
    }
    #[test]
    fn mockup_then_layers_in_z_order() {
        let mut renderer = renderer();
        let mut session = session(Some("front.png"));
        let store = session.store_mut();
        store
            .add_image_layer(solid([255, 0, 0, 255]), Some(Placement::new([0.0, 0.0], [60.0, 60.0])))
            .unwrap();
        store
            .add_image_layer(
                solid([0, 255, 0, 255]),
                Some(Placement::new([40.0, 40.0], [60.0, 60.0])),
            )
            .unwrap();
        let frame = renderer.render_frame(&session, [100, 100]).unwrap();
        assert_eq!(pixel(&frame, 20, 20), [255, 0, 0, 255]);
        // Overlap goes to the layer added last.
        assert_eq!(pixel(&frame, 50, 50), [0, 255, 0, 255]);
        // Mockup fills the rest.
        assert_eq!(pixel(&frame, 90, 10), [0, 0, 255, 255]);
    }
    #[test]
    fn missing_mockup_draws_white_live() {
        let mut renderer = renderer();
        let session = session(Some("missing.png"));
        let frame = renderer.render_frame(&session, [100, 100]).unwrap();
        assert_eq!(pixel(&frame, 50, 50), [255, 255, 255, 255]);
    }
    #[test]
    fn selection_overlay_only_when_selected() {
        let mut renderer = renderer();
        let mut session = session(None);
        let id = session
            .store_mut()
            .add_image_layer(solid([255, 0, 0, 255]), Some(Placement::new([20.0, 20.0], [60.0, 60.0])))
            .unwrap();
        let plain = renderer.render_frame(&session, [100, 100]).unwrap();
        session.store_mut().select(Some(id)).unwrap();
        let selected = renderer.render_frame(&session, [100, 100]).unwrap();
        // Handle over the top-left corner.
        assert_ne!(pixel(&plain, 20, 20), pixel(&selected, 20, 20));
        // Far from any handle or edge.
        assert_eq!(pixel(&plain, 50, 60), pixel(&selected, 50, 60));
    }
    #[test]
    fn strokes_are_drawn() {
        let mut renderer = renderer();
        let mut session = session(None);
        let store = session.store_mut();
        let id = store
            .begin_stroke(Color::rgb(0, 0, 0), 10.0, [10.0, 50.0])
            .unwrap();
        store.append_stroke_point(id, [90.0, 50.0]).unwrap();
        store.end_stroke(id).unwrap();
        let frame = renderer.render_frame(&session, [100, 100]).unwrap();
        assert_eq!(pixel(&frame, 50, 50), [0, 0, 0, 255]);
        assert_eq!(pixel(&frame, 50, 20), [255, 255, 255, 255]);
    }
    #[test]
    fn text_drawn_inside_rotated_frame() {
        let mut renderer = renderer();
        renderer.font = Some(super::text::test::font());
        let mut session = session(None);
        let store = session.store_mut();
        let id = store
            .add_text_layer("HHHH", [20.0, 40.0], Color::BLACK, 20.0)
            .unwrap();
        store
            .update_transform(
                id,
                PartialPlacement {
                    rotation_degrees: Some(90.0),
                    ..Default::default()
                },
            )
            .unwrap();
        let frame_box = store.get(id).unwrap().frame();
        let frame = renderer.render_frame(&session, [100, 100]).unwrap();

        let mut inked = 0;
        for y in 0..100 {
            for x in 0..100 {
                if pixel(&frame, x, y) == [255, 255, 255, 255] {
                    continue;
                }
                // Allow for antialiasing at the edge of the box.
                let [lx, ly] = frame_box
                    .canvas_to_local([x as f32 + 0.5, y as f32 + 0.5])
                    .unwrap();
                assert!(
                    (-2.0..=frame_box.size[0] + 2.0).contains(&lx)
                        && (-2.0..=frame_box.size[1] + 2.0).contains(&ly),
                    "ink at {x},{y} outside the text box"
                );
                inked += 1;
            }
        }
        assert!(inked > 20, "only {inked} pixels of text");
        // Inside the box before rotation, outside after.
        assert_eq!(pixel(&frame, 64, 52), [255, 255, 255, 255]);
    }
    #[test]
    fn raster_cache_follows_layers() {
        let mut renderer = renderer();
        let mut session = session(None);
        let id = session
            .store_mut()
            .add_image_layer(solid([255, 0, 0, 255]), None)
            .unwrap();
        renderer.render_frame(&session, [100, 100]).unwrap();
        assert_eq!(renderer.rasters.len(), 1);
        session.store_mut().remove_layer(id);
        renderer.render_frame(&session, [100, 100]).unwrap();
        assert!(renderer.rasters.is_empty());
    }
    #[tokio::test]
    async fn export_only_use_prunes_rasters() {
        let mut renderer = renderer();
        let mut session = session(None);
        let first = session
            .store_mut()
            .add_image_layer(solid([255, 0, 0, 255]), None)
            .unwrap();
        renderer.flatten(&session).await.unwrap();
        assert_eq!(renderer.rasters.len(), 1);

        session.store_mut().remove_layer(first);
        session
            .store_mut()
            .add_image_layer(solid([0, 255, 0, 255]), None)
            .unwrap();
        renderer.flatten(&session).await.unwrap();
        assert_eq!(renderer.rasters.len(), 1);
        session.clear();
        renderer.flatten(&session).await.unwrap();
        assert!(renderer.rasters.is_empty());
    }
}
