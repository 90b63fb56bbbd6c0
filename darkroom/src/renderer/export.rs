//! # Export
//!
//! Full-resolution drawing of a scene, and PNG encoding with the print resolution recorded in
//! a `pHYs` chunk.

use darkroom_core::units::Resolution;

use super::{draw_scene, RenderError, Scene};

/// Draw the scene stretched over an `export_size` pixmap, without any overlay.
pub(super) fn render(scene: &Scene, export_size: [u32; 2]) -> Result<tiny_skia::Pixmap, RenderError> {
    let [width, height] = export_size;
    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or(RenderError::Allocation(width, height))?;
    let [cw, ch] = scene.canvas_size;
    let [sx, sy] = [width as f32 / cw, height as f32 / ch];
    draw_scene(
        scene,
        &mut pixmap,
        tiny_skia::Transform::from_scale(sx, sy),
        sx.min(sy),
        None,
    );
    Ok(pixmap)
}

/// Encode as 8-bit RGBA PNG, tagged with the physical resolution.
///
/// # Errors
/// If the encoder fails.
pub fn encode_png(
    pixmap: &tiny_skia::Pixmap,
    resolution: Resolution,
) -> Result<Vec<u8>, RenderError> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        data.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }

    let mut bytes = Vec::new();
    let mut encoder = png::Encoder::new(&mut bytes, pixmap.width(), pixmap.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let ppm = resolution.pixels_per_meter();
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: ppm,
        yppu: ppm,
        unit: png::Unit::Meter,
    }));
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&data)?;
    writer.finish()?;
    log::debug!(
        "Encoded {}x{} PNG, {}",
        pixmap.width(),
        pixmap.height(),
        human_bytes::human_bytes(bytes.len() as f64)
    );
    Ok(bytes)
}

#[cfg(test)]
mod test {
    use crate::assets::{test::png, MemoryAssets, MockupLibrary};
    use crate::renderer::Renderer;
    use darkroom_core::color::Color;
    use darkroom_core::error::ErrorKind;
    use darkroom_core::ingest::Bitmap;
    use darkroom_core::options::EditorOptions;
    use darkroom_core::state::{EditorSession, MockupAsset, PartialPlacement, Placement, Side};
    use darkroom_core::units::Resolution;

    fn session() -> EditorSession {
        EditorSession::new(EditorOptions {
            canvas_size: [100, 100],
            export_size: [200, 200],
            export_resolution: Resolution::Dpi(300.0),
            mockups: vec![MockupAsset {
                side: Side::Front,
                variant_id: None,
                image_url: "front.png".to_owned(),
            }],
            ..Default::default()
        })
        .unwrap()
    }
    fn renderer() -> Renderer {
        let mut assets = MemoryAssets::default();
        assets.insert("front.png", png(10, 10, [0, 0, 255, 255]));
        Renderer::new(MockupLibrary::new(assets), None)
    }
    fn decode(bytes: &[u8]) -> (png::OutputInfo, Option<png::PixelDimensions>, Vec<u8>) {
        let mut reader = png::Decoder::new(bytes).read_info().unwrap();
        let dims = reader.info().pixel_dims;
        let mut data = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut data).unwrap();
        data.truncate(info.buffer_size());
        (info, dims, data)
    }
    fn populate(session: &mut EditorSession) {
        let bitmap =
            Bitmap::from_rgba(image::RgbaImage::from_pixel(10, 10, image::Rgba([255, 0, 0, 255])))
                .unwrap();
        let store = session.store_mut();
        let id = store
            .add_image_layer(bitmap, Some(Placement::new([10.0, 10.0], [40.0, 40.0])))
            .unwrap();
        store
            .update_transform(
                id,
                PartialPlacement {
                    rotation_degrees: Some(15.0),
                    opacity: Some(0.5),
                    ..Default::default()
                },
            )
            .unwrap();
        let stroke = store.begin_stroke(Color::BLACK, 4.0, [0.0, 90.0]).unwrap();
        store.append_stroke_point(stroke, [100.0, 95.0]).unwrap();
        store.end_stroke(stroke).unwrap();
        store.select(Some(id)).unwrap();
    }

    #[tokio::test]
    async fn export_size_and_resolution() {
        let mut session = session();
        populate(&mut session);
        let bytes = renderer().flatten(&session).await.unwrap();
        let (info, dims, data) = decode(&bytes);
        assert_eq!((info.width, info.height), (200, 200));
        assert_eq!(info.color_type, png::ColorType::Rgba);
        let dims = dims.unwrap();
        assert_eq!(dims.unit, png::Unit::Meter);
        assert_eq!(dims.xppu, 11811);
        // Mockup in the top-right, scaled with the canvas.
        let at = |x: usize, y: usize| &data[(y * 200 + x) * 4..][..4];
        assert_eq!(at(190, 10), [0, 0, 255, 255]);
    }
    #[tokio::test]
    async fn deterministic() {
        let mut session = session();
        populate(&mut session);
        let first = renderer().flatten(&session).await.unwrap();
        let second = renderer().flatten(&session).await.unwrap();
        assert_eq!(first, second);
    }
    #[tokio::test]
    async fn text_exports_deterministically() {
        let mut session = session();
        populate(&mut session);
        session
            .store_mut()
            .add_text_layer("Hi", [10.0, 60.0], Color::BLACK, 20.0)
            .unwrap();
        let with_font = || {
            let mut assets = MemoryAssets::default();
            assets.insert("front.png", png(10, 10, [0, 0, 255, 255]));
            Renderer::new(
                MockupLibrary::new(assets),
                Some(crate::renderer::text::test::font()),
            )
        };
        let first = with_font().flatten(&session).await.unwrap();
        assert_eq!(first, with_font().flatten(&session).await.unwrap());

        // Black ink over the blue mockup, within the text box doubled for export.
        let (_, _, data) = decode(&first);
        let inked = (120..168)
            .flat_map(|y| (20..68).map(move |x| (x, y)))
            .filter(|&(x, y)| data[(y * 200 + x) * 4 + 2] < 64)
            .count();
        assert!(inked > 20, "only {inked} pixels of text");
    }
    #[tokio::test]
    async fn never_shows_selection() {
        let mut session = session();
        populate(&mut session);
        let selected = renderer().flatten(&session).await.unwrap();
        session.store_mut().select(None).unwrap();
        let unselected = renderer().flatten(&session).await.unwrap();
        assert_eq!(selected, unselected);
    }
    #[tokio::test]
    async fn snapshot_taken_at_call() {
        let mut session = session();
        populate(&mut session);
        let mut renderer = renderer();
        let expected = renderer.flatten(&session).await.unwrap();
        let pending = renderer.flatten(&session);
        session.clear();
        drop(session);
        assert_eq!(pending.await.unwrap(), expected);
    }
    #[tokio::test]
    async fn failures_are_export_failed() {
        // Text without a font.
        let mut session = session();
        session
            .store_mut()
            .add_text_layer("hi", [10.0, 10.0], Color::BLACK, 20.0)
            .unwrap();
        let err = renderer().flatten(&session).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExportFailed);

        // Mockup that can't be loaded.
        let session = session_with_mockup("missing.png");
        let err = renderer().flatten(&session).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExportFailed);
    }
    fn session_with_mockup(url: &str) -> EditorSession {
        EditorSession::new(EditorOptions {
            canvas_size: [100, 100],
            export_size: [200, 200],
            mockups: vec![MockupAsset {
                side: Side::Front,
                variant_id: None,
                image_url: url.to_owned(),
            }],
            ..Default::default()
        })
        .unwrap()
    }
}
