//! # Layer Store
//!
//! The single writable source of truth for what is placed on the canvas. Every mutation is
//! atomic: it either applies in full and notifies observers exactly once, or fails and leaves
//! the store (and observers) untouched.

use super::layer::{
    ImageLayer, Layer, LayerID, LayerKind, PartialPlacement, Placement, StrokeLayer, TextLayer,
};
use crate::color::Color;
use crate::error::{EditorError, InvalidLayerReason, Result};
use crate::util::finite_point;

/// Something that happened to the store. Observers receive exactly one per mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    Added(LayerID),
    Removed(LayerID),
    Transformed(LayerID),
    StrokeExtended(LayerID),
    StrokeEnded(LayerID),
    TextEdited(LayerID),
    Selected(Option<LayerID>),
    Restacked(LayerID),
    Cleared,
    /// Several mutations made within one [`LayerStore::write_with`].
    Batch(Box<[Change]>),
}

/// Where to move a layer in z-order.
#[derive(Copy, Clone, PartialEq, Eq, Debug, strum::EnumIter)]
pub enum Restack {
    /// Paint over everything else.
    Top,
    /// Paint under everything else.
    Bottom,
    /// Swap with the layer directly above.
    Up,
    /// Swap with the layer directly below.
    Down,
}

/// Geometry limits applied to every layer the store holds.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StoreLimits {
    pub canvas_size: [f32; 2],
    /// Smallest effective width or height of an image or text box.
    pub min_size: f32,
    /// Fraction of the canvas a new image may cover on each axis.
    pub default_fit: f32,
}
impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            canvas_size: [985.0, 1271.0],
            min_size: 20.0,
            default_fit: 0.5,
        }
    }
}

pub struct UploadIDMarker;
pub type UploadID = crate::DarkroomID<UploadIDMarker>;

/// Proof that an upload was started against a particular generation of the store.
///
/// Clearing the store starts a new generation, and any upload begun before then is discarded
/// when it finishes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[must_use = "the ticket is needed to finish the upload"]
pub struct UploadTicket {
    pub id: UploadID,
    generation: u64,
}

pub struct ObserverIDMarker;
pub type ObserverID = crate::DarkroomID<ObserverIDMarker>;

type Observer = Box<dyn FnMut(&Change)>;

pub struct LayerStore {
    limits: StoreLimits,
    /// Bottom-most first.
    layers: Vec<Layer>,
    selected: Option<LayerID>,
    active_stroke: Option<LayerID>,
    generation: u64,
    observers: Vec<(ObserverID, Observer)>,
    /// Changes collected during a [`Self::write_with`], sent as one when it ends.
    batch: Option<smallvec::SmallVec<[Change; 1]>>,
}
impl Default for LayerStore {
    fn default() -> Self {
        Self::new(StoreLimits::default())
    }
}
impl std::fmt::Debug for LayerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerStore")
            .field("limits", &self.limits)
            .field("layers", &self.layers)
            .field("selected", &self.selected)
            .field("active_stroke", &self.active_stroke)
            .field("generation", &self.generation)
            .field("observers", &self.observers.len())
            .finish()
    }
}

// Reading
impl LayerStore {
    #[must_use]
    pub fn new(limits: StoreLimits) -> Self {
        Self {
            limits,
            layers: Vec::new(),
            selected: None,
            active_stroke: None,
            generation: 0,
            observers: Vec::new(),
            batch: None,
        }
    }
    #[must_use]
    pub fn limits(&self) -> &StoreLimits {
        &self.limits
    }
    /// All layers, in paint order (bottom-most first).
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
    #[must_use]
    pub fn get(&self, id: LayerID) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }
    #[must_use]
    pub fn contains(&self, id: LayerID) -> bool {
        self.get(id).is_some()
    }
    #[must_use]
    pub fn selected(&self) -> Option<LayerID> {
        self.selected
    }
    #[must_use]
    pub fn selected_layer(&self) -> Option<&Layer> {
        self.get(self.selected?)
    }
    #[must_use]
    pub fn active_stroke(&self) -> Option<LayerID> {
        self.active_stroke
    }
    /// Topmost layer under the canvas-space point.
    #[must_use]
    pub fn hit_test(&self, point: [f32; 2]) -> Option<LayerID> {
        self.layers
            .iter()
            .rev()
            .find(|layer| layer.hit(point))
            .map(|layer| layer.id)
    }
    /// Copy of every layer record. Bitmaps are shared, not copied.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Layer> {
        self.layers.clone()
    }
    fn index_of(&self, id: LayerID) -> Result<usize> {
        self.layers
            .iter()
            .position(|layer| layer.id == id)
            .ok_or(EditorError::invalid_layer(id, InvalidLayerReason::NotFound))
    }
}

// Observers
impl LayerStore {
    /// Register a callback to receive every [`Change`].
    pub fn subscribe(&mut self, observer: impl FnMut(&Change) + 'static) -> ObserverID {
        let id = ObserverID::default();
        self.observers.push((id, Box::new(observer)));
        id
    }
    /// Returns whether the observer was registered.
    pub fn unsubscribe(&mut self, id: ObserverID) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer, _)| *observer != id);
        before != self.observers.len()
    }
    fn notify(&mut self, change: Change) {
        if let Some(batch) = &mut self.batch {
            batch.push(change);
            return;
        }
        log::trace!("{change:?}");
        for (_, observer) in &mut self.observers {
            observer(&change);
        }
    }
    /// Run several mutations, notifying observers once with everything that changed.
    ///
    /// The resulting state is the same as making the calls outside of a batch. Nested calls fold
    /// into the outermost batch.
    pub fn write_with<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        if self.batch.is_some() {
            return f(self);
        }
        self.batch = Some(smallvec::SmallVec::new());
        let result = f(self);
        // Never None, we set it above and nested calls leave it alone.
        let mut changes = self.batch.take().unwrap_or_default();
        match changes.len() {
            0 => (),
            1 => {
                if let Some(change) = changes.pop() {
                    self.notify(change);
                }
            }
            _ => self.notify(Change::Batch(changes.into_vec().into_boxed_slice())),
        }
        result
    }
}

// Mutation
impl LayerStore {
    /// Place a decoded bitmap on top of everything else.
    ///
    /// Without a placement, the image is centered and shrunk to fit within the default fraction
    /// of the canvas, keeping its aspect ratio. It is never enlarged.
    ///
    /// # Errors
    /// [`EditorError::NonFiniteTransform`] if the given placement is not finite.
    pub fn add_image_layer(
        &mut self,
        bitmap: std::sync::Arc<crate::ingest::Bitmap>,
        placement: Option<Placement>,
    ) -> Result<LayerID> {
        let placement = match placement {
            Some(placement) if !placement.is_finite() => {
                return Err(EditorError::NonFiniteTransform)
            }
            Some(placement) => placement,
            None => self.default_placement(bitmap.size()),
        };
        let placement = self.clamp_initial(placement);
        Ok(self.push(LayerKind::Image(ImageLayer { bitmap, placement })))
    }
    fn default_placement(&self, [width, height]: [f32; 2]) -> Placement {
        let [canvas_w, canvas_h] = self.limits.canvas_size;
        let fit = self.limits.default_fit;
        let scale = (canvas_w * fit / width)
            .min(canvas_h * fit / height)
            .min(1.0);
        let min = self.limits.min_size;
        let size = [(width * scale).max(min), (height * scale).max(min)];
        Placement::new(
            [(canvas_w - size[0]) / 2.0, (canvas_h - size[1]) / 2.0],
            size,
        )
    }
    /// Grow a fresh placement up to the minimum size, and bring its other fields into range.
    fn clamp_initial(&self, mut placement: Placement) -> Placement {
        if placement.scale <= 0.0 {
            placement.scale = 1.0;
        }
        let min = self.limits.min_size / placement.scale;
        placement.width = placement.width.max(min);
        placement.height = placement.height.max(min);
        placement.opacity = placement.opacity.clamp(0.0, 1.0);
        placement
    }
    /// Start a new stroke, which becomes the one active stroke.
    ///
    /// Brush parameters are fixed for the life of the stroke.
    ///
    /// # Errors
    /// [`EditorError::NonFiniteTransform`] for a non-finite point or width.
    pub fn begin_stroke(
        &mut self,
        color: Color,
        stroke_width: f32,
        first_point: [f32; 2],
    ) -> Result<LayerID> {
        let first_point = finite_point(first_point)?;
        if !stroke_width.is_finite() {
            return Err(EditorError::NonFiniteTransform);
        }
        if let Some(previous) = self.active_stroke.take() {
            log::debug!("{previous} implicitly ended by a new stroke");
        }
        let id = self.push(LayerKind::Stroke(StrokeLayer {
            points: vec![first_point],
            color,
            stroke_width: stroke_width.max(0.0),
            offset: [0.0, 0.0],
        }));
        self.active_stroke = Some(id);
        Ok(id)
    }
    /// # Errors
    /// [`EditorError::InvalidLayer`] unless `id` is the active stroke, and
    /// [`EditorError::NonFiniteTransform`] for non-finite points.
    pub fn append_stroke_point(&mut self, id: LayerID, point: [f32; 2]) -> Result<()> {
        let index = self.index_of(id)?;
        if self.active_stroke != Some(id) {
            return Err(EditorError::invalid_layer(
                id,
                InvalidLayerReason::NotActiveStroke,
            ));
        }
        let point = finite_point(point)?;
        let LayerKind::Stroke(stroke) = &mut self.layers[index].kind else {
            // The active stroke is only ever set to a stroke layer.
            return Err(EditorError::invalid_layer(
                id,
                InvalidLayerReason::NotActiveStroke,
            ));
        };
        stroke.points.push(point);
        self.notify(Change::StrokeExtended(id));
        Ok(())
    }
    /// Close the active stroke. No more points can be added to it.
    ///
    /// # Errors
    /// [`EditorError::InvalidLayer`] unless `id` is the active stroke.
    pub fn end_stroke(&mut self, id: LayerID) -> Result<()> {
        if self.active_stroke != Some(id) {
            let reason = if self.contains(id) {
                InvalidLayerReason::NotActiveStroke
            } else {
                InvalidLayerReason::NotFound
            };
            return Err(EditorError::invalid_layer(id, reason));
        }
        self.active_stroke = None;
        self.notify(Change::StrokeEnded(id));
        Ok(())
    }
    /// Place text with its layout box's top-left at `position`.
    ///
    /// # Errors
    /// [`EditorError::NonFiniteTransform`] for a non-finite position or font size.
    pub fn add_text_layer(
        &mut self,
        content: impl Into<String>,
        position: [f32; 2],
        color: Color,
        font_size: f32,
    ) -> Result<LayerID> {
        let [x, y] = finite_point(position)?;
        if !font_size.is_finite() || font_size <= 0.0 {
            return Err(EditorError::NonFiniteTransform);
        }
        let mut text = TextLayer {
            content: content.into(),
            x,
            y,
            rotation_degrees: 0.0,
            scale: 1.0,
            color,
            font_size,
        };
        let [w, h] = text.layout_size();
        text.scale = (self.limits.min_size / w)
            .max(self.limits.min_size / h)
            .max(1.0);
        Ok(self.push(LayerKind::Text(text)))
    }
    /// # Errors
    /// [`EditorError::InvalidLayer`] if `id` is not a text layer.
    pub fn set_text(&mut self, id: LayerID, content: impl Into<String>) -> Result<()> {
        let index = self.index_of(id)?;
        let min = self.limits.min_size;
        let LayerKind::Text(text) = &mut self.layers[index].kind else {
            return Err(EditorError::invalid_layer(id, InvalidLayerReason::NotText));
        };
        text.content = content.into();
        // Shorter text may have shrunk the box below the minimum.
        let [w, h] = text.layout_size();
        text.scale = text.scale.max(min / w).max(min / h);
        self.notify(Change::TextEdited(id));
        Ok(())
    }
    /// Merge placement fields into a layer.
    ///
    /// A width, height, or scale that would take the effective size below the minimum is not
    /// applied, and that field keeps its previous value. Strokes can only be moved: their `x`
    /// and `y` set the drag offset.
    ///
    /// # Errors
    /// * [`EditorError::NonFiniteTransform`] if any given field is not finite.
    /// * [`EditorError::InvalidLayer`] if the layer does not exist, or does not support a
    ///   given field.
    pub fn update_transform(&mut self, id: LayerID, update: PartialPlacement) -> Result<()> {
        let index = self.index_of(id)?;
        if !update.is_finite() {
            return Err(EditorError::NonFiniteTransform);
        }
        let min = self.limits.min_size;
        match &mut self.layers[index].kind {
            LayerKind::Image(image) => {
                image.placement = merge_placement(image.placement, &update, min);
            }
            LayerKind::Text(text) => {
                if update.width.is_some() || update.height.is_some() || update.opacity.is_some()
                {
                    return Err(EditorError::invalid_layer(
                        id,
                        InvalidLayerReason::UnsupportedTransform,
                    ));
                }
                let [w, h] = text.layout_size();
                text.x = update.x.unwrap_or(text.x);
                text.y = update.y.unwrap_or(text.y);
                text.rotation_degrees = update.rotation_degrees.unwrap_or(text.rotation_degrees);
                if let Some(scale) = update.scale {
                    if w * scale >= min && h * scale >= min {
                        text.scale = scale;
                    }
                }
            }
            LayerKind::Stroke(stroke) => {
                if update.has_shape_fields() {
                    return Err(EditorError::invalid_layer(
                        id,
                        InvalidLayerReason::UnsupportedTransform,
                    ));
                }
                stroke.offset = [
                    update.x.unwrap_or(stroke.offset[0]),
                    update.y.unwrap_or(stroke.offset[1]),
                ];
            }
        }
        self.notify(Change::Transformed(id));
        Ok(())
    }
    /// Remove a layer. Removing a layer that doesn't exist does nothing.
    pub fn remove_layer(&mut self, id: LayerID) {
        let Ok(index) = self.index_of(id) else {
            return;
        };
        self.layers.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        if self.active_stroke == Some(id) {
            self.active_stroke = None;
        }
        self.notify(Change::Removed(id));
    }
    /// # Errors
    /// [`EditorError::InvalidLayer`] if selecting a layer that does not exist.
    pub fn select(&mut self, id: Option<LayerID>) -> Result<()> {
        if let Some(id) = id {
            self.index_of(id)?;
        }
        self.selected = id;
        self.notify(Change::Selected(id));
        Ok(())
    }
    /// Remove every layer, and discard any upload still in flight.
    pub fn clear_all(&mut self) {
        self.layers.clear();
        self.selected = None;
        self.active_stroke = None;
        self.generation = self.generation.wrapping_add(1);
        self.notify(Change::Cleared);
    }
    /// Move a layer in z-order. Moving past either end does nothing.
    ///
    /// # Errors
    /// [`EditorError::InvalidLayer`] if the layer does not exist.
    pub fn restack(&mut self, id: LayerID, to: Restack) -> Result<()> {
        let from = self.index_of(id)?;
        let last = self.layers.len() - 1;
        let target = match to {
            Restack::Top => last,
            Restack::Bottom => 0,
            Restack::Up => (from + 1).min(last),
            Restack::Down => from.saturating_sub(1),
        };
        if target == from {
            return Ok(());
        }
        let layer = self.layers.remove(from);
        self.layers.insert(target, layer);
        self.notify(Change::Restacked(id));
        Ok(())
    }
    /// Note the start of an upload. The returned ticket is checked when it finishes.
    pub fn begin_upload(&self) -> UploadTicket {
        UploadTicket {
            id: UploadID::default(),
            generation: self.generation,
        }
    }
    /// Whether an upload begun with this ticket may still add its layer.
    #[must_use]
    pub fn is_current(&self, ticket: &UploadTicket) -> bool {
        ticket.generation == self.generation
    }
    /// Add the result of an upload, unless the store was cleared since it began.
    ///
    /// # Errors
    /// As [`Self::add_image_layer`].
    pub fn finish_upload(
        &mut self,
        ticket: UploadTicket,
        bitmap: std::sync::Arc<crate::ingest::Bitmap>,
        placement: Option<Placement>,
    ) -> Result<Option<LayerID>> {
        if !self.is_current(&ticket) {
            log::info!("Discarding {}, the canvas was cleared", ticket.id);
            return Ok(None);
        }
        self.add_image_layer(bitmap, placement).map(Some)
    }
    /// Insert a fully-formed layer on top, with a fresh ID. Used for paste.
    pub(crate) fn insert(&mut self, mut kind: LayerKind) -> LayerID {
        let min = self.limits.min_size;
        match &mut kind {
            LayerKind::Image(image) => image.placement = self.clamp_initial(image.placement),
            LayerKind::Text(text) => {
                let [w, h] = text.layout_size();
                text.scale = text.scale.max(min / w).max(min / h);
            }
            LayerKind::Stroke(_) => (),
        }
        self.push(kind)
    }
    fn push(&mut self, kind: LayerKind) -> LayerID {
        let id = LayerID::default();
        log::debug!("Added {} layer {id}", kind.as_ref());
        self.layers.push(Layer { id, kind });
        self.notify(Change::Added(id));
        id
    }
}

/// Apply an update to an image placement, keeping the effective size at or above `min`.
fn merge_placement(prev: Placement, update: &PartialPlacement, min: f32) -> Placement {
    let mut next = prev;
    next.x = update.x.unwrap_or(prev.x);
    next.y = update.y.unwrap_or(prev.y);
    next.rotation_degrees = update.rotation_degrees.unwrap_or(prev.rotation_degrees);
    if let Some(opacity) = update.opacity {
        next.opacity = opacity.clamp(0.0, 1.0);
    }
    next.scale = update.scale.filter(|s| *s > 0.0).unwrap_or(prev.scale);
    next.width = update.width.unwrap_or(prev.width);
    next.height = update.height.unwrap_or(prev.height);
    if next.width * next.scale < min {
        next.width = prev.width;
    }
    if next.height * next.scale < min {
        next.height = prev.height;
    }
    // Only a shrinking scale can still be too small, as both dimensions are now known good at
    // either the new or the old scale.
    if next.width * next.scale < min || next.height * next.scale < min {
        next.scale = prev.scale;
        if next.width * next.scale < min {
            next.width = prev.width;
        }
        if next.height * next.scale < min {
            next.height = prev.height;
        }
    }
    next
}

#[cfg(test)]
mod test {
    use super::{Change, LayerStore, Restack};
    use crate::color::Color;
    use crate::error::ErrorKind;
    use crate::ingest::test::solid_bitmap;
    use crate::state::layer::{LayerKind, PartialPlacement, Placement};

    fn image_placement(store: &LayerStore, id: super::LayerID) -> Placement {
        match &store.get(id).unwrap().kind {
            LayerKind::Image(image) => image.placement,
            _ => panic!("not an image"),
        }
    }
    /// Record every change sent to observers.
    fn recorder(store: &mut LayerStore) -> std::rc::Rc<std::cell::RefCell<Vec<Change>>> {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = log.clone();
        store.subscribe(move |change| sink.borrow_mut().push(change.clone()));
        log
    }

    #[test]
    fn default_placement_fits_and_centers() {
        let mut store = LayerStore::default();
        let id = store.add_image_layer(solid_bitmap(2000, 1000), None).unwrap();
        let p = image_placement(&store, id);
        // Half of a 985 wide canvas.
        assert!((p.width - 492.5).abs() < 1e-3);
        assert!((p.height - 246.25).abs() < 1e-3);
        assert!((p.x + p.width / 2.0 - 492.5).abs() < 1e-3);
        assert!((p.y + p.height / 2.0 - 635.5).abs() < 1e-3);

        // Small images are not enlarged.
        let small = store.add_image_layer(solid_bitmap(100, 50), None).unwrap();
        let p = image_placement(&store, small);
        assert_eq!((p.width, p.height, p.scale), (100.0, 50.0, 1.0));

        // Images under the minimum grow to it, and stay centered.
        let tiny = store.add_image_layer(solid_bitmap(4, 4), None).unwrap();
        let p = image_placement(&store, tiny);
        assert_eq!((p.width, p.height), (20.0, 20.0));
        assert_eq!(p.frame().center(), [492.5, 635.5]);
    }
    #[test]
    fn min_size_keeps_previous_value() {
        let mut store = LayerStore::default();
        let id = store.add_image_layer(solid_bitmap(100, 100), None).unwrap();
        store
            .update_transform(
                id,
                PartialPlacement {
                    width: Some(5.0),
                    height: Some(60.0),
                    ..Default::default()
                },
            )
            .unwrap();
        let p = image_placement(&store, id);
        assert_eq!((p.width, p.height), (100.0, 60.0));

        // Scale that would make the 60 tall side 12 is not applied.
        store
            .update_transform(
                id,
                PartialPlacement {
                    scale: Some(0.2),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(image_placement(&store, id).scale, 1.0);
        store
            .update_transform(
                id,
                PartialPlacement {
                    scale: Some(-1.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(image_placement(&store, id).scale, 1.0);

        // Tiny uploads are clamped up on placement.
        let tiny = store.add_image_layer(solid_bitmap(5, 5), None).unwrap();
        let p = image_placement(&store, tiny);
        assert!(p.width >= 20.0 && p.height >= 20.0);
    }
    #[test]
    fn non_finite_update_is_atomic() {
        let mut store = LayerStore::default();
        let id = store.add_image_layer(solid_bitmap(100, 100), None).unwrap();
        let before = image_placement(&store, id);
        let log = recorder(&mut store);
        let err = store
            .update_transform(
                id,
                PartialPlacement {
                    x: Some(3.0),
                    rotation_degrees: Some(f32::INFINITY),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NonFiniteTransform);
        assert_eq!(image_placement(&store, id), before);
        assert!(log.borrow().is_empty());
    }
    #[test]
    fn stroke_lifecycle() {
        let mut store = LayerStore::default();
        let id = store.begin_stroke(Color::WHITE, 4.0, [1.0, 1.0]).unwrap();
        store.append_stroke_point(id, [2.0, 2.0]).unwrap();
        store.end_stroke(id).unwrap();

        let err = store.append_stroke_point(id, [3.0, 3.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLayer);
        let LayerKind::Stroke(stroke) = &store.get(id).unwrap().kind else {
            panic!("not a stroke");
        };
        assert_eq!(stroke.points, vec![[1.0, 1.0], [2.0, 2.0]]);

        // A new gesture is a new layer.
        let next = store.begin_stroke(Color::BLACK, 2.0, [5.0, 5.0]).unwrap();
        assert_ne!(next, id);
        assert_eq!(store.len(), 2);
    }
    #[test]
    fn strokes_only_move() {
        let mut store = LayerStore::default();
        let id = store.begin_stroke(Color::WHITE, 4.0, [1.0, 1.0]).unwrap();
        store.end_stroke(id).unwrap();
        let err = store
            .update_transform(
                id,
                PartialPlacement {
                    x: Some(10.0),
                    scale: Some(2.0),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidLayer);
        store
            .update_transform(id, PartialPlacement::position([10.0, -5.0]))
            .unwrap();
        assert_eq!(store.get(id).unwrap().kind.position(), [10.0, -5.0]);
    }
    #[test]
    fn text_layers() {
        let mut store = LayerStore::default();
        let text = store
            .add_text_layer("hi", [10.0, 10.0], Color::BLACK, 48.0)
            .unwrap();
        store.set_text(text, "hello").unwrap();
        let image = store.add_image_layer(solid_bitmap(10, 10), None).unwrap();
        assert_eq!(
            store.set_text(image, "nope").unwrap_err().kind(),
            ErrorKind::InvalidLayer
        );
        // Tiny font is scaled up to the minimum box.
        let small = store
            .add_text_layer("a", [0.0, 0.0], Color::BLACK, 5.0)
            .unwrap();
        let frame = store.get(small).unwrap().frame();
        let [w, h] = frame.effective_size();
        assert!(w >= 20.0 - 1e-3 && h >= 20.0 - 1e-3);
    }
    #[test]
    fn remove_is_idempotent() {
        let mut store = LayerStore::default();
        let id = store.add_image_layer(solid_bitmap(10, 10), None).unwrap();
        store.select(Some(id)).unwrap();
        let log = recorder(&mut store);
        store.remove_layer(id);
        store.remove_layer(id);
        assert!(store.is_empty());
        assert_eq!(store.selected(), None);
        assert_eq!(*log.borrow(), vec![Change::Removed(id)]);
        assert_eq!(
            store.select(Some(id)).unwrap_err().kind(),
            ErrorKind::InvalidLayer
        );
    }
    #[test]
    fn z_order_survives_selection() {
        let mut store = LayerStore::default();
        let a = store.add_image_layer(solid_bitmap(10, 10), None).unwrap();
        let b = store.begin_stroke(Color::WHITE, 4.0, [0.0, 0.0]).unwrap();
        let c = store
            .add_text_layer("c", [0.0, 0.0], Color::BLACK, 20.0)
            .unwrap();
        store.select(Some(a)).unwrap();
        store.select(Some(c)).unwrap();
        store.select(None).unwrap();
        let order: Vec<_> = store.layers().iter().map(|l| l.id).collect();
        assert_eq!(order, vec![a, b, c]);

        store.restack(a, Restack::Top).unwrap();
        let order: Vec<_> = store.layers().iter().map(|l| l.id).collect();
        assert_eq!(order, vec![b, c, a]);
        store.restack(c, Restack::Down).unwrap();
        // Already at the bottom, nothing to do.
        store.restack(c, Restack::Down).unwrap();
        let order: Vec<_> = store.layers().iter().map(|l| l.id).collect();
        assert_eq!(order, vec![c, b, a]);
    }
    #[test]
    fn batch_is_one_notification_with_same_result() {
        let points = [[1.0, 1.0], [2.0, 3.0], [4.0, 4.0]];

        let mut plain = LayerStore::default();
        let plain_log = recorder(&mut plain);
        let id = plain.begin_stroke(Color::WHITE, 4.0, [0.0, 0.0]).unwrap();
        for p in points {
            plain.append_stroke_point(id, p).unwrap();
        }
        assert_eq!(plain_log.borrow().len(), 4);

        let mut batched = LayerStore::default();
        let batched_log = recorder(&mut batched);
        let id2 = batched.begin_stroke(Color::WHITE, 4.0, [0.0, 0.0]).unwrap();
        batched.write_with(|store| {
            for p in points {
                store.append_stroke_point(id2, p).unwrap();
            }
        });
        let log = batched_log.borrow();
        assert_eq!(log.len(), 2);
        assert!(matches!(&log[1], Change::Batch(changes) if changes.len() == 3));

        let (LayerKind::Stroke(a), LayerKind::Stroke(b)) =
            (&plain.get(id).unwrap().kind, &batched.get(id2).unwrap().kind)
        else {
            panic!("not strokes");
        };
        assert_eq!(a.points, b.points);
    }
    #[test]
    fn cleared_uploads_are_discarded() {
        let mut store = LayerStore::default();
        let ticket = store.begin_upload();
        store.clear_all();
        assert_eq!(
            store
                .finish_upload(ticket, solid_bitmap(10, 10), None)
                .unwrap(),
            None
        );
        assert!(store.is_empty());

        let ticket = store.begin_upload();
        assert!(store
            .finish_upload(ticket, solid_bitmap(10, 10), None)
            .unwrap()
            .is_some());
    }
    #[test]
    fn hit_test_prefers_topmost() {
        let mut store = LayerStore::default();
        let below = store.add_image_layer(solid_bitmap(100, 100), None).unwrap();
        let above = store.add_image_layer(solid_bitmap(100, 100), None).unwrap();
        let center = store.get(below).unwrap().frame().center();
        assert_eq!(store.hit_test(center), Some(above));
        assert_eq!(store.hit_test([-50.0, -50.0]), None);
    }
}
