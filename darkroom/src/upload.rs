//! # Uploads
//!
//! Bringing a shopper's file onto the canvas, in three steps:
//! * [`begin`] checks the file type, without touching the store, and takes an upload ticket.
//! * [`PendingUpload::decode`] decodes the image, giving the editor a turn first.
//! * [`DecodedUpload::place`] adds the layer, unless the canvas was cleared in the meantime.

use std::sync::Arc;

use darkroom_core::error::Result;
use darkroom_core::ingest::{Bitmap, Upload};
use darkroom_core::state::store::UploadTicket;
use darkroom_core::state::{LayerID, LayerStore, Placement};

/// An upload of an acceptable type, not yet decoded.
#[must_use = "an upload does nothing until decoded and placed"]
pub struct PendingUpload {
    ticket: UploadTicket,
    upload: Upload,
}

/// Reject files that aren't an accepted image type, then note the upload against the store.
///
/// # Errors
/// [`darkroom_core::EditorError::UnsupportedFileType`] for anything but an accepted image.
pub fn begin(store: &LayerStore, upload: Upload) -> Result<PendingUpload> {
    let (format, _) = upload.validate()?;
    let ticket = store.begin_upload();
    log::debug!("Upload {} {:?} as {format:?}", ticket.id, upload.name);
    Ok(PendingUpload { ticket, upload })
}

impl PendingUpload {
    #[must_use]
    pub fn ticket(&self) -> &UploadTicket {
        &self.ticket
    }
    /// # Errors
    /// [`darkroom_core::EditorError::ImageDecodeFailed`] if the file is damaged.
    pub async fn decode(self) -> Result<DecodedUpload> {
        // Let pending input be handled before the decode blocks the thread.
        tokio::task::yield_now().await;
        let bitmap = self.upload.decode()?;
        Ok(DecodedUpload {
            ticket: self.ticket,
            bitmap,
        })
    }
}

#[must_use = "a decoded upload does nothing until placed"]
pub struct DecodedUpload {
    ticket: UploadTicket,
    bitmap: Arc<Bitmap>,
}
impl DecodedUpload {
    #[must_use]
    pub fn bitmap(&self) -> &Arc<Bitmap> {
        &self.bitmap
    }
    /// Add the image at the default placement, or the one given. `None` if the canvas was
    /// cleared since the upload began, in which case the image is dropped.
    ///
    /// # Errors
    /// [`darkroom_core::EditorError::NonFiniteTransform`] for a non-finite placement.
    pub fn place(
        self,
        store: &mut LayerStore,
        placement: Option<Placement>,
    ) -> Result<Option<LayerID>> {
        store.finish_upload(self.ticket, self.bitmap, placement)
    }
}
