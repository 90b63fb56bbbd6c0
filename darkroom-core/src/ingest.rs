//! # Ingestion
//!
//! Turns a user's upload (raw file bytes or a `data:` URL) into a decoded [`Bitmap`].
//! The file type is checked before any decoding is attempted, so a non-image never reaches the
//! decoder nor the layer store.

use crate::error::{EditorError, Result};
use base64::Engine as _;

pub struct BitmapIDMarker;
pub type BitmapID = crate::DarkroomID<BitmapIDMarker>;

/// Decoded, immutable RGBA8 pixels (straight alpha).
///
/// Shared by reference count between the layer that owns it, clipboard copies, and export
/// snapshots. Nothing ever writes to the pixels after decode.
pub struct Bitmap {
    id: BitmapID,
    pixels: image::RgbaImage,
}
impl Bitmap {
    /// Wrap already-decoded pixels.
    ///
    /// # Errors
    /// Zero-sized images have nothing to place and are rejected as undecodable.
    pub fn from_rgba(pixels: image::RgbaImage) -> Result<std::sync::Arc<Self>> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(EditorError::ImageDecodeFailed(image::ImageError::Limits(
                image::error::LimitError::from_kind(image::error::LimitErrorKind::DimensionError),
            )));
        }
        Ok(std::sync::Arc::new(Self {
            id: BitmapID::default(),
            pixels,
        }))
    }
    #[must_use]
    pub fn id(&self) -> BitmapID {
        self.id
    }
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
    #[must_use]
    pub fn size(&self) -> [f32; 2] {
        [self.width() as f32, self.height() as f32]
    }
    #[must_use]
    pub fn pixels(&self) -> &image::RgbaImage {
        &self.pixels
    }
    /// Bytes held by the decoded pixels.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.pixels.as_raw().len()
    }
}
impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitmap")
            .field("id", &self.id)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish_non_exhaustive()
    }
}
impl Drop for Bitmap {
    fn drop(&mut self) {
        log::trace!(
            "Released {} ({})",
            self.id,
            human_bytes::human_bytes(self.byte_len() as f64)
        );
    }
}

/// Image formats accepted from users.
const ACCEPTED: [image::ImageFormat; 5] = [
    image::ImageFormat::Png,
    image::ImageFormat::Jpeg,
    image::ImageFormat::Gif,
    image::ImageFormat::WebP,
    image::ImageFormat::Bmp,
];

/// A file selected by the user, not yet validated.
#[derive(Clone)]
pub struct Upload {
    /// File name, for diagnostics only.
    pub name: String,
    pub source: UploadSource,
}
#[derive(Clone)]
pub enum UploadSource {
    Bytes(Vec<u8>),
    /// A `data:<mime>;base64,<payload>` URL.
    DataUrl(String),
}
impl Upload {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            source: UploadSource::Bytes(bytes),
        }
    }
    pub fn from_data_url(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: UploadSource::DataUrl(url.into()),
        }
    }
    /// Check the file is a supported image, returning its format and raw encoded bytes.
    ///
    /// # Errors
    /// [`EditorError::UnsupportedFileType`] for anything that isn't an accepted image.
    pub fn validate(&self) -> Result<(image::ImageFormat, std::borrow::Cow<'_, [u8]>)> {
        let (declared, bytes) = match &self.source {
            UploadSource::Bytes(bytes) => (None, std::borrow::Cow::Borrowed(bytes.as_slice())),
            UploadSource::DataUrl(url) => {
                let (mime, bytes) = parse_data_url(url)?;
                (Some(mime), std::borrow::Cow::Owned(bytes))
            }
        };
        if let Some(mime) = declared {
            if !mime.starts_with("image/") {
                return Err(EditorError::UnsupportedFileType(mime.to_owned()));
            }
        }
        // Trust the bytes over the declared type - a renamed file should still be caught.
        let format = image::guess_format(&bytes).map_err(|_| {
            EditorError::UnsupportedFileType(declared.unwrap_or("unknown").to_owned())
        })?;
        if !ACCEPTED.contains(&format) {
            return Err(EditorError::UnsupportedFileType(
                format.to_mime_type().to_owned(),
            ));
        }
        Ok((format, bytes))
    }
    /// Validate and decode the upload.
    ///
    /// # Errors
    /// [`EditorError::UnsupportedFileType`] from validation, or [`EditorError::ImageDecodeFailed`]
    /// if the data is corrupt.
    pub fn decode(&self) -> Result<std::sync::Arc<Bitmap>> {
        let (format, bytes) = self.validate()?;
        let decoded = image::load_from_memory_with_format(&bytes, format)
            .map_err(EditorError::ImageDecodeFailed)?;
        let bitmap = Bitmap::from_rgba(decoded.into_rgba8())?;
        log::debug!(
            "Decoded {:?} as {} {}x{} ({})",
            self.name,
            bitmap.id(),
            bitmap.width(),
            bitmap.height(),
            human_bytes::human_bytes(bitmap.byte_len() as f64)
        );
        Ok(bitmap)
    }
}

/// Split a base64 data URL into its mime type and decoded payload.
fn parse_data_url(url: &str) -> Result<(&str, Vec<u8>)> {
    let unsupported = || EditorError::UnsupportedFileType("malformed data URL".to_owned());
    let rest = url.trim().strip_prefix("data:").ok_or_else(unsupported)?;
    let (header, payload) = rest.split_once(',').ok_or_else(unsupported)?;
    let mime = header.strip_suffix(";base64").ok_or_else(unsupported)?;
    // Parameters such as `;charset=` may sit between the type and `;base64`.
    let mime = mime.split(';').next().unwrap_or_default();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|_| unsupported())?;
    Ok((mime, bytes))
}
