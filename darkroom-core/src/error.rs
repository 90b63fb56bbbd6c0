//! # Errors
//!
//! Every fallible editor operation reports an [`EditorError`]. Callers that only care about the
//! category (to pick a message for the upload control or the export button, say) can match on
//! [`EditorError::kind`].

use crate::state::LayerID;

/// Broad category of an [`EditorError`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, strum::AsRefStr)]
pub enum ErrorKind {
    ImageDecodeFailed,
    UnsupportedFileType,
    InvalidLayer,
    ExportFailed,
    NonFiniteTransform,
    UnknownVariant,
    ToolDisabled,
}

#[derive(thiserror::Error, Debug)]
pub enum EditorError {
    #[error("failed to decode image")]
    ImageDecodeFailed(#[source] image::ImageError),
    #[error("unsupported file type {0:?}")]
    UnsupportedFileType(String),
    #[error("layer {id} {reason}")]
    InvalidLayer { id: LayerID, reason: InvalidLayerReason },
    #[error("export failed: {0}")]
    ExportFailed(String),
    #[error("transform contains a non-finite value")]
    NonFiniteTransform,
    #[error("no mockup for variant {0:?}")]
    UnknownVariant(String),
    #[error("tool {0} is not enabled")]
    ToolDisabled(&'static str),
}
impl EditorError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ImageDecodeFailed(_) => ErrorKind::ImageDecodeFailed,
            Self::UnsupportedFileType(_) => ErrorKind::UnsupportedFileType,
            Self::InvalidLayer { .. } => ErrorKind::InvalidLayer,
            Self::ExportFailed(_) => ErrorKind::ExportFailed,
            Self::NonFiniteTransform => ErrorKind::NonFiniteTransform,
            Self::UnknownVariant(_) => ErrorKind::UnknownVariant,
            Self::ToolDisabled(_) => ErrorKind::ToolDisabled,
        }
    }
    pub(crate) fn invalid_layer(id: LayerID, reason: InvalidLayerReason) -> Self {
        Self::InvalidLayer { id, reason }
    }
}
impl From<crate::util::FiniteF32Error> for EditorError {
    fn from(_: crate::util::FiniteF32Error) -> Self {
        Self::NonFiniteTransform
    }
}

/// Why a layer ID was rejected.
#[derive(thiserror::Error, Copy, Clone, PartialEq, Eq, Debug)]
pub enum InvalidLayerReason {
    #[error("does not exist")]
    NotFound,
    #[error("is not a stroke being drawn")]
    NotActiveStroke,
    #[error("is not a text layer")]
    NotText,
    #[error("does not support this transform")]
    UnsupportedTransform,
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
