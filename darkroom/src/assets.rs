//! # Assets
//!
//! Mockup images are named by URL in the editor options. Hosts decide where those bytes come
//! from by providing an [`AssetSource`]. Each image is decoded once, on first use, and kept
//! for the life of the [`MockupLibrary`].

use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum AssetError {
    #[error("asset {0:?} not found")]
    NotFound(String),
    #[error("failed to read {url:?}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {url:?}: {source}")]
    Decode {
        url: String,
        #[source]
        source: image::ImageError,
    },
    #[error("{0:?} has no pixels or is too large to draw")]
    BadSize(String),
}

/// Where mockup bytes come from.
pub trait AssetSource: Send + Sync {
    /// Fetch the raw, encoded bytes of an asset.
    ///
    /// # Errors
    /// If the asset does not exist or cannot be read.
    fn load(&self, url: &str) -> Result<Vec<u8>, AssetError>;
}

/// Assets as files beneath a base directory.
#[derive(Clone, Debug)]
pub struct FileAssets {
    base_dir: std::path::PathBuf,
}
impl FileAssets {
    pub fn new(base_dir: impl Into<std::path::PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}
impl AssetSource for FileAssets {
    fn load(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let relative = url.strip_prefix("file://").unwrap_or(url);
        let path = self.base_dir.join(relative.trim_start_matches('/'));
        log::trace!("Reading asset {}", path.display());
        std::fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AssetError::NotFound(url.to_owned())
            } else {
                AssetError::Io {
                    url: url.to_owned(),
                    source,
                }
            }
        })
    }
}

/// Assets held in memory, for hosts that bundle their mockups.
#[derive(Clone, Debug, Default)]
pub struct MemoryAssets {
    assets: hashbrown::HashMap<String, Arc<[u8]>>,
}
impl MemoryAssets {
    pub fn insert(&mut self, url: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.assets.insert(url.into(), bytes.into());
    }
}
impl AssetSource for MemoryAssets {
    fn load(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        self.assets
            .get(url)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| AssetError::NotFound(url.to_owned()))
    }
}

/// Decoded mockups, ready to draw, by URL.
pub struct MockupLibrary {
    source: Box<dyn AssetSource>,
    decoded: parking_lot::Mutex<hashbrown::HashMap<String, Arc<tiny_skia::Pixmap>>>,
}
impl MockupLibrary {
    pub fn new(source: impl AssetSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            decoded: parking_lot::Mutex::new(hashbrown::HashMap::new()),
        }
    }
    /// Get the decoded image, loading it if this is the first request for it.
    ///
    /// # Errors
    /// If the source can't provide it or it isn't a decodable image.
    pub fn get(&self, url: &str) -> Result<Arc<tiny_skia::Pixmap>, AssetError> {
        if let Some(pixmap) = self.decoded.lock().get(url) {
            return Ok(pixmap.clone());
        }
        // Not holding the lock while decoding. Two racing loads of the same URL both decode,
        // and the first one in wins.
        let bytes = self.source.load(url)?;
        let image = image::load_from_memory(&bytes)
            .map_err(|source| AssetError::Decode {
                url: url.to_owned(),
                source,
            })?
            .into_rgba8();
        let pixmap = crate::renderer::pixmap_from_rgba(&image)
            .ok_or_else(|| AssetError::BadSize(url.to_owned()))?;
        log::debug!(
            "Decoded mockup {url:?} ({}x{})",
            pixmap.width(),
            pixmap.height()
        );
        Ok(self
            .decoded
            .lock()
            .entry(url.to_owned())
            .or_insert_with(|| Arc::new(pixmap))
            .clone())
    }
}
