//! Durable storage for generated images

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::artifact::base64;
use crate::config::StorageConfig;
use crate::error::{AppError, Result};

/// Writes decoded render artifacts under a folder and hands back references
pub struct ArtifactStore {
    storage_path: PathBuf,
    url_prefix: String,
}

impl ArtifactStore {
    pub fn new(storage_path: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            storage_path: storage_path.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.base_path, &config.url_prefix)
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    /// Ensure the storage directory exists
    pub async fn ensure_storage_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.storage_path).await?;
        Ok(())
    }

    /// Decode one base64 image, write it under a fresh name and return its reference
    pub async fn save_base64(&self, b64_data: &str) -> Result<String> {
        let image_data = base64::decode(b64_data)?;
        let format: &str = match detect_image_format(&image_data) {
            Some(sniffed) => sniffed,
            None => base64::get_format_from_data_url(b64_data)
                .filter(|declared| is_known_format(declared))
                .unwrap_or("png"),
        };
        self.save_raw(&image_data, format).await
    }

    /// Save raw image bytes with the given extension
    pub async fn save_raw(&self, data: &[u8], format: &str) -> Result<String> {
        self.ensure_storage_dir().await?;

        let filename = format!("{}.{}", Uuid::new_v4(), format);
        let file_path = self.storage_path.join(&filename);
        fs::write(&file_path, data).await?;

        debug!(path = ?file_path, size = data.len(), "Saved image file");
        Ok(self.reference_for(&filename))
    }

    /// Persist every image in order. The first failure aborts the batch and
    /// removes the files already written by this call.
    pub async fn save_all(&self, images: &[String]) -> Result<Vec<String>> {
        let mut references = Vec::with_capacity(images.len());
        for image in images {
            match self.save_base64(image).await {
                Ok(reference) => references.push(reference),
                Err(e) => {
                    self.discard(&references).await;
                    return Err(e);
                }
            }
        }
        Ok(references)
    }

    /// Best-effort removal of stored files by reference
    pub async fn discard(&self, references: &[String]) {
        for reference in references {
            let Some(filename) = self.filename_for(reference) else {
                continue;
            };
            let path = self.storage_path.join(filename);
            match fs::remove_file(&path).await {
                Ok(()) => debug!(path = ?path, "Removed image file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = ?path, error = %e, "Failed to remove image file"),
            }
        }
    }

    /// Read back a file this store handed out a reference for
    pub async fn load(&self, reference: &str) -> Result<Vec<u8>> {
        let filename = self.filename_for(reference).ok_or_else(|| {
            AppError::InvalidRequest(format!("{} is not a stored image reference", reference))
        })?;

        fs::read(self.storage_path.join(filename))
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    AppError::InvalidRequest(format!("Stored image not found: {}", reference))
                }
                _ => AppError::Io(e),
            })
    }

    /// Public reference of a stored file
    pub fn reference_for(&self, filename: &str) -> String {
        format!("{}/{}", self.url_prefix, filename)
    }

    /// Whether `reference` points into this store's URL space
    pub fn is_reference(&self, reference: &str) -> bool {
        self.filename_for(reference).is_some()
    }

    /// Bare filename behind a reference; rejects anything that could leave the folder
    fn filename_for<'a>(&self, reference: &'a str) -> Option<&'a str> {
        let name = reference
            .trim()
            .strip_prefix(self.url_prefix.as_str())?
            .strip_prefix('/')?;
        let contained = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(|c: char| c == '/' || c == '\\');
        contained.then_some(name)
    }
}

fn is_known_format(format: &str) -> bool {
    matches!(format, "png" | "jpg" | "jpeg" | "webp")
}

/// Detect image format from binary data using magic bytes
fn detect_image_format(data: &[u8]) -> Option<&'static str> {
    if data.len() < 8 {
        return None;
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("png");
    }

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("jpg");
    }

    // WebP: RIFF....WEBP
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some("webp");
    }

    None
}
