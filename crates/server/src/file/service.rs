//! Property image upload service.
//!
//! Validates size and actual content type before anything touches disk, and
//! reports failures with a distinguishable kind instead of a bare false.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::storage::ImageStorage;

/// Maximum image size (5 MB).
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// Allowed image MIME types.
pub const ALLOWED_IMAGE_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Why an upload was rejected.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no image data provided")]
    Empty,

    #[error("image too large: {size} bytes (max {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error("image type not allowed: {0}")]
    UnsupportedType(String),

    #[error("image storage failed")]
    Storage(#[from] anyhow::Error),
}

/// A successfully stored image.
#[derive(Debug, Clone, Serialize)]
pub struct StoredImage {
    /// Storage URI, as persisted on the property row.
    pub uri: String,
    /// Public URL for serving.
    pub url: String,
    pub mime_type: String,
    pub size: i64,
}

/// Image service for validated uploads.
pub struct ImageService {
    storage: Arc<dyn ImageStorage>,
}

impl ImageService {
    pub fn new(storage: Arc<dyn ImageStorage>) -> Self {
        Self { storage }
    }

    /// Validate and store an uploaded image.
    ///
    /// The MIME type is detected from the actual bytes; the client-supplied
    /// filename only contributes a sanitized suffix to the stored name.
    pub async fn store(&self, filename: &str, data: &[u8]) -> Result<StoredImage, UploadError> {
        if data.is_empty() {
            return Err(UploadError::Empty);
        }

        if data.len() > MAX_IMAGE_SIZE {
            return Err(UploadError::TooLarge {
                size: data.len(),
                max: MAX_IMAGE_SIZE,
            });
        }

        let mime_type = infer::get(data)
            .map(|kind| kind.mime_type())
            .unwrap_or("application/octet-stream");

        if !ALLOWED_IMAGE_TYPES.contains(&mime_type) {
            return Err(UploadError::UnsupportedType(mime_type.to_string()));
        }

        let now = chrono::Utc::now();
        let unique_id = Uuid::now_v7().simple().to_string();
        let safe_name = sanitize_filename(filename);
        let uri = format!(
            "{}://{}/{}/{}_{}",
            self.storage.scheme(),
            now.format("%Y"),
            now.format("%m"),
            &unique_id[..8],
            safe_name
        );

        self.storage.write(&uri, data).await?;

        let url = self.storage.public_url(&uri);

        debug!(uri = %uri, mime = %mime_type, size = data.len(), "image stored");

        Ok(StoredImage {
            uri,
            url,
            mime_type: mime_type.to_string(),
            size: data.len() as i64,
        })
    }

    /// Remove a stored image. Storage failures are logged, not propagated;
    /// a missing file must never block deleting its property row.
    pub async fn remove(&self, uri: &str) {
        if let Err(e) = self.storage.delete(uri).await {
            warn!(error = %e, uri = %uri, "failed to delete stored image");
        }
    }

    /// Get the storage backend.
    pub fn storage(&self) -> &Arc<dyn ImageStorage> {
        &self.storage
    }
}

impl std::fmt::Debug for ImageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageService").finish()
    }
}

/// Sanitize a filename for safe storage.
pub fn sanitize_filename(filename: &str) -> String {
    use std::path::Path;

    // Get just the filename part (no path)
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect::<String>()
        .chars()
        .take(200)
        .collect()
}
