//! Storage for uploaded drawing images
//!
//! Images arrive as base64, optionally wrapped in a data URL, and are
//! written to the upload directory under a generated filename.

use std::path::PathBuf;

use anyhow::Context;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::AppError;
use crate::domain::UserId;

/// Writes uploaded images to a directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the upload directory if it doesn't exist.
    pub async fn ensure_dir(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create upload dir {}", self.dir.display()))
    }

    /// Delete a stored image. A failure is logged, not returned.
    pub async fn remove(&self, filename: &str) {
        let path = self.dir.join(filename);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(file = %filename, "Image removed"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove image"),
        }
    }

    /// Decode and store an image for `owner`. Returns the generated filename.
    pub async fn save(&self, owner: UserId, payload: &str) -> Result<String, AppError> {
        let bytes = decode_image(payload)?;
        let filename = format!("drawing_{}_{}.png", owner, Uuid::new_v4().simple());

        self.ensure_dir().await?;
        let path = self.dir.join(&filename);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write image {}", path.display()))?;

        debug!(file = %filename, size = bytes.len(), "Image stored");
        Ok(filename)
    }
}

/// Decode a base64 image payload, accepting a `data:...;base64,` prefix.
pub fn decode_image(payload: &str) -> Result<Vec<u8>, AppError> {
    let encoded = match payload.split_once(',') {
        Some((header, data)) if header.starts_with("data:") => data,
        _ => payload,
    }
    .trim();

    if encoded.is_empty() {
        return Err(AppError::InvalidInput("no image".to_string()));
    }

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| AppError::InvalidInput(format!("image is not valid base64: {}", e)))?;

    if bytes.is_empty() {
        return Err(AppError::InvalidInput("no image".to_string()));
    }
    Ok(bytes)
}
