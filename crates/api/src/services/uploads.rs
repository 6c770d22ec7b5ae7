//! Product image storage on local disk.
//!
//! Files land in the configured upload directory under a collision-free
//! name and are served back by the static `/uploads` route.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur when storing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The part's content type is not `image/*`.
    #[error("{0}")]
    NotAnImage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub file_name: String,
    /// Public URL under `/uploads`.
    pub url: String,
}

/// Writes uploads to a directory and maps them to public URLs.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    url_prefix: String,
}

impl UploadStore {
    /// `public_url` is the externally visible base URL of the API.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, public_url: &str) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: format!("{}/uploads/", public_url.trim_end_matches('/')),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Store an image.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::NotAnImage` if `content_type` is not `image/*`,
    /// or `UploadError::Io` if the write fails.
    pub async fn save_image(
        &self,
        original_name: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredUpload, UploadError> {
        let is_image = content_type
            .is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"));
        if !is_image {
            return Err(UploadError::NotAnImage("file must be an image".to_string()));
        }

        let file_name = unique_file_name(original_name.unwrap_or_default());
        self.ensure_dir().await?;
        tokio::fs::write(self.dir.join(&file_name), bytes).await?;

        tracing::debug!(file_name = %file_name, size = bytes.len(), "Upload stored");

        Ok(StoredUpload {
            url: format!("{}{file_name}", self.url_prefix),
            file_name,
        })
    }

    /// Remove a previously stored file by its public URL.
    ///
    /// URLs that don't point into this store are ignored. Failures are logged,
    /// not returned: a leftover file never blocks a catalog change.
    pub async fn remove_by_url(&self, url: &str) {
        let Some(file_name) = url.strip_prefix(&self.url_prefix) else {
            return;
        };
        if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name.starts_with('.') {
            return;
        }

        if let Err(e) = tokio::fs::remove_file(self.dir.join(file_name)).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(error = %e, file_name = %file_name, "Failed to remove upload");
        }
    }
}

/// `{unix}-{8 hex}-{sanitized original name}`.
fn unique_file_name(original: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    let short = token.get(..8).unwrap_or(&token);
    format!("{}-{short}-{}", Utc::now().timestamp(), sanitize(original))
}

/// Base name only, restricted to `[A-Za-z0-9._-]`.
fn sanitize(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}
