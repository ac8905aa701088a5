// SPDX-License-Identifier: MIT

//! Local media storage for avatar and cover uploads.
//!
//! Uploaded bytes land under a configured directory with a generated name;
//! the stored reference is the public `/media/...` path the router serves.

use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::AppError;

/// File-backed media store.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist an uploaded file and return its public reference.
    ///
    /// The original filename only contributes a sanitized extension; the
    /// stored name is always freshly generated.
    pub async fn save(
        &self,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, AppError> {
        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }

        let ext = original_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| "bin".to_string());

        let file_name = format!("{}.{ext}", Uuid::new_v4());
        let path = self.root.join(&file_name);

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Fatal(anyhow::anyhow!("creating media dir failed: {e}")))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Fatal(anyhow::anyhow!("writing media file failed: {e}")))?;

        tracing::debug!(file = %file_name, size = bytes.len(), "Stored media upload");

        Ok(format!("/media/{file_name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_reference() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let media_ref = store.save(Some("avatar.PNG"), b"pngbytes").await.unwrap();
        assert!(media_ref.starts_with("/media/"));
        assert!(media_ref.ends_with(".png"));

        let on_disk = dir
            .path()
            .join(media_ref.trim_start_matches("/media/"));
        assert_eq!(std::fs::read(on_disk).unwrap(), b"pngbytes");
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let err = store.save(Some("avatar.png"), b"").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_hostile_extension_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let media_ref = store
            .save(Some("../../etc/passwd%00"), b"data")
            .await
            .unwrap();
        assert!(media_ref.ends_with(".bin"));
    }
}
