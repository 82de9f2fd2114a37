use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::error::DomainError;

/// An uploaded image: the original filename plus the raw bytes, as handed over
/// by the multipart layer.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
    }
}

/// Stores image blobs and hands out opaque references. A reference locates the
/// blob inside the store; the public URL is derived from it, never stored.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn store(&self, upload: &ImageUpload) -> Result<String, DomainError>;
    /// Callers treat deletion as best-effort: a failure here must never abort
    /// the record mutation it accompanies.
    async fn delete(&self, reference: &str) -> Result<(), DomainError>;
    fn url_for(&self, reference: &str) -> String;
}

/// Filesystem-backed store. References look like `post-images/<uuid>.<ext>`
/// relative to the configured root.
#[derive(Clone)]
pub struct FsAssetStore {
    root: PathBuf,
    public_base: String,
}

impl FsAssetStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }
}

#[async_trait]
impl AssetStore for FsAssetStore {
    async fn store(&self, upload: &ImageUpload) -> Result<String, DomainError> {
        let ext = upload.extension().unwrap_or("bin");
        let reference = format!("post-images/{}.{}", Uuid::new_v4(), ext);
        let path = self.root.join(&reference);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                error!("failed to create asset directory: {}", e);
                DomainError::Storage(format!("asset store: {}", e))
            })?;
        }
        tokio::fs::write(&path, &upload.bytes).await.map_err(|e| {
            error!(reference = %reference, "failed to write asset: {}", e);
            DomainError::Storage(format!("asset store: {}", e))
        })?;

        info!(reference = %reference, bytes = upload.bytes.len(), "asset stored");
        Ok(reference)
    }

    async fn delete(&self, reference: &str) -> Result<(), DomainError> {
        let path = self.root.join(reference);
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| DomainError::Storage(format!("asset delete {}: {}", reference, e)))?;
        info!(reference = %reference, "asset deleted");
        Ok(())
    }

    fn url_for(&self, reference: &str) -> String {
        format!("{}/{}", self.public_base.trim_end_matches('/'), reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_upload() -> ImageUpload {
        ImageUpload {
            filename: "cat.png".into(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[tokio::test]
    async fn store_writes_blob_under_reference() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAssetStore::new(dir.path(), "/storage");

        let reference = store.store(&png_upload()).await.unwrap();
        assert!(reference.starts_with("post-images/"));
        assert!(reference.ends_with(".png"));
        assert!(dir.path().join(&reference).is_file());
    }

    #[tokio::test]
    async fn delete_removes_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAssetStore::new(dir.path(), "/storage");

        let reference = store.store(&png_upload()).await.unwrap();
        store.delete(&reference).await.unwrap();
        assert!(!dir.path().join(&reference).exists());
    }

    #[tokio::test]
    async fn delete_of_missing_reference_fails_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAssetStore::new(dir.path(), "/storage");

        let err = store.delete("post-images/gone.png").await.unwrap_err();
        assert!(matches!(err, DomainError::Storage(_)));
    }

    #[test]
    fn url_joins_base_and_reference() {
        let store = FsAssetStore::new("/tmp/assets", "https://cdn.example.com/storage/");
        assert_eq!(
            store.url_for("post-images/a.png"),
            "https://cdn.example.com/storage/post-images/a.png"
        );
    }
}
