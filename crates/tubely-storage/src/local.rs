//! Local filesystem asset storage.

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{StorageError, StorageResult};

/// Flat directory of publicly served files.
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    root: PathBuf,
    base_url: String,
}

impl LocalAssetStore {
    /// `base_url` is the public URL the root directory is served under.
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `data` to `filename`, replacing any existing file, and return
    /// its public URL.
    pub async fn write(&self, filename: &str, data: &[u8]) -> StorageResult<String> {
        let path = self.file_path(filename)?;

        tokio::fs::create_dir_all(&self.root).await?;

        let mut file = tokio::fs::File::create(&path).await.map_err(|e| {
            StorageError::upload_failed(format!("Failed to create {}: {}", path.display(), e))
        })?;
        file.write_all(data).await.map_err(|e| {
            StorageError::upload_failed(format!("Failed to write {}: {}", path.display(), e))
        })?;
        file.sync_all().await?;

        debug!(path = %path.display(), bytes = data.len(), "Stored asset");
        Ok(self.url(filename))
    }

    /// Public URL of `filename`.
    pub fn url(&self, filename: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), filename)
    }

    fn file_path(&self, filename: &str) -> StorageResult<PathBuf> {
        if filename.is_empty()
            || filename.contains("..")
            || filename.contains('/')
            || filename.contains('\\')
        {
            return Err(StorageError::invalid_key(format!(
                "Invalid asset file name: {:?}",
                filename
            )));
        }
        Ok(self.root.join(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_url() {
        let dir = TempDir::new().unwrap();
        let store = LocalAssetStore::new(dir.path().join("assets"), "http://localhost:8091/assets/");

        let url = store.write("abc.png", b"png bytes").await.unwrap();
        assert_eq!(url, "http://localhost:8091/assets/abc.png");

        let content = tokio::fs::read(dir.path().join("assets/abc.png")).await.unwrap();
        assert_eq!(content, b"png bytes");
    }

    #[tokio::test]
    async fn test_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = LocalAssetStore::new(dir.path(), "http://localhost/assets");

        store.write("a.jpeg", b"first").await.unwrap();
        store.write("a.jpeg", b"second").await.unwrap();

        let content = tokio::fs::read(dir.path().join("a.jpeg")).await.unwrap();
        assert_eq!(content, b"second");
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let store = LocalAssetStore::new(dir.path(), "http://localhost/assets");

        for name in ["../escape.png", "nested/a.png", "/etc/passwd", "", "a\\b.png"] {
            let err = store.write(name, b"x").await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "{name}");
        }
    }
}
