//! Scratch-file staging for uploaded byte streams.
//!
//! A [`StagedUpload`] owns every file it creates. Dropping it removes them, so
//! an aborted or timed-out ingestion never leaves scratch files behind.

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::fmt::Display;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

const STAGING_PREFIX: &str = "tubely-upload-";
const STAGING_SUFFIX: &str = ".mp4";

/// Creates staged uploads inside a scratch directory.
#[derive(Debug, Clone)]
pub struct StagingStore {
    scratch_dir: PathBuf,
    max_bytes: u64,
}

impl StagingStore {
    pub fn new(scratch_dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            max_bytes,
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Copy `stream` into a new scratch file.
    ///
    /// A `declared_len` above the limit is rejected before the stream is
    /// polled. A stream that grows past the limit is aborted mid-copy.
    pub async fn stage<S, E>(&self, mut stream: S, declared_len: Option<u64>) -> MediaResult<StagedUpload>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: Display,
    {
        if let Some(len) = declared_len {
            if len > self.max_bytes {
                return Err(MediaError::TooLarge {
                    limit: self.max_bytes,
                });
            }
        }

        tokio::fs::create_dir_all(&self.scratch_dir).await?;

        let (file, path) = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(STAGING_SUFFIX)
            .tempfile_in(&self.scratch_dir)?
            .keep()
            .map_err(|e| MediaError::Io(e.error))?;

        // From here on the guard owns the file.
        let mut staged = StagedUpload::new(path);
        let mut file = tokio::fs::File::from_std(file);

        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| MediaError::StreamFailed(e.to_string()))?;
            written += chunk.len() as u64;
            if written > self.max_bytes {
                return Err(MediaError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        staged.size = written;
        debug!(path = %staged.path().display(), bytes = written, "Staged upload");

        Ok(staged)
    }
}

/// Handle to a staged upload on local disk.
#[derive(Debug)]
pub struct StagedUpload {
    /// File used by subsequent steps
    current: PathBuf,
    /// Every file owned by this handle, removed on release
    owned: Vec<PathBuf>,
    size: u64,
    reader_taken: bool,
    released: bool,
}

impl StagedUpload {
    fn new(path: PathBuf) -> Self {
        Self {
            current: path.clone(),
            owned: vec![path],
            size: 0,
            reader_taken: false,
            released: false,
        }
    }

    /// Path of the current file.
    pub fn path(&self) -> &Path {
        &self.current
    }

    /// Size of the current file in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Supersede the current file with `path`.
    ///
    /// The handle takes ownership of `path`; the superseded file is still
    /// removed on release.
    pub async fn replace_with(&mut self, path: PathBuf) -> MediaResult<()> {
        if self.released {
            return Err(MediaError::Released);
        }
        if !self.owned.contains(&path) {
            self.owned.push(path.clone());
        }
        let meta = tokio::fs::metadata(&path).await?;
        self.size = meta.len();
        self.current = path;
        Ok(())
    }

    /// Open the current file positioned at its start.
    ///
    /// The reader can be taken once.
    pub async fn rewind(&mut self) -> MediaResult<tokio::fs::File> {
        if self.released {
            return Err(MediaError::Released);
        }
        if self.reader_taken {
            return Err(MediaError::ReaderTaken);
        }

        let mut file = tokio::fs::File::open(&self.current).await?;
        file.seek(SeekFrom::Start(0)).await?;
        self.reader_taken = true;
        Ok(file)
    }

    /// Remove every owned file. Safe to call more than once.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        for path in self.owned.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "Removed scratch file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), "Failed to remove scratch file: {}", e),
            }
        }
        self.released = true;
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    fn chunks(parts: &[&'static [u8]]) -> impl Stream<Item = Result<Bytes, io::Error>> + Unpin {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::from_static(p)))
                .collect::<Vec<_>>(),
        )
    }

    fn scratch_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_stage_and_read_back() {
        let dir = TempDir::new().unwrap();
        let store = StagingStore::new(dir.path(), 1024);

        let mut staged = store.stage(chunks(&[b"hello ", b"world"]), None).await.unwrap();
        assert_eq!(staged.size(), 11);
        assert!(staged.path().exists());

        let name = staged.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(STAGING_PREFIX));
        assert!(name.ends_with(STAGING_SUFFIX));

        let mut reader = staged.rewind().await.unwrap();
        let mut content = String::new();
        reader.read_to_string(&mut content).await.unwrap();
        assert_eq!(content, "hello world");

        assert!(matches!(staged.rewind().await, Err(MediaError::ReaderTaken)));
    }

    #[tokio::test]
    async fn test_unique_paths() {
        let dir = TempDir::new().unwrap();
        let store = StagingStore::new(dir.path(), 1024);

        let a = store.stage(chunks(&[b"a"]), None).await.unwrap();
        let b = store.stage(chunks(&[b"b"]), None).await.unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn test_declared_too_large_does_not_poll() {
        let dir = TempDir::new().unwrap();
        let store = StagingStore::new(dir.path(), 10);

        let polled = Arc::new(AtomicBool::new(false));
        let flag = polled.clone();
        let body = stream::poll_fn(move |_| {
            flag.store(true, Ordering::SeqCst);
            std::task::Poll::Ready(None::<Result<Bytes, io::Error>>)
        });

        let err = store.stage(body, Some(11)).await.unwrap_err();
        assert!(matches!(err, MediaError::TooLarge { limit: 10 }));
        assert!(!polled.load(Ordering::SeqCst));
        assert_eq!(scratch_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_stream_too_large_cleans_up() {
        let dir = TempDir::new().unwrap();
        let store = StagingStore::new(dir.path(), 8);

        let err = store
            .stage(chunks(&[b"12345", b"67890"]), None)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::TooLarge { limit: 8 }));
        assert_eq!(scratch_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_stream_error_cleans_up() {
        let dir = TempDir::new().unwrap();
        let store = StagingStore::new(dir.path(), 1024);

        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "client went away")),
        ]);

        let err = store.stage(body, None).await.unwrap_err();
        assert!(matches!(err, MediaError::StreamFailed(_)));
        assert_eq!(scratch_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = StagingStore::new(dir.path(), 1024);

        let mut staged = store.stage(chunks(&[b"data"]), None).await.unwrap();
        staged.release();
        staged.release();

        assert!(staged.is_released());
        assert!(matches!(staged.rewind().await, Err(MediaError::Released)));
        drop(staged);
        assert_eq!(scratch_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_replace_with_owns_both_files() {
        let dir = TempDir::new().unwrap();
        let store = StagingStore::new(dir.path(), 1024);

        let mut staged = store.stage(chunks(&[b"original"]), None).await.unwrap();
        let original = staged.path().to_path_buf();

        let rewritten = dir.path().join("rewritten.mp4");
        tokio::fs::write(&rewritten, b"rewritten!").await.unwrap();
        staged.replace_with(rewritten.clone()).await.unwrap();

        assert_eq!(staged.path(), rewritten.as_path());
        assert_eq!(staged.size(), 10);
        assert!(original.exists());

        drop(staged);
        assert!(!original.exists());
        assert!(!rewritten.exists());
        assert_eq!(scratch_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_drop_removes_file() {
        let dir = TempDir::new().unwrap();
        let store = StagingStore::new(dir.path(), 1024);

        let staged = store.stage(chunks(&[b"data"]), None).await.unwrap();
        let path = staged.path().to_path_buf();
        drop(staged);

        assert!(!path.exists());
    }
}
