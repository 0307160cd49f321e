//! Shared fakes for the API integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::Poll;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream, Stream};
use tokio::io::AsyncReadExt;

use tubely_api::{ApiConfig, AppState, IngestConfig, IngestPipeline, ThumbnailStorageMode};
use tubely_firestore::{FirestoreError, FirestoreResult, MemoryVideoStore, VideoStore};
use tubely_media::{fast_start_output_path, MediaError, MediaResult, MediaTool};
use tubely_models::{Dimensions, NewVideo, UserId, VideoId, VideoRecord};
use tubely_storage::{ObjectStore, StorageError, StorageResult};

pub const JWT_SECRET: &str = "test-secret";
pub const OBJECT_BASE_URL: &str = "https://tubely-test.s3.us-east-1.amazonaws.com";

/// Media tool that never spawns a process.
pub struct FakeMediaTool {
    pub dims: Dimensions,
    pub fail_rewrite: bool,
    pub fail_probe: bool,
    pub rewrite_delay: Option<Duration>,
    pub rewrites: AtomicUsize,
    pub probes: AtomicUsize,
}

impl FakeMediaTool {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            dims: Dimensions::new(width, height),
            fail_rewrite: false,
            fail_probe: false,
            rewrite_delay: None,
            rewrites: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
        }
    }

    pub fn landscape() -> Self {
        Self::new(1920, 1080)
    }

    pub fn failing_rewrite(mut self) -> Self {
        self.fail_rewrite = true;
        self
    }

    pub fn failing_probe(mut self) -> Self {
        self.fail_probe = true;
        self
    }

    pub fn slow_rewrite(mut self, delay: Duration) -> Self {
        self.rewrite_delay = Some(delay);
        self
    }
}

#[async_trait]
impl MediaTool for FakeMediaTool {
    async fn rewrite_fast_start(&self, input: &Path) -> MediaResult<PathBuf> {
        self.rewrites.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.rewrite_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_rewrite {
            return Err(MediaError::ffmpeg_failed("moov atom not found", None, Some(1)));
        }

        // The rewritten copy carries the original bytes behind a marker.
        let original = tokio::fs::read(input).await?;
        let mut rewritten = b"moov".to_vec();
        rewritten.extend_from_slice(&original);

        let output = fast_start_output_path(input);
        tokio::fs::write(&output, rewritten).await?;
        Ok(output)
    }

    async fn probe_dimensions(&self, path: &Path) -> MediaResult<Dimensions> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        if self.fail_probe {
            return Err(MediaError::invalid_video("no video stream"));
        }
        Ok(self.dims)
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: String,
    pub body: Vec<u8>,
    pub len: u64,
    pub content_type: String,
}

/// Object store that keeps puts in memory.
#[derive(Default)]
pub struct MemoryObjectStore {
    pub objects: Mutex<Vec<StoredObject>>,
    pub fail: bool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn stored(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        key: &str,
        mut body: tokio::fs::File,
        len: u64,
        content_type: &str,
    ) -> StorageResult<()> {
        if self.fail {
            return Err(StorageError::upload_failed("bucket unavailable"));
        }

        let mut data = Vec::new();
        body.read_to_end(&mut data).await?;

        self.objects.lock().unwrap().push(StoredObject {
            key: key.to_string(),
            body: data,
            len,
            content_type: content_type.to_string(),
        });
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", OBJECT_BASE_URL, key)
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        if self.fail {
            return Err(StorageError::upload_failed("bucket unavailable"));
        }
        Ok(())
    }
}

/// Video store whose updates always fail.
pub struct FailingUpdateStore {
    pub inner: MemoryVideoStore,
}

#[async_trait]
impl VideoStore for FailingUpdateStore {
    async fn get(&self, id: &VideoId) -> FirestoreResult<VideoRecord> {
        self.inner.get(id).await
    }

    async fn create(&self, record: &VideoRecord) -> FirestoreResult<()> {
        self.inner.create(record).await
    }

    async fn update(&self, _record: &VideoRecord) -> FirestoreResult<()> {
        Err(FirestoreError::request_failed("metadata store unavailable"))
    }
}

pub fn ingest_config(scratch_dir: &Path) -> IngestConfig {
    IngestConfig {
        max_upload_bytes: 1024,
        scratch_dir: scratch_dir.to_path_buf(),
        timeout: Duration::from_secs(10),
        max_in_flight: 2,
    }
}

pub fn pipeline(
    config: IngestConfig,
    videos: Arc<dyn VideoStore>,
    objects: Arc<dyn ObjectStore>,
    media: Arc<dyn MediaTool>,
) -> IngestPipeline {
    IngestPipeline::new(config, videos, objects, media)
}

pub async fn seed_video(videos: &dyn VideoStore, owner: UserId) -> VideoRecord {
    let record = VideoRecord::new(
        owner,
        NewVideo {
            title: "Boot.dev beats".to_string(),
            description: "A test video".to_string(),
        },
    );
    videos.create(&record).await.unwrap();
    record
}

/// Body stream yielding `data` in small chunks.
pub fn body(data: &[u8]) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Unpin + Send {
    let chunks: Vec<Result<Bytes, std::io::Error>> = data
        .chunks(100)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    stream::iter(chunks)
}

/// Empty body stream that records whether it was ever polled.
pub fn tracked_body(
    polled: Arc<AtomicBool>,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Unpin + Send {
    stream::poll_fn(move |_| {
        polled.store(true, Ordering::SeqCst);
        Poll::Ready(None)
    })
}

/// Files left in the scratch directory.
pub fn scratch_files(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}

/// App state backed entirely by in-memory fakes.
pub fn test_state(
    scratch_dir: &Path,
    assets_root: &Path,
    videos: Arc<dyn VideoStore>,
    objects: Arc<dyn ObjectStore>,
    media: Arc<dyn MediaTool>,
) -> AppState {
    test_state_in(
        "development",
        scratch_dir,
        assets_root,
        videos,
        objects,
        media,
    )
}

/// Like `test_state`, with the given deployment environment.
pub fn test_state_in(
    environment: &str,
    scratch_dir: &Path,
    assets_root: &Path,
    videos: Arc<dyn VideoStore>,
    objects: Arc<dyn ObjectStore>,
    media: Arc<dyn MediaTool>,
) -> AppState {
    let config = ApiConfig {
        environment: environment.to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        assets_root: assets_root.to_path_buf(),
        thumbnail_storage: ThumbnailStorageMode::Inline,
        ..ApiConfig::default()
    };
    AppState::from_parts(config, ingest_config(scratch_dir), videos, objects, media)
}

/// Multipart body with a single file part.
pub fn multipart_body(boundary: &str, field: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"upload.bin\"\r\n",
            field
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}
