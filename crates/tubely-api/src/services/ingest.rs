//! Video ingestion pipeline.
//!
//! One run takes an uploaded MP4 from the request body to a stored object
//! and an updated video record:
//!
//! 1. validate the content type, load the record and check ownership
//! 2. stage the body to a scratch file
//! 3. try a fast-start rewrite (falls back to the original on failure)
//! 4. rewind, classify geometry and derive the storage key
//! 5. upload, then write the object URL back to the record
//!
//! Nothing is staged until the request has passed step 1. Scratch files are
//! owned by a [`StagedUpload`](tubely_media::StagedUpload) guard and are
//! removed on every exit path, including timeouts.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures_util::Stream;
use tokio::sync::Semaphore;
use tracing::{info, info_span, warn, Instrument};

use tubely_firestore::VideoStore;
use tubely_media::{classify, MediaTool, StagingStore};
use tubely_models::{MediaType, StorageKey, UserId, VideoId, VideoRecord};
use tubely_storage::ObjectStore;

use crate::config::IngestConfig;
use crate::metrics;
use crate::services::error::IngestError;

/// A single video upload.
pub struct IngestRequest<S> {
    pub video_id: VideoId,
    /// Authenticated caller
    pub user_id: UserId,
    /// Declared content type of the upload
    pub content_type: String,
    /// Upper estimate of the body size, if known
    pub declared_len: Option<u64>,
    pub body: S,
}

/// Orchestrates video ingestion.
pub struct IngestPipeline {
    videos: Arc<dyn VideoStore>,
    objects: Arc<dyn ObjectStore>,
    media: Arc<dyn MediaTool>,
    staging: StagingStore,
    config: IngestConfig,
    permits: Arc<Semaphore>,
}

impl IngestPipeline {
    pub fn new(
        config: IngestConfig,
        videos: Arc<dyn VideoStore>,
        objects: Arc<dyn ObjectStore>,
        media: Arc<dyn MediaTool>,
    ) -> Self {
        let staging = StagingStore::new(config.scratch_dir.clone(), config.max_upload_bytes);
        let permits = Arc::new(Semaphore::new(config.max_in_flight.max(1)));

        Self {
            videos,
            objects,
            media,
            staging,
            config,
            permits,
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Run one ingestion to completion.
    ///
    /// Returns the updated record. The whole run, including waiting for a
    /// free slot, is bounded by the configured timeout.
    pub async fn ingest<S, E>(&self, request: IngestRequest<S>) -> Result<VideoRecord, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin + Send,
        E: Display,
    {
        let span = info_span!(
            "ingest",
            video_id = %request.video_id,
            user_id = %request.user_id
        );
        let start = Instant::now();
        let timeout = self.config.timeout;

        let result = async {
            match tokio::time::timeout(timeout, self.run_bounded(request)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout_secs = timeout.as_secs(), "Ingestion timed out");
                    Err(IngestError::Timeout(timeout.as_secs()))
                }
            }
        }
        .instrument(span)
        .await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::record_ingest(outcome, start.elapsed().as_secs_f64());

        result
    }

    async fn run_bounded<S, E>(&self, request: IngestRequest<S>) -> Result<VideoRecord, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin + Send,
        E: Display,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| IngestError::Unavailable("ingestion pool closed".to_string()))?;

        self.run(request).await
    }

    async fn run<S, E>(&self, request: IngestRequest<S>) -> Result<VideoRecord, IngestError>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin + Send,
        E: Display,
    {
        let IngestRequest {
            video_id,
            user_id,
            content_type,
            declared_len,
            body,
        } = request;

        let media_type: MediaType = content_type
            .parse()
            .map_err(|e| IngestError::InvalidContentType(format!("{}", e)))?;
        if !media_type.is_video_mp4() {
            return Err(IngestError::UnsupportedMediaType(media_type.essence()));
        }

        let mut record = self
            .videos
            .get(&video_id)
            .await
            .map_err(|e| IngestError::from_lookup(e, video_id))?;

        if !record.owned_by(&user_id) {
            warn!(owner = %record.user_id, "Upload rejected: caller does not own video");
            return Err(IngestError::Forbidden(video_id));
        }

        let mut staged = self
            .staging
            .stage(body, declared_len)
            .await
            .map_err(IngestError::from_staging)?;
        info!(bytes = staged.size(), "Upload staged");

        match self.media.rewrite_fast_start(staged.path()).await {
            Ok(rewritten) => {
                if let Err(e) = staged.replace_with(rewritten).await {
                    warn!(error = %e, "Fast-start copy unusable, continuing with original upload");
                    metrics::record_fast_start_fallback();
                }
            }
            Err(e) => {
                warn!(error = %e, "Fast-start rewrite failed, continuing with original upload");
                metrics::record_fast_start_fallback();
            }
        }

        let reader = staged.rewind().await.map_err(IngestError::from_staging)?;

        let class = classify(self.media.as_ref(), staged.path())
            .await
            .map_err(IngestError::Processing)?;
        let key = StorageKey::for_video(class, &video_id);
        info!(class = %class, key = %key, "Classified upload");

        self.objects
            .put(key.as_str(), reader, staged.size(), &media_type.essence())
            .await
            .map_err(IngestError::Upload)?;

        record.set_video_url(self.objects.object_url(key.as_str()));

        if let Err(e) = self.videos.update(&record).await {
            warn!(key = %key, "Object stored but video record not updated");
            return Err(IngestError::Metadata(e));
        }

        staged.release();
        info!(key = %key, "Ingestion complete");

        Ok(record)
    }
}
