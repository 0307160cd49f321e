//! Application state.

use std::sync::Arc;

use tracing::info;

use tubely_firestore::{FirestoreClient, MemoryVideoStore, VideoRepository, VideoStore};
use tubely_media::{FfmpegTool, MediaConfig, MediaTool};
use tubely_storage::{LocalAssetStore, ObjectStore, S3Client};

use crate::auth::JwtVerifier;
use crate::config::{ApiConfig, IngestConfig, MetadataBackend, ThumbnailStorageMode};
use crate::services::{IngestPipeline, ThumbnailService, ThumbnailStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub videos: Arc<dyn VideoStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub ingest: Arc<IngestPipeline>,
    pub thumbnails: Arc<ThumbnailService>,
    pub jwt: Arc<JwtVerifier>,
}

impl AppState {
    /// Create new application state.
    pub async fn new(
        config: ApiConfig,
        ingest_config: IngestConfig,
        media_config: MediaConfig,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        if config.jwt_secret.is_empty() {
            return Err("JWT_SECRET must be set".into());
        }

        let objects: Arc<dyn ObjectStore> = Arc::new(S3Client::from_env().await?);

        let videos: Arc<dyn VideoStore> = match config.metadata_backend {
            MetadataBackend::Firestore => {
                let client = FirestoreClient::from_env().await?;
                Arc::new(VideoRepository::new(client))
            }
            MetadataBackend::Memory => {
                info!("Using in-memory metadata store");
                Arc::new(MemoryVideoStore::new())
            }
        };

        let media = FfmpegTool::new(media_config);
        media.check_available()?;

        Ok(Self::from_parts(
            config,
            ingest_config,
            videos,
            objects,
            Arc::new(media),
        ))
    }

    /// Assemble state from already constructed collaborators.
    pub fn from_parts(
        config: ApiConfig,
        ingest_config: IngestConfig,
        videos: Arc<dyn VideoStore>,
        objects: Arc<dyn ObjectStore>,
        media: Arc<dyn MediaTool>,
    ) -> Self {
        let thumbnail_store = match config.thumbnail_storage {
            ThumbnailStorageMode::Local => ThumbnailStore::Local(LocalAssetStore::new(
                config.assets_root.clone(),
                config.assets_base_url(),
            )),
            ThumbnailStorageMode::Inline => ThumbnailStore::Inline,
        };

        let ingest = IngestPipeline::new(
            ingest_config,
            Arc::clone(&videos),
            Arc::clone(&objects),
            media,
        );
        let thumbnails = ThumbnailService::new(Arc::clone(&videos), thumbnail_store);
        let jwt = JwtVerifier::new(&config.jwt_secret, config.jwt_issuer.clone());

        Self {
            config,
            videos,
            objects,
            ingest: Arc::new(ingest),
            thumbnails: Arc::new(thumbnails),
            jwt: Arc::new(jwt),
        }
    }
}
