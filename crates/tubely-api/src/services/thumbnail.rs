//! Thumbnail uploads.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::info;

use tubely_firestore::VideoStore;
use tubely_models::{MediaType, UserId, VideoId, VideoRecord};
use tubely_storage::LocalAssetStore;

use crate::config::THUMBNAIL_MAX_BYTES;
use crate::services::error::IngestError;

/// Where thumbnail bytes end up.
#[derive(Debug, Clone)]
pub enum ThumbnailStore {
    /// `{video_id}.{subtype}` under a statically served directory
    Local(LocalAssetStore),
    /// A `data:` URL on the record
    Inline,
}

/// Stores thumbnails and links them to their video record.
pub struct ThumbnailService {
    videos: Arc<dyn VideoStore>,
    store: ThumbnailStore,
}

impl ThumbnailService {
    pub fn new(videos: Arc<dyn VideoStore>, store: ThumbnailStore) -> Self {
        Self { videos, store }
    }

    /// Persist `data` as the thumbnail of `video_id`.
    pub async fn upload(
        &self,
        video_id: VideoId,
        user_id: UserId,
        content_type: &str,
        data: &[u8],
    ) -> Result<VideoRecord, IngestError> {
        let media_type: MediaType = content_type
            .parse()
            .map_err(|e| IngestError::InvalidContentType(format!("{}", e)))?;
        if !media_type.is_image() {
            return Err(IngestError::UnsupportedMediaType(media_type.essence()));
        }
        if data.len() > THUMBNAIL_MAX_BYTES {
            return Err(IngestError::TooLarge {
                limit: THUMBNAIL_MAX_BYTES as u64,
            });
        }

        let mut record = self
            .videos
            .get(&video_id)
            .await
            .map_err(|e| IngestError::from_lookup(e, video_id))?;
        if !record.owned_by(&user_id) {
            return Err(IngestError::Forbidden(video_id));
        }

        let url = match &self.store {
            ThumbnailStore::Local(assets) => {
                let filename = format!("{}.{}", video_id, media_type.subtype());
                assets
                    .write(&filename, data)
                    .await
                    .map_err(IngestError::Upload)?
            }
            ThumbnailStore::Inline => {
                format!("data:{};base64,{}", media_type.essence(), STANDARD.encode(data))
            }
        };

        record.set_thumbnail_url(url);
        self.videos
            .update(&record)
            .await
            .map_err(IngestError::Metadata)?;

        info!(video_id = %video_id, bytes = data.len(), "Thumbnail stored");
        Ok(record)
    }
}
