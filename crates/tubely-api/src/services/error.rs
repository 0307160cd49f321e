//! Upload service errors.

use thiserror::Error;

use tubely_firestore::FirestoreError;
use tubely_media::MediaError;
use tubely_models::VideoId;
use tubely_storage::StorageError;

/// Terminal failure of an upload run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Invalid upload body: {0}")]
    InvalidBody(String),

    #[error("Video not found: {0}")]
    NotFound(VideoId),

    #[error("Not the owner of video {0}")]
    Forbidden(VideoId),

    #[error("Upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("Staging failed: {0}")]
    Staging(#[source] MediaError),

    #[error("Processing failed: {0}")]
    Processing(#[source] MediaError),

    #[error("Upload failed: {0}")]
    Upload(#[source] StorageError),

    #[error("Metadata update failed: {0}")]
    Metadata(#[source] FirestoreError),

    #[error("Ingestion timed out after {0} seconds")]
    Timeout(u64),

    #[error("Ingestion unavailable: {0}")]
    Unavailable(String),
}

impl IngestError {
    /// Failure while copying or rewinding the upload.
    pub fn from_staging(err: MediaError) -> Self {
        match err {
            MediaError::TooLarge { limit } => Self::TooLarge { limit },
            MediaError::StreamFailed(msg) => Self::InvalidBody(msg),
            other => Self::Staging(other),
        }
    }

    /// Failure while loading the target record.
    pub fn from_lookup(err: FirestoreError, video_id: VideoId) -> Self {
        if err.is_not_found() {
            Self::NotFound(video_id)
        } else {
            Self::Metadata(err)
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidContentType(_) | Self::UnsupportedMediaType(_) | Self::InvalidBody(_) => {
                "validation"
            }
            Self::NotFound(_) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::TooLarge { .. } => "too_large",
            Self::Staging(_) => "staging",
            Self::Processing(_) => "processing",
            Self::Upload(_) => "upload",
            Self::Metadata(_) => "metadata",
            Self::Timeout(_) => "timeout",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_mapping() {
        assert!(matches!(
            IngestError::from_staging(MediaError::TooLarge { limit: 5 }),
            IngestError::TooLarge { limit: 5 }
        ));
        assert!(matches!(
            IngestError::from_staging(MediaError::StreamFailed("reset".to_string())),
            IngestError::InvalidBody(_)
        ));
        assert!(matches!(
            IngestError::from_staging(MediaError::Released),
            IngestError::Staging(_)
        ));
    }

    #[test]
    fn test_lookup_mapping() {
        let id = VideoId::new();
        assert!(matches!(
            IngestError::from_lookup(FirestoreError::not_found("videos/x"), id),
            IngestError::NotFound(found) if found == id
        ));
        assert!(matches!(
            IngestError::from_lookup(FirestoreError::from_http_status(503, "down"), id),
            IngestError::Metadata(_)
        ));
    }
}
