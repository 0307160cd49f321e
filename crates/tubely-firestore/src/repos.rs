//! Firestore-backed video repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use tubely_models::{UserId, VideoId, VideoRecord};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::store::VideoStore;
use crate::types::{Document, ToFirestoreValue, Value};

const VIDEOS_COLLECTION: &str = "videos";

/// Repository for video documents.
#[derive(Clone)]
pub struct VideoRepository {
    client: FirestoreClient,
}

impl VideoRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VideoStore for VideoRepository {
    async fn get(&self, id: &VideoId) -> FirestoreResult<VideoRecord> {
        let doc = self
            .client
            .get_document(VIDEOS_COLLECTION, &id.to_string())
            .await?
            .ok_or_else(|| FirestoreError::not_found(format!("{}/{}", VIDEOS_COLLECTION, id)))?;

        document_to_video_record(&doc, id)
    }

    async fn create(&self, record: &VideoRecord) -> FirestoreResult<()> {
        self.client
            .create_document(
                VIDEOS_COLLECTION,
                &record.id.to_string(),
                video_record_to_fields(record),
            )
            .await?;
        info!(video_id = %record.id, user_id = %record.user_id, "Created video record");
        Ok(())
    }

    async fn update(&self, record: &VideoRecord) -> FirestoreResult<()> {
        self.client
            .update_document(
                VIDEOS_COLLECTION,
                &record.id.to_string(),
                video_record_to_fields(record),
            )
            .await?;
        Ok(())
    }

    async fn check_connectivity(&self) -> FirestoreResult<()> {
        self.client.check_connectivity().await
    }
}

fn video_record_to_fields(video: &VideoRecord) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("video_id".to_string(), video.id.to_string().to_firestore_value());
    fields.insert("user_id".to_string(), video.user_id.to_string().to_firestore_value());
    fields.insert("title".to_string(), video.title.to_firestore_value());
    fields.insert("description".to_string(), video.description.to_firestore_value());
    fields.insert("thumbnail_url".to_string(), video.thumbnail_url.to_firestore_value());
    fields.insert("video_url".to_string(), video.video_url.to_firestore_value());
    fields.insert("created_at".to_string(), video.created_at.to_firestore_value());
    fields.insert("updated_at".to_string(), video.updated_at.to_firestore_value());
    fields
}

fn document_to_video_record(doc: &Document, video_id: &VideoId) -> FirestoreResult<VideoRecord> {
    if doc.fields.is_none() {
        return Err(FirestoreError::invalid_response("Document has no fields"));
    }

    let user_id: UserId = doc
        .get::<String>("user_id")
        .ok_or_else(|| FirestoreError::invalid_response("Video document has no user_id"))?
        .parse()
        .map_err(|e| FirestoreError::invalid_response(format!("Video document: {}", e)))?;

    Ok(VideoRecord {
        id: *video_id,
        user_id,
        title: doc.get("title").unwrap_or_default(),
        description: doc.get("description").unwrap_or_default(),
        thumbnail_url: doc.get("thumbnail_url"),
        video_url: doc.get("video_url"),
        created_at: doc.get("created_at").unwrap_or_else(Utc::now),
        updated_at: doc.get("updated_at").unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubely_models::NewVideo;

    #[test]
    fn test_document_conversion() {
        let mut record = VideoRecord::new(
            UserId::new(),
            NewVideo {
                title: "Boots".to_string(),
                description: "A cat".to_string(),
            },
        );
        record.set_video_url("https://bucket.s3.us-east-1.amazonaws.com/portrait/x.mp4");

        let doc = Document::new(video_record_to_fields(&record));
        let restored = document_to_video_record(&doc, &record.id).unwrap();

        assert_eq!(restored.user_id, record.user_id);
        assert_eq!(restored.title, "Boots");
        assert_eq!(restored.description, "A cat");
        assert_eq!(restored.video_url, record.video_url);
        assert_eq!(restored.thumbnail_url, None);
        assert_eq!(restored.created_at.timestamp(), record.created_at.timestamp());
    }

    #[test]
    fn test_document_without_owner_is_invalid() {
        let mut fields = HashMap::new();
        fields.insert("title".to_string(), "Boots".to_firestore_value());

        let err = document_to_video_record(&Document::new(fields), &VideoId::new()).unwrap_err();
        assert!(matches!(err, FirestoreError::InvalidResponse(_)));
    }
}
