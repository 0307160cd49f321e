//! Video metadata store capability.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use tubely_models::{VideoId, VideoRecord};

use crate::error::{FirestoreError, FirestoreResult};

/// CRUD on video records.
///
/// Writes are whole-record overwrites; the last writer wins.
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Fetch a record. `FirestoreError::NotFound` when absent.
    async fn get(&self, id: &VideoId) -> FirestoreResult<VideoRecord>;

    /// Insert a new record.
    async fn create(&self, record: &VideoRecord) -> FirestoreResult<()>;

    /// Overwrite an existing record. `FirestoreError::NotFound` when absent.
    async fn update(&self, record: &VideoRecord) -> FirestoreResult<()>;

    /// Check that the backing store is reachable.
    async fn check_connectivity(&self) -> FirestoreResult<()> {
        Ok(())
    }
}

/// In-process store for local development and tests.
#[derive(Debug, Default)]
pub struct MemoryVideoStore {
    records: RwLock<HashMap<VideoId, VideoRecord>>,
}

impl MemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn get(&self, id: &VideoId) -> FirestoreResult<VideoRecord> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| FirestoreError::not_found(format!("videos/{}", id)))
    }

    async fn create(&self, record: &VideoRecord) -> FirestoreResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.id) {
            return Err(FirestoreError::AlreadyExists(format!("videos/{}", record.id)));
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn update(&self, record: &VideoRecord) -> FirestoreResult<()> {
        let mut records = self.records.write().await;
        match records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(FirestoreError::not_found(format!("videos/{}", record.id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubely_models::{NewVideo, UserId};

    fn record() -> VideoRecord {
        VideoRecord::new(
            UserId::new(),
            NewVideo {
                title: "Boots".to_string(),
                description: String::new(),
            },
        )
    }

    #[tokio::test]
    async fn test_create_get_update() {
        let store = MemoryVideoStore::new();
        let mut video = record();

        store.create(&video).await.unwrap();
        assert_eq!(store.get(&video.id).await.unwrap(), video);

        video.set_video_url("https://example.com/landscape/x.mp4");
        store.update(&video).await.unwrap();
        assert_eq!(
            store.get(&video.id).await.unwrap().video_url.as_deref(),
            Some("https://example.com/landscape/x.mp4")
        );
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_missing_record() {
        let store = MemoryVideoStore::new();
        let video = record();

        assert!(store.get(&video.id).await.unwrap_err().is_not_found());
        assert!(store.update(&video).await.unwrap_err().is_not_found());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_duplicate_create() {
        let store = MemoryVideoStore::new();
        let video = record();

        store.create(&video).await.unwrap();
        assert!(matches!(
            store.create(&video).await,
            Err(FirestoreError::AlreadyExists(_))
        ));
    }
}
