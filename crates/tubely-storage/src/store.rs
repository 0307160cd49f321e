//! Object store capability.

use async_trait::async_trait;

use crate::error::StorageResult;

/// Durable blob storage addressed by key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `len` bytes read from `body` under `key`, overwriting any
    /// existing object.
    async fn put(
        &self,
        key: &str,
        body: tokio::fs::File,
        len: u64,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Public address of the object stored under `key`.
    fn object_url(&self, key: &str) -> String;

    /// Check that the store is reachable.
    async fn check_connectivity(&self) -> StorageResult<()>;
}
