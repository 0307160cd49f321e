//! Object storage for ingested videos and local storage for thumbnails.
//!
//! This crate provides:
//! - The `ObjectStore` trait the ingestion pipeline uploads through
//! - An S3 implementation (AWS or any S3-compatible endpoint)
//! - A local asset store for statically served files

pub mod client;
pub mod error;
pub mod local;
pub mod store;

pub use client::{S3Client, S3Config};
pub use error::{StorageError, StorageResult};
pub use local::LocalAssetStore;
pub use store::ObjectStore;
