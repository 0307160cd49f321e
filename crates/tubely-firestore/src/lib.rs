//! Video metadata storage.
//!
//! This crate provides:
//! - The `VideoStore` trait consumed by the ingestion pipeline
//! - A Firestore REST client with token caching, retry and metrics
//! - `VideoRepository`, the Firestore-backed `VideoStore`
//! - `MemoryVideoStore` for local development and tests

pub mod client;
pub mod error;
pub mod metrics;
pub mod repos;
pub mod retry;
pub mod store;
pub mod token_cache;
pub mod types;

pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use repos::VideoRepository;
pub use retry::RetryConfig;
pub use store::{MemoryVideoStore, VideoStore};
pub use types::{Document, FromFirestoreValue, ToFirestoreValue, Value};
