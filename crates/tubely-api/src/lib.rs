//! Axum HTTP API server.
//!
//! This crate provides:
//! - The video ingestion pipeline (staging, fast-start, classification, upload)
//! - Thumbnail uploads (local files or inline data URLs)
//! - HS256 bearer token authentication
//! - Security headers, request IDs and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{ApiConfig, IngestConfig, MetadataBackend, ThumbnailStorageMode};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{IngestError, IngestPipeline, IngestRequest, ThumbnailService, ThumbnailStore};
pub use state::AppState;
