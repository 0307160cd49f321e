//! Business logic behind the upload endpoints.

pub mod error;
pub mod ingest;
pub mod thumbnail;

pub use error::IngestError;
pub use ingest::{IngestPipeline, IngestRequest};
pub use thumbnail::{ThumbnailService, ThumbnailStore};
