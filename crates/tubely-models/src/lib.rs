//! Shared data models for the Tubely backend.
//!
//! This crate provides Serde-serializable types for:
//! - Video records and their identifiers
//! - Geometry classification of uploaded videos
//! - Object storage keys
//! - Content-Type parsing

pub mod geometry;
pub mod media_type;
pub mod storage_key;
pub mod video;

// Re-export common types
pub use geometry::{Dimensions, GeometryClass};
pub use media_type::{MediaType, MediaTypeError, VIDEO_MP4};
pub use storage_key::StorageKey;
pub use video::{IdParseError, NewVideo, UserId, VideoId, VideoRecord};
