//! FFmpeg CLI wrapper and upload staging.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with timeouts
//! - FFprobe stream inspection
//! - Fast-start (moov atom relocation) rewriting
//! - Geometry classification of video files
//! - A `MediaTool` seam so the ingestion pipeline can run without real binaries
//! - Scratch-file staging of uploaded byte streams with guaranteed cleanup

pub mod command;
pub mod error;
pub mod faststart;
pub mod geometry;
pub mod probe;
pub mod staging;
pub mod tool;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use faststart::{fast_start_output_path, rewrite_fast_start};
pub use geometry::classify;
pub use probe::{probe_dimensions, VideoStreamInfo};
pub use staging::{StagedUpload, StagingStore};
pub use tool::{FfmpegTool, MediaConfig, MediaTool};
