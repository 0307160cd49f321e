//! Media tool capability.
//!
//! The ingestion pipeline talks to FFmpeg only through [`MediaTool`], so tests
//! can substitute a fake without real binaries.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::debug;

use tubely_models::Dimensions;

use crate::command::{check_ffmpeg, check_ffprobe, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::{faststart, probe};

/// Operations the pipeline needs from a media toolkit.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Write a fast-start copy of `input` and return its path.
    async fn rewrite_fast_start(&self, input: &Path) -> MediaResult<PathBuf>;

    /// Pixel dimensions of the first video stream.
    async fn probe_dimensions(&self, path: &Path) -> MediaResult<Dimensions>;
}

/// Subprocess limits for FFmpeg/FFprobe.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Timeout for a single subprocess
    pub process_timeout: Duration,
    /// Max concurrent subprocesses
    pub max_processes: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            process_timeout: Duration::from_secs(300),
            max_processes: 4,
        }
    }
}

impl MediaConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            process_timeout: std::env::var("MEDIA_PROCESS_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.process_timeout),
            max_processes: std::env::var("MEDIA_MAX_PROCESSES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_processes),
        }
    }
}

/// [`MediaTool`] backed by the `ffmpeg` and `ffprobe` binaries.
#[derive(Clone)]
pub struct FfmpegTool {
    config: MediaConfig,
    permits: Arc<Semaphore>,
}

impl FfmpegTool {
    pub fn new(config: MediaConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_processes.max(1)));
        Self { config, permits }
    }

    /// Check that both binaries are on PATH.
    pub fn check_available(&self) -> MediaResult<()> {
        check_ffmpeg()?;
        check_ffprobe()?;
        Ok(())
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    async fn acquire(&self) -> MediaResult<tokio::sync::SemaphorePermit<'_>> {
        debug!(
            available = self.permits.available_permits(),
            "Acquiring media process permit"
        );
        self.permits
            .acquire()
            .await
            .map_err(|_| MediaError::ResourceLimit("media process pool closed".to_string()))
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn rewrite_fast_start(&self, input: &Path) -> MediaResult<PathBuf> {
        let _permit = self.acquire().await?;
        let runner = FfmpegRunner::new().with_timeout(self.config.process_timeout);
        faststart::rewrite_fast_start(input, &runner).await
    }

    async fn probe_dimensions(&self, path: &Path) -> MediaResult<Dimensions> {
        let _permit = self.acquire().await?;
        probe::probe_dimensions(path, self.config.process_timeout).await
    }
}
