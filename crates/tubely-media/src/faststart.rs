//! Fast-start rewriting (moov atom relocation).
//!
//! The rewrite always writes a sibling file. The input is never touched, so a
//! caller can keep using it when the rewrite fails.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

const FAST_START_SUFFIX: &str = ".faststart.mp4";

/// Sibling path the rewritten copy of `input` is written to.
pub fn fast_start_output_path(input: impl AsRef<Path>) -> PathBuf {
    let input = input.as_ref();
    let mut name: OsString = input
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("upload"));
    name.push(FAST_START_SUFFIX);
    input.with_file_name(name)
}

/// Rewrite `input` so playback metadata sits at the front of the file.
///
/// Streams are copied without re-encoding. On failure, or if the future is
/// dropped, the partial output is removed.
pub async fn rewrite_fast_start(
    input: impl AsRef<Path>,
    runner: &FfmpegRunner,
) -> MediaResult<PathBuf> {
    let input = input.as_ref();

    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    let output = fast_start_output_path(input);
    let cmd = FfmpegCommand::new(input, &output)
        .stream_copy()
        .movflags("faststart")
        .format("mp4");

    debug!(input = %input.display(), output = %output.display(), "Rewriting for fast start");

    // Removes the sibling on every exit path, including cancellation,
    // until the rewrite is known to be good.
    let mut partial = PartialOutput::new(output.clone());

    runner.run(&cmd).await?;

    match tokio::fs::metadata(&output).await {
        Ok(meta) if meta.len() > 0 => {
            partial.keep();
            info!(output = %output.display(), bytes = meta.len(), "Fast-start rewrite complete");
            Ok(output)
        }
        _ => Err(MediaError::ffmpeg_failed(
            "FFmpeg produced no output",
            None,
            None,
        )),
    }
}

struct PartialOutput {
    path: PathBuf,
    armed: bool,
}

impl PartialOutput {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn keep(&mut self) {
        self.armed = false;
    }
}

impl Drop for PartialOutput {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed partial fast-start output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "Failed to remove partial output: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_output_removed_unless_kept() {
        let dir = TempDir::new().unwrap();
        let dropped = dir.path().join("a.mp4.faststart.mp4");
        let kept = dir.path().join("b.mp4.faststart.mp4");
        std::fs::write(&dropped, b"partial").unwrap();
        std::fs::write(&kept, b"complete").unwrap();

        drop(PartialOutput::new(dropped.clone()));
        let mut guard = PartialOutput::new(kept.clone());
        guard.keep();
        drop(guard);

        assert!(!dropped.exists());
        assert!(kept.exists());
    }

    #[test]
    fn test_output_path_is_sibling() {
        let out = fast_start_output_path("/tmp/scratch/tubely-upload-abc.mp4");
        assert_eq!(
            out,
            PathBuf::from("/tmp/scratch/tubely-upload-abc.mp4.faststart.mp4")
        );
    }

    #[tokio::test]
    async fn test_missing_input() {
        let err = rewrite_fast_start("/nonexistent/tubely/in.mp4", &FfmpegRunner::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_rewrite_leaves_input_and_no_sibling() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("corrupt.mp4");
        tokio::fs::write(&input, b"definitely not an mp4").await.unwrap();

        // Fails either because ffmpeg is missing or because the input is garbage.
        let result = rewrite_fast_start(&input, &FfmpegRunner::new()).await;
        assert!(result.is_err());

        assert!(!fast_start_output_path(&input).exists());
        let content = tokio::fs::read(&input).await.unwrap();
        assert_eq!(content, b"definitely not an mp4");
    }
}
