//! FFprobe video stream inspection.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use tubely_models::Dimensions;

use crate::command::{check_ffprobe, stderr_tail};
use crate::error::{MediaError, MediaResult};

/// Information about the first video stream of a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoStreamInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Video codec
    pub codec: String,
}

impl VideoStreamInfo {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Probe the first video stream of a file.
pub async fn probe_video_stream(
    path: impl AsRef<Path>,
    timeout: Duration,
) -> MediaResult<VideoStreamInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    debug!("Probing {}", path.display());

    let child = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-select_streams",
            "v:0",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| MediaError::Timeout(timeout.as_secs()))??;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(stderr_tail(&output.stderr)),
        });
    }

    parse_probe_output(&output.stdout)
}

/// Probe the pixel dimensions of the first video stream.
pub async fn probe_dimensions(path: impl AsRef<Path>, timeout: Duration) -> MediaResult<Dimensions> {
    probe_video_stream(path, timeout).await.map(|info| info.dimensions())
}

/// Extract the first video stream from FFprobe JSON output.
fn parse_probe_output(stdout: &[u8]) -> MediaResult<VideoStreamInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let stream = probe
        .streams
        .into_iter()
        .find(|s| s.codec_type.as_deref().unwrap_or("video") == "video")
        .ok_or_else(|| MediaError::invalid_video("No video stream found"))?;

    let width = stream
        .width
        .ok_or_else(|| MediaError::invalid_video("Video stream has no width"))?;
    let height = stream
        .height
        .ok_or_else(|| MediaError::invalid_video("Video stream has no height"))?;

    Ok(VideoStreamInfo {
        width,
        height,
        codec: stream.codec_name.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_video_stream() {
        let json = br#"{
            "streams": [
                {"index": 0, "codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080}
            ]
        }"#;

        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.dimensions(), Dimensions::new(1920, 1080));
        assert_eq!(info.codec, "h264");
    }

    #[test]
    fn test_parse_skips_audio_streams() {
        let json = br#"{
            "streams": [
                {"index": 0, "codec_type": "audio", "codec_name": "aac"},
                {"index": 1, "codec_type": "video", "codec_name": "h264", "width": 1080, "height": 1920}
            ]
        }"#;

        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.width, 1080);
        assert_eq!(info.height, 1920);
    }

    #[test]
    fn test_parse_no_streams() {
        let err = parse_probe_output(br#"{"streams": []}"#).unwrap_err();
        assert!(matches!(err, MediaError::InvalidVideo(_)));

        let err = parse_probe_output(b"{}").unwrap_err();
        assert!(matches!(err, MediaError::InvalidVideo(_)));
    }

    #[test]
    fn test_parse_missing_height() {
        let json = br#"{"streams": [{"codec_type": "video", "width": 640}]}"#;
        let err = parse_probe_output(json).unwrap_err();
        assert!(matches!(err, MediaError::InvalidVideo(_)));
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_probe_output(b"not json").unwrap_err();
        assert!(matches!(err, MediaError::JsonParse(_)));
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = probe_dimensions("/nonexistent/tubely/video.mp4", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
