use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::media::tool::FfmpegTool;

/// Full metadata for a single clip
///
/// Populated by probing, immutable once created, discarded after the
/// driving operation completes. An unreadable clip never produces a
/// descriptor; callers treat the absence as "exclude this clip".
#[derive(Debug, Clone)]
pub struct ClipDescriptor {
    /// Path to the clip
    pub path: PathBuf,

    /// Container duration in seconds
    pub duration: f64,

    /// Stream parameters of the primary video stream
    pub stream: StreamDescriptor,
}

/// Parameters of the primary video stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescriptor {
    /// Codec name, e.g. "h264"
    pub codec: String,

    /// Frame width in pixels
    pub width: u32,

    /// Frame height in pixels
    pub height: u32,

    /// Average frame rate, normalized from the rational form
    pub frame_rate: f64,

    /// Pixel format, e.g. "yuv420p"
    pub pixel_format: String,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    pix_fmt: Option<String>,
}

/// Queries clip metadata through FFprobe's introspection mode
///
/// Read-only; every method maps any probing failure (missing tool,
/// corrupt file, no video stream) to the empty-result sentinel rather
/// than an error.
#[derive(Debug, Clone)]
pub struct Prober {
    tool: FfmpegTool,
}

impl Prober {
    pub fn new(tool: FfmpegTool) -> Self {
        Self { tool }
    }

    /// Probe the primary video stream's parameters
    pub async fn video_stream(&self, path: &Path) -> Option<StreamDescriptor> {
        let out = self
            .tool
            .run_ffprobe(vec![
                "-v".to_string(),
                "error".to_string(),
                "-select_streams".to_string(),
                "v:0".to_string(),
                "-show_entries".to_string(),
                "stream=codec_name,width,height,avg_frame_rate,pix_fmt".to_string(),
                "-of".to_string(),
                "json".to_string(),
                path.display().to_string(),
            ])
            .await?;

        let desc = stream_from_json(&out);
        if desc.is_none() {
            debug!("Incomplete stream info for {:?}", path);
        }
        desc
    }

    /// Probe the container duration in seconds
    ///
    /// Works for both video and audio files. Returns 0.0 on any
    /// failure; a zero duration is below the validity threshold and
    /// gets the clip excluded downstream.
    pub async fn duration_secs(&self, path: &Path) -> f64 {
        let out = self
            .tool
            .run_ffprobe(vec![
                "-v".to_string(),
                "error".to_string(),
                "-show_entries".to_string(),
                "format=duration".to_string(),
                "-of".to_string(),
                "default=noprint_wrappers=1:nokey=1".to_string(),
                path.display().to_string(),
            ])
            .await;

        out.and_then(|s| s.trim().parse::<f64>().ok()).unwrap_or(0.0)
    }

    /// Probe stream parameters and duration together
    pub async fn describe(&self, path: &Path) -> Option<ClipDescriptor> {
        let stream = self.video_stream(path).await?;
        let duration = self.duration_secs(path).await;

        Some(ClipDescriptor {
            path: path.to_path_buf(),
            duration,
            stream,
        })
    }
}

/// Parse FFprobe's JSON stream listing into a descriptor
///
/// Every field must be present and non-degenerate; anything less is an
/// incomplete probe and yields `None`.
fn stream_from_json(json: &str) -> Option<StreamDescriptor> {
    let parsed: FfprobeOutput = serde_json::from_str(json).ok()?;
    let stream = parsed.streams.into_iter().next()?;

    let codec = stream.codec_name.filter(|s| !s.is_empty())?;
    let width = stream.width.filter(|&w| w > 0)?;
    let height = stream.height.filter(|&h| h > 0)?;
    let rate = stream.avg_frame_rate.filter(|s| !s.is_empty())?;
    let pixel_format = stream.pix_fmt.filter(|s| !s.is_empty())?;

    Some(StreamDescriptor {
        codec,
        width,
        height,
        frame_rate: parse_frame_rate(&rate),
        pixel_format,
    })
}

/// Normalize a frame-rate string to a float
///
/// FFprobe reports rates either as a rational ("30000/1001") or a plain
/// number ("29.97"). A zero denominator or unparseable text maps to 0.0.
pub fn parse_frame_rate(rate: &str) -> f64 {
    if let Some((num, den)) = rate.split_once('/') {
        let num: f64 = match num.trim().parse() {
            Ok(v) => v,
            Err(_) => return 0.0,
        };
        let den: f64 = match den.trim().parse() {
            Ok(v) => v,
            Err(_) => return 0.0,
        };
        if den == 0.0 {
            return 0.0;
        }
        num / den
    } else {
        rate.trim().parse().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rational_frame_rate() {
        assert!((parse_frame_rate("30000/1001") - 29.97).abs() < 1e-2);
        assert_eq!(parse_frame_rate("30/1"), 30.0);
    }

    #[test]
    fn test_parse_plain_frame_rate() {
        assert_eq!(parse_frame_rate("25"), 25.0);
        assert!((parse_frame_rate("29.97") - 29.97).abs() < 1e-9);
    }

    #[test]
    fn test_parse_degenerate_frame_rate() {
        assert_eq!(parse_frame_rate("0/0"), 0.0);
        assert_eq!(parse_frame_rate("30/0"), 0.0);
        assert_eq!(parse_frame_rate("garbage"), 0.0);
        assert_eq!(parse_frame_rate(""), 0.0);
    }

    #[test]
    fn test_stream_from_complete_json() {
        let json = r#"{
            "streams": [{
                "codec_name": "h264",
                "width": 1920,
                "height": 1080,
                "avg_frame_rate": "30/1",
                "pix_fmt": "yuv420p"
            }]
        }"#;

        let desc = stream_from_json(json).unwrap();
        assert_eq!(desc.codec, "h264");
        assert_eq!(desc.width, 1920);
        assert_eq!(desc.height, 1080);
        assert_eq!(desc.frame_rate, 30.0);
        assert_eq!(desc.pixel_format, "yuv420p");
    }

    #[test]
    fn test_stream_from_incomplete_json() {
        // No streams at all (audio-only file)
        assert!(stream_from_json(r#"{"streams": []}"#).is_none());

        // Missing pixel format
        let json = r#"{
            "streams": [{
                "codec_name": "h264",
                "width": 1920,
                "height": 1080,
                "avg_frame_rate": "30/1"
            }]
        }"#;
        assert!(stream_from_json(json).is_none());

        // Degenerate dimensions
        let json = r#"{
            "streams": [{
                "codec_name": "h264",
                "width": 0,
                "height": 1080,
                "avg_frame_rate": "30/1",
                "pix_fmt": "yuv420p"
            }]
        }"#;
        assert!(stream_from_json(json).is_none());

        // Not JSON
        assert!(stream_from_json("not json").is_none());
    }
}
