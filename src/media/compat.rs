use std::path::{Path, PathBuf};

use crate::media::probe::{Prober, StreamDescriptor};

/// Frame rates within this distance count as equal after normalizing
/// the rational form.
const FPS_TOLERANCE: f64 = 1e-3;

/// Whether a set of clips can be concatenated without re-encoding
///
/// Computed once per batch, never persisted.
#[derive(Debug, Clone)]
pub struct CompatibilityVerdict {
    /// True when stream-copy concatenation is safe
    pub safe: bool,

    /// Human-readable mismatch reason, or a match confirmation
    pub reason: String,
}

/// Decides whether clips share identical stream parameters
///
/// Lossless concatenation requires every clip to match the first one's
/// codec, resolution and pixel format exactly, and its frame rate to
/// within [`FPS_TOLERANCE`].
pub struct CompatibilityChecker {
    prober: Prober,
}

impl CompatibilityChecker {
    pub fn new(prober: Prober) -> Self {
        Self { prober }
    }

    /// Probe every clip and compare against the first
    ///
    /// The first incomplete probe or parameter mismatch short-circuits
    /// with a verdict naming the offending file.
    pub async fn check(&self, paths: &[PathBuf]) -> CompatibilityVerdict {
        let mut probed = Vec::with_capacity(paths.len());
        for path in paths {
            let info = self.prober.video_stream(path).await;
            let incomplete = info.is_none();
            probed.push((path.clone(), info));
            if incomplete {
                // No point probing the rest; judge() reports this one
                break;
            }
        }

        judge(&probed)
    }
}

/// Pure comparison over already-probed stream parameters
fn judge(probed: &[(PathBuf, Option<StreamDescriptor>)]) -> CompatibilityVerdict {
    let mut first: Option<&StreamDescriptor> = None;

    for (path, info) in probed {
        let info = match info {
            Some(info) => info,
            None => {
                return CompatibilityVerdict {
                    safe: false,
                    reason: format!("Missing stream info for: {}", file_name(path)),
                };
            }
        };

        let reference = match first {
            None => {
                first = Some(info);
                continue;
            }
            Some(reference) => reference,
        };

        let same = info.codec == reference.codec
            && info.width == reference.width
            && info.height == reference.height
            && info.pixel_format == reference.pixel_format
            && (info.frame_rate - reference.frame_rate).abs() < FPS_TOLERANCE;

        if !same {
            return CompatibilityVerdict {
                safe: false,
                reason: format!(
                    "Mismatch: {} (codec={}, size={}x{}, fps={:.3}, pix_fmt={}) \
                     vs ref (codec={}, size={}x{}, fps={:.3}, pix_fmt={})",
                    file_name(path),
                    info.codec,
                    info.width,
                    info.height,
                    info.frame_rate,
                    info.pixel_format,
                    reference.codec,
                    reference.width,
                    reference.height,
                    reference.frame_rate,
                    reference.pixel_format,
                ),
            };
        }
    }

    CompatibilityVerdict {
        safe: true,
        reason: "All inputs match (codec/size/fps/pix_fmt)".to_string(),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(codec: &str, width: u32, height: u32, fps: f64, pix_fmt: &str) -> StreamDescriptor {
        StreamDescriptor {
            codec: codec.to_string(),
            width,
            height,
            frame_rate: fps,
            pixel_format: pix_fmt.to_string(),
        }
    }

    #[test]
    fn test_matching_clips_are_safe() {
        let probed = vec![
            (PathBuf::from("a.mp4"), Some(desc("h264", 1920, 1080, 30.0, "yuv420p"))),
            (PathBuf::from("b.mp4"), Some(desc("h264", 1920, 1080, 30.0, "yuv420p"))),
            (PathBuf::from("c.mp4"), Some(desc("h264", 1920, 1080, 30.0, "yuv420p"))),
        ];

        let verdict = judge(&probed);
        assert!(verdict.safe);
    }

    #[test]
    fn test_resolution_mismatch_names_the_file() {
        let probed = vec![
            (PathBuf::from("a.mp4"), Some(desc("h264", 1920, 1080, 30.0, "yuv420p"))),
            (PathBuf::from("small.mp4"), Some(desc("h264", 1280, 720, 30.0, "yuv420p"))),
        ];

        let verdict = judge(&probed);
        assert!(!verdict.safe);
        assert!(verdict.reason.contains("small.mp4"));
    }

    #[test]
    fn test_incomplete_probe_is_unsafe() {
        let probed = vec![
            (PathBuf::from("a.mp4"), Some(desc("h264", 1920, 1080, 30.0, "yuv420p"))),
            (PathBuf::from("broken.mp4"), None),
        ];

        let verdict = judge(&probed);
        assert!(!verdict.safe);
        assert!(verdict.reason.contains("broken.mp4"));
    }

    #[test]
    fn test_frame_rate_near_equality() {
        // 30000/1001 vs 29.97 is within tolerance
        let probed = vec![
            (PathBuf::from("a.mp4"), Some(desc("h264", 1920, 1080, 29.97003, "yuv420p"))),
            (PathBuf::from("b.mp4"), Some(desc("h264", 1920, 1080, 29.97, "yuv420p"))),
        ];
        assert!(judge(&probed).safe);

        // A full frame apart is not
        let probed = vec![
            (PathBuf::from("a.mp4"), Some(desc("h264", 1920, 1080, 30.0, "yuv420p"))),
            (PathBuf::from("b.mp4"), Some(desc("h264", 1920, 1080, 29.0, "yuv420p"))),
        ];
        assert!(!judge(&probed).safe);
    }

    #[test]
    fn test_codec_mismatch() {
        let probed = vec![
            (PathBuf::from("a.mp4"), Some(desc("h264", 1920, 1080, 30.0, "yuv420p"))),
            (PathBuf::from("b.mp4"), Some(desc("hevc", 1920, 1080, 30.0, "yuv420p"))),
        ];

        let verdict = judge(&probed);
        assert!(!verdict.safe);
        assert!(verdict.reason.contains("hevc"));
    }

    #[test]
    fn test_single_clip_is_safe() {
        let probed = vec![
            (PathBuf::from("a.mp4"), Some(desc("h264", 1920, 1080, 30.0, "yuv420p"))),
        ];
        assert!(judge(&probed).safe);
    }
}
