use std::process::{Command, Output, Stdio};

use tokio::task;
use tracing::debug;

use crate::error::{BatchError, ProbeError, Result};

/// Handle on the external FFmpeg/FFprobe binaries
///
/// Commands are always built as argument vectors, never shell strings.
/// Each invocation blocks until the child exits; the blocking wait runs
/// on the tokio blocking pool so callers stay plain `async`.
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    ffmpeg: String,
    ffprobe: String,
}

impl FfmpegTool {
    /// Locate both tools on PATH, verifying each with its version
    /// subcommand. Any failure to launch or a non-zero exit means the
    /// tool is unusable.
    pub async fn detect() -> Result<Self> {
        let tool = Self::with_binaries("ffmpeg", "ffprobe");
        tool.ensure_available().await?;
        Ok(tool)
    }

    /// Build a handle around explicit binary names or paths
    pub fn with_binaries<S: Into<String>>(ffmpeg: S, ffprobe: S) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Run the version check for both binaries
    pub async fn ensure_available(&self) -> Result<()> {
        for name in [&self.ffmpeg, &self.ffprobe] {
            let bin = name.clone();
            let ok = task::spawn_blocking(move || {
                Command::new(&bin)
                    .arg("-version")
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status()
                    .map(|status| status.success())
                    .unwrap_or(false)
            })
            .await
            .unwrap_or(false);

            if !ok {
                return Err(ProbeError::ToolMissing { tool: name.clone() }.into());
            }
        }
        Ok(())
    }

    /// Run FFmpeg with the given arguments, failing on a non-zero exit
    pub async fn run_ffmpeg(&self, args: Vec<String>) -> Result<()> {
        debug!("ffmpeg {}", args.join(" "));
        let output = self.run(self.ffmpeg.clone(), args).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BatchError::EncodingFailed {
                reason: format!("FFmpeg failed: {}", tail(&stderr)),
            }
            .into());
        }

        Ok(())
    }

    /// Run FFprobe with the given arguments
    ///
    /// Returns captured stdout on success and `None` on any failure;
    /// probing failures exclude a clip, they never abort a batch.
    pub async fn run_ffprobe(&self, args: Vec<String>) -> Option<String> {
        debug!("ffprobe {}", args.join(" "));
        let output = self.run(self.ffprobe.clone(), args).await.ok()?;

        if !output.status.success() {
            return None;
        }

        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn run(&self, bin: String, args: Vec<String>) -> Result<Output> {
        let output = task::spawn_blocking(move || {
            let mut cmd = Command::new(&bin);
            cmd.args(&args);
            cmd.output()
        })
        .await
        .map_err(|e| BatchError::EncodingFailed {
            reason: format!("Failed to spawn external process: {}", e),
        })?
        .map_err(|e| BatchError::EncodingFailed {
            reason: format!("External process execution failed: {}", e),
        })?;

        Ok(output)
    }
}

// FFmpeg prints progress to stderr; on failure only the last few lines
// carry the actual diagnostic.
fn tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines.len().saturating_sub(4);
    lines[start..].join("\n")
}
