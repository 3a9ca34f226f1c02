use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::{
    config::Config,
    error::{BatchError, Result},
    filter::build_overlay_graph,
    media::FfmpegTool,
    pipeline::{workset, BatchReport},
};

/// Looping overlay compositing batch driver
///
/// Each configured overlay source that exists on disk is looped
/// (`-stream_loop -1`) and composited atop the footage; the source
/// audio passes through untouched.
pub struct OverlayPipeline {
    tool: FfmpegTool,
    config: Config,
}

impl OverlayPipeline {
    pub fn new(tool: FfmpegTool, config: Config) -> Self {
        Self { tool, config }
    }

    pub async fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<BatchReport> {
        info!("🎬 Overlay batch: {:?} -> {:?}", input_dir, output_dir);

        workset::clear_folder(output_dir, None)?;
        let mut items = workset::WorkSet::from_dir(input_dir, &["mp4"])?;

        if items.is_empty() {
            return Err(BatchError::NoVideosFound {
                path: input_dir.display().to_string(),
            }
            .into());
        }

        let overlays: Vec<PathBuf> = self
            .config
            .overlay
            .sources
            .iter()
            .filter(|source| {
                let present = source.exists();
                if !present {
                    warn!("Overlay source {:?} is missing; skipping it", source);
                }
                present
            })
            .cloned()
            .collect();

        let graph = build_overlay_graph(overlays.len(), self.config.overlay.position)?;

        let mut report = BatchReport::default();

        for index in 0..items.len() {
            let input = items.items()[index].path.clone();
            let name = input.file_name().map(|n| n.to_string_lossy().into_owned());
            let output = output_dir.join(name.as_deref().unwrap_or("output.mp4"));

            let mut args: Vec<String> = vec!["-y".into(), "-i".into(), input.display().to_string()];
            for overlay in &overlays {
                args.extend([
                    "-stream_loop".into(),
                    "-1".into(),
                    "-i".into(),
                    overlay.display().to_string(),
                ]);
            }

            let enc = &self.config.encode;
            args.extend([
                "-filter_complex".into(),
                graph.render(),
                "-map".into(),
                "[outv]".into(),
                // Audio from the main video, if it has any
                "-map".into(),
                "0:a?".into(),
                "-c:v".into(),
                enc.video_codec.clone(),
                "-c:a".into(),
                enc.audio_codec.clone(),
                "-shortest".into(),
                "-preset".into(),
                enc.preset.clone(),
                "-crf".into(),
                enc.crf.to_string(),
                "-threads".into(),
                enc.threads.to_string(),
                output.display().to_string(),
            ]);

            self.tool.run_ffmpeg(args).await?;

            items.mark_consumed(index);
            report.processed += 1;
            info!("   ✅ Done: {}", output.display());
        }

        report.consumed = items.sweep_consumed();
        info!(
            "🎉 Overlay batch complete: {} processed, {} inputs consumed",
            report.processed, report.consumed
        );
        Ok(report)
    }
}
