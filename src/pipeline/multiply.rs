use std::path::Path;

use tracing::info;

use crate::{
    config::Config,
    error::{BatchError, Result},
    filter::build_multiply_graph,
    media::FfmpegTool,
    pipeline::{workset, BatchReport},
};

/// Clip repetition batch driver
///
/// Plays each clip `repeat_factor` times back to back by splitting the
/// stream, resetting timestamps per branch, and concatenating.
pub struct MultiplyPipeline {
    tool: FfmpegTool,
    config: Config,
}

impl MultiplyPipeline {
    pub fn new(tool: FfmpegTool, config: Config) -> Self {
        Self { tool, config }
    }

    pub async fn run(&self, input_dir: &Path, output_dir: &Path) -> Result<BatchReport> {
        info!(
            "🎬 Multiply batch (x{}): {:?} -> {:?}",
            self.config.multiply.repeat_factor, input_dir, output_dir
        );

        workset::clear_folder(output_dir, None)?;
        let mut items = workset::WorkSet::from_dir(input_dir, &["mp4"])?;

        if items.is_empty() {
            return Err(BatchError::NoVideosFound {
                path: input_dir.display().to_string(),
            }
            .into());
        }

        let graph = build_multiply_graph(self.config.multiply.repeat_factor)?;

        let mut report = BatchReport::default();

        for index in 0..items.len() {
            let input = items.items()[index].path.clone();
            let name = input.file_name().map(|n| n.to_string_lossy().into_owned());
            let output = output_dir.join(name.as_deref().unwrap_or("output.mp4"));

            let enc = &self.config.encode;
            let args: Vec<String> = vec![
                "-y".into(),
                "-i".into(),
                input.display().to_string(),
                "-filter_complex".into(),
                graph.render(),
                "-map".into(),
                "[outv]".into(),
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
            ];

            self.tool.run_ffmpeg(args).await?;

            items.mark_consumed(index);
            report.processed += 1;
            info!("   ✅ Done: {}", output.display());
        }

        report.consumed = items.sweep_consumed();
        info!(
            "🎉 Multiply batch complete: {} processed, {} inputs consumed",
            report.processed, report.consumed
        );
        Ok(report)
    }
}
