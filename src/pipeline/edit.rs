use std::path::Path;

use rand::thread_rng;
use tracing::{info, warn};

use crate::{
    config::Config,
    error::{BatchError, Result},
    filter::build_edit_graph,
    media::{FfmpegTool, Prober},
    pipeline::{workset, BatchReport},
};

/// Crop / slow-down / watermark / music batch driver
///
/// Processes every `.mp4` in the input folder to completion, one at a
/// time, then sweeps consumed sources.
pub struct EditPipeline {
    tool: FfmpegTool,
    prober: Prober,
    config: Config,
}

impl EditPipeline {
    pub fn new(tool: FfmpegTool, config: Config) -> Self {
        let prober = Prober::new(tool.clone());
        Self { tool, prober, config }
    }

    /// Run the batch
    ///
    /// `music_dir`, when given and music is enabled, supplies one
    /// random background track per output file.
    pub async fn run(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        music_dir: Option<&Path>,
    ) -> Result<BatchReport> {
        info!("🎬 Edit batch: {:?} -> {:?}", input_dir, output_dir);

        workset::clear_folder(output_dir, None)?;
        let mut items = workset::WorkSet::from_dir(input_dir, &["mp4"])?;

        if items.is_empty() {
            return Err(BatchError::NoVideosFound {
                path: input_dir.display().to_string(),
            }
            .into());
        }

        let watermark = if self.config.watermark.enabled {
            if self.config.watermark.image.exists() {
                Some(&self.config.watermark)
            } else {
                warn!(
                    "Watermark enabled but image {:?} is missing; continuing without it",
                    self.config.watermark.image
                );
                None
            }
        } else {
            None
        };

        let mut report = BatchReport::default();
        let mut rng = thread_rng();

        for index in 0..items.len() {
            let input = items.items()[index].path.clone();
            let name = input.file_name().map(|n| n.to_string_lossy().into_owned());
            let output = output_dir.join(name.as_deref().unwrap_or("output.mp4"));

            // A clip that cannot be probed is excluded, not fatal
            let stream = match self.prober.video_stream(&input).await {
                Some(stream) => stream,
                None => {
                    warn!("Skipping unprobeable clip {:?}", input);
                    report.skipped += 1;
                    continue;
                }
            };

            let music = if self.config.edit.add_music {
                music_dir.and_then(|dir| workset::pick_random_music(dir, &mut rng))
            } else {
                None
            };

            let graph = build_edit_graph(
                stream.width,
                stream.height,
                &self.config.edit,
                watermark,
            )?;

            let mut args: Vec<String> = vec!["-y".into(), "-i".into(), input.display().to_string()];
            if let Some(wm) = watermark {
                args.push("-i".into());
                args.push(wm.image.display().to_string());
            }
            if let Some(music) = &music {
                args.push("-i".into());
                args.push(music.display().to_string());
            }

            args.push("-filter_complex".into());
            args.push(graph.render());
            args.push("-map".into());
            args.push("[outv]".into());

            match &music {
                Some(_) => {
                    // Audio comes from the last input
                    let audio_index = 1 + watermark.is_some() as usize;
                    args.push("-map".into());
                    args.push(format!("{}:a:0", audio_index));
                }
                None => args.push("-an".into()),
            }

            let enc = &self.config.encode;
            args.extend([
                "-shortest".into(),
                "-c:v".into(),
                enc.video_codec.clone(),
                "-preset".into(),
                enc.preset.clone(),
                "-c:a".into(),
                enc.audio_codec.clone(),
                "-b:a".into(),
                enc.audio_bitrate.clone(),
                "-threads".into(),
                enc.threads.to_string(),
                output.display().to_string(),
            ]);

            self.tool.run_ffmpeg(args).await?;

            items.mark_consumed(index);
            report.processed += 1;
            info!("   ✅ Processed: {}", output.display());
        }

        report.consumed = items.sweep_consumed();
        info!(
            "🎉 Edit batch complete: {} processed, {} skipped, {} inputs consumed",
            report.processed, report.skipped, report.consumed
        );
        Ok(report)
    }
}
