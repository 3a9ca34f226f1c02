use std::io::Write;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use rand::seq::SliceRandom;
use rand::thread_rng;
use tokio::task;
use tracing::info;

use crate::{
    config::{Config, SlideshowConfig},
    error::{BatchError, ProbeError, Result},
    kenburns::{cover_size, KenBurns, PanDirection},
    media::{FfmpegTool, Prober},
    pipeline::{assemble::manifest_line, workset, BatchReport},
    plan::TINY_SECS,
};

/// Ken-Burns photo-to-video driver
///
/// Two operations share the clip renderer: `run` builds one slideshow
/// matched to an audio track, `export_clips` emits one silent pan/zoom
/// clip per image.
pub struct SlideshowPipeline {
    tool: FfmpegTool,
    prober: Prober,
    config: Config,
}

impl SlideshowPipeline {
    pub fn new(tool: FfmpegTool, config: Config) -> Self {
        let prober = Prober::new(tool.clone());
        Self { tool, prober, config }
    }

    /// Build a slideshow covering the audio track
    pub async fn run(
        &self,
        images_dir: &Path,
        audio_dir: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!("🎬 Slideshow: {:?} + {:?} -> {:?}", images_dir, audio_dir, output_path);

        let output_dir = match output_path.parent() {
            Some(parent) if parent != Path::new("") => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        workset::clear_folder(&output_dir, None)?;

        let mut images = workset::find_images(images_dir)?;
        let audio_path = workset::find_audio(audio_dir)?;

        let audio_duration = self.prober.duration_secs(&audio_path).await;
        if audio_duration <= TINY_SECS {
            return Err(ProbeError::ProbeFailed {
                path: audio_path.display().to_string(),
            }
            .into());
        }

        let slideshow = &self.config.slideshow;
        let needed = needed_images(audio_duration, slideshow.per_image_secs);
        images.shuffle(&mut thread_rng());

        info!(
            "   {:.1}s of audio needs {} images at {:.1}s each",
            audio_duration, needed, slideshow.per_image_secs
        );

        let scratch = tempfile::tempdir()?;
        let mut clip_paths = Vec::with_capacity(needed);

        for index in 0..needed {
            let image = &images[index % images.len()];
            let pan = PanDirection::CYCLE[index % PanDirection::CYCLE.len()];
            let clip_path = scratch.path().join(format!("clip_{:03}.mp4", index));

            info!("   🖼️  {} ({:?} pan)", image.display(), pan);
            self.render_clip(image, &clip_path, pan).await?;
            clip_paths.push(clip_path);
        }

        // All clips share parameters by construction: stream-copy the
        // concat and stop at the audio's length
        let manifest_path = scratch.path().join("clips.txt");
        let mut manifest = std::fs::File::create(&manifest_path)?;
        for clip in &clip_paths {
            writeln!(manifest, "{}", manifest_line(clip))?;
        }
        drop(manifest);

        let enc = &self.config.encode;
        self.tool
            .run_ffmpeg(vec![
                "-y".into(),
                "-f".into(),
                "concat".into(),
                "-safe".into(),
                "0".into(),
                "-i".into(),
                manifest_path.display().to_string(),
                "-i".into(),
                audio_path.display().to_string(),
                "-map".into(),
                "0:v:0".into(),
                "-map".into(),
                "1:a:0".into(),
                "-c:v".into(),
                "copy".into(),
                "-c:a".into(),
                enc.audio_codec.clone(),
                "-b:a".into(),
                enc.audio_bitrate.clone(),
                "-shortest".into(),
                output_path.display().to_string(),
            ])
            .await?;

        info!("🎉 Slideshow complete: {:?}", output_path);
        Ok(())
    }

    /// Export one silent Ken-Burns clip per image
    ///
    /// Walks the single-axis pan cycle only (diagonals are too busy for
    /// standalone clips), skips images whose clip already exists, and
    /// consumes rendered sources.
    pub async fn export_clips(&self, images_dir: &Path, out_dir: &Path) -> Result<BatchReport> {
        info!("🎬 Ken-Burns clip export: {:?} -> {:?}", images_dir, out_dir);

        workset::clear_folder(out_dir, None)?;
        let mut items = workset::WorkSet::from_dir(images_dir, &workset::IMAGE_EXTENSIONS)?;

        if items.is_empty() {
            return Err(BatchError::NoImagesFound {
                path: images_dir.display().to_string(),
            }
            .into());
        }

        const PAN_CYCLE: [PanDirection; 4] = [
            PanDirection::Left,
            PanDirection::Right,
            PanDirection::Up,
            PanDirection::Down,
        ];

        let mut report = BatchReport::default();

        for index in 0..items.len() {
            let image = items.items()[index].path.clone();
            let pan = PAN_CYCLE[index % PAN_CYCLE.len()];

            let stem = image
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("clip_{}", index));
            let clip_path = out_dir.join(format!("{}.mp4", stem));

            if clip_path.exists() {
                info!("   Skipping (exists): {:?}", clip_path);
                report.skipped += 1;
                continue;
            }

            self.render_clip(&image, &clip_path, pan).await?;
            items.mark_consumed(index);
            report.processed += 1;
            info!("   ✅ {} ({:?} pan)", clip_path.display(), pan);
        }

        report.consumed = items.sweep_consumed();
        info!(
            "🎉 Export complete: {} rendered, {} skipped, {} images consumed",
            report.processed, report.skipped, report.consumed
        );
        Ok(report)
    }

    /// Render one image into a silent pan/zoom clip
    ///
    /// Frames are synthesized on the blocking pool, written as numbered
    /// PNGs into a scoped scratch dir, and encoded through the concat
    /// demuxer.
    async fn render_clip(
        &self,
        image_path: &Path,
        output_path: &Path,
        pan: PanDirection,
    ) -> Result<()> {
        let scratch = tempfile::tempdir()?;

        let frames_dir = scratch.path().to_path_buf();
        let image_path_owned = image_path.to_path_buf();
        let slideshow = self.config.slideshow.clone();

        let frame_paths = task::spawn_blocking(move || {
            render_frames(&image_path_owned, &frames_dir, &slideshow, pan)
        })
        .await
        .map_err(|e| BatchError::OutputFailed {
            reason: format!("Frame rendering task failed: {}", e),
        })??;

        let manifest_path = scratch.path().join("frames.txt");
        write_frame_manifest(&manifest_path, &frame_paths, self.config.slideshow.fps)?;

        let enc = &self.config.encode;
        self.tool
            .run_ffmpeg(vec![
                "-y".into(),
                "-f".into(),
                "concat".into(),
                "-safe".into(),
                "0".into(),
                "-i".into(),
                manifest_path.display().to_string(),
                "-c:v".into(),
                enc.video_codec.clone(),
                "-r".into(),
                self.config.slideshow.fps.to_string(),
                "-pix_fmt".into(),
                enc.pixel_format.clone(),
                "-crf".into(),
                enc.crf.to_string(),
                "-preset".into(),
                enc.preset.clone(),
                "-threads".into(),
                enc.threads.to_string(),
                "-an".into(),
                output_path.display().to_string(),
            ])
            .await?;

        Ok(())
    }
}

/// How many images an audio track needs at the configured pace
pub(crate) fn needed_images(audio_secs: f64, per_image_secs: f64) -> usize {
    ((audio_secs / per_image_secs).ceil() as usize).max(1)
}

/// Synthesize the animation frames for one image
fn render_frames(
    image_path: &Path,
    frames_dir: &Path,
    slideshow: &SlideshowConfig,
    pan: PanDirection,
) -> Result<Vec<PathBuf>> {
    let source = image::open(image_path)
        .map_err(|e| BatchError::OutputFailed {
            reason: format!("Failed to load image {:?}: {}", image_path, e),
        })?
        .to_rgb8();

    let canvas = (slideshow.width, slideshow.height);
    let base_size = cover_size(source.width(), source.height(), canvas.0, canvas.1);
    let base = imageops::resize(&source, base_size.0, base_size.1, FilterType::Triangle);

    let animation = KenBurns::new(
        base_size,
        canvas,
        slideshow.zoom_start,
        slideshow.zoom_end,
        pan,
        slideshow.per_image_secs,
    );

    let frame_count = ((slideshow.per_image_secs * slideshow.fps as f64).round() as usize).max(1);
    let mut frame_paths = Vec::with_capacity(frame_count);

    for frame_index in 0..frame_count {
        let t = frame_index as f64 / slideshow.fps as f64;
        let scale = animation.scale_at(t);

        // The scaled image must still cover the canvas
        let scaled_w = ((base_size.0 as f64 * scale).round() as u32).max(canvas.0);
        let scaled_h = ((base_size.1 as f64 * scale).round() as u32).max(canvas.1);
        let scaled = imageops::resize(&base, scaled_w, scaled_h, FilterType::Triangle);

        // Offsets are negative shifts of the image; convert to the crop
        // window's origin and keep it inside the scaled bounds
        let (offset_x, offset_y) = animation.offset_at(t);
        let crop_x = ((-offset_x).round() as u32).min(scaled_w - canvas.0);
        let crop_y = ((-offset_y).round() as u32).min(scaled_h - canvas.1);

        let frame = imageops::crop_imm(&scaled, crop_x, crop_y, canvas.0, canvas.1).to_image();

        let frame_path = frames_dir.join(format!("frame_{:06}.png", frame_index));
        frame.save(&frame_path).map_err(|e| BatchError::OutputFailed {
            reason: format!("Failed to save frame: {}", e),
        })?;
        frame_paths.push(frame_path);
    }

    Ok(frame_paths)
}

/// Concat-demuxer manifest pairing each frame with its display duration
fn write_frame_manifest(manifest_path: &Path, frame_paths: &[PathBuf], fps: u32) -> Result<()> {
    let mut manifest = std::fs::File::create(manifest_path)?;
    let frame_duration = 1.0 / fps as f64;

    for frame in frame_paths {
        writeln!(manifest, "{}", manifest_line(frame))?;
        writeln!(manifest, "duration {:.6}", frame_duration)?;
    }

    // The demuxer ignores the last duration unless the final entry repeats
    if let Some(last) = frame_paths.last() {
        writeln!(manifest, "{}", manifest_line(last))?;
    }

    Ok(())
}
