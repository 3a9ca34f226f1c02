use std::io::Write;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::thread_rng;
use tracing::{debug, info};

use crate::{
    config::Config,
    error::{BatchError, ProbeError, Result},
    filter::build_assembly_concat_graph,
    media::{CompatibilityChecker, FfmpegTool, Prober, StreamDescriptor},
    pipeline::workset,
    plan::{plan_assembly, AssemblyPlan, CandidateClip, TINY_SECS},
};

/// Audio-length-matched concatenation driver
///
/// Plans a clip sequence covering the audio track's duration, then
/// either stream-copies whole files through the concat demuxer (when
/// every clip shares stream parameters) or re-encodes with per-entry
/// trims through the concat filter.
pub struct AssemblePipeline {
    tool: FfmpegTool,
    prober: Prober,
    config: Config,
}

impl AssemblePipeline {
    pub fn new(tool: FfmpegTool, config: Config) -> Self {
        let prober = Prober::new(tool.clone());
        Self { tool, prober, config }
    }

    pub async fn run(
        &self,
        video_dir: &Path,
        audio_dir: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!("🎬 Assembling {:?} to the length of {:?}", video_dir, audio_dir);

        let output_dir = match output_path.parent() {
            Some(parent) if parent != Path::new("") => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        workset::clear_folder(&output_dir, None)?;

        // Missing resources fail before any processing begins
        let audio_path = workset::find_audio(audio_dir)?;
        let audio_duration = self.prober.duration_secs(&audio_path).await;
        if audio_duration <= TINY_SECS {
            return Err(ProbeError::ProbeFailed {
                path: audio_path.display().to_string(),
            }
            .into());
        }
        info!("   Audio: {} ({:.1}s)", audio_path.display(), audio_duration);

        let mut video_paths = workset::find_videos(video_dir)?;
        if self.config.assembly.shuffle {
            video_paths.shuffle(&mut thread_rng());
        }

        // Probe durations, dropping empty or unreadable clips
        let mut candidates = Vec::new();
        for path in &video_paths {
            let duration = self.prober.duration_secs(path).await;
            if duration > TINY_SECS {
                candidates.push(CandidateClip::new(path.clone(), duration));
            } else {
                debug!("Excluding zero-length or unreadable clip {:?}", path);
            }
        }

        let plan = plan_assembly(audio_duration, &candidates)?;
        info!(
            "   Plan: {} entries covering {:.1}s",
            plan.len(),
            plan.total_use_secs()
        );

        if self.config.assembly.prefer_lossless_concat {
            let candidate_paths: Vec<PathBuf> =
                candidates.iter().map(|c| c.path.clone()).collect();
            let checker = CompatibilityChecker::new(self.prober.clone());
            let verdict = checker.check(&candidate_paths).await;

            if verdict.safe {
                info!("   Stream parameters match; using lossless concat");
                return self.lossless_concat(&plan, &audio_path, output_path).await;
            }
            info!("   Falling back to re-encode (concat not safe): {}", verdict.reason);
        }

        self.reencode_concat(&plan, &candidates, &audio_path, output_path).await
    }

    /// Concat demuxer + stream copy, then mux the audio
    ///
    /// The demuxer cannot trim mid-file, so whole files are listed and
    /// the overshoot (< one clip) is cut by `-shortest` at mux time.
    async fn lossless_concat(
        &self,
        plan: &AssemblyPlan,
        audio_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        let scratch = tempfile::tempdir()?;
        let manifest_path = scratch.path().join("list.txt");

        let mut manifest = std::fs::File::create(&manifest_path)?;
        for entry in &plan.entries {
            writeln!(manifest, "{}", manifest_line(&entry.path))?;
        }
        drop(manifest);

        let concat_out = scratch.path().join("concat.mp4");
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
                "copy".into(),
                "-an".into(),
                concat_out.display().to_string(),
            ])
            .await?;

        let enc = &self.config.encode;
        self.tool
            .run_ffmpeg(vec![
                "-y".into(),
                "-i".into(),
                concat_out.display().to_string(),
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

        info!("🎉 Assembly complete: {:?}", output_path);
        Ok(())
    }

    /// Single-command re-encode through the concat filter
    ///
    /// Honors each plan entry's usable duration with an input-level
    /// `-t` trim and normalizes every input to the reference clip's
    /// geometry; this path exists precisely because the inputs don't
    /// share parameters.
    async fn reencode_concat(
        &self,
        plan: &AssemblyPlan,
        candidates: &[CandidateClip],
        audio_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        let reference = self.reference_stream(candidates).await?;
        let graph = build_assembly_concat_graph(
            plan.len(),
            reference.width,
            reference.height,
            self.config.assembly.fps,
        )?;

        let mut args: Vec<String> = vec!["-y".into()];
        for entry in &plan.entries {
            if entry.use_secs < entry.full_secs - TINY_SECS {
                args.push("-t".into());
                args.push(format!("{:.3}", entry.use_secs));
            }
            args.push("-i".into());
            args.push(entry.path.display().to_string());
        }
        args.push("-i".into());
        args.push(audio_path.display().to_string());

        let audio_index = plan.len();
        let enc = &self.config.encode;
        args.extend([
            "-filter_complex".into(),
            graph.render(),
            "-map".into(),
            "[outv]".into(),
            "-map".into(),
            format!("{}:a:0", audio_index),
            "-c:v".into(),
            enc.video_codec.clone(),
            "-preset".into(),
            enc.preset.clone(),
            "-crf".into(),
            enc.crf.to_string(),
            "-pix_fmt".into(),
            enc.pixel_format.clone(),
            "-c:a".into(),
            enc.audio_codec.clone(),
            "-b:a".into(),
            enc.audio_bitrate.clone(),
            "-shortest".into(),
            "-threads".into(),
            enc.threads.to_string(),
            output_path.display().to_string(),
        ]);

        self.tool.run_ffmpeg(args).await?;

        info!("🎉 Assembly complete (re-encoded): {:?}", output_path);
        Ok(())
    }

    /// First candidate with a readable video stream sets the geometry
    async fn reference_stream(&self, candidates: &[CandidateClip]) -> Result<StreamDescriptor> {
        for candidate in candidates {
            if let Some(stream) = self.prober.video_stream(&candidate.path).await {
                return Ok(stream);
            }
        }

        Err(BatchError::OutputFailed {
            reason: "No candidate clip has a readable video stream".to_string(),
        }
        .into())
    }
}

/// One concat-demuxer manifest line
///
/// The manifest is the single place where paths pass through a quoted
/// string; single quotes are escaped as `'\''`.
pub(crate) fn manifest_line(path: &Path) -> String {
    let escaped = path.display().to_string().replace('\'', "'\\''");
    format!("file '{}'", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_line_quotes_path() {
        assert_eq!(
            manifest_line(Path::new("/videos/clip one.mp4")),
            "file '/videos/clip one.mp4'"
        );
    }

    #[test]
    fn test_manifest_line_escapes_single_quotes() {
        assert_eq!(
            manifest_line(Path::new("/videos/it's.mp4")),
            r"file '/videos/it'\''s.mp4'"
        );
    }
}
