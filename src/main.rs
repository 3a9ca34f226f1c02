use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber;

use clipsmith::{
    config::Config,
    filter::{Orientation, WatermarkCorner},
    media::FfmpegTool,
    pipeline::{
        AssemblePipeline, EditPipeline, MultiplyPipeline, OverlayPipeline, SlideshowPipeline,
    },
};

#[derive(Parser)]
#[command(
    name = "clipsmith",
    version,
    about = "Batch transformation of short video clips via FFmpeg",
    long_about = "Clipsmith batch-processes folders of clips and images: cropping, slow-motion, \
                  watermarking, overlay compositing, music muxing, audio-length-matched \
                  concatenation, and Ken-Burns photo animation."
)]
struct Cli {
    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crop, slow down, watermark and add music to every clip in a folder
    Edit {
        /// Folder of source clips
        #[arg(short, long)]
        input: PathBuf,

        /// Folder for processed clips (cleared first)
        #[arg(short, long)]
        output: PathBuf,

        /// Folder of background music candidates
        #[arg(short, long)]
        music_dir: Option<PathBuf>,

        /// Orientation policy: auto, portrait or landscape
        #[arg(long, default_value = "auto")]
        orientation: String,

        /// Pixels to crop from the top
        #[arg(long)]
        top: Option<u32>,

        /// Pixels to crop from the bottom
        #[arg(long)]
        bottom: Option<u32>,

        /// Slow-down factor; 0 disables slow-down
        #[arg(long)]
        slow_factor: Option<f64>,

        /// Watermark corner (top-left, top-right, bottom-left,
        /// bottom-right) or "none"
        #[arg(long)]
        watermark_position: Option<String>,
    },

    /// Composite looping overlays onto every clip in a folder
    Overlay {
        /// Folder of source clips
        #[arg(short, long)]
        input: PathBuf,

        /// Folder for processed clips (cleared first)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Repeat every clip in a folder back to back
    Multiply {
        /// Folder of source clips
        #[arg(short, long)]
        input: PathBuf,

        /// Folder for processed clips (cleared first)
        #[arg(short, long)]
        output: PathBuf,

        /// Repeat factor
        #[arg(short, long)]
        factor: Option<u32>,
    },

    /// Concatenate clips to the length of an audio track
    Assemble {
        /// Folder of candidate clips
        #[arg(long)]
        videos: PathBuf,

        /// Folder holding the audio track (first sorted match wins)
        #[arg(long)]
        audio: PathBuf,

        /// Output video path (its folder is cleared first)
        #[arg(short, long)]
        output: PathBuf,

        /// Keep the candidate clips in sorted order
        #[arg(long)]
        no_shuffle: bool,
    },

    /// Animate still images into a slideshow matched to an audio track
    Slideshow {
        /// Folder of images
        #[arg(long)]
        images: PathBuf,

        /// Folder holding the audio track
        #[arg(long)]
        audio: PathBuf,

        /// Output video path (its folder is cleared first)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Export one silent Ken-Burns clip per image
    KbClips {
        /// Folder of images (rendered sources are consumed)
        #[arg(long)]
        images: PathBuf,

        /// Folder for the clips (cleared first)
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn parse_orientation(value: &str) -> Result<Orientation> {
    match value {
        "auto" => Ok(Orientation::Auto),
        "portrait" => Ok(Orientation::Portrait),
        "landscape" => Ok(Orientation::Landscape),
        other => Err(anyhow::anyhow!("Unknown orientation: {}", other)),
    }
}

fn parse_watermark_position(value: &str) -> Result<Option<WatermarkCorner>> {
    match value {
        "none" => Ok(None),
        "top-left" => Ok(Some(WatermarkCorner::TopLeft)),
        "top-right" => Ok(Some(WatermarkCorner::TopRight)),
        "bottom-left" => Ok(Some(WatermarkCorner::BottomLeft)),
        "bottom-right" => Ok(Some(WatermarkCorner::BottomRight)),
        other => Err(anyhow::anyhow!("Unknown watermark position: {}", other)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting Clipsmith v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };

    let tool = FfmpegTool::detect().await?;

    match cli.command {
        Command::Edit {
            input,
            output,
            music_dir,
            orientation,
            top,
            bottom,
            slow_factor,
            watermark_position,
        } => {
            config.edit.orientation = parse_orientation(&orientation)?;
            if let Some(top) = top {
                config.edit.remove_top = top;
            }
            if let Some(bottom) = bottom {
                config.edit.remove_bottom = bottom;
            }
            if let Some(factor) = slow_factor {
                // A zero factor means "don't slow down", mirroring the
                // empty form field it replaces
                config.edit.slow_down = factor > 0.0;
                if factor > 0.0 {
                    config.edit.slow_down_factor = factor;
                }
            }
            if let Some(position) = watermark_position {
                match parse_watermark_position(&position)? {
                    Some(corner) => {
                        config.watermark.enabled = true;
                        config.watermark.position = corner;
                    }
                    None => config.watermark.enabled = false,
                }
            }
            config.edit.add_music = config.edit.add_music && music_dir.is_some();
            config.validate()?;

            let pipeline = EditPipeline::new(tool, config);
            pipeline.run(&input, &output, music_dir.as_deref()).await?;
        }

        Command::Overlay { input, output } => {
            config.validate()?;
            let pipeline = OverlayPipeline::new(tool, config);
            pipeline.run(&input, &output).await?;
        }

        Command::Multiply { input, output, factor } => {
            if let Some(factor) = factor {
                config.multiply.repeat_factor = factor;
            }
            config.validate()?;
            let pipeline = MultiplyPipeline::new(tool, config);
            pipeline.run(&input, &output).await?;
        }

        Command::Assemble { videos, audio, output, no_shuffle } => {
            if no_shuffle {
                config.assembly.shuffle = false;
            }
            config.validate()?;
            let pipeline = AssemblePipeline::new(tool, config);
            pipeline.run(&videos, &audio, &output).await?;
        }

        Command::Slideshow { images, audio, output } => {
            config.validate()?;
            let pipeline = SlideshowPipeline::new(tool, config);
            pipeline.run(&images, &audio, &output).await?;
        }

        Command::KbClips { images, output } => {
            config.validate()?;
            let pipeline = SlideshowPipeline::new(tool, config);
            pipeline.export_clips(&images, &output).await?;
        }
    }

    info!("Done");
    Ok(())
}
