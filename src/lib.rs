//! # Clipsmith
//!
//! Batch transformation of short video clips: cropping, slow-motion,
//! watermarking, overlay compositing, music muxing, concatenation to
//! match an audio track, and Ken-Burns-style photo-to-video animation.
//!
//! Every heavy-lifting operation is delegated to FFmpeg invoked as a
//! subprocess; this crate's job is to assemble filter graphs, plan clip
//! sequences, and manage input/output folders.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clipsmith::{
//!     config::Config,
//!     media::FfmpegTool,
//!     pipeline::AssemblePipeline,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let tool = FfmpegTool::detect().await?;
//! let pipeline = AssemblePipeline::new(tool, Config::default());
//!
//! pipeline.run(
//!     "clips/".as_ref(),
//!     "audio/".as_ref(),
//!     "out/final_video.mp4".as_ref(),
//! ).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`media`] - FFmpeg/FFprobe invocation, metadata probing, and the
//!   lossless-concatenation compatibility check
//! - [`plan`] - the clip-assembly planner matching clips to an audio
//!   track's duration
//! - [`filter`] - typed filter-graph construction and validation
//! - [`kenburns`] - the pure pan/zoom animator for still images
//! - [`pipeline`] - the batch drivers tying it all together
//! - [`config`] - configuration management

pub mod config;
pub mod error;
pub mod filter;
pub mod kenburns;
pub mod media;
pub mod pipeline;
pub mod plan;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    error::{EditorError, Result},
    media::{FfmpegTool, Prober},
    plan::{plan_assembly, AssemblyPlan},
};
