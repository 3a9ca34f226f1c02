//! # Media Introspection Module
//!
//! Wraps the external FFmpeg/FFprobe tools: locating them, running them,
//! probing clip metadata, and deciding whether a set of clips can be
//! concatenated without re-encoding.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use clipsmith::media::{FfmpegTool, Prober};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let tool = FfmpegTool::detect().await?;
//! let prober = Prober::new(tool);
//!
//! if let Some(desc) = prober.describe("clip.mp4".as_ref()).await {
//!     let stream = &desc.stream;
//!     println!("{}x{} @ {:.2} fps", stream.width, stream.height, stream.frame_rate);
//! }
//! # Ok(())
//! # }
//! ```

pub mod compat;
pub mod probe;
pub mod tool;

pub use compat::{CompatibilityChecker, CompatibilityVerdict};
pub use probe::{ClipDescriptor, Prober, StreamDescriptor};
pub use tool::FfmpegTool;
