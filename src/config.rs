use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    filter::{Orientation, WatermarkCorner},
};

/// Main configuration for Clipsmith
///
/// One section per pipeline plus the shared encoder settings. The caller
/// passes this struct explicitly; there is no module-level shared state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Shared encoder settings for every re-encoding pipeline
    pub encode: EncodeConfig,

    /// Crop / slow-down / watermark pipeline settings
    pub edit: EditConfig,

    /// Watermark stamping settings
    pub watermark: WatermarkConfig,

    /// Looping overlay compositing settings
    pub overlay: OverlayConfig,

    /// Clip repetition settings
    pub multiply: MultiplyConfig,

    /// Audio-length-matched assembly settings
    pub assembly: AssemblyConfig,

    /// Ken-Burns slideshow settings
    pub slideshow: SlideshowConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            encode: EncodeConfig::default(),
            edit: EditConfig::default(),
            watermark: WatermarkConfig::default(),
            overlay: OverlayConfig::default(),
            multiply: MultiplyConfig::default(),
            assembly: AssemblyConfig::default(),
            slideshow: SlideshowConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.encode.validate()?;
        self.edit.validate()?;
        self.watermark.validate()?;
        self.multiply.validate()?;
        self.assembly.validate()?;
        self.slideshow.validate()?;
        Ok(())
    }
}

/// Shared encoder settings
///
/// Every pipeline that re-encodes uses the same codec/preset/bitrate
/// block; the encoder's internal thread count is an opaque knob passed
/// straight through as `-threads`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeConfig {
    /// Output video codec
    pub video_codec: String,

    /// Encoder preset
    pub preset: String,

    /// Constant rate factor (0-51, lower is better)
    pub crf: u8,

    /// Output audio codec
    pub audio_codec: String,

    /// Output audio bitrate
    pub audio_bitrate: String,

    /// Output pixel format
    pub pixel_format: String,

    /// Encoder thread count
    pub threads: usize,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "fast".to_string(),
            crf: 23,
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            pixel_format: "yuv420p".to_string(),
            threads: num_cpus::get(),
        }
    }
}

impl EncodeConfig {
    fn validate(&self) -> Result<()> {
        if self.crf > 51 {
            return Err(ConfigError::InvalidValue {
                key: "encode.crf".to_string(),
                value: self.crf.to_string()
            }.into());
        }

        if self.threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "encode.threads".to_string(),
                value: self.threads.to_string()
            }.into());
        }

        if self.video_codec.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "encode.video_codec".to_string(),
                value: self.video_codec.clone()
            }.into());
        }

        Ok(())
    }
}

/// Crop / slow-down pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditConfig {
    /// Pixels to crop from the top of the frame
    pub remove_top: u32,

    /// Pixels to crop from the bottom of the frame
    pub remove_bottom: u32,

    /// Orientation policy for the crop/pad decision
    pub orientation: Orientation,

    /// Slow the footage down
    pub slow_down: bool,

    /// Presentation timestamp multiplier (2.0 = half speed)
    pub slow_down_factor: f64,

    /// Mux a random background music track into each output
    pub add_music: bool,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            remove_top: 50,
            remove_bottom: 0,
            orientation: Orientation::Auto,
            slow_down: true,
            slow_down_factor: 2.0,
            add_music: true,
        }
    }
}

impl EditConfig {
    fn validate(&self) -> Result<()> {
        if self.slow_down && self.slow_down_factor <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "edit.slow_down_factor".to_string(),
                value: self.slow_down_factor.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Watermark stamping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkConfig {
    /// Stamp the watermark onto each output
    pub enabled: bool,

    /// Path to the watermark image
    pub image: PathBuf,

    /// Which corner to anchor the watermark to
    pub position: WatermarkCorner,

    /// Watermark height relative to the source frame height
    pub scale: f64,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            image: PathBuf::from("logo.png"),
            position: WatermarkCorner::BottomRight,
            scale: 0.2,
        }
    }
}

impl WatermarkConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.scale) || self.scale == 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "watermark.scale".to_string(),
                value: self.scale.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Looping overlay compositing configuration
///
/// Each listed source that exists on disk is looped and composited atop
/// the footage in order; missing sources are skipped with a warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Overlay sources, composited bottom-up in list order
    pub sources: Vec<PathBuf>,

    /// Top-left placement of every overlay (x, y)
    pub position: (i64, i64),
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            sources: vec![
                PathBuf::from("overlays/petals.gif"),
                PathBuf::from("overlays/sparkles.gif"),
            ],
            position: (0, 0),
        }
    }
}

/// Clip repetition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiplyConfig {
    /// How many times to play each clip back to back
    pub repeat_factor: u32,
}

impl Default for MultiplyConfig {
    fn default() -> Self {
        Self { repeat_factor: 2 }
    }
}

impl MultiplyConfig {
    fn validate(&self) -> Result<()> {
        if self.repeat_factor < 2 {
            return Err(ConfigError::InvalidValue {
                key: "multiply.repeat_factor".to_string(),
                value: self.repeat_factor.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Audio-length-matched assembly configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Output frame rate for the re-encode fallback path
    pub fps: u32,

    /// Shuffle the candidate clips before planning
    pub shuffle: bool,

    /// Use lossless stream-copy concatenation when the clips allow it
    pub prefer_lossless_concat: bool,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            shuffle: true,
            prefer_lossless_concat: true,
        }
    }
}

impl AssemblyConfig {
    fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(ConfigError::InvalidValue {
                key: "assembly.fps".to_string(),
                value: self.fps.to_string()
            }.into());
        }

        Ok(())
    }
}

/// Ken-Burns slideshow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideshowConfig {
    /// Output canvas width
    pub width: u32,

    /// Output canvas height
    pub height: u32,

    /// Seconds of video per still image
    pub per_image_secs: f64,

    /// Zoom factor at the start of each clip
    pub zoom_start: f64,

    /// Zoom factor at the end of each clip
    pub zoom_end: f64,

    /// Output frame rate
    pub fps: u32,
}

impl Default for SlideshowConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            per_image_secs: 10.0,
            zoom_start: 1.05,
            zoom_end: 1.15,
            fps: 30,
        }
    }
}

impl SlideshowConfig {
    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidValue {
                key: "slideshow.canvas".to_string(),
                value: format!("{}x{}", self.width, self.height)
            }.into());
        }

        if self.per_image_secs <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "slideshow.per_image_secs".to_string(),
                value: self.per_image_secs.to_string()
            }.into());
        }

        if self.zoom_start <= 0.0 || self.zoom_end <= 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "slideshow.zoom_range".to_string(),
                value: format!("{}-{}", self.zoom_start, self.zoom_end)
            }.into());
        }

        if self.fps == 0 {
            return Err(ConfigError::InvalidValue {
                key: "slideshow.fps".to_string(),
                value: self.fps.to_string()
            }.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let original_config = Config::default();

        // Save and load
        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config.edit.remove_top, loaded_config.edit.remove_top);
        assert_eq!(original_config.slideshow.fps, loaded_config.slideshow.fps);
        assert_eq!(original_config.encode.video_codec, loaded_config.encode.video_codec);
    }

    #[test]
    fn test_invalid_crf() {
        let mut config = Config::default();
        config.encode.crf = 52;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_slow_down_factor() {
        let mut config = Config::default();
        config.edit.slow_down = true;
        config.edit.slow_down_factor = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_watermark_scale() {
        let mut config = Config::default();
        config.watermark.scale = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_repeat_factor() {
        let mut config = Config::default();
        config.multiply.repeat_factor = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let result = Config::from_file("definitely_not_here.toml");
        assert!(result.is_err());
    }
}
