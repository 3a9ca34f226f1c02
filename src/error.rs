use thiserror::Error;

/// Main error type for the Clipsmith library
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Probing error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    #[error("Filter graph error: {0}")]
    Filter(#[from] FilterError),

    #[error("Batch processing error: {0}")]
    Batch(#[from] BatchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Errors raised while locating or querying the external media tools
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("External tool not available: {tool}")]
    ToolMissing { tool: String },

    #[error("Probing failed for: {path}")]
    ProbeFailed { path: String },
}

/// Clip-assembly planning errors
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("No usable input: every candidate clip is zero-length or unreadable")]
    NoUsableInput,

    #[error("Target duration must be positive, got {seconds}")]
    InvalidTarget { seconds: f64 },
}

/// Filter graph construction errors
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Filter stage reads label [{label}] before it is defined")]
    UndefinedLabel { label: String },

    #[error("Filter graph defines label [{label}] twice")]
    DuplicateLabel { label: String },

    #[error("Filter graph has no stages")]
    EmptyGraph,
}

/// Batch driver errors
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("No video files found in: {path}")]
    NoVideosFound { path: String },

    #[error("No image files found in: {path}")]
    NoImagesFound { path: String },

    #[error("No audio file found in: {path}")]
    NoAudioFound { path: String },

    #[error("Encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Output generation failed: {reason}")]
    OutputFailed { reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using EditorError
pub type Result<T> = std::result::Result<T, EditorError>;
