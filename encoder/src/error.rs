use thiserror::Error;

/// Errors returned when converting an upload to canonical audio.
#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("transcode: empty upload")]
    EmptyUpload,

    #[error("transcode: converter not found: {0}")]
    ConverterNotFound(String),

    #[error("transcode: converter failed with status {status}: {stderr}")]
    ConverterFailed { status: i32, stderr: String },

    #[error("transcode: io error: {0}")]
    Io(String),

    #[error("transcode: produced no audio")]
    EmptyOutput,
}

/// Errors returned when extracting an embedding from canonical audio.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("extract: audio too short: need at least {min_bytes} bytes, got {got_bytes}")]
    AudioTooShort { min_bytes: usize, got_bytes: usize },

    #[error("extract: dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("extract: encoder failed: {0}")]
    Encoder(String),

    #[error("extract: io error: {0}")]
    Io(String),
}
