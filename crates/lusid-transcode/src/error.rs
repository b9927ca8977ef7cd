//! Error types for transcoder output

use thiserror::Error;

/// Transcoder error types
#[derive(Error, Debug)]
pub enum TranscodeError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Output could not be serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for transcoder operations
pub type TranscodeResult<T> = Result<T, TranscodeError>;
