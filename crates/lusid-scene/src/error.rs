//! Error types for scene loading and time conversion

use std::path::PathBuf;

use thiserror::Error;

use crate::time::TimeUnit;

/// Scene error types
#[derive(Error, Debug)]
pub enum SceneError {
    /// Input file does not exist
    #[error("Scene file not found: {0}")]
    NotFound(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input is not syntactically valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Time unit string not in the alias table
    #[error("Unknown timeUnit '{0}' (expected one of: seconds, s, samples, samp, milliseconds, ms)")]
    UnknownTimeUnit(String),

    /// Time value cannot be converted to seconds
    #[error("Cannot convert {value} {unit} to seconds: {reason}")]
    TimeConversion {
        value: f64,
        unit: TimeUnit,
        reason: &'static str,
    },
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
