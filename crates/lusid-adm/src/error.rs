//! Error types for ADM import

use std::path::PathBuf;

use thiserror::Error;

/// ADM import error types
#[derive(Error, Debug)]
pub enum AdmError {
    /// Input file does not exist
    #[error("ADM file not found: {0}")]
    NotFound(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input is not well-formed XML
    #[error("XML error at byte {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    /// Structurally broken document (unbalanced tags, bad attributes)
    #[error("Malformed XML: {0}")]
    Malformed(String),

    /// Timecode not in `HH:MM:SS.fffff` form
    #[error("Cannot parse timecode '{0}'")]
    InvalidTimecode(String),

    /// Channel-activity report is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for ADM operations
pub type AdmResult<T> = Result<T, AdmError>;
