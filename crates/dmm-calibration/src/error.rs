//! Error types for calibration loading

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a calibration document
///
/// These never reach the decoder. The store logs them and keeps whatever
/// table it already had.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// No source had a document by this name
    #[error("calibration document not found: {0}")]
    NotFound(String),

    /// Document is not valid JSON
    #[error("invalid calibration document {name}: {source}")]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Document parsed but has no `"OL"` object
    #[error("calibration document {0} has no \"OL\" table")]
    MissingTable(String),

    /// I/O error reading a document from disk
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
