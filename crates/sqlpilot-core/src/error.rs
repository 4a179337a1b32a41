//! Error types shared by the prompt context.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or populating the prompt context.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The referenced document does not exist on disk.
    #[error("file missing: {}", .0.display())]
    FileNotFound(PathBuf),

    /// The document exists but could not be read.
    #[error("unable to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document was read but is not valid JSON.
    #[error("unable to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    Validation(String),
}
