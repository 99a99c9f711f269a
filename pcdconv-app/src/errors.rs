//! Error types for command execution.

use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Codec(#[from] pcdconv_data::CodecError),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{} has no parent directory", .0.display())]
    NoParentDirectory(std::path::PathBuf),
}
