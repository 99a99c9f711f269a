//! Error types for codec and scan operations.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while encoding, decoding or assembling point clouds.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Coarse classification of a [`CodecError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Format,
    NotFound,
    Io,
}

pub type Result<T> = std::result::Result<T, CodecError>;

impl CodecError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        CodecError::Format(msg.into())
    }

    /// Returns the error class callers can dispatch on.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::Format(_) => ErrorKind::Format,
            CodecError::NotFound(_) => ErrorKind::NotFound,
            CodecError::Io(_) => ErrorKind::Io,
            CodecError::Image(image::ImageError::IoError(e))
                if e.kind() == io::ErrorKind::NotFound =>
            {
                ErrorKind::NotFound
            }
            CodecError::Image(_) => ErrorKind::Io,
        }
    }

    /// Converts an error raised while opening or creating `path`, turning
    /// `NotFound` into [`CodecError::NotFound`].
    pub(crate) fn from_open(err: io::Error, path: &Path) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            CodecError::NotFound(path.to_path_buf())
        } else {
            CodecError::Io(err)
        }
    }

    /// Converts an error raised while decoding a body. A short read means the
    /// declared point count promised more bytes than the file holds.
    pub(crate) fn from_decode(err: io::Error, what: &str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            CodecError::Format(format!("truncated file while reading {}", what))
        } else {
            CodecError::Io(err)
        }
    }
}
