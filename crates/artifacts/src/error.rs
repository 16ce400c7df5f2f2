//! Artifact Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! None of these escape a catalog request: [`scan`](crate::scan) recovers
//! from all of them by reporting an empty discovery. They exist so the
//! recovery can log *why* a book has no files.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// An artifact error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for artifact operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Book directory does not exist
    #[display("directory not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Access denied
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Path contains invalid characters or escapes the library root
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// Format code that can't be used as a file extension
    #[display("invalid format code: {_0:?}")]
    InvalidFormat(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
