//! Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
/// Absent rows are never an error: lookups return `Option` or an empty `Vec`.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The database could not be opened or a query failed to execute.
    #[display("database error")]
    Database,
    /// A row was read but one of its columns holds a value we can't use.
    #[display("invalid library data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Every read is single-attempt; a failed query means the collaborator
        // is down or the library is corrupt, neither of which a retry fixes.
        false
    }
}
