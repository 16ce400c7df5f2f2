//! Catalog Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Absent data is never an error here: a missing book is `None`, an empty
//! selector result is an empty `Vec`, and an unreadable book directory just
//! means no download links. What remains is a failing store, which must
//! reach the caller instead of producing a half-rendered feed.

use derive_more::{Display, Error};

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The library database could not answer a query.
    #[display("library store failure")]
    Store,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store => false,
        }
    }
}
