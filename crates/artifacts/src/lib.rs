//! Discovery of the files that sit next to a book in a Calibre library.
//!
//! Each book owns one directory. Scanning it yields a [`Discovery`]: the
//! cover images and one file per known format. Turning that into links, or
//! into a format map, is left to the caller.

pub mod error;
mod format;
mod path;
mod scan;

pub use crate::format::FormatTable;
pub use crate::path::{book_dir, normalize_relative};
pub use crate::scan::{Artifact, ArtifactKind, Discovery, scan, scan_book, try_scan};
