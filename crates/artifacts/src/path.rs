//! Book directory resolution.
//!
//! Calibre stores each book's directory relative to the library root
//! (`Author Name/Title (42)`). That value comes out of the database, so it
//! is treated as untrusted input before it is joined onto the root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Normalizes a library-relative path, refusing anything that would leave
/// the library root.
///
/// `.` components and redundant separators disappear, and `..` is resolved
/// against the components seen so far. Absolute paths, Windows prefixes and
/// null bytes are rejected outright, as is a path that normalizes to nothing.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use libris_artifacts::normalize_relative;
/// assert_eq!(
///     normalize_relative("Frank Herbert/./Dune (1)/").unwrap(),
///     Path::new("Frank Herbert/Dune (1)")
/// );
/// assert!(normalize_relative("Frank Herbert/../../etc").is_err());
/// assert!(normalize_relative("/etc/passwd").is_err());
/// ```
pub fn normalize_relative(relative: impl AsRef<Path>) -> Result<PathBuf> {
    let relative = relative.as_ref();
    let invalid = || ErrorKind::InvalidPath(relative.to_path_buf());
    let mut components = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                // Null bytes survive Path::components() on Unix but truncate
                // the path once it reaches a syscall.
                if part.as_encoded_bytes().contains(&0) {
                    exn::bail!(invalid());
                }
                components.push(part);
            },
            Component::CurDir => {},
            Component::RootDir | Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(invalid());
    }
    Ok(components.into_iter().collect())
}

/// Absolute (or root-relative) directory of a book: `root` joined with the
/// normalized relative path.
pub fn book_dir(root: impl AsRef<Path>, relative: impl AsRef<Path>) -> Result<PathBuf> {
    Ok(root.as_ref().join(normalize_relative(relative)?))
}
