//! One-directory artifact discovery.

use std::collections::BTreeMap;
use std::path::Path;

use tokio::fs;

use crate::error::{ErrorKind, Result};
use crate::format::FormatTable;
use crate::path::book_dir;

const COVER_EXTENSION: &str = "jpg";

/// What a discovered file is for.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ArtifactKind {
    /// A `*.jpg` file in the book directory.
    Cover,
    /// A downloadable file, identified by its lowercase format code.
    Format(String),
}

/// A classified file in a book directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// Bare file name, relative to the book directory.
    pub file_name: String,
}

/// Result of scanning one book directory.
///
/// Artifacts are ordered by file name. There is at most one artifact per
/// format code: when a directory holds several files of the same format,
/// the first by name wins. Every cover file is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    artifacts: Vec<Artifact>,
}

impl Discovery {
    /// Builds a discovery from already-classified artifacts, applying the
    /// same ordering and per-format deduplication as [`scan`].
    pub fn from_artifacts(artifacts: impl IntoIterator<Item = Artifact>) -> Self {
        let mut artifacts = artifacts.into_iter().collect::<Vec<_>>();
        artifacts.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        let mut seen = Vec::<String>::new();
        artifacts.retain(|artifact| match &artifact.kind {
            ArtifactKind::Cover => true,
            ArtifactKind::Format(code) if seen.contains(code) => false,
            ArtifactKind::Format(code) => {
                seen.push(code.clone());
                true
            },
        });
        Self { artifacts }
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn covers(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter().filter(|a| a.kind == ArtifactKind::Cover)
    }

    /// File name of the given format, matched case-insensitively.
    pub fn file_for(&self, code: &str) -> Option<&str> {
        self.artifacts.iter().find_map(|artifact| match &artifact.kind {
            ArtifactKind::Format(found) if found.eq_ignore_ascii_case(code) => Some(artifact.file_name.as_str()),
            _ => None,
        })
    }

    /// Format code to file name, for every downloadable format found.
    pub fn formats(&self) -> BTreeMap<String, String> {
        self.artifacts
            .iter()
            .filter_map(|artifact| match &artifact.kind {
                ArtifactKind::Format(code) => Some((code.clone(), artifact.file_name.clone())),
                ArtifactKind::Cover => None,
            })
            .collect()
    }
}

/// Scans a book directory given the library root and the book's relative
/// path.
///
/// Never fails: an unsafe relative path, a missing directory or an
/// unreadable one all produce an empty [`Discovery`] and a warning.
pub async fn scan_book(root: &Path, relative: &Path, formats: &FormatTable) -> Discovery {
    match book_dir(root, relative) {
        Ok(dir) => scan(&dir, formats).await,
        Err(err) => {
            tracing::warn!(relative = %relative.display(), error = %err, "refusing to scan book directory");
            Discovery::default()
        },
    }
}

/// Scans a directory, degrading any failure to an empty [`Discovery`].
pub async fn scan(dir: &Path, formats: &FormatTable) -> Discovery {
    match try_scan(dir, formats).await {
        Ok(discovery) => {
            tracing::debug!(dir = %dir.display(), found = discovery.artifacts.len(), "scanned book directory");
            discovery
        },
        Err(err) => {
            tracing::warn!(dir = %dir.display(), error = %err, "book directory unavailable, no artifacts");
            Discovery::default()
        },
    }
}

/// Scans a directory, reporting why it could not be read.
pub async fn try_scan(dir: &Path, formats: &FormatTable) -> Result<Discovery> {
    let mut entries = fs::read_dir(dir).await.map_err(|e| map_io_error(e, dir))?;
    let mut artifacts = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| map_io_error(e, dir))? {
        let path = entry.path();
        // Follows symlinks; broken links and subdirectories are skipped.
        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {},
            _ => continue,
        }
        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::debug!(path = %path.display(), "skipping non UTF-8 file name");
            continue;
        };
        if let Some(kind) = classify(&file_name, formats) {
            artifacts.push(Artifact { kind, file_name });
        }
    }
    Ok(Discovery::from_artifacts(artifacts))
}

fn classify(file_name: &str, formats: &FormatTable) -> Option<ArtifactKind> {
    let extension = Path::new(file_name).extension()?.to_str()?;
    if extension.eq_ignore_ascii_case(COVER_EXTENSION) {
        return Some(ArtifactKind::Cover);
    }
    formats.code_for(extension).map(|code| ArtifactKind::Format(code.to_string()))
}

fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
    match e.kind() {
        std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
        std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
        _ => ErrorKind::Io(e),
    }
}
