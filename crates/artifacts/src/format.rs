//! Known downloadable formats.

use std::collections::BTreeMap;

use crate::error::{ErrorKind, Result};

/// Extension to mime type table used to classify book files.
///
/// Format codes are stored lowercase and matched case-insensitively, so
/// `NOVEL.EPUB` and `novel.epub` are both the `epub` format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatTable {
    formats: BTreeMap<String, String>,
}

impl Default for FormatTable {
    fn default() -> Self {
        Self {
            formats: [
                ("epub", "application/epub+zip"),
                ("mobi", "application/x-mobipocket-ebook"),
                ("pdf", "application/pdf"),
            ]
            .into_iter()
            .map(|(code, mime)| (code.to_string(), mime.to_string()))
            .collect(),
        }
    }
}

impl FormatTable {
    /// An empty table: nothing is downloadable until formats are inserted.
    pub fn empty() -> Self {
        Self { formats: BTreeMap::new() }
    }

    /// Registers (or overrides) a format.
    ///
    /// The code must be a non-empty ASCII alphanumeric extension without the
    /// leading dot.
    pub fn insert(&mut self, code: impl AsRef<str>, mime: impl Into<String>) -> Result<()> {
        let code = code.as_ref();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            exn::bail!(ErrorKind::InvalidFormat(code.to_string()));
        }
        self.formats.insert(code.to_ascii_lowercase(), mime.into());
        Ok(())
    }

    pub fn with(mut self, code: impl AsRef<str>, mime: impl Into<String>) -> Result<Self> {
        self.insert(code, mime)?;
        Ok(self)
    }

    /// Mime type of a format code.
    pub fn mime(&self, code: &str) -> Option<&str> {
        self.formats.get(&code.to_ascii_lowercase()).map(String::as_str)
    }

    /// The canonical (lowercase) code for a file extension, if it is a known format.
    pub(crate) fn code_for(&self, extension: &str) -> Option<&str> {
        self.formats.get_key_value(&extension.to_ascii_lowercase()).map(|(code, _)| code.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.formats.iter().map(|(code, mime)| (code.as_str(), mime.as_str()))
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}
