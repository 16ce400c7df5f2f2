//! Request-independent catalog settings.

use libris_artifacts::FormatTable;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_RECENT_LIMIT: u32 = 50;
pub const DEFAULT_OPDS_THUMBNAIL_HEIGHT: u32 = 50;
pub const DEFAULT_HTML_THUMBNAIL_HEIGHT: u32 = 225;
pub const DEFAULT_FETCH_ENDPOINT: &str = "fetch";

/// How links to book files are addressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LinkMode {
    /// [`Fetch`](Self::Fetch) when the library root is absolute, otherwise
    /// [`Direct`](Self::Direct).
    #[default]
    Auto,
    /// Indirect references resolved by a download handler:
    /// `{endpoint}?id=42&type=epub`.
    Fetch,
    /// The URL-encoded file path under the library root, for libraries the
    /// web server can serve as static files.
    Direct,
}
impl Display for LinkMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Fetch => "fetch",
            Self::Direct => "direct",
        })
    }
}
impl FromStr for LinkMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "fetch" => Ok(Self::Fetch),
            "direct" => Ok(Self::Direct),
            other => Err(format!("unknown link mode {other:?}")),
        }
    }
}

/// The addressing actually used once [`LinkMode::Auto`] is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    Fetch,
    Direct,
}

/// Who is asking for entries: it only decides the thumbnail height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Surface {
    /// An OPDS/Atom feed for e-reader clients.
    #[default]
    Opds,
    /// An HTML page for browsers.
    Html,
}

/// Everything the catalog needs to know about its environment.
///
/// Passed in explicitly; nothing in the catalog reads process state.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Library root, as configured. Whether it is absolute matters for
    /// [`LinkMode::Auto`].
    pub root: PathBuf,
    pub link_mode: LinkMode,
    /// Base of image, thumbnail and fetch-mode download links.
    pub fetch_endpoint: String,
    pub opds_thumbnail_height: u32,
    pub html_thumbnail_height: u32,
    /// Size of the "recent additions" list.
    pub recent_limit: u32,
    pub formats: FormatTable,
}

impl Options {
    /// Defaults for everything but the library root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            link_mode: LinkMode::default(),
            fetch_endpoint: DEFAULT_FETCH_ENDPOINT.to_string(),
            opds_thumbnail_height: DEFAULT_OPDS_THUMBNAIL_HEIGHT,
            html_thumbnail_height: DEFAULT_HTML_THUMBNAIL_HEIGHT,
            recent_limit: DEFAULT_RECENT_LIMIT,
            formats: FormatTable::default(),
        }
    }

    pub fn with_link_mode(mut self, mode: LinkMode) -> Self {
        self.link_mode = mode;
        self
    }

    pub fn with_fetch_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.fetch_endpoint = endpoint.into();
        self
    }

    pub fn with_recent_limit(mut self, limit: u32) -> Self {
        self.recent_limit = limit;
        self
    }

    pub fn with_thumbnail_heights(mut self, opds: u32, html: u32) -> Self {
        self.opds_thumbnail_height = opds;
        self.html_thumbnail_height = html;
        self
    }

    pub fn with_formats(mut self, formats: FormatTable) -> Self {
        self.formats = formats;
        self
    }

    pub fn addressing(&self) -> Addressing {
        match self.link_mode {
            LinkMode::Fetch => Addressing::Fetch,
            LinkMode::Direct => Addressing::Direct,
            LinkMode::Auto if self.root.is_absolute() => Addressing::Fetch,
            LinkMode::Auto => Addressing::Direct,
        }
    }

    pub fn thumbnail_height(&self, surface: Surface) -> u32 {
        match surface {
            Surface::Opds => self.opds_thumbnail_height,
            Surface::Html => self.html_thumbnail_height,
        }
    }
}
