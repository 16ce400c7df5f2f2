//! Typed links and the pure link rendering pass.
//!
//! Rendering never touches the store or the filesystem: it takes what the
//! [`Book`](crate::Book) has already resolved (associations and the
//! [`Discovery`] of its directory) and lays out the links in a fixed order:
//! artifact links in file name order, then one related link per author, then
//! the series link.

use crate::locale::{Localize, keys};
use crate::options::{Addressing, Options, Surface};
use crate::page::Navigable;
use libris_artifacts::{ArtifactKind, Discovery};
use libris_store::{Author, Id, Series};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::path::Path;

pub const JPEG: &str = "image/jpeg";
pub const NAVIGATION: &str = "application/atom+xml;profile=opds-catalog;kind=navigation";
const DOWNLOAD: &str = "Download";
const OCTET_STREAM: &str = "application/octet-stream";

/// Characters left alone when a file path becomes a direct link: unreserved
/// characters and the path separator.
const DIRECT_PATH: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~').remove(b'/');

/// The semantic role of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Relation {
    #[cfg_attr(feature = "serde", serde(rename = "http://opds-spec.org/image"))]
    Image,
    #[cfg_attr(feature = "serde", serde(rename = "http://opds-spec.org/image/thumbnail"))]
    Thumbnail,
    #[cfg_attr(feature = "serde", serde(rename = "http://opds-spec.org/acquisition"))]
    Acquisition,
    #[cfg_attr(feature = "serde", serde(rename = "related"))]
    Related,
    #[cfg_attr(feature = "serde", serde(rename = "subsection"))]
    Subsection,
}
impl Relation {
    /// The `rel` attribute value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "http://opds-spec.org/image",
            Self::Thumbnail => "http://opds-spec.org/image/thumbnail",
            Self::Acquisition => "http://opds-spec.org/acquisition",
            Self::Related => "related",
            Self::Subsection => "subsection",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Link {
    pub href: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub mime_type: String,
    #[cfg_attr(feature = "serde", serde(rename = "rel"))]
    pub relation: Relation,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub title: Option<String>,
}
impl Link {
    pub fn new(href: impl Into<String>, mime_type: impl Into<String>, relation: Relation) -> Self {
        Self {
            href: href.into(),
            mime_type: mime_type.into(),
            relation,
            title: None,
        }
    }

    /// A link to another catalog page.
    pub fn navigation(href: impl Into<String>, relation: Relation) -> Self {
        Self::new(href, NAVIGATION, relation)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// What link rendering needs to know about one book.
#[derive(Debug, Clone, Copy)]
pub struct BookLinks<'a> {
    pub id: Id,
    /// The book directory under the library root.
    pub dir: &'a Path,
    pub series_index: f64,
    pub discovery: &'a Discovery,
    pub authors: &'a [Author],
    pub series: Option<&'a Series>,
}

/// Renders the ordered link set of a book.
pub fn render_links(book: &BookLinks<'_>, options: &Options, surface: Surface, locale: &dyn Localize) -> Vec<Link> {
    let mut links = Vec::new();
    let fetch = &options.fetch_endpoint;
    let addressing = options.addressing();
    for artifact in book.discovery.artifacts() {
        match &artifact.kind {
            ArtifactKind::Cover => {
                let href = match addressing {
                    Addressing::Fetch => format!("{fetch}?id={}", book.id),
                    Addressing::Direct => direct_href(book.dir, &artifact.file_name),
                };
                links.push(Link::new(href, JPEG, Relation::Image));
                // Thumbnails are generated on demand, so never direct.
                let height = options.thumbnail_height(surface);
                links.push(Link::new(format!("{fetch}?id={}&height={height}", book.id), JPEG, Relation::Thumbnail));
            },
            ArtifactKind::Format(code) => {
                let href = match addressing {
                    Addressing::Fetch => format!("{fetch}?id={}&type={code}", book.id),
                    Addressing::Direct => direct_href(book.dir, &artifact.file_name),
                };
                let mime = options.formats.mime(code).unwrap_or(OCTET_STREAM);
                links.push(Link::new(href, mime, Relation::Acquisition).with_title(DOWNLOAD));
            },
        }
    }
    let other_books = locale.message(keys::OTHER_BOOKS, &[]);
    for author in book.authors {
        let title = locale.message(keys::BOOK_AUTHOR, &[other_books.as_str(), author.name.as_str()]);
        links.push(Link::navigation(author.uri(), Relation::Related).with_title(title));
    }
    if let Some(series) = book.series {
        let index = format_series_index(book.series_index);
        let title = locale.message(keys::SERIES_DATA, &[index.as_str(), series.name.as_str()]);
        links.push(Link::navigation(series.uri(), Relation::Related).with_title(title));
    }
    links
}

/// `1.0` renders as `1`, `2.5` as `2.5`.
pub fn format_series_index(index: f64) -> String {
    index.to_string()
}

fn direct_href(dir: &Path, file_name: &str) -> String {
    let path = dir.join(file_name);
    utf8_percent_encode(&path.to_string_lossy(), DIRECT_PATH).to_string()
}
