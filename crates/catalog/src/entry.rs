use crate::book::Book;
use crate::link::Link;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ContentType {
    #[cfg_attr(feature = "serde", serde(rename = "text/html"))]
    Html,
    #[cfg_attr(feature = "serde", serde(rename = "text"))]
    Text,
}
impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Html => "text/html",
            Self::Text => "text",
        }
    }
}

/// One renderable catalog item: a book, or a navigation bucket such as a
/// letter of the alphabetical index.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Entry {
    pub title: String,
    /// Stable Atom id (`urn:uuid:…` for books, `calibre:…` otherwise).
    pub id: String,
    pub content: String,
    pub content_type: ContentType,
    pub links: Vec<Link>,
    /// The book behind a book entry, with whatever it already resolved.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub book: Option<Book>,
}
impl Entry {
    /// An entry that only leads to other catalog pages.
    pub fn navigation(
        title: impl Into<String>,
        id: impl Into<String>,
        content: impl Into<String>,
        links: Vec<Link>,
    ) -> Self {
        Self {
            title: title.into(),
            id: id.into(),
            content: content.into(),
            content_type: ContentType::Text,
            links,
            book: None,
        }
    }

    pub fn is_book(&self) -> bool {
        self.book.is_some()
    }
}
