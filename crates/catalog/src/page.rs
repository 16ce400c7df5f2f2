//! Catalog routes and entry identifiers.
//!
//! Navigation links point at catalog pages by number (`?page=3&id=42`).
//! The numbers are part of the public URL scheme and must stay stable.

use libris_store::{Author, Series, Tag};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

pub const ALL_BOOKS_ID: &str = "calibre:books";
pub const RECENT_BOOKS_ID: &str = "calibre:recentbooks";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Page {
    AuthorDetail = 3,
    AllBooks = 4,
    AllBooksLetter = 5,
    SeriesDetail = 7,
    RecentBooks = 10,
    TagDetail = 12,
}
impl Page {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn uri(self) -> String {
        format!("?page={}", self.number())
    }

    /// Page URI with an `id` parameter, percent-encoded.
    pub fn uri_with_id(self, id: impl ToString) -> String {
        let id = id.to_string();
        format!("?page={}&id={}", self.number(), utf8_percent_encode(&id, NON_ALPHANUMERIC))
    }
}

/// Entry id of a book: its uuid as a URN.
pub fn book_entry_id(uuid: &str) -> String {
    format!("urn:uuid:{uuid}")
}

pub fn letter_entry_id(letter: char) -> String {
    format!("{ALL_BOOKS_ID}:letter:{letter}")
}

/// Something with its own catalog page.
pub trait Navigable {
    /// Relative URI of the entity's catalog page.
    fn uri(&self) -> String;
    /// Stable Atom entry id.
    fn entry_id(&self) -> String;
}

macro_rules! navigable {
    ($ty:ty, $page:expr, $prefix:literal) => {
        impl Navigable for $ty {
            fn uri(&self) -> String {
                $page.uri_with_id(self.id)
            }

            fn entry_id(&self) -> String {
                format!(concat!("calibre:", $prefix, ":{}"), self.id)
            }
        }
    };
}
navigable!(Author, Page::AuthorDetail, "author");
navigable!(Series, Page::SeriesDetail, "series");
navigable!(Tag, Page::TagDetail, "tag");

/// URI of the books-by-letter page.
pub fn letter_uri(letter: char) -> String {
    Page::AllBooksLetter.uri_with_id(letter)
}
