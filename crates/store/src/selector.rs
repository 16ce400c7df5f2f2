//! Catalog selectors: which books a request wants, and in which order.

use crate::models::Id;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// The criterion used to filter the catalog.
///
/// Every variant maps to exactly one query template, and each template owns
/// its ordering:
///
/// | Selector      | Matches                                          | Order                    |
/// |---------------|--------------------------------------------------|--------------------------|
/// | `Author(id)`  | books linked to the author                       | publication date, asc    |
/// | `Series(id)`  | books in the series                              | series index, asc        |
/// | `Tag(id)`     | books carrying the tag                           | sort key                 |
/// | `Id(id)`      | the book with that primary key (zero or one)     | n/a                      |
/// | `Query(text)` | title or any author name contains `text`         | store default            |
/// | `Letter(c)`   | uppercased sort key starts with `c`              | sort key                 |
/// | `Recent(n)`   | the `n` most recently added books                | added, newest first      |
///
/// No secondary tie-break is applied: books with equal keys come back in
/// whatever order SQLite produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Author(Id),
    Series(Id),
    Tag(Id),
    Id(Id),
    Query(String),
    Letter(char),
    Recent(u32),
}
impl Selector {
    /// Short name of the selector kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Author(_) => "author",
            Self::Series(_) => "series",
            Self::Tag(_) => "tag",
            Self::Id(_) => "id",
            Self::Query(_) => "query",
            Self::Letter(_) => "letter",
            Self::Recent(_) => "recent",
        }
    }

    /// `LIKE` pattern for the text-matching selectors.
    ///
    /// User-supplied text is matched literally: `%`, `_` and the escape
    /// character itself are escaped (the queries declare `ESCAPE '\'`).
    pub(crate) fn like_pattern(&self) -> Option<String> {
        match self {
            Self::Query(text) => Some(format!("%{}%", escape_like(text))),
            // SQLite's upper() only folds ASCII, so the letter must be folded
            // the same way or accented initials would never match.
            Self::Letter(letter) => Some(format!("{}%", escape_like(&letter.to_ascii_uppercase().to_string()))),
            _ => None,
        }
    }
}
impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Author(id) | Self::Series(id) | Self::Tag(id) | Self::Id(id) => write!(f, "{}:{id}", self.kind()),
            Self::Query(text) => write!(f, "query:{text:?}"),
            Self::Letter(letter) => write!(f, "letter:{letter}"),
            Self::Recent(limit) => write!(f, "recent:{limit}"),
        }
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
