//! The read interface the catalog consumes.

use crate::error::Result;
use crate::models::{Author, BookRecord, Id, LetterCount, Series, Tag};
use crate::selector::Selector;
use async_trait::async_trait;

/// Read-only view of the library.
///
/// Every method is a single-attempt read. Absent rows are expressed as
/// `None` or an empty `Vec`; an `Err` always means the store itself failed
/// and must be surfaced to the caller.
///
/// # Examples
///
/// ```
/// use libris_store::{Selector, Store, error::Result};
///
/// async fn titles_by(store: &dyn Store, author: i64) -> Result<Vec<String>> {
///     let books = store.books(&Selector::Author(author)).await?;
///     Ok(books.into_iter().map(|b| b.title).collect())
/// }
/// ```
#[async_trait]
pub trait Store: Send + Sync {
    /// Books matching the selector, in the selector's order.
    async fn books(&self, selector: &Selector) -> Result<Vec<BookRecord>>;

    /// A single book by primary key.
    async fn book(&self, id: Id) -> Result<Option<BookRecord>>;

    /// Authors of a book, ordered by name.
    async fn authors_of(&self, book: Id) -> Result<Vec<Author>>;

    /// The series a book belongs to, if any.
    async fn series_of(&self, book: Id) -> Result<Option<Series>>;

    /// Tags of a book, ordered by name.
    async fn tags_of(&self, book: Id) -> Result<Vec<Tag>>;

    async fn author(&self, id: Id) -> Result<Option<Author>>;

    async fn series(&self, id: Id) -> Result<Option<Series>>;

    async fn tag(&self, id: Id) -> Result<Option<Tag>>;

    /// Total number of books in the library.
    async fn count_books(&self) -> Result<u64>;

    /// One bucket per distinct first letter of the uppercased sort key,
    /// ascending by letter.
    async fn letter_counts(&self) -> Result<Vec<LetterCount>>;
}
