//! SQLite implementation of [`Store`] over a Calibre `metadata.db`.
//!
//! Every query lives in its own file under `queries/` so that the SQL can be
//! read (and run by hand against a real library) without digging through
//! Rust string literals.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{Author, BookRecord, BookRow, EntityRow, Id, LetterCount, LetterRow, Series, Tag};
use crate::selector::Selector;
use crate::store::Store;
use async_trait::async_trait;
use exn::ResultExt;
use sqlx::SqlitePool;
use tracing::instrument;

/// Repository for reading books and their associations from the library.
///
/// Cheap to clone: it only holds the connection pool.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn query_for(selector: &Selector) -> &'static str {
        match selector {
            Selector::Author(_) => include_str!("../queries/books_by_author.sql"),
            Selector::Series(_) => include_str!("../queries/books_by_series.sql"),
            Selector::Tag(_) => include_str!("../queries/books_by_tag.sql"),
            Selector::Id(_) => include_str!("../queries/book_by_id.sql"),
            Selector::Query(_) => include_str!("../queries/books_by_query.sql"),
            Selector::Letter(_) => include_str!("../queries/books_by_letter.sql"),
            Selector::Recent(_) => include_str!("../queries/books_recent.sql"),
        }
    }

    async fn entity<T: From<EntityRow>>(&self, sql: &'static str, id: Id) -> Result<Option<T>> {
        let row: Option<EntityRow> = sqlx::query_as(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(row.map(T::from))
    }

    async fn entities<T: From<EntityRow>>(&self, sql: &'static str, id: Id) -> Result<Vec<T>> {
        let rows: Vec<EntityRow> = sqlx::query_as(sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(rows.into_iter().map(T::from).collect())
    }
}

#[async_trait]
impl Store for Repository {
    #[instrument("querying books", skip_all, fields(selector = %selector))]
    async fn books(&self, selector: &Selector) -> Result<Vec<BookRecord>> {
        let query = sqlx::query_as::<_, BookRow>(Self::query_for(selector));
        let query = match selector {
            Selector::Author(id) | Selector::Series(id) | Selector::Tag(id) | Selector::Id(id) => query.bind(*id),
            Selector::Query(_) | Selector::Letter(_) => query.bind(selector.like_pattern()),
            Selector::Recent(limit) => query.bind(i64::from(*limit)),
        };
        let rows = query.fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;
        tracing::debug!(count = rows.len(), "fetched book rows");
        rows.into_iter().map(BookRecord::try_from).collect()
    }

    #[instrument("fetching book", skip(self))]
    async fn book(&self, id: Id) -> Result<Option<BookRecord>> {
        let row: Option<BookRow> = sqlx::query_as(include_str!("../queries/book_by_id.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(BookRecord::try_from).transpose()
    }

    #[instrument("resolving authors", skip(self))]
    async fn authors_of(&self, book: Id) -> Result<Vec<Author>> {
        self.entities(include_str!("../queries/authors_by_book.sql"), book).await
    }

    #[instrument("resolving series", skip(self))]
    async fn series_of(&self, book: Id) -> Result<Option<Series>> {
        self.entity(include_str!("../queries/series_by_book.sql"), book).await
    }

    #[instrument("resolving tags", skip(self))]
    async fn tags_of(&self, book: Id) -> Result<Vec<Tag>> {
        self.entities(include_str!("../queries/tags_by_book.sql"), book).await
    }

    async fn author(&self, id: Id) -> Result<Option<Author>> {
        self.entity(include_str!("../queries/author_by_id.sql"), id).await
    }

    async fn series(&self, id: Id) -> Result<Option<Series>> {
        self.entity(include_str!("../queries/series_by_id.sql"), id).await
    }

    async fn tag(&self, id: Id) -> Result<Option<Tag>> {
        self.entity(include_str!("../queries/tag_by_id.sql"), id).await
    }

    async fn count_books(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_books.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("book count"))
    }

    #[instrument("counting books per letter", skip_all)]
    async fn letter_counts(&self) -> Result<Vec<LetterCount>> {
        let rows: Vec<LetterRow> = sqlx::query_as(include_str!("../queries/letter_counts.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(LetterCount::try_from).collect()
    }
}
