//! In-memory store for testing.

use crate::error::Result;
use crate::models::{Author, BookRecord, Id, LetterCount, Series, Tag};
use crate::selector::Selector;
use crate::store::Store;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Which [`Store`] method a call went to, for [`MockStore::calls`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    Books,
    Book,
    AuthorsOf,
    SeriesOf,
    TagsOf,
    Entity,
    Count,
    Letters,
}

/// In-memory store for testing.
///
/// Holds books and their associations in plain collections and counts every
/// call per [`Call`] kind, so tests can assert how many queries a piece of
/// code issued. Selector semantics mirror the SQL templates closely enough
/// for unit tests; the repository tests cover the real queries.
///
/// # Examples
///
/// ```
/// use libris_store::mock::{Call, MockStore};
/// use libris_store::{Author, BookRecord, Store};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = MockStore::new()
///     .with_book(BookRecord::new(1, "uuid-1", "Dune", "Frank Herbert/Dune (1)"))
///     .with_author(1, Author { id: 3, name: "Frank Herbert".into() });
/// assert_eq!(store.authors_of(1).await.unwrap().len(), 1);
/// assert_eq!(store.calls(Call::AuthorsOf), 1);
/// # }
/// ```
#[derive(Debug)]
pub struct MockStore {
    books: Vec<BookRecord>,
    sort_keys: HashMap<Id, String>,
    authors: HashMap<Id, Vec<Author>>,
    series: HashMap<Id, Series>,
    tags: HashMap<Id, Vec<Tag>>,
    calls: HashMap<Call, AtomicUsize>,
}

impl Default for MockStore {
    fn default() -> Self {
        Self {
            books: Vec::new(),
            sort_keys: HashMap::new(),
            authors: HashMap::new(),
            series: HashMap::new(),
            tags: HashMap::new(),
            calls: counters(),
        }
    }
}
impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a book; its sort key defaults to its title.
    pub fn with_book(mut self, book: BookRecord) -> Self {
        self.sort_keys.insert(book.id, book.title.clone());
        self.books.push(book);
        self
    }

    pub fn with_sort_key(mut self, book: Id, sort: impl Into<String>) -> Self {
        self.sort_keys.insert(book, sort.into());
        self
    }

    pub fn with_author(mut self, book: Id, author: Author) -> Self {
        let authors = self.authors.entry(book).or_default();
        authors.push(author);
        authors.sort_by(|a, b| a.name.cmp(&b.name));
        self
    }

    pub fn with_series(mut self, book: Id, series: Series) -> Self {
        self.series.insert(book, series);
        self
    }

    pub fn with_tag(mut self, book: Id, tag: Tag) -> Self {
        let tags = self.tags.entry(book).or_default();
        tags.push(tag);
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        self
    }

    /// Number of calls made to the given method so far.
    pub fn calls(&self, call: Call) -> usize {
        self.calls.get(&call).map(|c| c.load(Ordering::SeqCst)).unwrap_or(0)
    }

    fn record(&self, call: Call) {
        // Every counter is created up front; `&self` methods can only bump them.
        if let Some(counter) = self.calls.get(&call) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn sort_key(&self, book: &BookRecord) -> String {
        self.sort_keys.get(&book.id).cloned().unwrap_or_else(|| book.title.clone())
    }

    fn matches(&self, book: &BookRecord, selector: &Selector) -> bool {
        match selector {
            Selector::Author(id) => self.authors.get(&book.id).is_some_and(|a| a.iter().any(|a| a.id == *id)),
            Selector::Series(id) => self.series.get(&book.id).is_some_and(|s| s.id == *id),
            Selector::Tag(id) => self.tags.get(&book.id).is_some_and(|t| t.iter().any(|t| t.id == *id)),
            Selector::Id(id) => book.id == *id,
            Selector::Query(text) => {
                let text = text.to_lowercase();
                book.title.to_lowercase().contains(&text)
                    || self
                        .authors
                        .get(&book.id)
                        .is_some_and(|a| a.iter().any(|a| a.name.to_lowercase().contains(&text)))
            },
            Selector::Letter(letter) => self.sort_key(book).to_ascii_uppercase().starts_with(letter.to_ascii_uppercase()),
            Selector::Recent(_) => true,
        }
    }
}

fn counters() -> HashMap<Call, AtomicUsize> {
    [
        Call::Books,
        Call::Book,
        Call::AuthorsOf,
        Call::SeriesOf,
        Call::TagsOf,
        Call::Entity,
        Call::Count,
        Call::Letters,
    ]
    .into_iter()
    .map(|call| (call, AtomicUsize::new(0)))
    .collect()
}

#[async_trait]
impl Store for MockStore {
    async fn books(&self, selector: &Selector) -> Result<Vec<BookRecord>> {
        self.record(Call::Books);
        let mut books = self.books.iter().filter(|b| self.matches(b, selector)).cloned().collect::<Vec<_>>();
        match selector {
            Selector::Author(_) => books.sort_by_key(|b| b.pubdate),
            Selector::Series(_) => books.sort_by(|a, b| a.series_index.total_cmp(&b.series_index)),
            Selector::Tag(_) | Selector::Letter(_) => books.sort_by_key(|b| self.sort_key(b).to_lowercase()),
            Selector::Recent(limit) => {
                books.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                books.truncate(*limit as usize);
            },
            Selector::Id(_) | Selector::Query(_) => {},
        }
        Ok(books)
    }

    async fn book(&self, id: Id) -> Result<Option<BookRecord>> {
        self.record(Call::Book);
        Ok(self.books.iter().find(|b| b.id == id).cloned())
    }

    async fn authors_of(&self, book: Id) -> Result<Vec<Author>> {
        self.record(Call::AuthorsOf);
        Ok(self.authors.get(&book).cloned().unwrap_or_default())
    }

    async fn series_of(&self, book: Id) -> Result<Option<Series>> {
        self.record(Call::SeriesOf);
        Ok(self.series.get(&book).cloned())
    }

    async fn tags_of(&self, book: Id) -> Result<Vec<Tag>> {
        self.record(Call::TagsOf);
        Ok(self.tags.get(&book).cloned().unwrap_or_default())
    }

    async fn author(&self, id: Id) -> Result<Option<Author>> {
        self.record(Call::Entity);
        Ok(self.authors.values().flatten().find(|a| a.id == id).cloned())
    }

    async fn series(&self, id: Id) -> Result<Option<Series>> {
        self.record(Call::Entity);
        Ok(self.series.values().find(|s| s.id == id).cloned())
    }

    async fn tag(&self, id: Id) -> Result<Option<Tag>> {
        self.record(Call::Entity);
        Ok(self.tags.values().flatten().find(|t| t.id == id).cloned())
    }

    async fn count_books(&self) -> Result<u64> {
        self.record(Call::Count);
        Ok(self.books.len() as u64)
    }

    async fn letter_counts(&self) -> Result<Vec<LetterCount>> {
        self.record(Call::Letters);
        let mut buckets = BTreeMap::<char, u64>::new();
        for book in &self.books {
            if let Some(letter) = self.sort_key(book).to_ascii_uppercase().chars().next() {
                *buckets.entry(letter).or_default() += 1;
            }
        }
        Ok(buckets.into_iter().map(|(letter, count)| LetterCount { letter, count }).collect())
    }
}
