//! The catalog query dispatcher.

use crate::MAX_ENTRY_CONCURRENCY;
use crate::book::Book;
use crate::entry::Entry;
use crate::error::{ErrorKind, Result};
use crate::link::{Link, Relation};
use crate::locale::{Localize, Messages, keys};
use crate::options::{Options, Surface};
use crate::page::{ALL_BOOKS_ID, Page, RECENT_BOOKS_ID, letter_entry_id, letter_uri};
use exn::ResultExt;
use futures::{StreamExt, TryStreamExt, stream};
use libris_store::{Author, BookRecord, Id, Selector, Series, StoreHandle, Tag};
use std::sync::Arc;
use tracing::instrument;

/// Read-only catalog over a library store.
///
/// Every method runs the queries it needs and returns fully assembled
/// entries in the order the store produced the books. Nothing is cached
/// between calls.
#[derive(Clone)]
pub struct Catalog {
    store: StoreHandle,
    options: Arc<Options>,
    locale: Arc<dyn Localize>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog").field("options", &self.options).finish_non_exhaustive()
    }
}

impl Catalog {
    /// A catalog with the default English messages.
    pub fn new(store: StoreHandle, options: Options) -> Self {
        Self {
            store,
            options: Arc::new(options),
            locale: Arc::new(Messages::default()),
        }
    }

    pub fn with_locale(mut self, locale: impl Localize + 'static) -> Self {
        self.locale = Arc::new(locale);
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Entries for every book the selector matches.
    #[instrument("listing entries", skip_all, fields(selector = %selector, surface = ?surface))]
    pub async fn entries(&self, selector: &Selector, surface: Surface) -> Result<Vec<Entry>> {
        let records = self.store.books(selector).await.or_raise(|| ErrorKind::Store)?;
        tracing::debug!(count = records.len(), "assembling entries");
        self.assemble(records, surface).await
    }

    pub async fn books_by_author(&self, author: Id, surface: Surface) -> Result<Vec<Entry>> {
        self.entries(&Selector::Author(author), surface).await
    }

    pub async fn books_by_series(&self, series: Id, surface: Surface) -> Result<Vec<Entry>> {
        self.entries(&Selector::Series(series), surface).await
    }

    pub async fn books_by_tag(&self, tag: Id, surface: Surface) -> Result<Vec<Entry>> {
        self.entries(&Selector::Tag(tag), surface).await
    }

    /// Books whose title or any author name contains `text`.
    pub async fn books_by_query(&self, text: impl Into<String>, surface: Surface) -> Result<Vec<Entry>> {
        self.entries(&Selector::Query(text.into()), surface).await
    }

    pub async fn books_by_letter(&self, letter: char, surface: Surface) -> Result<Vec<Entry>> {
        self.entries(&Selector::Letter(letter), surface).await
    }

    /// The most recently added books, up to the configured limit.
    pub async fn recent(&self, surface: Surface) -> Result<Vec<Entry>> {
        self.entries(&Selector::Recent(self.options.recent_limit), surface).await
    }

    /// A single book, or `None` if the library has no such id.
    #[instrument("fetching book", skip(self))]
    pub async fn book(&self, id: Id) -> Result<Option<Book>> {
        let record = self.store.book(id).await.or_raise(|| ErrorKind::Store)?;
        Ok(record.map(|record| self.book_from(record)))
    }

    pub async fn book_entry(&self, id: Id, surface: Surface) -> Result<Option<Entry>> {
        match self.book(id).await? {
            Some(book) => Ok(Some(book.entry(self.locale.as_ref(), surface).await?)),
            None => Ok(None),
        }
    }

    /// One navigation entry per initial letter of the sort key, with the
    /// number of books under it.
    #[instrument("building letter index", skip_all)]
    pub async fn letter_index(&self) -> Result<Vec<Entry>> {
        let buckets = self.store.letter_counts().await.or_raise(|| ErrorKind::Store)?;
        Ok(buckets
            .into_iter()
            .map(|bucket| {
                let count = bucket.count.to_string();
                Entry::navigation(
                    bucket.letter.to_string(),
                    letter_entry_id(bucket.letter),
                    self.locale.message(keys::BOOK_COUNT, &[count.as_str()]),
                    vec![Link::navigation(letter_uri(bucket.letter), Relation::Subsection)],
                )
            })
            .collect())
    }

    /// The two entry points of the book catalog: everything alphabetically,
    /// and the recent additions.
    #[instrument("building top level", skip_all)]
    pub async fn top_level(&self) -> Result<Vec<Entry>> {
        let count = self.store.count_books().await.or_raise(|| ErrorKind::Store)?.to_string();
        let limit = self.options.recent_limit.to_string();
        Ok(vec![
            Entry::navigation(
                self.locale.message(keys::ALL_BOOKS_TITLE, &[]),
                ALL_BOOKS_ID,
                self.locale.message(keys::ALL_BOOKS_ALPHABETICAL, &[count.as_str()]),
                vec![Link::navigation(Page::AllBooks.uri(), Relation::Subsection)],
            ),
            Entry::navigation(
                self.locale.message(keys::RECENT_TITLE, &[]),
                RECENT_BOOKS_ID,
                self.locale.message(keys::RECENT_LIST, &[limit.as_str()]),
                vec![Link::navigation(Page::RecentBooks.uri(), Relation::Subsection)],
            ),
        ])
    }

    pub async fn author(&self, id: Id) -> Result<Option<Author>> {
        self.store.author(id).await.or_raise(|| ErrorKind::Store)
    }

    pub async fn series(&self, id: Id) -> Result<Option<Series>> {
        self.store.series(id).await.or_raise(|| ErrorKind::Store)
    }

    pub async fn tag(&self, id: Id) -> Result<Option<Tag>> {
        self.store.tag(id).await.or_raise(|| ErrorKind::Store)
    }

    fn book_from(&self, record: BookRecord) -> Book {
        Book::new(record, self.store.clone(), self.options.clone())
    }

    /// Builds entries concurrently while keeping the input order. The first
    /// store failure aborts the whole list.
    async fn assemble(&self, records: Vec<BookRecord>, surface: Surface) -> Result<Vec<Entry>> {
        let locale = self.locale.as_ref();
        stream::iter(records)
            .map(|record| self.book_from(record).entry(locale, surface))
            .buffered(MAX_ENTRY_CONCURRENCY)
            .try_collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::ContentType;
    use crate::options::LinkMode;
    use async_trait::async_trait;
    use libris_store::mock::{Call, MockStore};
    use libris_store::{Database, LetterCount, Repository, Store};
    use rstest::rstest;
    use time::macros::datetime;

    const LIBRARY: &str = include_str!("../../store/fixtures/library.sql");

    async fn fixture(options: Options) -> Catalog {
        let db = Database::connect_in_memory(LIBRARY).await.unwrap();
        Catalog::new(Arc::new(Repository::from(&db)), options)
    }

    fn titles(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.title.as_str()).collect()
    }

    /// Every call fails, as if the database went away mid-request.
    struct BrokenStore;

    #[async_trait]
    impl Store for BrokenStore {
        async fn books(&self, _: &Selector) -> libris_store::error::Result<Vec<BookRecord>> {
            Err(exn::Exn::from(libris_store::error::ErrorKind::Database))
        }
        async fn book(&self, _: Id) -> libris_store::error::Result<Option<BookRecord>> {
            Err(exn::Exn::from(libris_store::error::ErrorKind::Database))
        }
        async fn authors_of(&self, _: Id) -> libris_store::error::Result<Vec<Author>> {
            Err(exn::Exn::from(libris_store::error::ErrorKind::Database))
        }
        async fn series_of(&self, _: Id) -> libris_store::error::Result<Option<Series>> {
            Err(exn::Exn::from(libris_store::error::ErrorKind::Database))
        }
        async fn tags_of(&self, _: Id) -> libris_store::error::Result<Vec<Tag>> {
            Err(exn::Exn::from(libris_store::error::ErrorKind::Database))
        }
        async fn author(&self, _: Id) -> libris_store::error::Result<Option<Author>> {
            Err(exn::Exn::from(libris_store::error::ErrorKind::Database))
        }
        async fn series(&self, _: Id) -> libris_store::error::Result<Option<Series>> {
            Err(exn::Exn::from(libris_store::error::ErrorKind::Database))
        }
        async fn tag(&self, _: Id) -> libris_store::error::Result<Option<Tag>> {
            Err(exn::Exn::from(libris_store::error::ErrorKind::Database))
        }
        async fn count_books(&self) -> libris_store::error::Result<u64> {
            Err(exn::Exn::from(libris_store::error::ErrorKind::Database))
        }
        async fn letter_counts(&self) -> libris_store::error::Result<Vec<LetterCount>> {
            Err(exn::Exn::from(libris_store::error::ErrorKind::Database))
        }
    }

    #[tokio::test]
    async fn test_entries_keep_store_order() {
        // More books than the assembly window, added oldest first.
        let mut store = MockStore::new();
        for id in 1..=40 {
            let record = BookRecord::new(id, format!("uuid-{id}"), format!("Book {id}"), format!("Author/Book {id} ({id})"))
                .with_timestamp(datetime!(2020-01-01 00:00 UTC) + time::Duration::days(id));
            store = store.with_book(record);
        }
        let store = Arc::new(store);
        let catalog = Catalog::new(store.clone(), Options::new("/srv/library"));
        let entries = catalog.entries(&Selector::Recent(40), Surface::Opds).await.unwrap();
        let ids = entries.iter().map(|e| e.book.as_ref().unwrap().id()).collect::<Vec<_>>();
        assert_eq!(ids, (1..=40).rev().collect::<Vec<_>>());
        assert_eq!(store.calls(Call::Books), 1);
        // One author and one series lookup per book, no tags.
        assert_eq!(store.calls(Call::AuthorsOf), 40);
        assert_eq!(store.calls(Call::SeriesOf), 40);
        assert_eq!(store.calls(Call::TagsOf), 0);
    }

    #[tokio::test]
    async fn test_missing_book_is_none() {
        let catalog = fixture(Options::new("/srv/library")).await;
        assert!(catalog.book(999).await.unwrap().is_none());
        assert!(catalog.book_entry(999, Surface::Opds).await.unwrap().is_none());
        assert!(catalog.entries(&Selector::Id(999), Surface::Opds).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_book_by_id() {
        let catalog = fixture(Options::new("/srv/library")).await;
        let book = catalog.book(4).await.unwrap().unwrap();
        assert_eq!(book.title(), "A Wizard of Earthsea");
        assert_eq!(book.authors_name().await.unwrap().as_deref(), Some("Ursula K. Le Guin"));
        assert_eq!(book.tags_name().await.unwrap().as_deref(), Some("fantasy"));
        let entry = catalog.book_entry(4, Surface::Opds).await.unwrap().unwrap();
        assert_eq!(entry.id, "urn:uuid:6a1c5e1e-0c55-4d2b-9b57-1f1a7c6b0004");
    }

    #[tokio::test]
    async fn test_book_without_series() {
        let catalog = fixture(Options::new("/srv/library")).await;
        let entry = catalog.book_entry(6, Surface::Opds).await.unwrap().unwrap();
        let book = entry.book.as_ref().unwrap();
        assert_eq!(book.tags_name().await.unwrap().as_deref(), Some("mystery, sci-fi"));
        assert!(entry.links.iter().all(|l| !l.href.starts_with("?page=7")));
        assert_eq!(entry.content, "A murder in a domed city.");
    }

    #[tokio::test]
    async fn test_query_matches_author() {
        let catalog = fixture(Options::new("/srv/library")).await;
        let mut found = titles(&catalog.books_by_query("tolkien", Surface::Opds).await.unwrap())
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        found.sort();
        assert_eq!(found, vec!["The Fellowship of the Ring", "The Return of the King", "The Two Towers"]);
    }

    #[rstest]
    #[case(Selector::Series(1), vec!["The Fellowship of the Ring", "The Two Towers", "The Return of the King"])]
    #[case(Selector::Author(2), vec!["A Wizard of Earthsea"])]
    #[case(Selector::Tag(1), vec!["The Caves of Steel", "Foundation", "Foundation and Empire"])]
    #[tokio::test]
    async fn test_selector_order(#[case] selector: Selector, #[case] expected: Vec<&str>) {
        let catalog = fixture(Options::new("/srv/library")).await;
        let entries = catalog.entries(&selector, Surface::Opds).await.unwrap();
        assert_eq!(titles(&entries), expected);
        assert!(entries.iter().all(|e| e.content_type == ContentType::Html));
    }

    #[tokio::test]
    async fn test_series_entries_carry_series_line() {
        let catalog = fixture(Options::new("/srv/library")).await;
        let entries = catalog.books_by_series(1, Surface::Opds).await.unwrap();
        assert_eq!(
            entries[0].content,
            "<strong>Series: </strong>Book 1 in the The Lord of the Rings series<br />\n<p>The first volume.<br />Frodo sets out.</p>"
        );
        assert!(entries[1].content.starts_with("<strong>Series: </strong>Book 2 in"));
        let series_link = entries[1].links.last().unwrap();
        assert_eq!(series_link.href, "?page=7&id=1");
    }

    #[tokio::test]
    async fn test_recent_uses_configured_limit() {
        let catalog = fixture(Options::new("/srv/library").with_recent_limit(2)).await;
        let entries = catalog.recent(Surface::Opds).await.unwrap();
        assert_eq!(titles(&entries), vec!["The Caves of Steel", "Foundation and Empire"]);
    }

    #[tokio::test]
    async fn test_letter_index() {
        let catalog = fixture(Options::new("/srv/library")).await;
        let index = catalog.letter_index().await.unwrap();
        assert_eq!(titles(&index), vec!["C", "D", "F", "R", "S", "T", "W"]);
        let f = &index[2];
        assert_eq!(f.id, "calibre:books:letter:F");
        assert_eq!(f.content, "3 books");
        assert_eq!(f.content_type, ContentType::Text);
        assert_eq!(f.links, vec![Link::navigation("?page=5&id=F", Relation::Subsection)]);
        assert!(!f.is_book());
    }

    #[tokio::test]
    async fn test_letter_bucket_lists_its_books() {
        let catalog = fixture(Options::new("/srv/library")).await;
        for bucket in catalog.letter_index().await.unwrap() {
            let letter = bucket.title.chars().next().unwrap();
            let books = catalog.books_by_letter(letter, Surface::Opds).await.unwrap();
            assert_eq!(bucket.content, format!("{} books", books.len()));
        }
        let d = catalog.books_by_letter('D', Surface::Opds).await.unwrap();
        assert_eq!(titles(&d), vec!["Dune"]);
    }

    #[tokio::test]
    async fn test_top_level() {
        let catalog = fixture(Options::new("/srv/library").with_recent_limit(25)).await;
        let top = catalog.top_level().await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, "calibre:books");
        assert_eq!(top[0].title, "All books");
        assert_eq!(top[0].content, "Alphabetical index of the 10 books");
        assert_eq!(top[0].links[0].href, "?page=4");
        assert_eq!(top[1].id, "calibre:recentbooks");
        assert_eq!(top[1].content, "25 most recent books");
        assert_eq!(top[1].links[0].href, "?page=10");
        assert!(top.iter().all(|e| e.content_type == ContentType::Text));
    }

    #[tokio::test]
    async fn test_entity_lookups() {
        let catalog = fixture(Options::new("/srv/library")).await;
        assert_eq!(catalog.author(3).await.unwrap().map(|a| a.name), Some("Isaac Asimov".to_string()));
        assert_eq!(catalog.series(1).await.unwrap().map(|s| s.name), Some("The Lord of the Rings".to_string()));
        assert_eq!(catalog.tag(2).await.unwrap().map(|t| t.name), Some("mystery".to_string()));
        assert!(catalog.tag(999).await.unwrap().is_none());
    }

    #[rstest]
    #[case(Surface::Opds, "fetch?id=4&height=50")]
    #[case(Surface::Html, "fetch?id=4&height=225")]
    #[tokio::test]
    async fn test_surface_selects_thumbnail(#[case] surface: Surface, #[case] expected: &str) {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Ursula K. Le Guin").join("A Wizard of Earthsea (4)");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("cover.jpg"), b"jpeg").unwrap();
        let catalog = fixture(Options::new(root.path())).await;
        let entry = catalog.book_entry(4, surface).await.unwrap().unwrap();
        let thumbnail = entry.links.iter().find(|l| l.relation == Relation::Thumbnail).unwrap();
        assert_eq!(thumbnail.href, expected);
    }

    #[tokio::test]
    async fn test_direct_links_from_relative_root() {
        let catalog = fixture(Options::new("library").with_link_mode(LinkMode::Auto)).await;
        // The directory does not exist relative to the test process: no
        // artifact links, only navigation.
        let entry = catalog.book_entry(8, Surface::Opds).await.unwrap().unwrap();
        assert!(entry.links.iter().all(|l| l.relation == Relation::Related));
        assert_eq!(entry.content, "Holmes &amp; Watson &lt;meet&gt; for the first time.");
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let catalog = Catalog::new(Arc::new(BrokenStore), Options::new("/srv/library"));
        let err = catalog.entries(&Selector::Recent(5), Surface::Opds).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Store));
        assert!(catalog.book(1).await.is_err());
        assert!(catalog.letter_index().await.is_err());
        assert!(catalog.top_level().await.is_err());
    }

    #[tokio::test]
    async fn test_association_failure_fails_the_list() {
        struct BrokenAuthors(MockStore);
        #[async_trait]
        impl Store for BrokenAuthors {
            async fn books(&self, s: &Selector) -> libris_store::error::Result<Vec<BookRecord>> {
                self.0.books(s).await
            }
            async fn book(&self, id: Id) -> libris_store::error::Result<Option<BookRecord>> {
                self.0.book(id).await
            }
            async fn authors_of(&self, _: Id) -> libris_store::error::Result<Vec<Author>> {
                Err(exn::Exn::from(libris_store::error::ErrorKind::Database))
            }
            async fn series_of(&self, id: Id) -> libris_store::error::Result<Option<Series>> {
                self.0.series_of(id).await
            }
            async fn tags_of(&self, id: Id) -> libris_store::error::Result<Vec<Tag>> {
                self.0.tags_of(id).await
            }
            async fn author(&self, id: Id) -> libris_store::error::Result<Option<Author>> {
                self.0.author(id).await
            }
            async fn series(&self, id: Id) -> libris_store::error::Result<Option<Series>> {
                self.0.series(id).await
            }
            async fn tag(&self, id: Id) -> libris_store::error::Result<Option<Tag>> {
                self.0.tag(id).await
            }
            async fn count_books(&self) -> libris_store::error::Result<u64> {
                self.0.count_books().await
            }
            async fn letter_counts(&self) -> libris_store::error::Result<Vec<LetterCount>> {
                self.0.letter_counts().await
            }
        }
        let store = MockStore::new().with_book(BookRecord::new(1, "uuid-1", "Dune", "Frank Herbert/Dune (1)"));
        let catalog = Catalog::new(Arc::new(BrokenAuthors(store)), Options::new("/srv/library"));
        assert!(catalog.recent(Surface::Opds).await.is_err());
    }
}
