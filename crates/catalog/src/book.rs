//! The book aggregate.
//!
//! A [`Book`] starts out as the scalar data of one row. Authors, series,
//! tags and the files in its directory are fetched the first time they are
//! asked for and kept for the lifetime of the instance, so building an entry
//! costs at most one query per association no matter how many times the
//! comment and the links need them.

use crate::entry::{ContentType, Entry};
use crate::error::{ErrorKind, Result};
use crate::link::{BookLinks, Link, format_series_index, render_links};
use crate::locale::{Localize, keys};
use crate::options::{Options, Surface};
use crate::page::book_entry_id;
use exn::ResultExt;
use libris_artifacts::{Discovery, scan_book};
use libris_store::{Author, BookRecord, Id, Series, StoreHandle, Tag};
use quick_xml::escape::partial_escape;
use regex::Regex;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use time::OffsetDateTime;
use tokio::sync::OnceCell;

/// A comment closing one of these tags was written as HTML and is trusted.
static HTML_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</(div|p|a)>").unwrap());

#[derive(Clone)]
pub struct Book {
    record: BookRecord,
    path: PathBuf,
    store: StoreHandle,
    options: Arc<Options>,
    authors: OnceCell<Vec<Author>>,
    series: OnceCell<Option<Series>>,
    tags: OnceCell<Vec<Tag>>,
    discovery: OnceCell<Discovery>,
}

impl Debug for Book {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Book")
            .field("id", &self.record.id)
            .field("uuid", &self.record.uuid)
            .field("title", &self.record.title)
            .field("path", &self.path)
            .field("authors", &self.authors.get())
            .field("series", &self.series.get())
            .field("tags", &self.tags.get())
            .field("discovery", &self.discovery.get())
            .finish_non_exhaustive()
    }
}

impl Book {
    pub fn new(record: BookRecord, store: StoreHandle, options: Arc<Options>) -> Self {
        let path = options.root.join(&record.relative_path);
        Self {
            record,
            path,
            store,
            options,
            authors: OnceCell::new(),
            series: OnceCell::new(),
            tags: OnceCell::new(),
            discovery: OnceCell::new(),
        }
    }

    pub fn id(&self) -> Id {
        self.record.id
    }

    pub fn uuid(&self) -> &str {
        &self.record.uuid
    }

    pub fn title(&self) -> &str {
        &self.record.title
    }

    pub fn timestamp(&self) -> OffsetDateTime {
        self.record.timestamp
    }

    pub fn pubdate(&self) -> Option<OffsetDateTime> {
        self.record.pubdate
    }

    pub fn series_index(&self) -> f64 {
        self.record.series_index
    }

    /// Book directory under the library root.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Book directory as stored in the library.
    pub fn relative_path(&self) -> &Path {
        &self.record.relative_path
    }

    pub fn record(&self) -> &BookRecord {
        &self.record
    }

    /// Entry id: the uuid as a URN.
    pub fn entry_id(&self) -> String {
        book_entry_id(&self.record.uuid)
    }

    pub async fn authors(&self) -> Result<&[Author]> {
        let authors = self
            .authors
            .get_or_try_init(|| async {
                tracing::debug!(book = self.record.id, "resolving authors");
                self.store.authors_of(self.record.id).await.or_raise(|| ErrorKind::Store)
            })
            .await?;
        Ok(authors.as_slice())
    }

    pub async fn series(&self) -> Result<Option<&Series>> {
        let series = self
            .series
            .get_or_try_init(|| async {
                tracing::debug!(book = self.record.id, "resolving series");
                self.store.series_of(self.record.id).await.or_raise(|| ErrorKind::Store)
            })
            .await?;
        Ok(series.as_ref())
    }

    pub async fn tags(&self) -> Result<&[Tag]> {
        let tags = self
            .tags
            .get_or_try_init(|| async {
                tracing::debug!(book = self.record.id, "resolving tags");
                self.store.tags_of(self.record.id).await.or_raise(|| ErrorKind::Store)
            })
            .await?;
        Ok(tags.as_slice())
    }

    /// Author names joined with `", "`, or `None` without authors.
    pub async fn authors_name(&self) -> Result<Option<String>> {
        Ok(join_names(self.authors().await?.iter().map(|a| a.name.as_str())))
    }

    /// Tag names joined with `", "`, or `None` without tags.
    pub async fn tags_name(&self) -> Result<Option<String>> {
        Ok(join_names(self.tags().await?.iter().map(|t| t.name.as_str())))
    }

    /// Files in the book directory. Scanned once; an unreadable directory
    /// is simply empty.
    pub async fn artifacts(&self) -> &Discovery {
        self.discovery
            .get_or_init(|| scan_book(&self.options.root, &self.record.relative_path, &self.options.formats))
            .await
    }

    /// Format code to file name for every downloadable file found.
    pub async fn formats(&self) -> BTreeMap<String, String> {
        self.artifacts().await.formats()
    }

    /// Where the file of `format` lives: under the library root, or
    /// relative to it with `relative`. `None` when the book has no such file.
    pub async fn file_path(&self, format: &str, relative: bool) -> Option<PathBuf> {
        let file = self.artifacts().await.file_for(format)?;
        let dir = if relative { self.relative_path() } else { self.path() };
        Some(dir.join(file))
    }

    /// The description as HTML.
    ///
    /// With `with_series`, a line naming the series and the book's position
    /// in it comes first. Comments that already contain block markup pass
    /// through (with `<br>` made self-closing); anything else is escaped.
    pub async fn comment(&self, with_series: bool, locale: &dyn Localize) -> Result<String> {
        let mut html = String::new();
        if with_series && let Some(series) = self.series().await? {
            let index = format_series_index(self.record.series_index);
            let name = escape_html(series.name.as_str());
            html.push_str("<strong>");
            html.push_str(&locale.message(keys::SERIES, &[]));
            html.push_str("</strong>");
            html.push_str(&locale.message(keys::SERIES_DATA, &[index.as_str(), name.as_ref()]));
            html.push_str("<br />\n");
        }
        html.push_str(&render_comment(self.record.comment.as_deref().unwrap_or_default()));
        Ok(html)
    }

    /// The ordered link set: artifacts, then authors, then the series.
    pub async fn links(&self, locale: &dyn Localize, surface: Surface) -> Result<Vec<Link>> {
        let authors = self.authors().await?;
        let series = self.series().await?;
        let discovery = self.artifacts().await;
        let book = BookLinks {
            id: self.record.id,
            dir: &self.path,
            series_index: self.record.series_index,
            discovery,
            authors,
            series,
        };
        Ok(render_links(&book, &self.options, surface, locale))
    }

    /// Turns the book into its catalog entry.
    pub async fn entry(self, locale: &dyn Localize, surface: Surface) -> Result<Entry> {
        let content = self.comment(true, locale).await?;
        let links = self.links(locale, surface).await?;
        Ok(Entry {
            title: self.record.title.clone(),
            id: self.entry_id(),
            content,
            content_type: ContentType::Html,
            links,
            book: Some(self),
        })
    }
}

fn render_comment(comment: &str) -> String {
    if HTML_COMMENT.is_match(comment) {
        comment.replace("<br>", "<br />")
    } else {
        escape_html(comment).into_owned()
    }
}

/// HTML escaping with quotes written as `&quot;` and `&#039;`, which HTML4
/// readers understand where `&apos;` is XML only.
fn escape_html(text: &str) -> Cow<'_, str> {
    let escaped = partial_escape(text);
    if !escaped.contains(['"', '\'']) {
        return escaped;
    }
    Cow::Owned(escaped.replace('"', "&quot;").replace('\'', "&#039;"))
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> Option<String> {
    let joined = names.collect::<Vec<_>>().join(", ");
    (!joined.is_empty()).then_some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Messages;
    use crate::options::LinkMode;
    use libris_store::mock::{Call, MockStore};
    use rstest::rstest;

    fn foundation() -> BookRecord {
        BookRecord::new(5, "6a1c5e1e-0c55-4d2b-9b57-1f1a7c6b0005", "Foundation", "Isaac Asimov/Foundation (5)")
    }

    fn mock() -> MockStore {
        MockStore::new()
            .with_book(foundation())
            .with_author(5, Author { id: 3, name: "Isaac Asimov".into() })
            .with_series(5, Series { id: 2, name: "Foundation & Empire".into() })
            .with_tag(5, Tag { id: 1, name: "sci-fi".into() })
            .with_tag(5, Tag { id: 4, name: "classic".into() })
    }

    fn make_book(store: &Arc<MockStore>, record: BookRecord, root: &Path) -> Book {
        let options = Options::new(root).with_link_mode(LinkMode::Fetch);
        Book::new(record, store.clone(), Arc::new(options))
    }

    #[rstest]
    #[case("<p>The first volume.<br>Frodo sets out.</p>", "<p>The first volume.<br />Frodo sets out.</p>")]
    #[case("<div>Block</div>", "<div>Block</div>")]
    #[case("<a href=\"x\">link</a> and <br>", "<a href=\"x\">link</a> and <br />")]
    #[case("Holmes & Watson <meet>", "Holmes &amp; Watson &lt;meet&gt;")]
    // No closing block tag, so `<br>` is escaped like everything else.
    #[case("line<br>break", "line&lt;br&gt;break")]
    #[case("It's \"quoted\"", "It&#039;s &quot;quoted&quot;")]
    #[case("", "")]
    fn test_render_comment(#[case] comment: &str, #[case] expected: &str) {
        assert_eq!(render_comment(comment), expected);
    }

    #[tokio::test]
    async fn test_associations_resolve_once() {
        let store = Arc::new(mock());
        let book = make_book(&store, foundation(), Path::new("/srv/library"));
        for _ in 0..3 {
            assert_eq!(book.authors().await.unwrap().len(), 1);
            assert_eq!(book.series().await.unwrap().map(|s| s.id), Some(2));
            assert_eq!(book.tags().await.unwrap().len(), 2);
        }
        assert_eq!(store.calls(Call::AuthorsOf), 1);
        assert_eq!(store.calls(Call::SeriesOf), 1);
        assert_eq!(store.calls(Call::TagsOf), 1);
    }

    #[tokio::test]
    async fn test_absent_series_is_memoized() {
        let store = Arc::new(MockStore::new().with_book(foundation()));
        let book = make_book(&store, foundation(), Path::new("/srv/library"));
        assert!(book.series().await.unwrap().is_none());
        assert!(book.series().await.unwrap().is_none());
        assert_eq!(store.calls(Call::SeriesOf), 1);
    }

    #[tokio::test]
    async fn test_names() {
        let store = Arc::new(mock().with_author(5, Author { id: 9, name: "Anonymous".into() }));
        let book = make_book(&store, foundation(), Path::new("/srv/library"));
        assert_eq!(book.authors_name().await.unwrap().as_deref(), Some("Anonymous, Isaac Asimov"));
        assert_eq!(book.tags_name().await.unwrap().as_deref(), Some("classic, sci-fi"));

        let lonely = Arc::new(MockStore::new());
        let book = make_book(&lonely, foundation(), Path::new("/srv/library"));
        assert_eq!(book.authors_name().await.unwrap(), None);
        assert_eq!(book.tags_name().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_comment_with_series() {
        let store = Arc::new(mock());
        let record = foundation().with_series_index(2.0).with_comment("Psychohistory.");
        let book = make_book(&store, record, Path::new("/srv/library"));
        let locale = Messages::default();
        assert_eq!(
            book.comment(true, &locale).await.unwrap(),
            "<strong>Series: </strong>Book 2 in the Foundation &amp; Empire series<br />\nPsychohistory."
        );
        assert_eq!(book.comment(false, &locale).await.unwrap(), "Psychohistory.");
    }

    #[tokio::test]
    async fn test_entry() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Isaac Asimov").join("Foundation (5)");
        std::fs::create_dir_all(&dir).unwrap();
        for file in ["cover.jpg", "Foundation.epub", "Foundation.pdf"] {
            std::fs::write(dir.join(file), b"data").unwrap();
        }
        let store = Arc::new(mock());
        let book = make_book(&store, foundation(), root.path());
        let entry = book.entry(&Messages::default(), Surface::Opds).await.unwrap();
        assert_eq!(entry.title, "Foundation");
        assert_eq!(entry.id, "urn:uuid:6a1c5e1e-0c55-4d2b-9b57-1f1a7c6b0005");
        assert_eq!(entry.content_type, ContentType::Html);
        // image, thumbnail, epub, pdf, author, series
        assert_eq!(entry.links.len(), 6);
        let book = entry.book.unwrap();
        let formats = book.formats().await;
        assert_eq!(formats.get("epub").map(String::as_str), Some("Foundation.epub"));
        assert_eq!(formats.get("pdf").map(String::as_str), Some("Foundation.pdf"));
        assert_eq!(store.calls(Call::AuthorsOf), 1);
        assert_eq!(store.calls(Call::SeriesOf), 1);
        assert_eq!(store.calls(Call::TagsOf), 0);
    }

    #[tokio::test]
    async fn test_missing_directory_keeps_navigation() {
        let root = tempfile::tempdir().unwrap();
        let store = Arc::new(mock());
        let book = make_book(&store, foundation(), root.path());
        let links = book.links(&Messages::default(), Surface::Opds).await.unwrap();
        assert_eq!(links.iter().map(|l| l.href.as_str()).collect::<Vec<_>>(), vec!["?page=3&id=3", "?page=7&id=2"]);
        assert!(book.formats().await.is_empty());
    }

    #[tokio::test]
    async fn test_file_path() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Isaac Asimov").join("Foundation (5)");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Foundation.epub"), b"data").unwrap();
        let store = Arc::new(mock());
        let book = make_book(&store, foundation(), root.path());
        assert_eq!(book.file_path("epub", false).await, Some(dir.join("Foundation.epub")));
        assert_eq!(
            book.file_path("EPUB", true).await,
            Some(Path::new("Isaac Asimov/Foundation (5)/Foundation.epub").to_path_buf())
        );
        assert_eq!(book.file_path("pdf", false).await, None);
    }
}
