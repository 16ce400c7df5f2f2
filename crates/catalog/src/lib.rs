//! Catalog entry assembly for a Calibre library.
//!
//! Given a [`Selector`](libris_store::Selector), the [`Catalog`] queries the
//! store, wraps each row in a [`Book`] that lazily resolves its authors,
//! series, tags and on-disk files, and turns every book into an [`Entry`]
//! with its typed [`Link`]s. Serializing entries to Atom or HTML is left to
//! the caller; enable the `serde` feature to hand them to a serializer.

mod book;
mod catalog;
mod entry;
pub mod error;
mod link;
pub mod locale;
pub mod options;
pub mod page;

pub use crate::book::Book;
pub use crate::catalog::Catalog;
pub use crate::entry::{ContentType, Entry};
pub use crate::link::{BookLinks, Link, Relation, format_series_index, render_links};
pub use crate::locale::{Localize, Messages};
pub use crate::options::{Addressing, LinkMode, Options, Surface};

/// Number of books assembled into entries at the same time.
pub(crate) const MAX_ENTRY_CONCURRENCY: usize = 16;
